//! Fixed record category set.
//!
//! # Invariants
//! - `Category::ALL` lists every category exactly once, in presentation order.
//! - Wire names are stable camelCase strings and round-trip through
//!   [`Category::parse`].

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One named class of medical record kept per subject.
///
/// Variant order is presentation order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Prescriptions,
    DoctorVisits,
    Temperature,
    Allergies,
    BloodGlucose,
    LabResults,
    Radiology,
    HeartRate,
    BloodPressure,
    VitalSigns,
}

impl Category {
    /// Every category the share view fans out over.
    pub const ALL: [Category; 10] = [
        Self::Prescriptions,
        Self::DoctorVisits,
        Self::Temperature,
        Self::Allergies,
        Self::BloodGlucose,
        Self::LabResults,
        Self::Radiology,
        Self::HeartRate,
        Self::BloodPressure,
        Self::VitalSigns,
    ];

    /// Storage partition / wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prescriptions => "prescriptions",
            Self::DoctorVisits => "doctorVisits",
            Self::Temperature => "temperature",
            Self::Allergies => "allergies",
            Self::BloodGlucose => "bloodGlucose",
            Self::LabResults => "labResults",
            Self::Radiology => "radiology",
            Self::HeartRate => "heartRate",
            Self::BloodPressure => "bloodPressure",
            Self::VitalSigns => "vitalSigns",
        }
    }

    /// Section heading shown by the presentation layer.
    pub fn title(self) -> &'static str {
        match self {
            Self::Prescriptions => "Prescriptions",
            Self::DoctorVisits => "Doctor Visits",
            Self::Temperature => "Temperature",
            Self::Allergies => "Allergies",
            Self::BloodGlucose => "Blood Glucose",
            Self::LabResults => "Lab Results",
            Self::Radiology => "Radiology",
            Self::HeartRate => "Heart Rate",
            Self::BloodPressure => "Blood Pressure",
            Self::VitalSigns => "Vital Signs",
        }
    }

    /// Parses an exact wire name. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
