//! Display summary built from an aggregate.

use crate::model::aggregate::AggregateResult;
use crate::model::category::Category;
use crate::present::format::format_record;
use serde::Serialize;

pub const SUMMARY_HEADING: &str = "Medical Summary";

/// One rendered category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub category: Category,
    pub title: &'static str,
    /// One line per record, in storage order.
    pub lines: Vec<String>,
}

/// Rendered share view; sections follow category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub heading: &'static str,
    pub sections: Vec<SummarySection>,
}

impl SummaryView {
    pub fn section(&self, category: Category) -> Option<&SummarySection> {
        self.sections
            .iter()
            .find(|section| section.category == category)
    }

    /// Plain-text rendering: heading, then one block per section.
    pub fn to_text(&self) -> String {
        let mut out = String::from(self.heading);
        out.push('\n');
        for section in &self.sections {
            out.push('\n');
            out.push_str(section.title);
            out.push('\n');
            for line in &section.lines {
                out.push_str("- ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Renders every present category; absent ones produce no section.
pub fn render_summary(result: &AggregateResult) -> SummaryView {
    let sections = result
        .iter()
        .map(|(category, records)| SummarySection {
            category,
            title: category.title(),
            lines: records
                .iter()
                .map(|record| format_record(category, record))
                .collect(),
        })
        .collect();

    SummaryView {
        heading: SUMMARY_HEADING,
        sections,
    }
}
