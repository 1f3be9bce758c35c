//! Consolidated per-category view for one share request.
//!
//! # Invariants
//! - A category key is present if and only if its record set is non-empty.
//! - Iteration follows [`Category`] order, independent of insertion order.

use crate::model::category::Category;
use crate::model::record::{Record, RecordSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Merged record sets of every category that had data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResult {
    categories: BTreeMap<Category, RecordSet>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `records` under `category` unless the set is empty.
    ///
    /// Returns whether the category is now present.
    pub fn insert_non_empty(&mut self, category: Category, records: RecordSet) -> bool {
        if records.is_empty() {
            return false;
        }
        self.categories.insert(category, records);
        true
    }

    pub fn get(&self, category: Category) -> Option<&[Record]> {
        self.categories.get(&category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains_key(&category)
    }

    /// Present categories in presentation order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Record])> + '_ {
        self.categories
            .iter()
            .map(|(category, records)| (*category, records.as_slice()))
    }

    /// Number of present categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total record count across present categories.
    pub fn record_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Terminal non-error outcome of a share request.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareView {
    /// No token was presented; nothing is shown and nothing was read.
    NoDataRequested,
    /// Token resolved and every category fetch settled.
    Completed(AggregateResult),
}

#[cfg(test)]
mod tests {
    use super::AggregateResult;
    use crate::model::category::Category;
    use crate::model::record::Record;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_record_sets_are_never_inserted() {
        let mut result = AggregateResult::new();
        assert!(!result.insert_non_empty(Category::Radiology, Vec::new()));
        assert!(!result.contains(Category::Radiology));
        assert!(result.is_empty());
    }

    #[test]
    fn iteration_follows_category_order() {
        let mut result = AggregateResult::new();
        result.insert_non_empty(Category::VitalSigns, vec![record(json!({"name": "spo2"}))]);
        result.insert_non_empty(Category::Prescriptions, vec![record(json!({"dosage": "5mg"}))]);

        let order: Vec<_> = result.categories().collect();
        assert_eq!(order, vec![Category::Prescriptions, Category::VitalSigns]);
        assert_eq!(result.record_count(), 2);
    }

    #[test]
    fn serializes_as_object_keyed_by_wire_name() {
        let mut result = AggregateResult::new();
        result.insert_non_empty(
            Category::BloodGlucose,
            vec![record(json!({"level": 5.4})), record(json!({"level": 6.1}))],
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"bloodGlucose": [{"level": 5.4}, {"level": 6.1}]}));
    }
}
