//! Quotation validation module
//!
//! Checks mapped records against the required-field and numeric-sign rules,
//! collecting every issue on a record instead of failing on the first one.
//! Records are never mutated; they are partitioned into valid and invalid.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::db::models::{Field, QuotationRecord};

/// A validation issue found on one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Row number in the import batch (1-indexed for user display)
    pub row: usize,
    /// Field that has the issue
    pub field: Field,
    /// The problematic value
    pub value: String,
    /// Description of why this is an issue
    pub reason: String,
}

impl ValidationIssue {
    pub fn new(
        row: usize,
        field: Field,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// A rejected record with every reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub record: QuotationRecord,
    pub issues: Vec<ValidationIssue>,
}

/// Result of validation: accepted records and rejected ones with reasons
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub valid: Vec<QuotationRecord>,
    pub invalid: Vec<InvalidRecord>,
}

impl ValidationResult {
    pub fn has_issues(&self) -> bool {
        !self.invalid.is_empty()
    }

    /// Count issues by field for summary reporting
    pub fn issue_summary(&self) -> BTreeMap<Field, usize> {
        let mut summary = BTreeMap::new();
        for issue in self.invalid.iter().flat_map(|r| &r.issues) {
            *summary.entry(issue.field).or_insert(0) += 1;
        }
        summary
    }
}

/// Validate a batch of mapped records
///
/// A record is invalid when its reference, description or name is empty, or
/// when unit price, quantity, cartons or units per carton is negative.
pub fn validate(records: Vec<QuotationRecord>) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (row_idx, record) in records.into_iter().enumerate() {
        let issues = check_record(row_idx + 1, &record);
        if issues.is_empty() {
            result.valid.push(record);
        } else {
            result.invalid.push(InvalidRecord { record, issues });
        }
    }

    result
}

/// Every rule violation on one record
pub fn check_record(row: usize, record: &QuotationRecord) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let required_text = [
        (Field::Referencia, &record.referencia),
        (Field::Description, &record.description),
        (Field::Name, &record.name),
    ];
    for (field, value) in required_text {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::new(
                row,
                field,
                value.as_str(),
                format!("{} is required", field),
            ));
        }
    }

    let non_negative = [
        (Field::UnitPriceRmb, record.unit_price_rmb),
        (Field::Qty, record.qty),
        (Field::Ctns, record.ctns),
        (Field::UnitCtn, record.unit_ctn),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            issues.push(ValidationIssue::new(
                row,
                field,
                value.to_string(),
                format!("{} cannot be negative", field),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_record(referencia: &str) -> QuotationRecord {
        QuotationRecord {
            referencia: referencia.to_string(),
            description: "Plastic cup".to_string(),
            name: "Cup".to_string(),
            ctns: dec!(2),
            unit_ctn: dec!(100),
            qty: dec!(200),
            unit_price_rmb: dec!(0.8),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record_passes() {
        let result = validate(vec![sample_record("A1")]);
        assert_eq!(result.valid.len(), 1);
        assert!(!result.has_issues());
    }

    #[test]
    fn test_empty_required_text_fields() {
        let mut record = sample_record(" ");
        record.name.clear();

        let result = validate(vec![record]);
        assert_eq!(result.invalid.len(), 1);
        let fields: Vec<Field> = result.invalid[0].issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec![Field::Referencia, Field::Name]);
    }

    #[test]
    fn test_each_negative_number_is_rejected() {
        let mutators: [fn(&mut QuotationRecord); 4] = [
            |r| r.unit_price_rmb = dec!(-1),
            |r| r.qty = dec!(-1),
            |r| r.ctns = dec!(-1),
            |r| r.unit_ctn = dec!(-1),
        ];

        for mutate in mutators {
            let mut record = sample_record("A1");
            mutate(&mut record);
            let result = validate(vec![record]);
            assert!(result.valid.is_empty());
            assert_eq!(result.invalid[0].issues.len(), 1);
        }
    }

    #[test]
    fn test_violations_accumulate_on_one_record() {
        let mut record = sample_record("");
        record.description.clear();
        record.ctns = dec!(-3);
        record.unit_price_rmb = dec!(-0.5);

        let result = validate(vec![record]);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].issues.len(), 4);
    }

    #[test]
    fn test_zero_values_are_valid() {
        let mut record = sample_record("A1");
        record.ctns = Decimal::ZERO;
        record.unit_price_rmb = Decimal::ZERO;
        assert!(validate(vec![record]).invalid.is_empty());
    }

    #[test]
    fn test_rows_are_numbered_from_one() {
        let result = validate(vec![sample_record("A1"), sample_record("")]);
        assert_eq!(result.invalid[0].issues[0].row, 2);
    }

    #[test]
    fn test_issue_summary_counts_by_field() {
        let mut a = sample_record("");
        a.ctns = dec!(-1);
        let b = sample_record("");
        let result = validate(vec![a, b, sample_record("ok")]);

        let summary = result.issue_summary();
        assert_eq!(summary.get(&Field::Referencia), Some(&2));
        assert_eq!(summary.get(&Field::Ctns), Some(&1));
        assert_eq!(result.valid.len(), 1);
    }
}
