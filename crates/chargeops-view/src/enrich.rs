//! Per-user feedback counters derived from the whole collection

use chargeops_core::{FieldValue, Record, RecordId};
use std::collections::HashMap;

/// Field carrying the user's total number of reviews
pub const REVIEWS_FIELD: &str = "userTotalReviews";

/// Field carrying the user's total number of reports
pub const REPORTS_FIELD: &str = "userTotalReports";

/// Field grouping feedback by author
pub const USER_FIELD: &str = "userId";

const TECHNICAL_ISSUE: &str = "Technical Issue";

/// Review and report counts for one author
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserTotals {
    /// Feedback records written
    pub reviews: usize,
    /// Records counting as reports
    pub reports: usize,
}

/// Whether a feedback record counts as a report
///
/// A rating of 2 or lower, or the "Technical Issue" category.
#[must_use]
pub fn is_report(record: &Record) -> bool {
    record.number("rating").is_some_and(|r| r <= 2.0) || record.text("category") == TECHNICAL_ISSUE
}

/// Totals per author; records without a `userId` share the `None` group
#[must_use]
pub fn totals_by_user(records: &[Record]) -> HashMap<Option<RecordId>, UserTotals> {
    let mut totals: HashMap<Option<RecordId>, UserTotals> = HashMap::new();
    for record in records {
        let author = record.get(USER_FIELD).and_then(FieldValue::as_id);
        let entry = totals.entry(author).or_default();
        entry.reviews += 1;
        if is_report(record) {
            entry.reports += 1;
        }
    }
    totals
}

/// Copy of `records` with the author's counters attached to each record
///
/// Same length and order as the input.
#[must_use]
pub fn enrich(records: &[Record]) -> Vec<Record> {
    let totals = totals_by_user(records);
    records
        .iter()
        .map(|record| {
            let author = record.get(USER_FIELD).and_then(FieldValue::as_id);
            let counts = totals.get(&author).copied().unwrap_or_default();
            record
                .clone()
                .with(REVIEWS_FIELD, counts_to_field(counts.reviews))
                .with(REPORTS_FIELD, counts_to_field(counts.reports))
        })
        .collect()
}

/// Counters previously attached by [`enrich`]
#[must_use]
pub fn totals_of(record: &Record) -> Option<UserTotals> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let read = |field: &str| record.number(field).map(|n| n as usize);
    Some(UserTotals {
        reviews: read(REVIEWS_FIELD)?,
        reports: read(REPORTS_FIELD)?,
    })
}

#[allow(clippy::cast_precision_loss)]
fn counts_to_field(count: usize) -> f64 {
    count as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feedback(user: Option<i64>, rating: i64, category: &str) -> Record {
        let record = Record::new().with("rating", rating).with("category", category);
        match user {
            Some(id) => record.with(USER_FIELD, id),
            None => record,
        }
    }

    #[test]
    fn test_report_rule() {
        assert!(is_report(&feedback(Some(1), 2, "Billing")));
        assert!(is_report(&feedback(Some(1), 5, "Technical Issue")));
        assert!(!is_report(&feedback(Some(1), 3, "Billing")));
        assert!(!is_report(&Record::new().with("category", "Billing")));
    }

    #[test]
    fn test_enrich_counts_per_user() {
        let records = vec![
            feedback(Some(1), 5, "Praise"),
            feedback(Some(2), 1, "Billing"),
            feedback(Some(1), 2, "Billing"),
            feedback(Some(1), 4, "Technical Issue"),
        ];

        let enriched = enrich(&records);

        assert_eq!(enriched.len(), records.len());
        assert_eq!(totals_of(&enriched[0]), Some(UserTotals { reviews: 3, reports: 2 }));
        assert_eq!(totals_of(&enriched[1]), Some(UserTotals { reviews: 1, reports: 1 }));
        assert_eq!(enriched[2].number("rating"), Some(2.0));
    }

    #[test]
    fn test_string_and_numeric_user_ids_group_together() {
        let records = vec![
            feedback(Some(7), 5, "Praise"),
            Record::new().with(USER_FIELD, "7").with("rating", 4),
        ];
        let totals = totals_by_user(&records);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&Some(RecordId::from("7"))].reviews, 2);
    }

    #[test]
    fn test_missing_user_ids_share_a_group() {
        let records = vec![feedback(None, 1, "Billing"), feedback(None, 5, "Praise")];
        let enriched = enrich(&records);
        assert_eq!(totals_of(&enriched[1]), Some(UserTotals { reviews: 2, reports: 1 }));
    }

    #[test]
    fn test_canonical_records_untouched() {
        let records = vec![feedback(Some(1), 5, "Praise")];
        let _ = enrich(&records);
        assert!(!records[0].contains(REVIEWS_FIELD));
        assert_eq!(totals_of(&records[0]), None);
    }
}
