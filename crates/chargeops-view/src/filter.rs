//! Free-text search and categorical constraints

use chargeops_core::{FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Selected value of a categorical filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Matches every record, including those without the field
    #[default]
    All,
    /// Matches records whose field equals the value
    Equals(String),
}

impl Selection {
    /// Parse user input; empty input or `all` selects everything
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Equals(trimmed.to_string())
        }
    }

    /// Whether this is the match-all selection
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// How a constraint compares the selected value with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Exact text equality
    Text,
    /// Numeric equality on the parsed value
    Number,
    /// Boolean equality; accepts `true/false`, `enabled/disabled`, `yes/no`
    Boolean,
}

/// One categorical filter on a field
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Field the constraint reads
    pub field: String,
    /// Comparison used
    pub kind: MatchKind,
    /// Current selection
    pub selection: Selection,
    /// Value assumed when the field is absent or null
    pub missing_as: Option<FieldValue>,
}

impl Constraint {
    /// Create an unconstrained filter on `field`
    #[must_use]
    pub fn new(field: impl Into<String>, kind: MatchKind) -> Self {
        Self {
            field: field.into(),
            kind,
            selection: Selection::All,
            missing_as: None,
        }
    }

    /// Treat absent values as `value`
    #[must_use]
    pub fn missing_as(mut self, value: impl Into<FieldValue>) -> Self {
        self.missing_as = Some(value.into());
        self
    }

    /// Whether a record passes this constraint
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Selection::Equals(wanted) = &self.selection else {
            return true;
        };

        let value = record
            .get(&self.field)
            .filter(|v| !v.is_null())
            .or(self.missing_as.as_ref());
        let Some(value) = value else {
            return false;
        };

        match self.kind {
            MatchKind::Text => match value {
                FieldValue::Text(s) => s == wanted,
                FieldValue::Null | FieldValue::Opaque(_) => false,
                other => other.to_string() == *wanted,
            },
            MatchKind::Number => {
                #[allow(clippy::float_cmp)]
                match (value.as_f64(), wanted.trim().parse::<f64>()) {
                    (Some(have), Ok(want)) => have == want,
                    _ => false,
                }
            }
            MatchKind::Boolean => match (value.as_bool(), parse_bool_choice(wanted)) {
                (Some(have), Some(want)) => have == want,
                _ => false,
            },
        }
    }
}

fn parse_bool_choice(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "enabled" | "yes" => Some(true),
        "false" | "disabled" | "no" => Some(false),
        _ => None,
    }
}

/// Search term plus categorical constraints for one screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    term: String,
    search_fields: Vec<String>,
    constraints: Vec<Constraint>,
}

impl FilterSpec {
    /// Create a filter searching the given fields
    #[must_use]
    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            term: String::new(),
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            constraints: Vec::new(),
        }
    }

    /// Add a categorical constraint
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Current search term
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Replace the search term
    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    /// Fields the search term is matched against
    #[must_use]
    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Declared constraints
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Change the selection of the constraint on `field`
    ///
    /// Returns `false` when no constraint is declared for the field.
    pub fn select(&mut self, field: &str, selection: Selection) -> bool {
        self.constraints
            .iter_mut()
            .find(|c| c.field == field)
            .map(|c| c.selection = selection)
            .is_some()
    }

    /// Clear the term and reset every constraint to [`Selection::All`]
    pub fn clear(&mut self) {
        self.term.clear();
        for constraint in &mut self.constraints {
            constraint.selection = Selection::All;
        }
    }

    /// Whether the search term matches any search field
    #[must_use]
    pub fn matches_term(&self, record: &Record) -> bool {
        if self.term.is_empty() {
            return true;
        }
        let needle = self.term.to_lowercase();
        self.search_fields.iter().any(|field| {
            let haystack = match record.get(field) {
                Some(FieldValue::Text(s)) => s.to_lowercase(),
                Some(v @ (FieldValue::Number(_) | FieldValue::Bool(_))) => v.to_string(),
                _ => String::new(),
            };
            haystack.contains(&needle)
        })
    }

    /// Whether a record passes the term and every constraint
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_term(record) && self.constraints.iter().all(|c| c.matches(record))
    }

    /// Records passing the filter, in input order
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn charger(name: &str, address: &str, status: &str, enabled: Option<bool>) -> Record {
        let record = Record::new()
            .with("name", name)
            .with("address", address)
            .with("status", status);
        match enabled {
            Some(e) => record.with("enabled", e),
            None => record,
        }
    }

    fn chargers() -> Vec<Record> {
        vec![
            charger("Tesla Supercharger A", "1 Main St", "Available", Some(true)),
            charger("Ionity Highway", "A7 Exit 12", "Charging", Some(false)),
            charger("Mall Station", "Tesla Plaza", "Available", None),
        ]
    }

    fn spec() -> FilterSpec {
        FilterSpec::new(["name", "address", "type"])
            .with_constraint(Constraint::new("status", MatchKind::Text))
            .with_constraint(Constraint::new("enabled", MatchKind::Boolean).missing_as(false))
    }

    #[test]
    fn test_empty_term_matches_all() {
        let records = chargers();
        assert_eq!(spec().apply(&records).len(), 3);
    }

    #[test]
    fn test_term_is_case_insensitive_across_fields() {
        let records = chargers();
        let mut filter = spec();
        filter.set_term("TESLA");

        let names: Vec<&str> = filter.apply(&records).iter().map(|r| r.text("name")).collect();
        assert_eq!(names, vec!["Tesla Supercharger A", "Mall Station"]);
    }

    #[test]
    fn test_missing_search_field_reads_empty() {
        let records = vec![Record::new().with("address", "Somewhere")];
        let mut filter = spec();
        filter.set_term("some");
        assert_eq!(filter.apply(&records).len(), 1);
    }

    #[test]
    fn test_text_constraint_is_exact() {
        let records = chargers();
        let mut filter = spec();
        assert!(filter.select("status", Selection::parse("Available")));
        assert_eq!(filter.apply(&records).len(), 2);

        filter.select("status", Selection::parse("available"));
        assert!(filter.apply(&records).is_empty());
    }

    #[rstest]
    #[case("enabled", 1)]
    #[case("disabled", 2)]
    #[case("yes", 1)]
    #[case("false", 2)]
    #[case("all", 3)]
    fn test_boolean_constraint(#[case] raw: &str, #[case] expected: usize) {
        let records = chargers();
        let mut filter = spec();
        filter.select("enabled", Selection::parse(raw));
        assert_eq!(filter.apply(&records).len(), expected);
    }

    #[test]
    fn test_numeric_constraint_coerces_selection() {
        let records = vec![
            Record::new().with("rating", 4),
            Record::new().with("rating", "4"),
            Record::new().with("rating", 2),
            Record::new(),
        ];
        let mut filter = FilterSpec::new(["comment"])
            .with_constraint(Constraint::new("rating", MatchKind::Number));
        filter.select("rating", Selection::parse("4"));
        assert_eq!(filter.apply(&records).len(), 2);
    }

    #[test]
    fn test_missing_as_default_role() {
        let records = vec![
            Record::new().with("name", "a").with("role", "admin"),
            Record::new().with("name", "b"),
            Record::new().with("name", "c").with("role", FieldValue::Null),
        ];
        let mut filter = FilterSpec::new(["name"])
            .with_constraint(Constraint::new("role", MatchKind::Text).missing_as("user"));
        filter.select("role", Selection::parse("user"));
        assert_eq!(filter.apply(&records).len(), 2);
    }

    #[test]
    fn test_select_unknown_field() {
        let mut filter = spec();
        assert!(!filter.select("category", Selection::parse("Billing")));
    }

    #[test]
    fn test_clear_restores_everything() {
        let records = chargers();
        let mut filter = spec();
        filter.set_term("ionity");
        filter.select("status", Selection::parse("Charging"));
        assert_eq!(filter.apply(&records).len(), 1);

        filter.clear();
        assert_eq!(filter.apply(&records).len(), 3);
        assert!(filter.constraints().iter().all(|c| c.selection.is_all()));
    }
}
