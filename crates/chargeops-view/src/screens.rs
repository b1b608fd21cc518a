//! Per-screen configuration of the list pipeline

use crate::filter::{Constraint, FilterSpec, MatchKind};
use crate::sort::{Direction, FieldKind, SortSpec};
use chargeops_core::{EntityKind, FieldValue};

/// A categorical filter offered by a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDef {
    /// Field filtered on
    pub field: &'static str,
    /// Comparison used
    pub kind: MatchKind,
    /// Value assumed for records lacking the field
    pub missing_as: Option<&'static str>,
}

/// Static description of one list screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenDef {
    /// Entity listed
    pub kind: EntityKind,
    /// Fields the search box matches
    pub search_fields: &'static [&'static str],
    /// Categorical filters
    pub filters: &'static [FilterDef],
    /// Fields with a declared sort kind
    pub sort_fields: &'static [(&'static str, FieldKind)],
    /// Sort applied when the screen opens
    pub default_sort: (&'static str, Direction),
    /// Whether per-user feedback counters are attached
    pub enrich: bool,
    /// Columns shown in tables
    pub columns: &'static [&'static str],
}

const fn filter(field: &'static str, kind: MatchKind) -> FilterDef {
    FilterDef {
        field,
        kind,
        missing_as: None,
    }
}

/// Users screen
pub static USERS: ScreenDef = ScreenDef {
    kind: EntityKind::User,
    search_fields: &["name", "email"],
    filters: &[
        FilterDef {
            field: "role",
            kind: MatchKind::Text,
            missing_as: Some("user"),
        },
        filter("status", MatchKind::Text),
    ],
    sort_fields: &[
        ("name", FieldKind::Text),
        ("email", FieldKind::Text),
        ("role", FieldKind::Text),
        ("status", FieldKind::Text),
        ("created_at", FieldKind::Date),
    ],
    default_sort: ("name", Direction::Ascending),
    enrich: false,
    columns: &["id", "name", "email", "role", "status", "car_type"],
};

/// Charging points screen
pub static CHARGERS: ScreenDef = ScreenDef {
    kind: EntityKind::Charger,
    search_fields: &["name", "address", "type"],
    filters: &[
        filter("status", MatchKind::Text),
        FilterDef {
            field: "enabled",
            kind: MatchKind::Boolean,
            missing_as: Some("false"),
        },
    ],
    sort_fields: &[
        ("name", FieldKind::Text),
        ("address", FieldKind::Text),
        ("status", FieldKind::Text),
        ("ratings", FieldKind::Number),
        ("sessions", FieldKind::Number),
    ],
    default_sort: ("name", Direction::Ascending),
    enrich: false,
    columns: &["id", "name", "address", "status", "enabled", "power", "connector", "ratings"],
};

/// Feedback screen
pub static FEEDBACK: ScreenDef = ScreenDef {
    kind: EntityKind::Feedback,
    search_fields: &["userName", "chargerName", "comment", "category"],
    filters: &[
        filter("rating", MatchKind::Number),
        filter("status", MatchKind::Text),
        filter("category", MatchKind::Text),
    ],
    sort_fields: &[
        ("dateSubmitted", FieldKind::Date),
        ("rating", FieldKind::Number),
        ("userName", FieldKind::Text),
        ("chargerName", FieldKind::Text),
        ("status", FieldKind::Text),
        ("userTotalReviews", FieldKind::Number),
        ("userTotalReports", FieldKind::Number),
    ],
    default_sort: ("dateSubmitted", Direction::Descending),
    enrich: true,
    columns: &[
        "id",
        "userName",
        "chargerName",
        "rating",
        "category",
        "status",
        "dateSubmitted",
        "userTotalReviews",
        "userTotalReports",
    ],
};

/// Transactions screen
pub static TRANSACTIONS: ScreenDef = ScreenDef {
    kind: EntityKind::Transaction,
    search_fields: &["id", "userName", "chargingPointName", "userEmail", "location"],
    filters: &[
        filter("type", MatchKind::Text),
        filter("status", MatchKind::Text),
        filter("transactionType", MatchKind::Text),
    ],
    sort_fields: &[
        ("date", FieldKind::Date),
        ("amount", FieldKind::Number),
        ("id", FieldKind::Text),
        ("status", FieldKind::Text),
    ],
    default_sort: ("date", Direction::Descending),
    enrich: false,
    columns: &["id", "type", "date", "amount", "transactionType", "status"],
};

impl ScreenDef {
    /// Screen definition for an entity kind
    #[must_use]
    pub fn for_kind(kind: EntityKind) -> &'static Self {
        match kind {
            EntityKind::User => &USERS,
            EntityKind::Charger => &CHARGERS,
            EntityKind::Feedback => &FEEDBACK,
            EntityKind::Transaction => &TRANSACTIONS,
        }
    }

    /// Declared sort kind of a field
    #[must_use]
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.sort_fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Fresh filter with every constraint unselected
    #[must_use]
    pub fn filter_spec(&self) -> FilterSpec {
        self.filters
            .iter()
            .fold(FilterSpec::new(self.search_fields.iter().copied()), |spec, def| {
                let constraint = Constraint::new(def.field, def.kind);
                let constraint = match def.missing_as {
                    Some(raw) => constraint.missing_as(FieldValue::infer(raw)),
                    None => constraint,
                };
                spec.with_constraint(constraint)
            })
    }

    /// Sort applied when the screen opens
    #[must_use]
    pub fn initial_sort(&self) -> SortSpec {
        let (field, direction) = self.default_sort;
        SortSpec {
            field: field.to_string(),
            direction,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_kind_has_a_screen() {
        for kind in EntityKind::ALL {
            assert_eq!(ScreenDef::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn test_default_sort_fields_are_declared() {
        for kind in EntityKind::ALL {
            let screen = ScreenDef::for_kind(kind);
            assert!(screen.field_kind(screen.default_sort.0).is_some());
        }
    }

    #[test]
    fn test_filter_spec_carries_missing_defaults() {
        let spec = USERS.filter_spec();
        let role = spec.constraints().iter().find(|c| c.field == "role").unwrap();
        assert_eq!(role.missing_as, Some(FieldValue::Text("user".to_string())));

        let spec = CHARGERS.filter_spec();
        let enabled = spec.constraints().iter().find(|c| c.field == "enabled").unwrap();
        assert_eq!(enabled.missing_as, Some(FieldValue::Bool(false)));
    }

    #[test]
    fn test_only_feedback_enriches() {
        assert!(FEEDBACK.enrich);
        assert!(!USERS.enrich && !CHARGERS.enrich && !TRANSACTIONS.enrich);
        assert_eq!(FEEDBACK.initial_sort(), SortSpec::descending("dateSubmitted"));
    }
}
