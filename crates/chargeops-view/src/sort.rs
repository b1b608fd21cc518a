//! Stable, typed sorting of filtered records

use chargeops_core::{FieldValue, Record, utils::parse_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How a field's values compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Case-insensitive text
    Text,
    /// Numeric, with numeric strings coerced
    Number,
    /// Timestamp parsed to an instant
    Date,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first; missing values lead
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Largest first; missing values trail
    #[serde(rename = "desc")]
    Descending,
}

impl Direction {
    /// The opposite direction
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Sort key and direction of a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field sorted on
    pub field: String,
    /// Direction
    pub direction: Direction,
}

impl SortSpec {
    /// Ascending sort on `field`
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Descending sort on `field`
    #[must_use]
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Column-header click: same field flips, a new field starts ascending
    pub fn toggle(&mut self, field: &str) {
        if self.field == field {
            self.direction = self.direction.reversed();
        } else {
            self.field = field.to_string();
            self.direction = Direction::Ascending;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Missing,
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
        }
    }

    fn extract(value: Option<&FieldValue>, kind: Option<FieldKind>) -> Self {
        let Some(value) = value else {
            return Self::Missing;
        };
        if matches!(value, FieldValue::Null | FieldValue::Opaque(_)) {
            return Self::Missing;
        }

        match kind {
            Some(FieldKind::Number) => value.as_f64().map_or(Self::Missing, Self::Number),
            Some(FieldKind::Date) => value
                .as_str()
                .and_then(parse_instant)
                .map_or(Self::Missing, Self::Date),
            Some(FieldKind::Text) => Self::Text(value.to_string().to_lowercase()),
            None => match value {
                FieldValue::Number(n) => Self::Number(*n),
                FieldValue::Bool(b) => Self::Number(if *b { 1.0 } else { 0.0 }),
                other => Self::Text(other.to_string().to_lowercase()),
            },
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Sort rows in place by `spec`
///
/// `kind` is the declared kind of the sort field; `None` infers per value.
/// The sort is stable in both directions.
pub fn sort_records(rows: &mut Vec<&Record>, spec: &SortSpec, kind: Option<FieldKind>) {
    let mut keyed: Vec<(SortKey, &Record)> = rows
        .drain(..)
        .map(|r| (SortKey::extract(r.get(&spec.field), kind), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.compare(b);
        match spec.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });

    rows.extend(keyed.into_iter().map(|(_, r)| r));
}
