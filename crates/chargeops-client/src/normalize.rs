//! Response-shape normalization
//!
//! Services answer a list request with either a bare array or an object
//! wrapping one. Every accepted shape decodes to the same `Vec<Record>`;
//! anything else is an empty collection, never an error.

use chargeops_core::{EntityKind, Record};
use serde_json::Value;
use tracing::debug;

/// Shape of a list response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Top-level array
    Bare(Vec<Value>),
    /// Object with an array under `key`
    Wrapped {
        /// Key holding the array
        key: String,
        /// Array elements
        items: Vec<Value>,
    },
    /// Neither of the above
    Unrecognized,
}

impl ResponseShape {
    /// Classify a response body for an entity kind
    ///
    /// An object is accepted when it holds an array under the entity's
    /// wrapper key, or when it has exactly one key and that key holds an
    /// array.
    #[must_use]
    pub fn classify(body: Value, kind: EntityKind) -> Self {
        match body {
            Value::Array(items) => Self::Bare(items),
            Value::Object(mut map) => {
                let wrapper = kind.wrapper_key();
                if matches!(map.get(wrapper), Some(Value::Array(_)))
                    && let Some(Value::Array(items)) = map.remove(wrapper)
                {
                    return Self::Wrapped {
                        key: wrapper.to_string(),
                        items,
                    };
                }
                if map.len() == 1
                    && let Some((key, Value::Array(items))) = map.into_iter().next()
                {
                    return Self::Wrapped { key, items };
                }
                Self::Unrecognized
            }
            _ => Self::Unrecognized,
        }
    }

    /// Records in the body, dropping non-object elements
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        let items = match self {
            Self::Bare(items) | Self::Wrapped { items, .. } => items,
            Self::Unrecognized => return Vec::new(),
        };

        let total = items.len();
        let records: Vec<Record> = items.into_iter().filter_map(Record::from_json).collect();
        if records.len() < total {
            debug!(
                dropped = total - records.len(),
                "Dropped non-object elements from list response"
            );
        }
        records
    }
}

/// Normalize a list body into records
#[must_use]
pub fn normalize(body: Value, kind: EntityKind) -> Vec<Record> {
    let shape = ResponseShape::classify(body, kind);
    if shape == ResponseShape::Unrecognized {
        debug!(%kind, "Unrecognized list response shape, treating as empty");
    }
    shape.into_records()
}
