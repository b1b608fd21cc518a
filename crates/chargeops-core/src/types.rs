//! Core data types for the `ChargeOps` console

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Name of the designated identifier field on every record
pub const ID_FIELD: &str = "id";

/// A single field value inside a [`Record`]
///
/// Scalars take part in search, filtering and sorting. Nested JSON is kept
/// as [`FieldValue::Opaque`] so it survives an update round-trip untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// JSON `null` or an absent value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Nested array or object
    Opaque(serde_json::Value),
}

impl FieldValue {
    /// Infer a value from user-entered text
    ///
    /// `true`/`false` become booleans, `null` becomes [`FieldValue::Null`],
    /// anything that parses as a finite number becomes a number, and the rest
    /// stays text.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            "null" => Self::Null,
            _ => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or_else(|| Self::Text(raw.to_string()), Self::Number),
        }
    }

    /// Whether the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as text, if it is text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value; numeric strings are coerced
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Boolean view of the value; `"true"`/`"false"` strings are coerced
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Self::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Identifier view of the value
    ///
    /// Integral numbers render without a fractional part so that `7` and
    /// `"7"` name the same record.
    #[must_use]
    pub fn as_id(&self) -> Option<RecordId> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(RecordId(s.clone())),
            Self::Number(n) => Some(RecordId(format_number(*n))),
            _ => None,
        }
    }

    /// Convert to a JSON value
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Opaque(v) => v.clone(),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    // Integral values go out as integers; the backends bind them to int64.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn format_number(n: f64) -> String {
    match number_to_json(n) {
        serde_json::Value::Number(num) => num.to_string(),
        _ => n.to_string(),
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Opaque(other)
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
            Self::Opaque(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// Server-assigned record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Borrow the identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// One entity instance as returned by a backend service
///
/// Fields keep the order the server sent them in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object; anything else yields `None`
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(Self {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            }),
            _ => None,
        }
    }

    /// Convert to a JSON object
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Builder-style setter
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Remove a field, keeping the order of the others
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    /// Look up a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether the field is present (even if null)
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Text of a field; missing, null and non-text values read as `""`
    #[must_use]
    pub fn text(&self, field: &str) -> &str {
        self.get(field).and_then(FieldValue::as_str).unwrap_or("")
    }

    /// Numeric value of a field
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Boolean value of a field
    #[must_use]
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_bool)
    }

    /// The record's identifier, if the server assigned one
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.get(ID_FIELD).and_then(FieldValue::as_id)
    }

    /// Iterate over fields in order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The entity kinds the console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Operator and end-user accounts
    User,
    /// Charging points
    Charger,
    /// User feedback on chargers
    Feedback,
    /// Charging and maintenance transactions
    Transaction,
}

impl EntityKind {
    /// All entity kinds
    pub const ALL: [Self; 4] = [Self::User, Self::Charger, Self::Feedback, Self::Transaction];

    /// Collection path on the owning service
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::User => "/api/users",
            Self::Charger => "/api/cps",
            Self::Feedback => "/api/feedbacks",
            Self::Transaction => "/api/transactions",
        }
    }

    /// Key used when the service wraps the list in an object
    #[must_use]
    pub const fn wrapper_key(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Charger => "cps",
            Self::Feedback => "feedbacks",
            Self::Transaction => "transactions",
        }
    }

    /// Human-readable plural label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Charger => "chargers",
            Self::Feedback => "feedback",
            Self::Transaction => "transactions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Self::User),
            "charger" | "chargers" | "cp" | "cps" => Ok(Self::Charger),
            "feedback" | "feedbacks" => Ok(Self::Feedback),
            "transaction" | "transactions" => Ok(Self::Transaction),
            other => Err(crate::Error::validation(
                "entity",
                format!("unknown entity kind '{other}'"),
            )),
        }
    }
}

/// Account role carried by users and token claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrator
    Admin,
    /// Network operator
    Operator,
    /// End user of the charging network
    User,
}

impl Role {
    /// Parse a role string case-insensitively; unknown roles yield `None`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "operator" => Some(Self::Operator),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// Whether the role may sign in to the operator console
    #[must_use]
    pub const fn can_access_console(self) -> bool {
        matches!(self, Self::Admin | Self::Operator)
    }

    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote command that can be sent to a charger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargerCommand {
    /// Start a charging transaction
    Start,
    /// Stop the active transaction
    Stop,
}

impl fmt::Display for ChargerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

impl FromStr for ChargerCommand {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(crate::Error::validation(
                "command",
                format!("unknown charger command '{other}'"),
            )),
        }
    }
}

/// Envelope posted to the command endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Target charger
    #[serde(rename = "chargerId")]
    pub charger_id: RecordId,
    /// Command to run
    pub command: ChargerCommand,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_record_from_json_keeps_order_and_types() {
        let record = Record::from_json(json!({
            "id": 7,
            "name": "Tesla Supercharger A",
            "enabled": true,
            "ratings": 4.5,
            "feedback": null,
            "tags": ["fast", "ccs"]
        }))
        .unwrap();

        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "name", "enabled", "ratings", "feedback", "tags"]);
        assert_eq!(record.id(), Some(RecordId::from("7")));
        assert_eq!(record.text("name"), "Tesla Supercharger A");
        assert_eq!(record.boolean("enabled"), Some(true));
        assert_eq!(record.number("ratings"), Some(4.5));
        assert!(record.get("feedback").unwrap().is_null());
        assert!(matches!(record.get("tags"), Some(FieldValue::Opaque(_))));
    }

    #[test]
    fn test_record_from_non_object_is_none() {
        assert!(Record::from_json(json!([1, 2])).is_none());
        assert!(Record::from_json(json!("user")).is_none());
    }

    #[test]
    fn test_missing_text_reads_as_empty() {
        let record = Record::new().with("rating", 3);
        assert_eq!(record.text("comment"), "");
        assert_eq!(record.text("rating"), "");
    }

    #[test]
    fn test_integral_numbers_serialize_as_integers() {
        let record = Record::new().with("id", 12).with("power", 22.5);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":12,"power":22.5}"#);
    }

    #[test]
    fn test_record_json_roundtrip_preserves_nested() {
        let original = json!({"id": "u-1", "transactions": [{"id": 1, "amount": 2.5}]});
        let record: Record = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(record.to_json(), original);
    }

    #[rstest]
    #[case("true", FieldValue::Bool(true))]
    #[case("false", FieldValue::Bool(false))]
    #[case("null", FieldValue::Null)]
    #[case("42", FieldValue::Number(42.0))]
    #[case("3.5", FieldValue::Number(3.5))]
    #[case("Available", FieldValue::Text("Available".to_string()))]
    #[case("NaN", FieldValue::Text("NaN".to_string()))]
    fn test_field_value_infer(#[case] raw: &str, #[case] expected: FieldValue) {
        assert_eq!(FieldValue::infer(raw), expected);
    }

    #[test]
    fn test_numeric_text_coerces() {
        assert_eq!(FieldValue::from("18.75").as_f64(), Some(18.75));
        assert_eq!(FieldValue::from("n/a").as_f64(), None);
        assert_eq!(FieldValue::from("TRUE").as_bool(), Some(true));
    }

    #[test]
    fn test_entity_kind_paths() {
        assert_eq!(EntityKind::User.path(), "/api/users");
        assert_eq!(EntityKind::Charger.path(), "/api/cps");
        assert_eq!(EntityKind::Charger.wrapper_key(), "cps");
        assert_eq!(EntityKind::Feedback.wrapper_key(), "feedbacks");
        assert_eq!("cps".parse::<EntityKind>().unwrap(), EntityKind::Charger);
        assert!("stations".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_role_gating() {
        assert!(Role::parse("Admin").unwrap().can_access_console());
        assert!(Role::parse("operator").unwrap().can_access_console());
        assert!(!Role::User.can_access_console());
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_command_envelope_wire_format() {
        let envelope = CommandEnvelope {
            charger_id: RecordId::from("CP-ALPHA-01"),
            command: ChargerCommand::Stop,
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"chargerId": "CP-ALPHA-01", "command": "stop"})
        );
        assert_eq!("START".parse::<ChargerCommand>().unwrap(), ChargerCommand::Start);
    }
}
