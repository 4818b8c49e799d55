//! User record and credential data models.
//!
//! Guards define their own field sets, so records are field-name-addressable
//! JSON maps rather than a fixed struct. The [`Fields`] trait is the
//! capability the field policy filters through, so any shape that can answer
//! "what is the value of field X" works the same way.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved credential key carrying the plaintext password.
///
/// Never used as a lookup constraint; checked locally against the record's
/// stored hash after the record is fetched.
pub const PASSWORD_FIELD: &str = "password";

/// Record field holding the stored password hash.
pub const PASSWORD_HASH_FIELD: &str = "password_hash";

/// Field-name to value mapping shared by records, credentials, and payloads
pub type FieldMap = Map<String, Value>;

/// Read access to named fields, independent of the concrete record shape
pub trait Fields {
    /// Value of `name`, or `None` when the field is absent
    fn field(&self, name: &str) -> Option<&Value>;
}

impl Fields for FieldMap {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Fields for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(name))
    }
}

/// A user record fetched from a guard's record source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    fields: FieldMap,
}

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Value of `name`, or `None` when absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of `name`, or `None` when absent or not a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

impl Fields for UserRecord {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<FieldMap> for UserRecord {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

/// Lookup constraints plus an optional password, as supplied to `attempt`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    fields: FieldMap,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lookup constraint (or the reserved password entry)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The plaintext password, when one was supplied
    pub fn password(&self) -> Option<&str> {
        self.fields.get(PASSWORD_FIELD).and_then(Value::as_str)
    }

    /// Every entry except the reserved password key, ANDed together at lookup
    pub fn lookup_filters(&self) -> FieldMap {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != PASSWORD_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<FieldMap> for Credentials {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

/// Whether a field value counts as present for identity purposes.
///
/// Nulls and empty strings do not identify anyone.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Canonical string form of an identity value, used as the token subject
pub(crate) fn subject_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_filters_exclude_password() {
        let credentials = Credentials::new()
            .with("id", 7)
            .with("name", "Ann")
            .with(PASSWORD_FIELD, "secret");

        let filters = credentials.lookup_filters();
        assert_eq!(filters.len(), 2);
        assert!(filters.contains_key("id"));
        assert!(filters.contains_key("name"));
        assert!(!filters.contains_key(PASSWORD_FIELD));
        assert_eq!(credentials.password(), Some("secret"));
    }

    #[test]
    fn test_record_from_value_requires_an_object() {
        assert!(UserRecord::from_value(json!({"id": 1})).is_some());
        assert!(UserRecord::from_value(json!([1, 2])).is_none());
        assert!(UserRecord::from_value(json!("id")).is_none());
    }

    #[test]
    fn test_fields_capability_reads_any_shape() {
        let record = UserRecord::new().with("id", 7);
        let value = json!({"id": 7});

        assert_eq!(record.field("id"), Some(&json!(7)));
        assert_eq!(value.field("id"), Some(&json!(7)));
        assert_eq!(record.field("missing"), None);
        assert_eq!(json!(42).field("id"), None);
    }

    #[test]
    fn test_identity_presence() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!("7")));
    }

    #[test]
    fn test_subject_strings_are_unquoted() {
        assert_eq!(subject_of(&json!("ann")), "ann");
        assert_eq!(subject_of(&json!(7)), "7");
    }
}
