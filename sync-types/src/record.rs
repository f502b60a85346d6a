//! Store-side record representation.
//!
//! A [`RemoteRecord`] is what the remote record store persists: a typed bag
//! of fields plus the identifier the store assigned on first save. Entities
//! convert to and from records (see [`crate::entity`]); the store never sees
//! entity types directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::RecordId;

/// Field holding the entity's stable identifier in every entity record.
pub const ID_FIELD: &str = "id";

/// Kind of record stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// An adoptable animal.
    Pet,
    /// An animal shelter.
    Shelter,
    /// An app user and their favorites.
    User,
}

impl RecordType {
    /// Name of the record type as known to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pet => "Pet",
            Self::Shelter => "Shelter",
            Self::User => "User",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link to another remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordReference {
    /// The referenced record.
    pub record_id: RecordId,
}

impl RecordReference {
    /// Reference the record with the given id.
    pub fn new(record_id: RecordId) -> Self {
        Self { record_id }
    }
}

/// A single field value in a remote record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FieldValue {
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Double(f64),
    /// List of text values.
    TextList(Vec<String>),
    /// Reference to one record.
    Reference(RecordReference),
    /// Ordered references to many records.
    ReferenceList(Vec<RecordReference>),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

/// A record as persisted by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Kind of record.
    pub record_type: RecordType,
    /// Store-assigned id; `None` until the record has been saved once.
    pub record_id: Option<RecordId>,
    /// Field values keyed by field name.
    pub fields: BTreeMap<String, FieldValue>,
}

impl RemoteRecord {
    /// Create an empty, never-saved record of the given type.
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            record_id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the record id (builder style).
    pub fn with_id(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Set a field value, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<FieldValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Set a text field only when a value is present.
    pub fn set_opt(&mut self, key: &str, value: Option<&String>) {
        if let Some(v) = value {
            self.set(key, v.as_str());
        }
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get a text field.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Get a floating point field (integers are widened).
    pub fn double(&self, key: &str) -> Option<f64> {
        match self.fields.get(key) {
            Some(FieldValue::Double(n)) => Some(*n),
            Some(FieldValue::Integer(n)) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get a text list field. Missing fields read as empty.
    pub fn text_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(FieldValue::TextList(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Get a reference list field. Missing fields read as empty.
    pub fn references(&self, key: &str) -> Vec<RecordReference> {
        match self.fields.get(key) {
            Some(FieldValue::ReferenceList(refs)) => refs.clone(),
            _ => Vec::new(),
        }
    }

    /// The entity's stable identifier, if the record carries one.
    pub fn entity_id(&self) -> Option<&str> {
        self.text(ID_FIELD)
    }
}
