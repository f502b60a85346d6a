//! The app user and their ordered favorites.

use serde::{Deserialize, Serialize};

use crate::{
    ConversionError, FieldValue, RecordId, RecordReference, RecordType, RemoteRecord, UserId,
};

/// Field of the user record holding the favorite references.
pub const FAVORITES_FIELD: &str = "saved_pets";

/// Ordered references to favorited pet records, most recent first.
///
/// Never holds two references to the same record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteList(Vec<RecordReference>);

impl FavoriteList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from references, keeping the first occurrence of each id.
    pub fn from_references(references: Vec<RecordReference>) -> Self {
        let mut list = Self::new();
        for reference in references {
            if !list.contains(&reference.record_id) {
                list.0.push(reference);
            }
        }
        list
    }

    /// Insert at the front. An existing reference to the same record moves to
    /// the front instead of being duplicated.
    ///
    /// Returns `true` if the reference was not already present.
    pub fn insert_front(&mut self, reference: RecordReference) -> bool {
        let existed = self.remove(&reference.record_id);
        self.0.insert(0, reference);
        !existed
    }

    /// Remove the reference to a record. Returns `true` if it was present.
    pub fn remove(&mut self, record_id: &RecordId) -> bool {
        let before = self.0.len();
        self.0.retain(|r| &r.record_id != record_id);
        self.0.len() != before
    }

    /// Whether the list references the record.
    pub fn contains(&self, record_id: &RecordId) -> bool {
        self.0.iter().any(|r| &r.record_id == record_id)
    }

    /// Iterate references in order.
    pub fn iter(&self) -> impl Iterator<Item = &RecordReference> {
        self.0.iter()
    }

    /// Number of favorites.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no favorites.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The references as a slice.
    pub fn as_slice(&self) -> &[RecordReference] {
        &self.0
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Id of the user's remote record. Required before the favorites can be
    /// written remotely.
    #[serde(default)]
    pub remote_id: Option<RecordId>,
    /// Favorited pets, most recent first.
    #[serde(default)]
    pub favorites: FavoriteList,
}

impl User {
    /// Create a new local user with no remote record yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            remote_id: None,
            favorites: FavoriteList::new(),
        }
    }

    /// Record form of a user that has not been saved remotely yet.
    ///
    /// Used once, to create the user record.
    pub fn to_new_record(&self) -> RemoteRecord {
        let mut record = RemoteRecord::new(RecordType::User);
        record.set("user_id", self.id.to_string());
        record.set("name", self.name.as_str());
        record.set(
            FAVORITES_FIELD,
            FieldValue::ReferenceList(self.favorites.as_slice().to_vec()),
        );
        record
    }

    /// Record form used to update the existing user record.
    ///
    /// The whole favorites field is written; the store keeps the last write.
    pub fn to_record(&self) -> Result<RemoteRecord, ConversionError> {
        let remote_id = self
            .remote_id
            .clone()
            .ok_or(ConversionError::MissingField {
                record_type: RecordType::User,
                field: "record_id",
            })?;
        Ok(self.to_new_record().with_id(remote_id))
    }

    /// Build a user from its remote record.
    pub fn from_record(record: &RemoteRecord) -> Result<Self, ConversionError> {
        if record.record_type != RecordType::User {
            return Err(ConversionError::TypeMismatch {
                expected: RecordType::User,
                actual: record.record_type,
            });
        }
        let id = record
            .text("user_id")
            .and_then(UserId::parse)
            .ok_or(ConversionError::InvalidField {
                record_type: RecordType::User,
                field: "user_id",
            })?;
        Ok(Self {
            id,
            name: record.text("name").unwrap_or_default().to_string(),
            remote_id: record.record_id.clone(),
            favorites: FavoriteList::from_references(record.references(FAVORITES_FIELD)),
        })
    }
}
