//! Syncable domain entities: Pets and Shelters.
//!
//! Each entity owns a stable [`EntityId`] and, once it has been saved to the
//! remote store at least once, the [`RecordId`] the store assigned. The
//! `synced` flag is never stored; it is derived from the presence of that
//! remote id so the two cannot disagree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::ID_FIELD;
use crate::{ConversionError, EntityId, FieldValue, RecordId, RecordType, RemoteRecord};

/// Something that can be mirrored to the remote record store.
pub trait Syncable {
    /// Stable local identifier.
    fn entity_id(&self) -> &EntityId;

    /// Remote identifier, once assigned.
    fn remote_id(&self) -> Option<&RecordId>;

    /// Record the identifier the store assigned.
    fn set_remote_id(&mut self, record_id: RecordId);

    /// Convert to the store-side representation.
    fn to_record(&self) -> Result<RemoteRecord, ConversionError>;

    /// True iff a remote identifier has been assigned.
    fn is_synced(&self) -> bool {
        self.remote_id().is_some()
    }
}

/// Kinds of entity that take part in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Adoptable animals.
    Pet,
    /// Shelters.
    Shelter,
}

impl EntityKind {
    /// Every entity kind.
    pub const ALL: [EntityKind; 2] = [EntityKind::Pet, EntityKind::Shelter];

    /// Remote record type used for this kind.
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Pet => RecordType::Pet,
            Self::Shelter => RecordType::Shelter,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pet => f.write_str("pet"),
            Self::Shelter => f.write_str("shelter"),
        }
    }
}

/// An adoptable animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Listing id.
    pub id: EntityId,
    /// Remote record id once synced.
    #[serde(default)]
    pub remote_id: Option<RecordId>,
    /// Display name.
    pub name: String,
    /// Species ("Dog", "Cat", ...).
    #[serde(default)]
    pub animal: Option<String>,
    /// Breed names, primary first.
    #[serde(default)]
    pub breeds: Vec<String>,
    /// Age bracket.
    #[serde(default)]
    pub age: Option<String>,
    /// Sex.
    #[serde(default)]
    pub sex: Option<String>,
    /// Size bracket.
    #[serde(default)]
    pub size: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Listing id of the shelter housing the pet.
    #[serde(default)]
    pub shelter_id: Option<String>,
    /// Adoption status.
    #[serde(default)]
    pub status: Option<String>,
    /// Photo URLs.
    #[serde(default)]
    pub photo_urls: Vec<String>,
    /// Last listing update, as reported by the listing service.
    #[serde(default)]
    pub last_update: Option<String>,
}

impl Pet {
    /// Create an unsynced pet with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            remote_id: None,
            name: name.into(),
            animal: None,
            breeds: Vec::new(),
            age: None,
            sex: None,
            size: None,
            description: None,
            shelter_id: None,
            status: None,
            photo_urls: Vec::new(),
            last_update: None,
        }
    }

    /// Build a pet from a pulled record. The record's id becomes the remote id.
    pub fn from_record(record: &RemoteRecord) -> Result<Self, ConversionError> {
        expect_type(record, RecordType::Pet)?;
        Ok(Self {
            id: EntityId::new(required_text(record, ID_FIELD)?),
            remote_id: record.record_id.clone(),
            name: required_text(record, "name")?.to_string(),
            animal: optional_text(record, "animal"),
            breeds: record.text_list("breeds"),
            age: optional_text(record, "age"),
            sex: optional_text(record, "sex"),
            size: optional_text(record, "size"),
            description: optional_text(record, "description"),
            shelter_id: optional_text(record, "shelter_id"),
            status: optional_text(record, "status"),
            photo_urls: record.text_list("photo_urls"),
            last_update: optional_text(record, "last_update"),
        })
    }
}

impl Syncable for Pet {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }

    fn remote_id(&self) -> Option<&RecordId> {
        self.remote_id.as_ref()
    }

    fn set_remote_id(&mut self, record_id: RecordId) {
        self.remote_id = Some(record_id);
    }

    fn to_record(&self) -> Result<RemoteRecord, ConversionError> {
        let mut record = new_record(RecordType::Pet, &self.id, &self.name, &self.remote_id)?;
        record.set_opt("animal", self.animal.as_ref());
        if !self.breeds.is_empty() {
            record.set("breeds", FieldValue::TextList(self.breeds.clone()));
        }
        record.set_opt("age", self.age.as_ref());
        record.set_opt("sex", self.sex.as_ref());
        record.set_opt("size", self.size.as_ref());
        record.set_opt("description", self.description.as_ref());
        record.set_opt("shelter_id", self.shelter_id.as_ref());
        record.set_opt("status", self.status.as_ref());
        if !self.photo_urls.is_empty() {
            record.set("photo_urls", FieldValue::TextList(self.photo_urls.clone()));
        }
        record.set_opt("last_update", self.last_update.as_ref());
        Ok(record)
    }
}

/// An animal shelter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    /// Listing id.
    pub id: EntityId,
    /// Remote record id once synced.
    #[serde(default)]
    pub remote_id: Option<RecordId>,
    /// Shelter name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State or region.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub zip: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Latitude in degrees.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Shelter {
    /// Create an unsynced shelter with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            remote_id: None,
            name: name.into(),
            address: None,
            city: None,
            state: None,
            zip: None,
            phone: None,
            email: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Build a shelter from a pulled record.
    pub fn from_record(record: &RemoteRecord) -> Result<Self, ConversionError> {
        expect_type(record, RecordType::Shelter)?;
        Ok(Self {
            id: EntityId::new(required_text(record, ID_FIELD)?),
            remote_id: record.record_id.clone(),
            name: required_text(record, "name")?.to_string(),
            address: optional_text(record, "address"),
            city: optional_text(record, "city"),
            state: optional_text(record, "state"),
            zip: optional_text(record, "zip"),
            phone: optional_text(record, "phone"),
            email: optional_text(record, "email"),
            latitude: record.double("latitude"),
            longitude: record.double("longitude"),
        })
    }
}

impl Syncable for Shelter {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }

    fn remote_id(&self) -> Option<&RecordId> {
        self.remote_id.as_ref()
    }

    fn set_remote_id(&mut self, record_id: RecordId) {
        self.remote_id = Some(record_id);
    }

    fn to_record(&self) -> Result<RemoteRecord, ConversionError> {
        let mut record = new_record(RecordType::Shelter, &self.id, &self.name, &self.remote_id)?;
        record.set_opt("address", self.address.as_ref());
        record.set_opt("city", self.city.as_ref());
        record.set_opt("state", self.state.as_ref());
        record.set_opt("zip", self.zip.as_ref());
        record.set_opt("phone", self.phone.as_ref());
        record.set_opt("email", self.email.as_ref());
        if let Some(lat) = self.latitude {
            record.set("latitude", lat);
        }
        if let Some(lon) = self.longitude {
            record.set("longitude", lon);
        }
        Ok(record)
    }
}

/// Either kind of syncable entity, as held by the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    /// A pet.
    Pet(Pet),
    /// A shelter.
    Shelter(Shelter),
}

impl Entity {
    /// Which kind of entity this is.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Pet(_) => EntityKind::Pet,
            Self::Shelter(_) => EntityKind::Shelter,
        }
    }

    /// Materialize an entity of the given kind from a remote record.
    pub fn from_record(kind: EntityKind, record: &RemoteRecord) -> Result<Self, ConversionError> {
        match kind {
            EntityKind::Pet => Pet::from_record(record).map(Self::Pet),
            EntityKind::Shelter => Shelter::from_record(record).map(Self::Shelter),
        }
    }

    /// Borrow as a pet, if it is one.
    pub fn as_pet(&self) -> Option<&Pet> {
        match self {
            Self::Pet(p) => Some(p),
            Self::Shelter(_) => None,
        }
    }

    /// Display name of the entity.
    pub fn name(&self) -> &str {
        match self {
            Self::Pet(p) => &p.name,
            Self::Shelter(s) => &s.name,
        }
    }
}

impl From<Pet> for Entity {
    fn from(pet: Pet) -> Self {
        Self::Pet(pet)
    }
}

impl From<Shelter> for Entity {
    fn from(shelter: Shelter) -> Self {
        Self::Shelter(shelter)
    }
}

impl Syncable for Entity {
    fn entity_id(&self) -> &EntityId {
        match self {
            Self::Pet(p) => p.entity_id(),
            Self::Shelter(s) => s.entity_id(),
        }
    }

    fn remote_id(&self) -> Option<&RecordId> {
        match self {
            Self::Pet(p) => p.remote_id(),
            Self::Shelter(s) => s.remote_id(),
        }
    }

    fn set_remote_id(&mut self, record_id: RecordId) {
        match self {
            Self::Pet(p) => p.set_remote_id(record_id),
            Self::Shelter(s) => s.set_remote_id(record_id),
        }
    }

    fn to_record(&self) -> Result<RemoteRecord, ConversionError> {
        match self {
            Self::Pet(p) => p.to_record(),
            Self::Shelter(s) => s.to_record(),
        }
    }
}

fn new_record(
    record_type: RecordType,
    id: &EntityId,
    name: &str,
    remote_id: &Option<RecordId>,
) -> Result<RemoteRecord, ConversionError> {
    if id.is_empty() {
        return Err(ConversionError::MissingField {
            record_type,
            field: ID_FIELD,
        });
    }
    if name.trim().is_empty() {
        return Err(ConversionError::MissingField {
            record_type,
            field: "name",
        });
    }
    let mut record = RemoteRecord::new(record_type);
    record.record_id = remote_id.clone();
    record.set(ID_FIELD, id.as_str());
    record.set("name", name);
    Ok(record)
}

fn expect_type(record: &RemoteRecord, expected: RecordType) -> Result<(), ConversionError> {
    if record.record_type != expected {
        return Err(ConversionError::TypeMismatch {
            expected,
            actual: record.record_type,
        });
    }
    Ok(())
}

fn required_text<'a>(
    record: &'a RemoteRecord,
    field: &'static str,
) -> Result<&'a str, ConversionError> {
    match record.get(field) {
        Some(FieldValue::Text(s)) if !s.trim().is_empty() => Ok(s),
        Some(FieldValue::Text(_)) | None => Err(ConversionError::MissingField {
            record_type: record.record_type,
            field,
        }),
        Some(_) => Err(ConversionError::InvalidField {
            record_type: record.record_type,
            field,
        }),
    }
}

fn optional_text(record: &RemoteRecord, field: &str) -> Option<String> {
    record.text(field).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rex() -> Pet {
        let mut pet = Pet::new("p1", "Rex");
        pet.animal = Some("Dog".into());
        pet.breeds = vec!["Labrador".into(), "Beagle".into()];
        pet.shelter_id = Some("s1".into());
        pet
    }

    // ===========================================
    // Synced Flag Tests
    // ===========================================

    #[test]
    fn synced_follows_remote_id() {
        let mut pet = rex();
        assert!(!pet.is_synced());

        pet.set_remote_id(RecordId::new("rec-001"));
        assert!(pet.is_synced());
        assert_eq!(pet.remote_id(), Some(&RecordId::new("rec-001")));
    }

    // ===========================================
    // Conversion Tests
    // ===========================================

    #[test]
    fn pet_record_carries_fields() {
        let record = rex().to_record().unwrap();
        assert_eq!(record.record_type, RecordType::Pet);
        assert!(record.record_id.is_none());
        assert_eq!(record.entity_id(), Some("p1"));
        assert_eq!(record.text("name"), Some("Rex"));
        assert_eq!(record.text("animal"), Some("Dog"));
        assert_eq!(record.text_list("breeds").len(), 2);
        assert!(record.get("age").is_none());
    }

    #[test]
    fn pet_without_name_fails_conversion() {
        let pet = Pet::new("p1", "  ");
        assert_eq!(
            pet.to_record(),
            Err(ConversionError::MissingField {
                record_type: RecordType::Pet,
                field: "name"
            })
        );
    }

    #[test]
    fn pet_without_id_fails_conversion() {
        let pet = Pet::new("", "Rex");
        assert!(matches!(
            pet.to_record(),
            Err(ConversionError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn pulled_pet_is_synced_with_same_fields() {
        let original = rex();
        let record = original
            .to_record()
            .unwrap()
            .with_id(RecordId::new("rec-042"));

        let pulled = Pet::from_record(&record).unwrap();
        assert!(pulled.is_synced());
        assert_eq!(pulled.remote_id, Some(RecordId::new("rec-042")));
        assert_eq!(Pet { remote_id: None, ..pulled }, original);
    }

    #[test]
    fn shelter_coordinates_survive_conversion() {
        let mut shelter = Shelter::new("s1", "Happy Tails");
        shelter.city = Some("Provo".into());
        shelter.latitude = Some(40.23);
        shelter.longitude = Some(-111.66);

        let record = shelter.to_record().unwrap().with_id(RecordId::new("rec-7"));
        let back = Shelter::from_record(&record).unwrap();
        assert_eq!(back.latitude, Some(40.23));
        assert_eq!(back.longitude, Some(-111.66));
        assert_eq!(back.city.as_deref(), Some("Provo"));
    }

    #[test]
    fn from_record_rejects_wrong_type() {
        let record = Shelter::new("s1", "Happy Tails").to_record().unwrap();
        assert_eq!(
            Pet::from_record(&record),
            Err(ConversionError::TypeMismatch {
                expected: RecordType::Pet,
                actual: RecordType::Shelter
            })
        );
    }

    #[test]
    fn from_record_rejects_non_text_id() {
        let mut record = RemoteRecord::new(RecordType::Pet);
        record.set("id", 7i64);
        record.set("name", "Rex");
        assert!(matches!(
            Pet::from_record(&record),
            Err(ConversionError::InvalidField { field: "id", .. })
        ));
    }

    // ===========================================
    // Entity Enum Tests
    // ===========================================

    #[test]
    fn entity_delegates_to_inner() {
        let mut entity = Entity::from(rex());
        assert_eq!(entity.kind(), EntityKind::Pet);
        assert_eq!(entity.entity_id().as_str(), "p1");
        assert_eq!(entity.name(), "Rex");

        entity.set_remote_id(RecordId::new("rec-5"));
        assert!(entity.as_pet().unwrap().is_synced());
    }

    #[test]
    fn entity_from_record_by_kind() {
        let record = Shelter::new("s1", "Happy Tails").to_record().unwrap();
        let entity = Entity::from_record(EntityKind::Shelter, &record).unwrap();
        assert_eq!(entity.kind(), EntityKind::Shelter);
        assert!(Entity::from_record(EntityKind::Pet, &record).is_err());
    }

    #[test]
    fn entity_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntityKind::Shelter).unwrap(), "\"shelter\"");
        assert_eq!(EntityKind::Pet.record_type(), RecordType::Pet);
    }
}
