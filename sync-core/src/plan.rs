//! Push and pull planning.
//!
//! Decides what goes into a push batch and which remote records a pull
//! should ask for. Pure functions over entities and ids; no store access.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use petsync_types::{ConversionError, EntityId, Predicate, RecordId, RecordType, RemoteRecord, Syncable};

/// What to do when two local entities produce the same remote record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the first entity seen; later ones are reported as duplicates.
    #[default]
    KeepFirst,
    /// Keep the last entity seen, in the position of the first.
    KeepLast,
    /// Refuse to build the batch.
    Reject,
}

/// Errors while building a push plan. Either way, nothing is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// An entity could not be converted.
    #[error("cannot convert {entity_id}: {source}")]
    Conversion {
        /// The entity that failed.
        entity_id: EntityId,
        /// Why it failed.
        #[source]
        source: ConversionError,
    },

    /// Two entities map to the same record under [`DuplicatePolicy::Reject`].
    #[error("duplicate {record_type} record for {entity_id}")]
    Duplicate {
        /// Record type of the collision.
        record_type: RecordType,
        /// Entity id shared by the colliding entities.
        entity_id: EntityId,
    },
}

/// Identity of a record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    record_type: RecordType,
    entity_id: String,
}

impl RecordKey {
    fn of(record: &RemoteRecord, fallback: &EntityId) -> Self {
        Self {
            record_type: record.record_type,
            entity_id: record
                .entity_id()
                .unwrap_or_else(|| fallback.as_str())
                .to_string(),
        }
    }
}

/// A record queued for a push batch, with the entity it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRecord {
    /// Position of the originating entity in the input.
    pub source: usize,
    /// Originating local entity.
    pub entity_id: EntityId,
    /// Record to submit.
    pub record: RemoteRecord,
}

/// The contents of one push batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPlan {
    entries: Vec<PlannedRecord>,
    duplicates: Vec<EntityId>,
}

impl PushPlan {
    /// Convert and deduplicate entities into a batch.
    ///
    /// Conversion is all-or-nothing: the first entity that cannot be
    /// converted fails the whole plan.
    pub fn build<'a, E, I>(entities: I, policy: DuplicatePolicy) -> Result<Self, PlanError>
    where
        E: Syncable + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        let mut plan = Self::default();
        let mut positions: HashMap<RecordKey, usize> = HashMap::new();

        for (source, entity) in entities.into_iter().enumerate() {
            let entity_id = entity.entity_id().clone();
            let record = entity.to_record().map_err(|e| PlanError::Conversion {
                entity_id: entity_id.clone(),
                source: e,
            })?;
            let key = RecordKey::of(&record, &entity_id);

            match positions.get(&key) {
                None => {
                    positions.insert(key, plan.entries.len());
                    plan.entries.push(PlannedRecord {
                        source,
                        entity_id,
                        record,
                    });
                }
                Some(&index) => match policy {
                    DuplicatePolicy::KeepFirst => plan.duplicates.push(entity_id),
                    DuplicatePolicy::KeepLast => {
                        let replaced = std::mem::replace(
                            &mut plan.entries[index],
                            PlannedRecord {
                                source,
                                entity_id,
                                record,
                            },
                        );
                        plan.duplicates.push(replaced.entity_id);
                    }
                    DuplicatePolicy::Reject => {
                        return Err(PlanError::Duplicate {
                            record_type: key.record_type,
                            entity_id,
                        })
                    }
                },
            }
        }

        Ok(plan)
    }

    /// Records to submit, in submission order.
    pub fn entries(&self) -> &[PlannedRecord] {
        &self.entries
    }

    /// Entities dropped as duplicates.
    pub fn duplicates(&self) -> &[EntityId] {
        &self.duplicates
    }

    /// Whether there is nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records to submit.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Split into entries and duplicates.
    pub fn into_parts(self) -> (Vec<PlannedRecord>, Vec<EntityId>) {
        (self.entries, self.duplicates)
    }
}

/// Predicate selecting remote records not already held locally.
///
/// With nothing synced yet this is [`Predicate::All`].
pub fn exclusion_predicate<'a, I>(synced: I) -> Predicate
where
    I: IntoIterator<Item = &'a RecordId>,
{
    let excluded: BTreeSet<RecordId> = synced.into_iter().cloned().collect();
    if excluded.is_empty() {
        Predicate::All
    } else {
        Predicate::RecordIdNotIn(excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petsync_types::{Entity, Pet, Shelter};

    fn pet(id: &str, name: &str) -> Entity {
        Entity::Pet(Pet::new(id, name))
    }

    fn names(plan: &PushPlan) -> Vec<&str> {
        plan.entries()
            .iter()
            .map(|e| e.record.text("name").unwrap())
            .collect()
    }

    // ===========================================
    // Push Plan Tests
    // ===========================================

    #[test]
    fn plan_keeps_input_order() {
        let entities = vec![pet("p1", "Rex"), pet("p2", "Luna")];
        let plan = PushPlan::build(&entities, DuplicatePolicy::KeepFirst).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(names(&plan), vec!["Rex", "Luna"]);
        assert!(plan.duplicates().is_empty());
    }

    #[test]
    fn conversion_failure_fails_whole_plan() {
        let entities = vec![pet("p1", "Rex"), pet("p2", ""), pet("p3", "Max")];
        let err = PushPlan::build(&entities, DuplicatePolicy::KeepFirst).unwrap_err();

        assert!(matches!(
            err,
            PlanError::Conversion { ref entity_id, .. } if entity_id.as_str() == "p2"
        ));
    }

    #[test]
    fn keep_first_reports_later_duplicates() {
        let entities = vec![pet("p1", "Rex"), pet("p1", "Rex II"), pet("p2", "Luna")];
        let plan = PushPlan::build(&entities, DuplicatePolicy::KeepFirst).unwrap();

        assert_eq!(names(&plan), vec!["Rex", "Luna"]);
        assert_eq!(plan.duplicates(), &[EntityId::new("p1")]);
    }

    #[test]
    fn keep_last_replaces_in_place() {
        let entities = vec![pet("p1", "Rex"), pet("p2", "Luna"), pet("p1", "Rex II")];
        let plan = PushPlan::build(&entities, DuplicatePolicy::KeepLast).unwrap();

        assert_eq!(names(&plan), vec!["Rex II", "Luna"]);
        assert_eq!(plan.entries()[0].source, 2);
        assert_eq!(plan.duplicates().len(), 1);
    }

    #[test]
    fn reject_policy_errors_on_collision() {
        let entities = vec![pet("p1", "Rex"), pet("p1", "Rex II")];
        let err = PushPlan::build(&entities, DuplicatePolicy::Reject).unwrap_err();

        assert_eq!(
            err,
            PlanError::Duplicate {
                record_type: RecordType::Pet,
                entity_id: EntityId::new("p1"),
            }
        );
    }

    #[test]
    fn same_id_different_type_is_not_a_duplicate() {
        let entities = vec![pet("x1", "Rex"), Entity::Shelter(Shelter::new("x1", "Happy Tails"))];
        let plan = PushPlan::build(&entities, DuplicatePolicy::Reject).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn batch_has_no_colliding_identities() {
        let entities: Vec<Entity> = (0..20)
            .map(|i| pet(&format!("p{}", i % 7), &format!("Pet {}", i)))
            .collect();
        let plan = PushPlan::build(&entities, DuplicatePolicy::KeepFirst).unwrap();

        let mut seen = std::collections::HashSet::new();
        for entry in plan.entries() {
            assert!(seen.insert(entry.record.entity_id().unwrap().to_string()));
        }
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.len() + plan.duplicates().len(), 20);
    }

    #[test]
    fn empty_input_gives_empty_plan() {
        let entities: Vec<Entity> = Vec::new();
        let plan = PushPlan::build(&entities, DuplicatePolicy::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn duplicate_policy_parses_kebab_case() {
        let policy: DuplicatePolicy = serde_json::from_str("\"keep-last\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::KeepLast);
    }

    // ===========================================
    // Exclusion Predicate Tests
    // ===========================================

    #[test]
    fn no_synced_ids_matches_everything() {
        let ids: Vec<RecordId> = Vec::new();
        assert_eq!(exclusion_predicate(&ids), Predicate::All);
    }

    #[test]
    fn synced_ids_are_excluded_exactly() {
        let ids = vec![RecordId::new("rec-1"), RecordId::new("rec-2"), RecordId::new("rec-1")];
        match exclusion_predicate(&ids) {
            Predicate::RecordIdNotIn(set) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains(&RecordId::new("rec-1")));
                assert!(set.contains(&RecordId::new("rec-2")));
            }
            other => panic!("Expected RecordIdNotIn, got {:?}", other),
        }
    }
}
