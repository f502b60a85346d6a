//! Mock record store for testing.
//!
//! Keeps records in memory, logs every call for verification, and allows
//! forcing failures or holding calls in flight.

use super::{BatchOutcome, RecordStore, RemoteError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use petsync_types::{Query, RecordId, RemoteRecord};

/// A call made against the mock store, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `query`
    Query(Query),
    /// `save`
    Save(RemoteRecord),
    /// `batch_save`
    BatchSave(Vec<RemoteRecord>),
    /// `delete`
    Delete(RecordId),
    /// `batch_modify`
    BatchModify(Vec<RemoteRecord>),
}

impl StoreCall {
    /// Short name of the call, for order assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Save(_) => "save",
            Self::BatchSave(_) => "batch_save",
            Self::Delete(_) => "delete",
            Self::BatchModify(_) => "batch_modify",
        }
    }
}

/// Mock record store for testing.
///
/// Assigns ids `rec-001`, `rec-002`, ... in save order. Clones share state.
#[derive(Clone)]
pub struct MockRecordStore {
    inner: Arc<Mutex<MockStoreInner>>,
    hold: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    records: BTreeMap<RecordId, RemoteRecord>,
    issued_ids: u64,
    calls: Vec<StoreCall>,
    fail_next_query: Option<RemoteError>,
    fail_next_save: Option<RemoteError>,
    fail_next_batch_save: Option<RemoteError>,
    fail_next_delete: Option<RemoteError>,
    fail_next_batch_modify: Option<RemoteError>,
    rejected: HashSet<String>,
}

impl MockStoreInner {
    fn next_id(&mut self) -> RecordId {
        self.issued_ids += 1;
        RecordId::new(format!("rec-{:03}", self.issued_ids))
    }

    fn store(&mut self, mut record: RemoteRecord) -> RemoteRecord {
        let id = match record.record_id.clone() {
            Some(id) => id,
            None => self.next_id(),
        };
        record.record_id = Some(id.clone());
        self.records.insert(id, record.clone());
        record
    }

    fn is_rejected(&self, record: &RemoteRecord) -> bool {
        let by_entity = record
            .entity_id()
            .map(|id| self.rejected.contains(id))
            .unwrap_or(false);
        let by_record = record
            .record_id
            .as_ref()
            .map(|id| self.rejected.contains(id.as_str()))
            .unwrap_or(false);
        by_entity || by_record
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner::default())),
            hold: Arc::new(hold),
        }
    }
}

impl fmt::Debug for MockRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("MockRecordStore")
            .field("records", &inner.records.len())
            .field("calls", &inner.calls.len())
            .finish_non_exhaustive()
    }
}

impl MockRecordStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record directly into the store, bypassing the call log.
    ///
    /// Returns the id it was stored under.
    pub fn insert(&self, record: RemoteRecord) -> RecordId {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner.store(record);
        stored.record_id.unwrap_or_else(|| RecordId::new(""))
    }

    /// All stored records, ordered by id.
    pub fn records(&self) -> Vec<RemoteRecord> {
        let inner = self.inner.lock().unwrap();
        inner.records.values().cloned().collect()
    }

    /// Look up a stored record.
    pub fn record(&self, record_id: &RecordId) -> Option<RemoteRecord> {
        let inner = self.inner.lock().unwrap();
        inner.records.get(record_id).cloned()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Names of every call made so far, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().map(StoreCall::name).collect()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.len()
    }

    /// Cause the next query() to fail with the given error.
    pub fn fail_next_query(&self, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_query = Some(error);
    }

    /// Cause the next save() to fail with the given error.
    pub fn fail_next_save(&self, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_save = Some(error);
    }

    /// Cause the next batch_save() to fail as a whole.
    pub fn fail_next_batch_save(&self, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_batch_save = Some(error);
    }

    /// Cause the next delete() to fail with the given error.
    pub fn fail_next_delete(&self, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_delete = Some(error);
    }

    /// Cause the next batch_modify() to fail as a whole.
    pub fn fail_next_batch_modify(&self, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_batch_modify = Some(error);
    }

    /// Refuse, inside batches, any record whose entity id or record id
    /// equals `id`. The rest of the batch still succeeds.
    pub fn reject_in_batches(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.rejected.insert(id.to_string());
    }

    /// Hold every subsequent call after it is logged, until released.
    pub fn hold_calls(&self) {
        self.hold.send_replace(true);
    }

    /// Let held calls (and future calls) proceed.
    pub fn release_calls(&self) {
        self.hold.send_replace(false);
    }

    /// Clear all state (records, calls, failures, id counter).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockStoreInner::default();
    }

    fn log(&self, call: StoreCall) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
    }

    async fn wait_released(&self) {
        let mut rx = self.hold.subscribe();
        // The sender lives as long as self, so this cannot fail.
        let _ = rx.wait_for(|held| !*held).await;
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn query(&self, query: &Query) -> Result<Vec<RemoteRecord>, RemoteError> {
        self.log(StoreCall::Query(query.clone()));
        self.wait_released().await;

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_query.take() {
            return Err(error);
        }

        let mut found: Vec<RemoteRecord> = inner
            .records
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        query.sort_records(&mut found);
        Ok(found)
    }

    async fn save(&self, record: RemoteRecord) -> Result<RemoteRecord, RemoteError> {
        self.log(StoreCall::Save(record.clone()));
        self.wait_released().await;

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_save.take() {
            return Err(error);
        }
        Ok(inner.store(record))
    }

    async fn batch_save(&self, records: Vec<RemoteRecord>) -> Result<BatchOutcome, RemoteError> {
        self.log(StoreCall::BatchSave(records.clone()));
        self.wait_released().await;

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_batch_save.take() {
            return Err(error);
        }

        let outcome = records
            .into_iter()
            .map(|record| {
                if inner.is_rejected(&record) {
                    Err(RemoteError::Server("record rejected".into()))
                } else {
                    Ok(inner.store(record))
                }
            })
            .collect();
        Ok(outcome)
    }

    async fn delete(&self, record_id: &RecordId) -> Result<(), RemoteError> {
        self.log(StoreCall::Delete(record_id.clone()));
        self.wait_released().await;

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_delete.take() {
            return Err(error);
        }
        inner
            .records
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::UnknownRecord(record_id.clone()))
    }

    async fn batch_modify(
        &self,
        records: Vec<RemoteRecord>,
    ) -> Result<BatchOutcome, RemoteError> {
        self.log(StoreCall::BatchModify(records.clone()));
        self.wait_released().await;

        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_batch_modify.take() {
            return Err(error);
        }

        let outcome = records
            .into_iter()
            .map(|record| {
                let id = record.record_id.clone().ok_or(RemoteError::MissingRecordId)?;
                if !inner.records.contains_key(&id) {
                    return Err(RemoteError::UnknownRecord(id));
                }
                if inner.is_rejected(&record) {
                    return Err(RemoteError::Server("record rejected".into()));
                }
                Ok(inner.store(record))
            })
            .collect();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petsync_types::{Predicate, RecordType};

    fn pet_record(id: &str) -> RemoteRecord {
        let mut r = RemoteRecord::new(RecordType::Pet);
        r.set("id", id);
        r.set("name", "Rex");
        r
    }

    // ===========================================
    // MockRecordStore Basic Tests
    // ===========================================

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let store = MockRecordStore::new();

        let first = store.save(pet_record("p1")).await.unwrap();
        let second = store.save(pet_record("p2")).await.unwrap();

        assert_eq!(first.record_id, Some(RecordId::new("rec-001")));
        assert_eq!(second.record_id, Some(RecordId::new("rec-002")));
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn save_with_id_overwrites() {
        let store = MockRecordStore::new();
        let saved = store.save(pet_record("p1")).await.unwrap();

        let mut changed = saved.clone();
        changed.set("name", "Rex II");
        store.save(changed).await.unwrap();

        assert_eq!(store.records().len(), 1);
        let stored = store.record(&RecordId::new("rec-001")).unwrap();
        assert_eq!(stored.text("name"), Some("Rex II"));
    }

    #[tokio::test]
    async fn query_filters_by_type_and_predicate() {
        let store = MockRecordStore::new();
        store.insert(pet_record("p1"));
        store.insert(pet_record("p2"));
        let mut shelter = RemoteRecord::new(RecordType::Shelter);
        shelter.set("id", "p1");
        store.insert(shelter);

        let query = Query::new(RecordType::Pet, Predicate::text_equals("id", "p1"));
        let found = store.query(&query).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity_id(), Some("p1"));
    }

    #[tokio::test]
    async fn batch_save_reports_per_record() {
        let store = MockRecordStore::new();
        store.reject_in_batches("p2");

        let outcome = store
            .batch_save(vec![pet_record("p1"), pet_record("p2"), pet_record("p3")])
            .await
            .unwrap();

        assert!(outcome[0].is_ok());
        assert!(matches!(outcome[1], Err(RemoteError::Server(_))));
        assert!(outcome[2].is_ok());
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn batch_modify_requires_existing_record() {
        let store = MockRecordStore::new();
        let id = store.insert(pet_record("p1"));

        let outcome = store
            .batch_modify(vec![
                pet_record("p1").with_id(id),
                pet_record("p2"),
                pet_record("p3").with_id(RecordId::new("rec-999")),
            ])
            .await
            .unwrap();

        assert!(outcome[0].is_ok());
        assert_eq!(outcome[1], Err(RemoteError::MissingRecordId));
        assert_eq!(
            outcome[2],
            Err(RemoteError::UnknownRecord(RecordId::new("rec-999")))
        );
    }

    #[tokio::test]
    async fn delete_unknown_record_fails() {
        let store = MockRecordStore::new();
        let result = store.delete(&RecordId::new("rec-404")).await;
        assert!(matches!(result, Err(RemoteError::UnknownRecord(_))));
    }

    // ===========================================
    // Failure Injection Tests
    // ===========================================

    #[tokio::test]
    async fn forced_save_failure_only_affects_next_call() {
        let store = MockRecordStore::new();
        store.fail_next_save(RemoteError::Network("offline".into()));

        let result = store.save(pet_record("p1")).await;
        assert_eq!(result, Err(RemoteError::Network("offline".into())));

        store.save(pet_record("p1")).await.unwrap();
    }

    #[tokio::test]
    async fn forced_batch_failure_saves_nothing() {
        let store = MockRecordStore::new();
        store.fail_next_batch_save(RemoteError::NotAuthenticated);

        let result = store.batch_save(vec![pet_record("p1")]).await;
        assert_eq!(result, Err(RemoteError::NotAuthenticated));
        assert!(store.records().is_empty());
    }

    // ===========================================
    // Call Log and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn calls_are_logged_in_order_even_when_failing() {
        let store = MockRecordStore::new();
        store.fail_next_delete(RemoteError::Server("boom".into()));

        let _ = store
            .query(&Query::new(RecordType::Pet, Predicate::All))
            .await;
        let _ = store.save(pet_record("p1")).await;
        let _ = store.delete(&RecordId::new("rec-001")).await;

        assert_eq!(store.call_names(), vec!["query", "save", "delete"]);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store1 = MockRecordStore::new();
        let store2 = store1.clone();

        store1.save(pet_record("p1")).await.unwrap();

        assert_eq!(store2.records().len(), 1);
        assert_eq!(store2.call_count(), 1);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let store = MockRecordStore::new();
        store.save(pet_record("p1")).await.unwrap();
        store.fail_next_query(RemoteError::NotAuthenticated);

        store.reset();

        assert!(store.records().is_empty());
        assert_eq!(store.call_count(), 0);
        let saved = store.save(pet_record("p2")).await.unwrap();
        assert_eq!(saved.record_id, Some(RecordId::new("rec-001")));
    }

    #[tokio::test]
    async fn held_call_is_logged_but_waits_for_release() {
        let store = MockRecordStore::new();
        store.hold_calls();

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.save(pet_record("p1")).await })
        };

        while store.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(store.records().is_empty());

        store.release_calls();
        task.await.unwrap().unwrap();
        assert_eq!(store.records().len(), 1);
    }
}
