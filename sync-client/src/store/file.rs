//! Directory-backed record store.
//!
//! Stands in for the hosted store when running the CLI: each record type
//! lives in `<dir>/<Type>.json` as a map from record id to record. Two
//! clients pointed at the same directory share one "remote".

use super::{BatchOutcome, RecordStore, RemoteError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use petsync_types::{Query, RecordId, RecordType, RemoteRecord};

type Table = BTreeMap<RecordId, RemoteRecord>;

const ALL_TYPES: [RecordType; 3] = [RecordType::Pet, RecordType::Shelter, RecordType::User];

/// Record store persisted as JSON files in a directory.
#[derive(Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileRecordStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, RemoteError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(storage)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, record_type: RecordType) -> PathBuf {
        self.dir.join(format!("{}.json", record_type.as_str()))
    }

    async fn load(&self, record_type: RecordType) -> Result<Table, RemoteError> {
        let path = self.table_path(record_type);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(storage),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::new()),
            Err(e) => Err(storage(e)),
        }
    }

    async fn store(&self, record_type: RecordType, table: &Table) -> Result<(), RemoteError> {
        let bytes = serde_json::to_vec_pretty(table).map_err(storage)?;
        let path = self.table_path(record_type);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(storage)?;
        tokio::fs::rename(&tmp, &path).await.map_err(storage)
    }

    /// Find the table holding a record id.
    async fn locate(&self, record_id: &RecordId) -> Result<Option<(RecordType, Table)>, RemoteError> {
        for record_type in ALL_TYPES {
            let table = self.load(record_type).await?;
            if table.contains_key(record_id) {
                return Ok(Some((record_type, table)));
            }
        }
        Ok(None)
    }
}

fn storage(e: impl std::fmt::Display) -> RemoteError {
    RemoteError::Storage(e.to_string())
}

fn assign_id(table: &mut Table, mut record: RemoteRecord) -> RemoteRecord {
    let id = record
        .record_id
        .clone()
        .unwrap_or_else(|| RecordId::new(uuid::Uuid::new_v4().to_string()));
    record.record_id = Some(id.clone());
    table.insert(id, record.clone());
    record
}

/// Group records by type, remembering each one's position in the input.
fn by_type(records: Vec<RemoteRecord>) -> BTreeMap<RecordType, Vec<(usize, RemoteRecord)>> {
    let mut groups: BTreeMap<RecordType, Vec<(usize, RemoteRecord)>> = BTreeMap::new();
    for (index, record) in records.into_iter().enumerate() {
        groups.entry(record.record_type).or_default().push((index, record));
    }
    groups
}

fn collect_outcome(slots: Vec<Option<Result<RemoteRecord, RemoteError>>>) -> BatchOutcome {
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(RemoteError::MissingRecordId)))
        .collect()
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn query(&self, query: &Query) -> Result<Vec<RemoteRecord>, RemoteError> {
        let _guard = self.lock.lock().await;
        let table = self.load(query.record_type).await?;
        let mut found: Vec<RemoteRecord> = table
            .into_values()
            .filter(|r| query.matches(r))
            .collect();
        query.sort_records(&mut found);
        Ok(found)
    }

    async fn save(&self, record: RemoteRecord) -> Result<RemoteRecord, RemoteError> {
        let _guard = self.lock.lock().await;
        let record_type = record.record_type;
        let mut table = self.load(record_type).await?;
        let saved = assign_id(&mut table, record);
        self.store(record_type, &table).await?;
        tracing::debug!("Saved {} record {:?}", record_type, saved.record_id);
        Ok(saved)
    }

    async fn batch_save(&self, records: Vec<RemoteRecord>) -> Result<BatchOutcome, RemoteError> {
        let _guard = self.lock.lock().await;
        let mut slots = vec![None; records.len()];

        for (record_type, group) in by_type(records) {
            let mut table = self.load(record_type).await?;
            for (index, record) in group {
                slots[index] = Some(Ok(assign_id(&mut table, record)));
            }
            self.store(record_type, &table).await?;
        }

        Ok(collect_outcome(slots))
    }

    async fn delete(&self, record_id: &RecordId) -> Result<(), RemoteError> {
        let _guard = self.lock.lock().await;
        let (record_type, mut table) = self
            .locate(record_id)
            .await?
            .ok_or_else(|| RemoteError::UnknownRecord(record_id.clone()))?;
        table.remove(record_id);
        self.store(record_type, &table).await
    }

    async fn batch_modify(
        &self,
        records: Vec<RemoteRecord>,
    ) -> Result<BatchOutcome, RemoteError> {
        let _guard = self.lock.lock().await;
        let mut slots = vec![None; records.len()];

        for (record_type, group) in by_type(records) {
            let mut table = self.load(record_type).await?;
            for (index, record) in group {
                let outcome = match record.record_id.clone() {
                    None => Err(RemoteError::MissingRecordId),
                    Some(id) if !table.contains_key(&id) => Err(RemoteError::UnknownRecord(id)),
                    Some(_) => Ok(assign_id(&mut table, record)),
                };
                slots[index] = Some(outcome);
            }
            self.store(record_type, &table).await?;
        }

        Ok(collect_outcome(slots))
    }
}
