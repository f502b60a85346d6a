//! Reconciler between the local store and the remote record store.
//!
//! The reconciler owns the sync gate. State transitions are computed by the
//! pure [`SyncState`] machine from petsync-core and published on a watch
//! channel; this module performs the store I/O the machine asks for.
//!
//! # Example
//!
//! ```ignore
//! let reconciler = Reconciler::new(ReconcilerConfig::default(), remote, local);
//!
//! // Favorite a pet: existence check, save if new, then update the user.
//! let pet = reconciler.save_favorite(Pet::new("p1", "Rex").into()).await?;
//!
//! // Push unsynced entities, then pull new remote ones.
//! match reconciler.perform_full_sync().await {
//!     SyncOutcome::Completed(report) => println!("{:?}", report),
//!     SyncOutcome::AlreadySyncing => {}
//! }
//! ```

use tokio::sync::watch;

use crate::config::ReconcilerConfig;
use crate::error::ReconcileError;
use crate::local::{LocalStore, UserContext};
use crate::store::{RecordStore, RemoteError};
use petsync_core::{
    exclusion_predicate, Action, Event, PullReport, PushPlan, PushReport, RecordFailure, SyncState,
};
use petsync_types::{
    Entity, EntityKind, FavoriteList, Predicate, Query, RecordId, RecordReference, RecordType,
    RemoteRecord, Syncable, User, FAVORITES_FIELD, ID_FIELD,
};

/// Per-kind results of one full sync pass.
///
/// Errors are kept here rather than returned; one kind failing does not stop
/// the others.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Push result for each configured kind, in order.
    pub push: Vec<(EntityKind, Result<PushReport, ReconcileError>)>,
    /// Pull result for each configured kind, in order.
    pub pull: Vec<(EntityKind, Result<PullReport, ReconcileError>)>,
}

impl SyncReport {
    /// True when every push and pull succeeded and every pushed record saved.
    pub fn is_clean(&self) -> bool {
        self.push
            .iter()
            .all(|(_, r)| matches!(r, Ok(report) if report.is_complete()))
            && self.pull.iter().all(|(_, r)| r.is_ok())
    }
}

/// Result of asking for a full sync.
#[derive(Debug)]
pub enum SyncOutcome {
    /// A pass ran to the end.
    Completed(SyncReport),
    /// A pass was already running; nothing was done.
    AlreadySyncing,
}

/// Reconciles local entities with the remote record store.
///
/// Generic over the remote store `R` and the local store `L` so tests can
/// run against [`MockRecordStore`](crate::MockRecordStore) and
/// [`MemoryLocalStore`](crate::MemoryLocalStore).
pub struct Reconciler<R, L> {
    config: ReconcilerConfig,
    remote: R,
    local: L,
    state: watch::Sender<SyncState>,
}

/// Returns the gate to idle if a pass ends without finishing.
struct PassGuard<'a> {
    state: &'a watch::Sender<SyncState>,
    armed: bool,
}

impl PassGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Sync pass ended early, releasing gate");
            apply(self.state, Event::Aborted);
        }
    }
}

/// Feed an event to the state machine and publish the new state.
fn apply(state: &watch::Sender<SyncState>, event: Event) -> Vec<Action> {
    let mut actions = Vec::new();
    state.send_if_modified(|current| {
        let (next, emitted) = current.on_event(event);
        actions = emitted;
        let changed = next != *current;
        *current = next;
        changed
    });
    actions
}

fn remote_failure(context: &str, e: RemoteError) -> ReconcileError {
    tracing::warn!("{}: {}", context, e);
    ReconcileError::Remote(e)
}

impl<R, L> Reconciler<R, L>
where
    R: RecordStore,
    L: LocalStore + UserContext,
{
    /// Create a reconciler with an idle gate.
    pub fn new(config: ReconcilerConfig, remote: R, local: L) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            config,
            remote,
            local,
            state,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// The remote store.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The local store.
    pub fn local(&self) -> &L {
        &self.local
    }

    /// Current gate state.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Watch gate state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Find the remote record for an entity, matched on its `id` field.
    ///
    /// An entity that cannot be converted has no remote counterpart and
    /// yields `Ok(None)`.
    pub async fn ensure_remote_exists(
        &self,
        entity: &Entity,
    ) -> Result<Option<RemoteRecord>, ReconcileError> {
        match entity.to_record() {
            Ok(record) => self.find_remote(record.record_type, entity).await,
            Err(e) => {
                tracing::warn!("Skipping existence check for {}: {}", entity.entity_id(), e);
                Ok(None)
            }
        }
    }

    async fn find_remote(
        &self,
        record_type: RecordType,
        entity: &Entity,
    ) -> Result<Option<RemoteRecord>, ReconcileError> {
        let query = Query::new(
            record_type,
            Predicate::text_equals(ID_FIELD, entity.entity_id().as_str()),
        );
        let found = self
            .remote
            .query(&query)
            .await
            .map_err(|e| remote_failure("Existence check failed", e))?;
        Ok(found.into_iter().next())
    }

    /// Favorite an entity for the current user.
    ///
    /// Reuses the entity's remote record if one already exists, otherwise
    /// saves it. Then puts a reference to it at the front of the user's
    /// favorites and writes the user record. Returns the entity, synced.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::NotReady`] if there is no current user.
    /// - [`ReconcileError::Conversion`] if the entity or user cannot be
    ///   converted; nothing is sent.
    /// - [`ReconcileError::Remote`] if the check, the save, or the user update
    ///   fails. A failed save leaves the user record untouched.
    pub async fn save_favorite(&self, mut entity: Entity) -> Result<Entity, ReconcileError> {
        let mut user = self
            .local
            .current_user()
            .await?
            .ok_or(ReconcileError::NotReady)?;

        let record = entity.to_record()?;
        user.to_record()?;

        let remote_id = match self.find_remote(record.record_type, &entity).await? {
            Some(existing) => {
                let id = existing.record_id.ok_or(RemoteError::MissingRecordId)?;
                tracing::debug!("{} already stored as {}", entity.entity_id(), id);
                id
            }
            None => {
                let saved = self
                    .remote
                    .save(record)
                    .await
                    .map_err(|e| remote_failure("Saving favorite failed", e))?;
                let id = saved.record_id.ok_or(RemoteError::MissingRecordId)?;
                entity.set_remote_id(id.clone());
                self.local.put(entity.clone()).await?;
                tracing::debug!("Saved {} as {}", entity.entity_id(), id);
                id
            }
        };
        entity.set_remote_id(remote_id.clone());

        user.favorites.insert_front(RecordReference::new(remote_id));
        self.write_user(&user).await?;

        self.local.put(entity.clone()).await?;
        self.local.set_current_user(user).await?;
        tracing::info!("Favorited {}", entity.entity_id());
        Ok(entity)
    }

    /// Delete an entity's remote record.
    ///
    /// Local state is not touched; removing the entity from the favorites
    /// and the local store is up to the caller once this succeeds.
    pub async fn delete_favorite(&self, entity: &Entity) -> Result<(), ReconcileError> {
        let remote_id = entity
            .remote_id()
            .ok_or_else(|| ReconcileError::MissingRemoteIdentifier {
                entity_id: entity.entity_id().clone(),
            })?;
        self.remote
            .delete(remote_id)
            .await
            .map_err(|e| remote_failure("Deleting favorite failed", e))?;
        tracing::info!("Deleted remote record {} for {}", remote_id, entity.entity_id());
        Ok(())
    }

    /// Drop a reference from the current user's favorites and rewrite the
    /// user record.
    ///
    /// Meant to follow a successful [`delete_favorite`](Self::delete_favorite)
    /// so the remote user record stops pointing at the deleted record. A
    /// reference that is not in the favorites issues no remote call. Local
    /// favorites change only once the remote update is accepted.
    pub async fn remove_favorite(&self, record_id: &RecordId) -> Result<User, ReconcileError> {
        let mut user = self
            .local
            .current_user()
            .await?
            .ok_or(ReconcileError::NotReady)?;
        if !user.favorites.remove(record_id) {
            return Ok(user);
        }

        self.write_user(&user).await?;
        self.local.set_current_user(user.clone()).await?;
        tracing::info!("Removed {} from favorites", record_id);
        Ok(user)
    }

    async fn write_user(&self, user: &User) -> Result<(), ReconcileError> {
        let outcome = self
            .remote
            .batch_modify(vec![user.to_record()?])
            .await
            .map_err(|e| remote_failure("Updating favorites failed", e))?;
        match outcome.into_iter().next() {
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(remote_failure("User record refused", e)),
            None => Err(remote_failure(
                "User record refused",
                RemoteError::Server("empty batch response".into()),
            )),
        }
    }

    /// Save every unsynced entity of a kind in one batch.
    ///
    /// Conversion is all-or-nothing and happens before any remote call.
    /// Entities the store accepts get their remote id and are persisted;
    /// refused ones are listed in [`PushReport::failed`] and stay unsynced.
    pub async fn push(&self, kind: EntityKind) -> Result<PushReport, ReconcileError> {
        let pending = self.local.unsynced(kind).await?;
        let plan = PushPlan::build(&pending, self.config.duplicate_policy)?;
        let (entries, duplicates) = plan.into_parts();

        let mut report = PushReport::new(kind);
        if !duplicates.is_empty() {
            tracing::warn!("Push {}: {} duplicate entities left out", kind, duplicates.len());
        }
        report.duplicates = duplicates;

        if entries.is_empty() {
            tracing::debug!("Push {}: nothing to push", kind);
            return Ok(report);
        }

        let records = entries.iter().map(|e| e.record.clone()).collect();
        let outcome = self
            .remote
            .batch_save(records)
            .await
            .map_err(|e| remote_failure("Batch save failed", e))?;
        let mut results = outcome.into_iter();

        for entry in entries {
            let result = results
                .next()
                .unwrap_or_else(|| Err(RemoteError::Server("no result for record".into())));
            let saved_id = result.and_then(|r| r.record_id.ok_or(RemoteError::MissingRecordId));
            match saved_id {
                Ok(id) => {
                    let mut entity = pending[entry.source].clone();
                    entity.set_remote_id(id.clone());
                    self.local.put(entity).await?;
                    report.saved.push((entry.entity_id, id));
                }
                Err(e) => {
                    tracing::warn!("Push {}: {} refused: {}", kind, entry.entity_id, e);
                    report.failed.push(RecordFailure {
                        entity_id: entry.entity_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Push {}: {} saved, {} failed",
            kind,
            report.saved.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Fetch remote records of a kind not yet held locally and store them.
    pub async fn pull(&self, kind: EntityKind) -> Result<PullReport, ReconcileError> {
        let synced = self.local.synced_ids(kind).await?;
        let mut query = Query::new(kind.record_type(), exclusion_predicate(&synced));
        if let Some(sort) = &self.config.pull_sort {
            query = query.sorted_by(sort.clone());
        }

        let records = self
            .remote
            .query(&query)
            .await
            .map_err(|e| remote_failure("Pull query failed", e))?;

        let mut report = PullReport::new(kind);
        for record in records {
            match Entity::from_record(kind, &record) {
                Ok(entity) if entity.is_synced() => {
                    report.materialized.push(entity.entity_id().clone());
                    self.local.put(entity).await?;
                }
                Ok(entity) => {
                    tracing::warn!("Pull {}: {} came back without an id", kind, entity.entity_id());
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("Pull {}: skipping record: {}", kind, e);
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Pull {}: {} new, {} skipped",
            kind,
            report.materialized.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Run one push-then-pull pass over every configured kind.
    ///
    /// Returns [`SyncOutcome::AlreadySyncing`] at once, without touching
    /// either store, if a pass is in progress. The gate is released when the
    /// pass ends, whether it succeeded, failed, or its future was dropped.
    pub async fn perform_full_sync(&self) -> SyncOutcome {
        if !apply(&self.state, Event::SyncRequested).contains(&Action::StartPush) {
            tracing::debug!("Sync requested during a pass, ignoring");
            return SyncOutcome::AlreadySyncing;
        }
        let guard = PassGuard {
            state: &self.state,
            armed: true,
        };

        let mut report = SyncReport::default();
        for &kind in &self.config.kinds {
            report.push.push((kind, self.push(kind).await));
        }

        apply(&self.state, Event::PushFinished);
        for &kind in &self.config.kinds {
            report.pull.push((kind, self.pull(kind).await));
        }

        apply(&self.state, Event::PullFinished);
        guard.disarm();
        SyncOutcome::Completed(report)
    }

    /// Create the current user's remote record if it does not have one.
    ///
    /// A fresh local user named `name` is created first when none exists.
    pub async fn register_user(&self, name: &str) -> Result<User, ReconcileError> {
        let mut user = match self.local.current_user().await? {
            Some(user) => user,
            None => User::new(name),
        };
        if user.remote_id.is_some() {
            return Ok(user);
        }

        let saved = self
            .remote
            .save(user.to_new_record())
            .await
            .map_err(|e| remote_failure("Creating user record failed", e))?;
        user.remote_id = Some(saved.record_id.ok_or(RemoteError::MissingRecordId)?);
        self.local.set_current_user(user.clone()).await?;
        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Replace the current user's favorites with those in their remote record.
    pub async fn refresh_user(&self) -> Result<User, ReconcileError> {
        let mut user = self
            .local
            .current_user()
            .await?
            .ok_or(ReconcileError::NotReady)?;
        let remote_id = user
            .remote_id
            .clone()
            .ok_or(ReconcileError::NotReady)?;

        let query = Query::new(
            RecordType::User,
            Predicate::text_equals("user_id", &user.id.to_string()),
        );
        let found = self
            .remote
            .query(&query)
            .await
            .map_err(|e| remote_failure("Fetching user record failed", e))?;
        let record = found
            .into_iter()
            .find(|r| r.record_id.as_ref() == Some(&remote_id))
            .ok_or(RemoteError::UnknownRecord(remote_id))?;

        user.favorites = FavoriteList::from_references(record.references(FAVORITES_FIELD));
        self.local.set_current_user(user.clone()).await?;
        Ok(user)
    }
}
