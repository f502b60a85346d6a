//! Sync gate state machine for petsync.
//!
//! A pure, side-effect-free state machine for the full-sync pass lifecycle.
//! It takes events as input and produces a new state plus a list of actions
//! to execute. The reconciler in petsync-client performs the actual push and
//! pull I/O and feeds completion events back in.
//!
//! ```text
//! Idle --SyncRequested--> Pushing --PushFinished--> Pulling --PullFinished--> Idle
//!   ^                        |                         |
//!   +--------Aborted---------+-------------------------+
//! ```

use serde::Serialize;

/// Sync gate state - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SyncState {
    /// No pass running; a sync request will start one.
    #[default]
    Idle,
    /// Pass running, pushing unsynced local entities.
    Pushing,
    /// Pass running, pulling remote records not yet held locally.
    Pulling,
}

impl SyncState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function. The caller is responsible for executing the
    /// returned actions.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            (Self::Idle, Event::SyncRequested) => (Self::Pushing, vec![Action::StartPush]),

            // The gate is advisory: a second request is dropped, not queued.
            (state @ (Self::Pushing | Self::Pulling), Event::SyncRequested) => {
                (state, vec![Action::RejectRequest])
            }

            (Self::Pushing, Event::PushFinished) => (Self::Pulling, vec![Action::StartPull]),
            (Self::Pulling, Event::PullFinished) => (Self::Idle, vec![Action::ReleaseGate]),

            (Self::Pushing | Self::Pulling, Event::Aborted) => {
                (Self::Idle, vec![Action::ReleaseGate])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Whether a pass is in progress.
    pub fn is_syncing(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Events that drive the sync gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A caller asked for a full sync pass.
    SyncRequested,
    /// The push phase ran to completion (successfully or not).
    PushFinished,
    /// The pull phase ran to completion (successfully or not).
    PullFinished,
    /// The pass ended early, e.g. its future was dropped.
    Aborted,
}

/// Actions to be executed by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Begin pushing unsynced entities.
    StartPush,
    /// Begin pulling new remote records.
    StartPull,
    /// Answer the request immediately without doing any work.
    RejectRequest,
    /// The pass is over; the gate is open again.
    ReleaseGate,
}
