//! # petsync-core
//!
//! Pure logic for petsync (no I/O, instant tests).
//!
//! This crate holds the sync gate state machine and the push/pull planning
//! rules without any store access, so they can be tested without mocks or
//! an async runtime.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O (remote store calls, local
//! persistence) is performed by `petsync-client`, which interprets the
//! actions and plans produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod plan;
pub mod report;
pub mod state;

pub use plan::{exclusion_predicate, DuplicatePolicy, PlanError, PlannedRecord, PushPlan};
pub use report::{PullReport, PushReport, RecordFailure};
pub use state::{Action, Event, SyncState};
