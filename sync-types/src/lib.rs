//! # petsync-types
//!
//! Data model shared by all petsync crates:
//! - [`EntityId`], [`RecordId`], [`UserId`] - Identity types
//! - [`Pet`], [`Shelter`], [`Entity`] - Syncable entities ([`Syncable`])
//! - [`User`], [`FavoriteList`] - The user and their ordered favorites
//! - [`RemoteRecord`], [`Query`], [`Predicate`] - Remote store representation
//! - [`ConversionError`] - Entity/record conversion failures

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entity;
mod error;
mod ids;
mod query;
mod record;
mod user;

pub use entity::{Entity, EntityKind, Pet, Shelter, Syncable};
pub use error::ConversionError;
pub use ids::{EntityId, RecordId, UserId};
pub use query::{Predicate, Query, SortDescriptor};
pub use record::{FieldValue, RecordReference, RecordType, RemoteRecord, ID_FIELD};
pub use user::{FavoriteList, User, FAVORITES_FIELD};
