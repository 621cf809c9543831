//! Persistence for the trade engine.
//!
//! This crate provides:
//! - `SqlitePositionStore`, the `SQLite` implementation of `PositionStore`
//! - `ResilientStore`, which layers the degrade-to-empty failure policy on
//!   top of any store

mod error;
pub mod resilient;
pub mod sqlite_store;

pub use resilient::{ResilientStore, WriteOutcome};
pub use sqlite_store::SqlitePositionStore;
