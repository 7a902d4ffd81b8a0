//! Core order management for the delivery-order system.
//!
//! This crate owns the two pieces of the system with real invariants:
//! the status transition validator and the storage-backed order store
//! that keeps the denormalized full-order document in sync with the
//! authoritative status column. It also provides the one-time seed
//! bootstrap run at process start.

/// One-time seed bootstrap for populating an empty store.
pub mod seed;
/// Storage-backed CRUD over order records.
pub mod store;
/// Pure validation of status transitions.
pub mod transition;

pub use seed::*;
pub use store::*;
pub use transition::*;
