//! Common types module for the delivery-order system.
//!
//! This module defines the core data types and structures shared by the
//! storage, store and service crates. It provides a centralized location
//! for shared types to ensure consistency across all components.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Order domain types including the stored record, the nested order
/// document and the status enumeration.
pub mod order;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
pub use validation::*;
