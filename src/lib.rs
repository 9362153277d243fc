// Team Hub - resource views over a keyed query cache

// Domain records and creatable drafts
pub mod models;

// Core types: predicates, formatters and descriptor tables
pub mod core;

// Client infrastructure - query cache, mutations, invalidation, sessions
pub mod infrastructure;

// Backends - mock store, REST router and HTTP client
pub mod api;

// Resource views bound to cached queries
pub mod views;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
