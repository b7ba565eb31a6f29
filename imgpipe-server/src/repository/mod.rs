//! Repository Module
//!
//! Data access layer for jobs.
//! [`JobStore`] is the contract; each backing lives in its own submodule.

pub mod job;
pub mod memory;
pub mod postgres;

// Re-export for convenience
pub use job::{JobStore, StoreError};
pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;
