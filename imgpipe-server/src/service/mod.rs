//! Service Module
//!
//! Business logic layer of the server.
//! Services coordinate the job store, the object store and the executor.

pub mod job;

// Re-export for convenience
pub use job::{JobError, JobService};
