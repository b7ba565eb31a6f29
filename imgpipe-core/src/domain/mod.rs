//! Core domain types
//!
//! This module contains the core domain structures used across imgpipe crates.
//! The server persists and executes them; the client and CLI only read them.

pub mod job;
pub mod step;
