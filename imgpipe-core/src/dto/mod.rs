//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the server and its clients
//! (the `imgpipe-client` crate and the CLI). Field names are camelCase on
//! the wire.

pub mod auth;
pub mod error;
pub mod job;
