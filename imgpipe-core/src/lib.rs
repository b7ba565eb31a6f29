//! imgpipe Core
//!
//! Core types and abstractions for the imgpipe image-processing service.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, Step, etc.)
//! - DTOs: Request/response bodies shared by the server, client and CLI

pub mod domain;
pub mod dto;
