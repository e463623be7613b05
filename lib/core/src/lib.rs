//! Core domain types and utilities for the tributary platform.
//!
//! This crate provides the strongly-typed identifiers and the error-handling
//! foundation shared by the workflow engine and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, TriggerId, WorkflowId, WorkflowRunId};
