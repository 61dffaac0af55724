//! # compozy-core
//!
//! Domain types for the Compozy workflow engine.
//!
//! This crate has no I/O. It provides:
//! - Entity structs for organizations, problems, tasks, executions, chat and documents
//! - Status enums with explicit transition tables
//! - The generic [`workflow::Stateful`] transition contract
//! - Pure progress and classification queries
//! - Task dependency graph checks
//! - Workflow event records and typed errors

pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod graph;
pub mod ids;
pub mod progress;
pub mod responses;
pub mod workflow;
