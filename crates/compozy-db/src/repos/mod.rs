//! Repository methods on `WorkflowService`, one module per aggregate.

pub mod batch;
pub mod chat;
pub mod document;
pub mod execution;
pub mod history;
pub mod member;
pub mod organization;
pub mod overview;
pub mod problem;
pub mod repository;
pub mod task;
