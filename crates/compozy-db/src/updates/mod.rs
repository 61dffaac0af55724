//! Partial-update builders for non-status fields.
//!
//! Status is never part of an update; it changes only through the
//! transition path.

pub mod problem;
pub mod task;

pub use problem::{ProblemUpdate, ProblemUpdateBuilder};
pub use task::{TaskUpdate, TaskUpdateBuilder};
