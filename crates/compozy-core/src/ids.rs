//! ID prefix constants.
//!
//! IDs are generated by the store as `{prefix}-{8 hex chars}`.

pub const PREFIX_ORGANIZATION: &str = "org";
pub const PREFIX_MEMBER: &str = "mbr";
pub const PREFIX_REPOSITORY: &str = "rep";
pub const PREFIX_PROBLEM: &str = "prb";
pub const PREFIX_TASK: &str = "tsk";
pub const PREFIX_EXECUTION: &str = "exe";
pub const PREFIX_MESSAGE: &str = "msg";
pub const PREFIX_DOCUMENT: &str = "doc";
pub const PREFIX_TRANSITION: &str = "trn";

pub const ALL_PREFIXES: [&str; 9] = [
    PREFIX_ORGANIZATION,
    PREFIX_MEMBER,
    PREFIX_REPOSITORY,
    PREFIX_PROBLEM,
    PREFIX_TASK,
    PREFIX_EXECUTION,
    PREFIX_MESSAGE,
    PREFIX_DOCUMENT,
    PREFIX_TRANSITION,
];
