pub mod chat;
pub mod dispatch;
pub mod doc;
pub mod exec;
pub mod member;
pub mod org;
pub mod problem;
pub mod repo;
pub mod schema;
pub mod shared;
pub mod task;
