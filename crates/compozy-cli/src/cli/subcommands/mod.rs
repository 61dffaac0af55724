mod chat;
mod doc;
mod exec;
mod member;
mod org;
mod problem;
mod repo;
mod task;

pub use chat::ChatCommands;
pub use doc::DocCommands;
pub use exec::ExecCommands;
pub use member::MemberCommands;
pub use org::OrgCommands;
pub use problem::ProblemCommands;
pub use repo::RepoCommands;
pub use task::TaskCommands;
