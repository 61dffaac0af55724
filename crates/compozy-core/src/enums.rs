//! Status enums, choice fields, and entity types for Compozy.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer. The tables here are the only
//! definition of which transitions exist.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! impl_display_via_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority level shared by problems and tasks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Sort rank, lower is more urgent.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// ProblemStatus
// ---------------------------------------------------------------------------

/// Workflow status of a problem.
///
/// ```text
/// draft → analyzing → prd_generation → prd_review → spec_generation → spec_review
///       → task_creation → task_selection → executing → testing → completed
///
/// prd_review  → prd_generation   (send back for revision)
/// spec_review → spec_generation  (send back for revision)
/// testing     → executing        (tests failed, rework)
/// any non-terminal → cancelled; working states → failed
/// failed | cancelled → draft     (reopen)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    Draft,
    Analyzing,
    PrdGeneration,
    PrdReview,
    SpecGeneration,
    SpecReview,
    TaskCreation,
    TaskSelection,
    Executing,
    Testing,
    Completed,
    Failed,
    Cancelled,
}

impl ProblemStatus {
    pub const ALL: [Self; 13] = [
        Self::Draft,
        Self::Analyzing,
        Self::PrdGeneration,
        Self::PrdReview,
        Self::SpecGeneration,
        Self::SpecReview,
        Self::TaskCreation,
        Self::TaskSelection,
        Self::Executing,
        Self::Testing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Analyzing, Self::Cancelled],
            Self::Analyzing => &[Self::PrdGeneration, Self::Failed, Self::Cancelled],
            Self::PrdGeneration => &[Self::PrdReview, Self::Failed, Self::Cancelled],
            Self::PrdReview => &[Self::SpecGeneration, Self::PrdGeneration, Self::Cancelled],
            Self::SpecGeneration => &[Self::SpecReview, Self::Failed, Self::Cancelled],
            Self::SpecReview => &[Self::TaskCreation, Self::SpecGeneration, Self::Cancelled],
            Self::TaskCreation => &[Self::TaskSelection, Self::Failed, Self::Cancelled],
            Self::TaskSelection => &[Self::Executing, Self::Cancelled],
            Self::Executing => &[Self::Testing, Self::Failed, Self::Cancelled],
            Self::Testing => &[
                Self::Completed,
                Self::Executing,
                Self::Failed,
                Self::Cancelled,
            ],
            Self::Completed => &[],
            Self::Failed | Self::Cancelled => &[Self::Draft],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Analyzing => "analyzing",
            Self::PrdGeneration => "prd_generation",
            Self::PrdReview => "prd_review",
            Self::SpecGeneration => "spec_generation",
            Self::SpecReview => "spec_review",
            Self::TaskCreation => "task_creation",
            Self::TaskSelection => "task_selection",
            Self::Executing => "executing",
            Self::Testing => "testing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a task derived from a problem's technical specification.
///
/// ```text
/// pending → selected → in_progress → testing → completed
///                                  → completed
///         → skipped            testing → in_progress (rework)
/// in_progress | testing → failed
/// selected | completed | failed | skipped → pending (reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Selected,
    InProgress,
    Testing,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Selected,
        Self::InProgress,
        Self::Testing,
        Self::Completed,
        Self::Failed,
        Self::Skipped,
    ];

    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Selected, Self::Skipped],
            Self::Selected => &[Self::InProgress, Self::Pending, Self::Skipped],
            Self::InProgress => &[Self::Testing, Self::Completed, Self::Failed],
            Self::Testing => &[Self::Completed, Self::InProgress, Self::Failed],
            Self::Completed | Self::Failed | Self::Skipped => &[Self::Pending],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// A dependency in this state no longer blocks its dependents.
    #[must_use]
    pub const fn satisfies_dependency(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Selected => "selected",
            Self::InProgress => "in_progress",
            Self::Testing => "testing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutionStatus
// ---------------------------------------------------------------------------

/// Status of a single task execution attempt.
///
/// ```text
/// pending → running → completed
///                   → failed
///                   → timeout
///                   → cancelled
/// pending → failed
///         → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl ExecutionStatus {
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::Timeout,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Running, Self::Failed, Self::Cancelled],
            Self::Running => &[
                Self::Completed,
                Self::Failed,
                Self::Cancelled,
                Self::Timeout,
            ],
            Self::Completed | Self::Failed | Self::Cancelled | Self::Timeout => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

// ---------------------------------------------------------------------------
// AgentType / AgentName
// ---------------------------------------------------------------------------

/// Kind of external agent that carried out an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    CodeWriter,
    TestRunner,
    BusinessAnalyst,
    TechArchitect,
    TaskPlanner,
    Unknown,
}

impl AgentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CodeWriter => "code_writer",
            Self::TestRunner => "test_runner",
            Self::BusinessAnalyst => "business_analyst",
            Self::TechArchitect => "tech_architect",
            Self::TaskPlanner => "task_planner",
            Self::Unknown => "unknown",
        }
    }
}

/// Agent that can author a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    BusinessAnalyst,
    TechArchitect,
    TaskPlanner,
    CodeWriter,
    TestRunner,
}

impl AgentName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BusinessAnalyst => "business_analyst",
            Self::TechArchitect => "tech_architect",
            Self::TaskPlanner => "task_planner",
            Self::CodeWriter => "code_writer",
            Self::TestRunner => "test_runner",
        }
    }

    /// Human-facing name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BusinessAnalyst => "Business Analyst",
            Self::TechArchitect => "Tech Architect",
            Self::TaskPlanner => "Task Planner",
            Self::CodeWriter => "Code Writer",
            Self::TestRunner => "Test Runner",
        }
    }
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Type of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    Answer,
    Info,
    Error,
    System,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Info => "info",
            Self::Error => "error",
            Self::System => "system",
        }
    }
}

// ---------------------------------------------------------------------------
// MemberRole
// ---------------------------------------------------------------------------

/// Role of a user inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
    Viewer,
}

impl MemberRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    #[must_use]
    pub const fn can_manage_members(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn can_create_problems(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }
}

// ---------------------------------------------------------------------------
// RepoProvider
// ---------------------------------------------------------------------------

/// Source control hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepoProvider {
    Github,
    Gitlab,
    Bitbucket,
}

impl RepoProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Bitbucket => "bitbucket",
        }
    }

    /// Username segment used when embedding an access token in a clone URL.
    #[must_use]
    pub const fn token_user(self) -> &'static str {
        match self {
            Self::Github | Self::Gitlab => "oauth2",
            Self::Bitbucket => "x-token-auth",
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentKind
// ---------------------------------------------------------------------------

/// Kind of generated document attached to a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Prd,
    TechSpec,
}

impl DocumentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prd => "prd",
            Self::TechSpec => "tech_spec",
        }
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity in the system, used in transition history and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Organization,
    Member,
    Repository,
    Problem,
    Task,
    Execution,
    ChatMessage,
    Document,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Member => "member",
            Self::Repository => "repository",
            Self::Problem => "problem",
            Self::Task => "task",
            Self::Execution => "execution",
            Self::ChatMessage => "chat_message",
            Self::Document => "document",
        }
    }
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Kind of workflow event delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Transitioned,
    Failed,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Transitioned => "transitioned",
            Self::Failed => "failed",
        }
    }
}

impl_display_via_as_str!(
    Priority,
    ProblemStatus,
    TaskStatus,
    ExecutionStatus,
    AgentType,
    AgentName,
    MessageType,
    MemberRole,
    RepoProvider,
    DocumentKind,
    EntityType,
    EventKind,
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
