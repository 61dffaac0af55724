//! Problem update builder.

use compozy_core::enums::Priority;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProblemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<Option<String>>,
}

impl ProblemUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.workflow_id.is_none()
    }
}

#[derive(Default)]
pub struct ProblemUpdateBuilder(ProblemUpdate);

impl ProblemUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.0.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.0.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn workflow_id(mut self, workflow_id: Option<String>) -> Self {
        self.0.workflow_id = Some(workflow_id);
        self
    }

    #[must_use]
    pub fn build(self) -> ProblemUpdate {
        self.0
    }
}
