//! Serde roundtrip and JsonSchema validation tests for entity and response types.

use chrono::{Duration, Utc};
use schemars::schema_for;
use compozy_core::entities::*;
use compozy_core::enums::*;
use compozy_core::events::WorkflowEvent;
use compozy_core::responses::*;

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            pretty_assertions::assert_eq!(recovered, val, "roundtrip for {}", stringify!($ty));

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn failed_problem() -> Problem {
    let now = Utc::now();
    Problem {
        id: "prb-5e1a09cd".into(),
        organization_id: "org-77aa01bc".into(),
        created_by: Some("user-1".into()),
        title: "Checkout times out under load".into(),
        description: "p99 above 8s during sales".into(),
        status: ProblemStatus::Failed,
        priority: Priority::Critical,
        repository_ids: vec!["rep-0a0b0c0d".into()],
        workflow_id: Some("wf-123".into()),
        error_message: Some("analysis agent crashed".into()),
        version: 4,
        created_at: now,
        updated_at: now,
    }
}

roundtrip_and_validate!(problem_roundtrip, Problem, failed_problem());

roundtrip_and_validate!(
    task_roundtrip,
    Task,
    {
        let now = Utc::now();
        Task {
            id: "tsk-1f2e3d4c".into(),
            problem_id: "prb-5e1a09cd".into(),
            title: "Add connection pool metrics".into(),
            description: String::new(),
            spec: "Expose pool wait time".into(),
            status: TaskStatus::Completed,
            priority: Priority::Low,
            order_index: 2,
            dependencies: vec!["tsk-00000001".into()],
            started_at: Some(now - Duration::minutes(3)),
            completed_at: Some(now),
            error_message: None,
            version: 6,
            created_at: now,
            updated_at: now,
        }
    }
);

roundtrip_and_validate!(
    execution_roundtrip,
    TaskExecution,
    {
        let now = Utc::now();
        TaskExecution {
            id: "exe-aa11bb22".into(),
            task_id: "tsk-1f2e3d4c".into(),
            attempt_number: 2,
            status: ExecutionStatus::Timeout,
            agent_type: AgentType::TestRunner,
            job_id: Some("job-9".into()),
            logs: "running suite\n".into(),
            output: Some(serde_json::json!({"passed": 41, "failed": 1})),
            metrics: None,
            error_message: Some("no heartbeat for 600s".into()),
            started_at: Some(now),
            completed_at: Some(now),
            version: 3,
            created_at: now,
            updated_at: now,
        }
    }
);

roundtrip_and_validate!(
    agent_message_roundtrip,
    ChatMessage,
    {
        let now = Utc::now();
        let mut metadata = serde_json::Map::new();
        metadata.insert("stage".into(), serde_json::json!("prd_review"));
        ChatMessage {
            id: "msg-01020304".into(),
            problem_id: "prb-5e1a09cd".into(),
            sender: Sender::Agent {
                agent: AgentName::BusinessAnalyst,
            },
            content: "Which regions are affected?".into(),
            message_type: MessageType::Question,
            is_read: false,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
);

roundtrip_and_validate!(
    document_roundtrip,
    Document,
    {
        let now = Utc::now();
        Document {
            id: "doc-0badcafe".into(),
            problem_id: "prb-5e1a09cd".into(),
            kind: DocumentKind::TechSpec,
            version: 2,
            content: "Use a bounded pool".into(),
            summary: "Pool sizing".into(),
            word_count: 4,
            created_by: None,
            is_approved: true,
            approved_by: Some("user-1".into()),
            approved_at: Some(now),
            change_notes: "Addressed review".into(),
            created_at: now,
            updated_at: now,
        }
    }
);

roundtrip_and_validate!(
    repository_roundtrip,
    Repository,
    {
        let now = Utc::now();
        Repository {
            id: "rep-0a0b0c0d".into(),
            organization_id: "org-77aa01bc".into(),
            name: "shop".into(),
            url: "https://gitlab.com/acme/shop".into(),
            provider: RepoProvider::Gitlab,
            default_branch: "main".into(),
            auth_token: None,
            is_private: true,
            last_synced_at: None,
            local_path: Some("/srv/repos/shop".into()),
            created_at: now,
            updated_at: now,
        }
    }
);

roundtrip_and_validate!(
    event_roundtrip,
    WorkflowEvent,
    WorkflowEvent::transition(
        "prb-5e1a09cd",
        ProblemStatus::PrdReview,
        ProblemStatus::PrdGeneration,
        Some("user-1"),
        Some("needs acceptance criteria"),
        Utc::now(),
    )
);

roundtrip_and_validate!(
    batch_report_roundtrip,
    BatchReport,
    BatchReport {
        succeeded: vec!["tsk-1".into()],
        failed: vec![BatchFailure {
            id: "tsk-2".into(),
            error: "Entity not found: task tsk-2".into(),
        }],
    }
);

#[test]
fn overview_serializes_flags() {
    let problem = failed_problem();
    let overview = ProblemOverview {
        progress: problem.progress_percentage(),
        is_active: problem.is_active(),
        is_awaiting_review: problem.is_awaiting_review(),
        is_in_progress: false,
        tasks: TaskCounts::default(),
        completion_ratio: 0.0,
        unread_messages: 2,
        latest_documents: Vec::new(),
        problem,
    };
    let json = serde_json::to_value(&overview).unwrap();
    assert_eq!(json["progress"], 0);
    assert_eq!(json["is_active"], false);
    assert_eq!(json["problem"]["status"], "failed");
}

#[test]
fn unknown_status_string_is_rejected() {
    let mut json = serde_json::to_value(failed_problem()).unwrap();
    json["status"] = serde_json::json!("archived");
    assert!(serde_json::from_value::<Problem>(json).is_err());
}
