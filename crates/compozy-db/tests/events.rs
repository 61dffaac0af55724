//! Event delivery: ordering, failure isolation and the built-in sinks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use compozy_config::CompozyConfig;
use compozy_core::enums::{EntityType, EventKind, Priority, ProblemStatus};
use compozy_core::events::WorkflowEvent;
use compozy_db::events::{EventListener, RecordingListener};
use compozy_db::repos::problem::NewProblem;
use compozy_db::repos::task::NewTask;
use compozy_db::service::WorkflowService;
use compozy_db::transition::TransitionRequest;

struct Failing;

impl EventListener for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_event(&self, _event: &WorkflowEvent) -> anyhow::Result<()> {
        anyhow::bail!("sink offline")
    }
}

struct Panicking(AtomicUsize);

impl EventListener for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn on_event(&self, _event: &WorkflowEvent) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        panic!("listener bug");
    }
}

fn new_problem(org_id: &str) -> NewProblem {
    NewProblem {
        organization_id: org_id.to_string(),
        title: "Flaky deploys".into(),
        description: String::new(),
        priority: Priority::Low,
        created_by: Some("admin-1".into()),
        repository_ids: Vec::new(),
        workflow_id: Some("wf-123".into()),
    }
}

async fn seed_admin(svc: &WorkflowService) -> String {
    let org = svc
        .create_organization("Acme", "acme", None)
        .await
        .unwrap();
    svc.add_member(&org.id, "admin-1", compozy_core::enums::MemberRole::Admin, None)
        .await
        .unwrap();
    org.id
}

#[tokio::test]
async fn failing_listeners_never_undo_the_transition() {
    let mut svc = WorkflowService::new_local(":memory:").await.unwrap();
    let panicking = Arc::new(Panicking(AtomicUsize::new(0)));
    let recorder = Arc::new(RecordingListener::new());
    svc.subscribe(Arc::new(Failing));
    svc.subscribe(panicking.clone());
    svc.subscribe(recorder.clone());

    let org_id = seed_admin(&svc).await;
    let problem = svc.create_problem(new_problem(&org_id)).await.unwrap();
    let problem = svc
        .start_analysis(&problem, &TransitionRequest::new().by("admin-1").because("triage"))
        .await
        .unwrap();

    assert_eq!(
        svc.get_problem(&problem.id).await.unwrap().status,
        ProblemStatus::Analyzing
    );
    assert_eq!(panicking.0.load(Ordering::SeqCst), 2);

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Created);
    assert_eq!(events[0].actor.as_deref(), Some("admin-1"));
    let transition = &events[1];
    assert_eq!(transition.kind, EventKind::Transitioned);
    assert_eq!(transition.entity_type, EntityType::Problem);
    assert_eq!(transition.old_status.as_deref(), Some("draft"));
    assert_eq!(transition.new_status, "analyzing");
    assert_eq!(transition.reason.as_deref(), Some("triage"));
}

#[tokio::test]
async fn rejected_transition_emits_nothing() {
    let mut svc = WorkflowService::new_local(":memory:").await.unwrap();
    let recorder = Arc::new(RecordingListener::new());
    svc.subscribe(recorder.clone());
    let org_id = seed_admin(&svc).await;
    let problem = svc.create_problem(new_problem(&org_id)).await.unwrap();
    recorder.clear();

    assert!(
        svc.transition_problem(&problem, ProblemStatus::Completed, &TransitionRequest::new())
            .await
            .is_err()
    );
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn jsonl_sink_configured_from_config() {
    let dir = TempDir::new().unwrap();
    let mut config = CompozyConfig::default();
    config.database.path = ":memory:".into();
    config.events.jsonl_dir = dir.path().join("events").to_string_lossy().into_owned();

    let svc = WorkflowService::from_config(&config).await.unwrap();
    let org_id = seed_admin(&svc).await;
    let problem = svc.create_problem(new_problem(&org_id)).await.unwrap();
    let task = svc
        .create_task(NewTask::new(&problem.id, "Pin runner image"))
        .await
        .unwrap();
    svc.start_analysis(&problem, &TransitionRequest::new())
        .await
        .unwrap();

    let problems: Vec<WorkflowEvent> =
        serde_jsonlines::json_lines(dir.path().join("events/problem.jsonl"))
            .unwrap()
            .collect::<std::io::Result<_>>()
            .unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[1].new_status, "analyzing");

    let tasks: Vec<WorkflowEvent> =
        serde_jsonlines::json_lines(dir.path().join("events/task.jsonl"))
            .unwrap()
            .collect::<std::io::Result<_>>()
            .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].entity_id, task.id);
}
