//! Shared fixtures for in-crate tests.

use std::sync::Arc;

use compozy_core::entities::{Organization, Problem, Task};
use compozy_core::enums::{MemberRole, Priority};

use crate::CompozyDb;
use crate::events::RecordingListener;
use crate::repos::problem::NewProblem;
use crate::repos::task::NewTask;
use crate::service::WorkflowService;

/// In-memory service with a recording listener attached.
pub async fn test_service() -> (WorkflowService, Arc<RecordingListener>) {
    let db = CompozyDb::open_local(":memory:").await.unwrap();
    let mut svc = WorkflowService::from_db(db);
    let recorder = Arc::new(RecordingListener::new());
    svc.subscribe(recorder.clone());
    (svc, recorder)
}

pub async fn seed_org(svc: &WorkflowService) -> Organization {
    let org = svc
        .create_organization("Acme", "acme", None)
        .await
        .unwrap();
    svc.add_member(&org.id, "admin-1", MemberRole::Admin, None)
        .await
        .unwrap();
    org
}

pub async fn seed_problem(svc: &WorkflowService, org_id: &str) -> Problem {
    svc.create_problem(NewProblem {
        organization_id: org_id.to_string(),
        title: "Checkout is slow".into(),
        description: "p99 above 8s".into(),
        priority: Priority::High,
        created_by: None,
        repository_ids: Vec::new(),
        workflow_id: None,
    })
    .await
    .unwrap()
}

pub async fn seed_task(svc: &WorkflowService, problem_id: &str, title: &str) -> Task {
    svc.create_task(NewTask::new(problem_id, title))
        .await
        .unwrap()
}
