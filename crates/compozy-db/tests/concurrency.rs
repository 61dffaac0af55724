//! Racing transitions from one snapshot: exactly one writer wins.

use std::sync::Arc;

use compozy_core::entities::Problem;
use compozy_core::enums::{EntityType, EventKind, Priority, ProblemStatus};
use compozy_core::errors::CoreError;
use compozy_db::error::DatabaseError;
use compozy_db::events::RecordingListener;
use compozy_db::repos::problem::NewProblem;
use compozy_db::repos::task::NewTask;
use compozy_db::service::WorkflowService;
use compozy_db::transition::TransitionRequest;

async fn service_with_draft() -> (Arc<WorkflowService>, Arc<RecordingListener>, Problem) {
    let mut svc = WorkflowService::new_local(":memory:").await.unwrap();
    let recorder = Arc::new(RecordingListener::new());
    svc.subscribe(recorder.clone());
    let org = svc
        .create_organization("Acme", "acme", None)
        .await
        .unwrap();
    let problem = svc
        .create_problem(NewProblem {
            organization_id: org.id,
            title: "Race me".into(),
            description: String::new(),
            priority: Priority::Medium,
            created_by: None,
            repository_ids: Vec::new(),
            workflow_id: None,
        })
        .await
        .unwrap();
    (Arc::new(svc), recorder, problem)
}

fn is_lost_race(err: &DatabaseError) -> bool {
    matches!(
        err,
        DatabaseError::Core(
            CoreError::ConcurrentModification { .. } | CoreError::InvalidTransition { .. }
        )
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_racing_transitions_one_wins() {
    let (svc, recorder, snapshot) = service_with_draft().await;
    recorder.clear();

    let a = {
        let svc = Arc::clone(&svc);
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            svc.transition_problem(&snapshot, ProblemStatus::Analyzing, &TransitionRequest::new().by("a"))
                .await
        })
    };
    let b = {
        let svc = Arc::clone(&svc);
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            svc.transition_problem(&snapshot, ProblemStatus::Cancelled, &TransitionRequest::new().by("b"))
                .await
        })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let winner = match (&a, &b) {
        (Ok(w), Err(e)) | (Err(e), Ok(w)) => {
            assert!(is_lost_race(e), "unexpected loser error: {e}");
            w.status
        }
        _ => panic!("expected exactly one winner, got {a:?} and {b:?}"),
    };

    let stored = svc.get_problem(&snapshot.id).await.unwrap();
    assert_eq!(stored.status, winner);
    assert_eq!(stored.version, 2);
    assert_eq!(recorder.events().len(), 1);
    let history = svc
        .transition_history(EntityType::Problem, &snapshot.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn stale_snapshot_with_reachable_target_is_concurrent_modification() {
    let (svc, recorder, snapshot) = service_with_draft().await;
    let req = TransitionRequest::new();

    svc.transition_problem(&snapshot, ProblemStatus::Analyzing, &req)
        .await
        .unwrap();
    let err = svc
        .transition_problem(&snapshot, ProblemStatus::Cancelled, &req)
        .await
        .unwrap_err();
    match err {
        DatabaseError::Core(CoreError::ConcurrentModification {
            expected_version, ..
        }) => assert_eq!(expected_version, 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        svc.get_problem(&snapshot.id).await.unwrap().status,
        ProblemStatus::Analyzing
    );
    assert_eq!(recorder.count_of(EventKind::Transitioned), 1);
}

#[tokio::test]
async fn stale_snapshot_with_unreachable_target_reports_current_status() {
    let (svc, _, snapshot) = service_with_draft().await;
    let req = TransitionRequest::new();

    svc.cancel_problem(&snapshot, &req).await.unwrap();
    let err = svc
        .start_analysis(&snapshot, &req)
        .await
        .unwrap_err();
    match err {
        DatabaseError::Core(CoreError::InvalidTransition { from, to, .. }) => {
            assert_eq!(from, "cancelled");
            assert_eq!(to, "analyzing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_writers_same_target_single_event() {
    let (svc, recorder, snapshot) = service_with_draft().await;
    recorder.clear();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = Arc::clone(&svc);
            let snapshot = snapshot.clone();
            tokio::spawn(async move {
                svc.transition_problem(&snapshot, ProblemStatus::Analyzing, &TransitionRequest::new())
                    .await
            })
        })
        .collect();
    for handle in handles {
        let problem = handle.await.unwrap().unwrap();
        assert_eq!(problem.status, ProblemStatus::Analyzing);
    }

    assert_eq!(svc.get_problem(&snapshot.id).await.unwrap().version, 2);
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_during_transitions_see_status_and_version_together() {
    let (svc, _, snapshot) = service_with_draft().await;

    let writer = {
        let svc = Arc::clone(&svc);
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            let req = TransitionRequest::new();
            let analyzing = svc
                .transition_problem(&snapshot, ProblemStatus::Analyzing, &req)
                .await
                .unwrap();
            svc.transition_problem(&analyzing, ProblemStatus::PrdGeneration, &req)
                .await
                .unwrap()
        })
    };
    let reader = {
        let svc = Arc::clone(&svc);
        let id = snapshot.id.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..50 {
                let p = svc.get_problem(&id).await.unwrap();
                seen.push((p.status, p.version));
                tokio::task::yield_now().await;
            }
            seen
        })
    };

    let last = writer.await.unwrap();
    assert_eq!(last.version, 3);
    for (status, version) in reader.await.unwrap() {
        let expected = match status {
            ProblemStatus::Draft => 1,
            ProblemStatus::Analyzing => 2,
            ProblemStatus::PrdGeneration => 3,
            other => panic!("unexpected status {other}"),
        };
        assert_eq!(version, expected, "{status}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dependency_deleted_while_creating_is_validation_error() {
    let (svc, _, problem) = service_with_draft().await;
    let dep = svc.create_task(NewTask::new(&problem.id, "schema")).await.unwrap();

    let creator = {
        let svc = Arc::clone(&svc);
        let mut new = NewTask::new(&problem.id, "backfill");
        new.dependencies = vec![dep.id.clone()];
        tokio::spawn(async move { svc.create_task(new).await })
    };
    let deleter = {
        let svc = Arc::clone(&svc);
        let id = dep.id.clone();
        tokio::spawn(async move { svc.delete_task(&id).await })
    };

    deleter.await.unwrap().unwrap();
    match creator.await.unwrap() {
        Ok(task) => {
            // Created first; the delete then cascaded the edge away.
            let stored = svc.get_task(&task.id).await.unwrap();
            assert!(stored.dependencies.is_empty());
        }
        Err(err) => assert!(
            matches!(err, DatabaseError::Core(CoreError::Validation(_))),
            "{err:?}"
        ),
    }
}
