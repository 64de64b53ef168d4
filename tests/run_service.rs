// tests/run_service.rs

mod common;

use std::sync::Arc;

use common::{FAST_POLL, init_tracing, shell_context, with_timeout};
use futures_util::StreamExt;
use runvisor::context::ExecutionContext;
use runvisor::errors::RunvisorError;
use runvisor::manager::RunManager;
use runvisor::service::messages::{RUN_NOT_FOUND, STATUS_CHECKED, STATUS_ERROR};
use runvisor::service::{ManagerFactory, RunIdRequest, RunParams, RunService};
use runvisor::types::{COMPLETED_RUN, RunArgs, RunId};
use runvisor_test_utils::scripted_manager::ScriptedFactory;

fn scripted_service(factory: &ScriptedFactory) -> RunService {
    RunService::new(shell_context(&[("b", "true"), ("a", "true")]))
        .with_factory(Arc::new(factory.clone()))
        .with_poll_interval(FAST_POLL)
}

fn request(run_id: &str) -> RunIdRequest {
    RunIdRequest {
        run_id: run_id.to_string(),
    }
}

#[test]
fn test_list_pipelines_is_sorted() {
    let factory = ScriptedFactory::new(vec![], Some(0));
    let service = scripted_service(&factory);

    assert_eq!(service.list_pipelines().names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_unknown_run_yields_exactly_one_error_message() {
    init_tracing();
    let factory = ScriptedFactory::new(vec![], Some(0));
    let service = scripted_service(&factory);

    let messages: Vec<_> = with_timeout(service.status(request("does-not-exist")).collect()).await;

    assert_eq!(messages.len(), 1);
    let msg = &messages[0];
    assert_eq!(msg.run_id, "does-not-exist");
    assert_eq!(msg.run_status, STATUS_ERROR);
    assert_eq!(msg.success, RUN_NOT_FOUND);
    assert!(msg.events.is_empty());
    assert!(msg.exit_code.is_empty());
    assert!(factory.created().is_empty());
}

#[tokio::test]
async fn test_run_registers_and_starts_before_returning() {
    init_tracing();
    let factory = ScriptedFactory::new(vec![vec!["work"]], Some(0));
    let service = scripted_service(&factory);

    let summary = service.run(RunParams::new("a").with_tag("nightly")).unwrap();

    assert_eq!(summary.success, format!("Run {} dispatched", summary.run_id));
    assert!(service.registry().contains(&RunId::from(summary.run_id.as_str())));

    let created = factory.created();
    assert_eq!(created.len(), 1);
    assert!(created[0].is_started());
    assert_eq!(created[0].args().pipeline, "a");
    assert_eq!(created[0].args().tags, vec!["nightly"]);
}

#[tokio::test]
async fn test_status_stream_polls_until_completed() {
    init_tracing();
    let factory = ScriptedFactory::new(vec![vec!["one"], vec![], vec!["two", "three"]], Some(0));
    let service = scripted_service(&factory);
    let summary = service.run(RunParams::new("a")).unwrap();

    let messages: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;

    let statuses: Vec<&str> = messages.iter().map(|m| m.run_status.as_str()).collect();
    assert_eq!(statuses, vec!["Pending", "Pending", "Completed"]);
    assert!(messages.iter().all(|m| m.success == STATUS_CHECKED));
    assert!(messages.iter().all(|m| m.run_id == summary.run_id));

    let last = messages.last().unwrap();
    assert!(last.is_terminal());
    assert_eq!(last.events, vec!["one", "two", "three"]);
    assert_eq!(last.exit_code, "0");
    assert!(messages[..2].iter().all(|m| m.exit_code.is_empty()));

    assert_eq!(factory.created()[0].polls(), 3);
}

#[tokio::test]
async fn test_status_of_completed_run_is_one_terminal_message() {
    init_tracing();
    let factory = ScriptedFactory::new(vec![vec!["only"]], Some(2));
    let service = scripted_service(&factory);
    let summary = service.run(RunParams::new("a")).unwrap();

    let first: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;
    let second: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;

    assert_eq!(first.len(), 1);
    assert_eq!(second, first);
    assert_eq!(second[0].exit_code, "2");
}

#[tokio::test]
async fn test_dropping_the_stream_leaves_the_run_alone() {
    init_tracing();
    let factory = ScriptedFactory::new(vec![vec![], vec![], vec!["late"]], Some(0));
    let service = scripted_service(&factory);
    let summary = service.run(RunParams::new("a")).unwrap();

    let mut stream = Box::pin(service.status(request(&summary.run_id)));
    let first = with_timeout(stream.next()).await.unwrap();
    assert_eq!(first.run_status, "Pending");
    drop(stream);

    // A fresh stream resumes from the manager's current state.
    let rest: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;
    assert_eq!(rest.last().unwrap().events, vec!["late"]);
}

#[tokio::test]
async fn test_runs_share_the_registry_across_clones() {
    let factory = ScriptedFactory::new(vec![vec!["x"]], Some(0));
    let service = scripted_service(&factory);
    let clone = service.clone();

    let a = service.run(RunParams::new("a")).unwrap();
    let b = clone.run(RunParams::new("b")).unwrap();

    assert_ne!(a.run_id, b.run_id);
    assert_eq!(service.registry().len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_worker_through_service() {
    init_tracing();
    let service = common::fast_service(&[("hello", "echo hello; sleep 0.1; echo bye")]);
    let summary = service.run(RunParams::new("hello")).unwrap();

    let messages: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;

    let last = messages.last().unwrap();
    assert_eq!(last.run_status, "Completed");
    assert_eq!(last.exit_code, "0");
    assert!(last.events.contains(&"hello".to_string()));
    assert!(last.events.contains(&"bye".to_string()));
    assert_eq!(last.events.last().map(String::as_str), Some(COMPLETED_RUN));
    assert!(
        messages[..messages.len() - 1]
            .iter()
            .all(|m| m.run_status == "Pending")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_unknown_pipeline_is_a_failed_run_not_a_service_error() {
    init_tracing();
    let service = common::fast_service(&[("hello", "echo hello")]);

    let summary = service.run(RunParams::new("missing")).unwrap();
    let messages: Vec<_> = with_timeout(service.status(request(&summary.run_id)).collect()).await;

    let last = messages.last().unwrap();
    assert_eq!(last.run_status, "Completed");
    assert!(last.exit_code.is_empty());
    assert!(last.events.iter().any(|e| e.starts_with("Failed to start worker")));
}

#[tokio::test]
async fn test_start_failure_is_propagated() {
    // A factory whose manager was already started: `start` inside `run` fails.
    let factory = ScriptedFactory::new(vec![vec!["x"]], Some(0));
    let prestarted = {
        let factory = factory.clone();
        move |ctx: Arc<dyn ExecutionContext>, args: RunArgs| -> Arc<dyn RunManager> {
            let manager = factory.create(ctx, args);
            manager.start().unwrap();
            manager
        }
    };
    let service = RunService::new(shell_context(&[("a", "true")])).with_factory(Arc::new(prestarted));

    match service.run(RunParams::new("a")) {
        Err(RunvisorError::AlreadyStarted(_)) => {}
        other => panic!("Expected AlreadyStarted, got: {:?}", other),
    }
    // The run stays registered so its id can still be looked up.
    assert_eq!(service.registry().len(), 1);
}

#[tokio::test]
async fn test_status_stream_outlives_the_service_handle() {
    let factory = ScriptedFactory::new(vec![vec!["x"], vec!["y"]], Some(0));
    let service = scripted_service(&factory);
    let summary = service.run(RunParams::new("a")).unwrap();

    let stream = service.status(request(&summary.run_id));
    drop(service);
    let handle = tokio::spawn(stream.collect::<Vec<_>>());

    let messages = with_timeout(handle).await.unwrap();
    assert_eq!(messages.last().unwrap().events, vec!["x", "y"]);
}
