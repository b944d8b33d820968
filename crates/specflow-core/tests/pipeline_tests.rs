use pretty_assertions::assert_eq;
use specflow_artifact::{Job, Status};
use specflow_core::stages::{BUSINESS, CROSS_REVIEW, EXECUTIVE, REQUIREMENTS, TECHNICAL};
use specflow_core::{ErrorKind, Orchestrator, Reconciled, Specflow, SpecflowConfig};
use specflow_gateway::GatewayError;
use specflow_kernel::events::drain;
use specflow_kernel::{EventSink, ProgressEvent, StageGraph, StageSpec};
use specflow_test_utils::{sample_job, test_model, Reply, ScriptedGateway};
use std::sync::Arc;
use std::time::Duration;

fn a_then_b() -> StageGraph {
    StageGraph::builder()
        .stage(StageSpec::new("A", "Stage A", "[A] {{title}}: {{description}}"))
        .stage(StageSpec::new("B", "Stage B", "[B] {{output.A}}").after(["A"]))
        .build()
        .unwrap()
}

#[tokio::test]
async fn two_stage_success() {
    let gw = Arc::new(ScriptedGateway::new().reply("[A]", "foo").reply("[B]", "bar"));
    let orchestrator = Orchestrator::with_graph(a_then_b(), gw.clone(), test_model());
    let mut job = Job::new("Portal", "desc");
    let (events, mut rx) = EventSink::channel();

    orchestrator.run(&mut job, &events).await.unwrap();

    assert_eq!(job.status, Status::Completed);
    assert_eq!(job.output("A"), Some("foo"));
    assert_eq!(job.output("B"), Some("bar"));
    assert_eq!(job.outputs.len(), 2);
    assert_eq!(job.active_run, None);
    assert_eq!(gw.prompts(), vec!["[A] Portal: desc".to_string(), "[B] foo".to_string()]);
    assert_eq!(
        drain(&mut rx),
        vec![
            ProgressEvent::Progress { label: "Stage A".into(), percent: 0 },
            ProgressEvent::StepComplete { label: "Stage A".into() },
            ProgressEvent::Progress { label: "Stage B".into(), percent: 50 },
            ProgressEvent::StepComplete { label: "Stage B".into() },
        ]
    );
}

#[tokio::test]
async fn two_stage_failure_keeps_completed_output() {
    let gw = Arc::new(
        ScriptedGateway::new()
            .reply("[A]", "foo")
            .fail("[B]", GatewayError::Unavailable("quota".into())),
    );
    let orchestrator = Orchestrator::with_graph(a_then_b(), gw, test_model());
    let mut job = Job::new("Portal", "desc");

    let err = orchestrator.run(&mut job, &EventSink::disabled()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GatewayFailure);
    assert_eq!(job.status, Status::Failed);
    assert_eq!(job.outputs.len(), 1);
    assert_eq!(job.output("A"), Some("foo"));
    assert_eq!(job.active_run, None);
}

#[tokio::test]
async fn rerun_starts_from_empty_outputs() {
    let gw = Arc::new(ScriptedGateway::new().reply("[A]", "foo").reply("[B]", "bar"));
    let orchestrator = Orchestrator::with_graph(a_then_b(), gw, test_model());
    let mut job = Job::new("Portal", "desc");
    job.set_output("stale".into(), "old".into());

    orchestrator.run(&mut job, &EventSink::disabled()).await.unwrap();
    assert_eq!(job.output("stale"), None);
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_for_same_job_is_rejected() {
    let gw = Arc::new(
        ScriptedGateway::new()
            .with_fallback(Reply::text("ok"))
            .with_latency(Duration::from_millis(100)),
    );
    let orchestrator = Orchestrator::with_graph(a_then_b(), gw, test_model());
    let mut first = Job::new("Portal", "desc");
    let mut second = first.clone();
    let events = EventSink::disabled();

    let (r1, r2) = tokio::join!(
        orchestrator.run(&mut first, &events),
        orchestrator.run(&mut second, &events)
    );

    assert!(r1.is_ok());
    assert_eq!(r2.unwrap_err().kind(), ErrorKind::StateConflict);
    assert_eq!(second.status, Status::New);
    assert!(second.outputs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropped_run_leaves_reconcilable_state() {
    let gw = Arc::new(
        ScriptedGateway::new()
            .reply("[A]", "foo")
            .reply("[B]", "bar")
            .delayed(Duration::from_secs(60)),
    );
    let specflow = Specflow::with_graph(SpecflowConfig::default(), gw, a_then_b()).unwrap();
    let mut job = Job::new("Portal", "desc");

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        specflow.run_pipeline(&mut job, &EventSink::disabled()),
    )
    .await;
    assert!(outcome.is_err());

    assert_eq!(job.status, Status::Running);
    assert!(job.active_run.is_some());
    assert_eq!(job.output("A"), Some("foo"));
    assert_eq!(job.output("B"), None);

    assert_eq!(specflow.reconcile(&mut job), Reconciled::Reset);
    assert_eq!(job.status, Status::New);
    assert_eq!(specflow.reconcile(&mut job), Reconciled::Clean);
}

#[tokio::test]
async fn default_graph_runs_every_stage() {
    let gw = Arc::new(
        ScriptedGateway::new()
            .reply("Write a technical analysis", "TECH")
            .reply("Write a business analysis", "BIZ")
            .reply("Review the technical and business", "REVIEW")
            .reply("Derive a numbered list", "REQS")
            .reply("Write a one-page executive", "EXEC"),
    );
    let specflow = Specflow::new(SpecflowConfig::default(), gw.clone()).unwrap();
    let mut job = sample_job();

    specflow.run_pipeline(&mut job, &EventSink::disabled()).await.unwrap();

    assert_eq!(job.status, Status::Completed);
    for (stage, text) in [
        (TECHNICAL, "TECH"),
        (BUSINESS, "BIZ"),
        (CROSS_REVIEW, "REVIEW"),
        (REQUIREMENTS, "REQS"),
        (EXECUTIVE, "EXEC"),
    ] {
        assert_eq!(job.output(stage), Some(text), "{stage}");
    }
    assert!(gw.finished_before("Write a technical analysis", "Review the technical"));
    assert!(gw.finished_before("Write a business analysis", "Review the technical"));
    assert!(gw.finished_before("Derive a numbered list", "Write a one-page executive"));

    let tech_prompt = &gw.calls_matching("Write a technical analysis")[0].prompt;
    assert!(tech_prompt.contains("### api.md (docs/api.md)"));
    assert!(tech_prompt.contains("Folder: docs/"));
}
