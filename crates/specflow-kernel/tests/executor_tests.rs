use pretty_assertions::assert_eq;
use proptest::prelude::*;
use specflow_artifact::{OutputMap, StageId};
use specflow_gateway::GatewayError;
use specflow_kernel::events::drain;
use specflow_kernel::{
    EventSink, ProgressEvent, StageExecutor, StageGraph, StageInput, StageSpec,
};
use specflow_test_utils::{test_model, ScriptedGateway};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn diamond() -> StageGraph {
    StageGraph::builder()
        .stage(StageSpec::new("a", "A", "[a] {{description}}"))
        .stage(StageSpec::new("b", "B", "[b] {{output.a}}").after(["a"]))
        .stage(StageSpec::new("c", "C", "[c] {{output.a}}").after(["a"]))
        .stage(StageSpec::new("d", "D", "[d] {{output.b}} {{output.c}}").after(["b", "c"]))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn stages_wait_for_all_prerequisites() {
    let gw = Arc::new(
        ScriptedGateway::new()
            .reply("[a]", "A")
            .reply("[b]", "B")
            .delayed(Duration::from_millis(300))
            .reply("[c]", "C")
            .delayed(Duration::from_millis(50))
            .reply("[d]", "D"),
    );
    let exec = StageExecutor::new(gw.clone(), test_model()).with_max_concurrent(4);
    let mut outputs = OutputMap::new();

    exec.execute(&diamond(), StageInput::default(), &mut outputs, &EventSink::disabled())
        .await
        .unwrap();

    assert!(gw.finished_before("[a]", "[b]"));
    assert!(gw.finished_before("[a]", "[c]"));
    assert!(gw.finished_before("[b]", "[d]"));
    assert!(gw.finished_before("[c]", "[d]"));
    assert_eq!(gw.max_in_flight(), 2);
    assert_eq!(gw.calls_matching("[d]")[0].prompt, "[d] B C");
    assert_eq!(outputs.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn concurrency_is_bounded() {
    let mut builder = StageGraph::builder();
    for i in 0..6 {
        builder = builder.stage(StageSpec::new(format!("s{i}").as_str(), "S", format!("[s{i}]")));
    }
    let graph = builder.build().unwrap();
    let gw = Arc::new(
        ScriptedGateway::new()
            .with_fallback(specflow_test_utils::Reply::text("ok"))
            .with_latency(Duration::from_millis(100)),
    );
    let exec = StageExecutor::new(gw.clone(), test_model()).with_max_concurrent(2);
    let mut outputs = OutputMap::new();

    exec.execute(&graph, StageInput::default(), &mut outputs, &EventSink::disabled())
        .await
        .unwrap();

    assert_eq!(gw.call_count(), 6);
    assert_eq!(gw.max_in_flight(), 2);
}

#[tokio::test]
async fn progress_events_follow_dispatch_and_store() {
    let graph = StageGraph::builder()
        .stage(StageSpec::new("A", "Alpha", "[A]"))
        .stage(StageSpec::new("B", "Beta", "[B] {{output.A}}").after(["A"]))
        .build()
        .unwrap();
    let gw = Arc::new(ScriptedGateway::new().reply("[A]", "foo").reply("[B]", "bar"));
    let exec = StageExecutor::new(gw, test_model());
    let (sink, mut rx) = EventSink::channel();
    let mut outputs = OutputMap::new();

    exec.execute(&graph, StageInput::default(), &mut outputs, &sink)
        .await
        .unwrap();

    assert_eq!(
        drain(&mut rx),
        vec![
            ProgressEvent::Progress { label: "Alpha".into(), percent: 0 },
            ProgressEvent::StepComplete { label: "Alpha".into() },
            ProgressEvent::Progress { label: "Beta".into(), percent: 50 },
            ProgressEvent::StepComplete { label: "Beta".into() },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failure_drops_in_flight_and_pending_stages() {
    let graph = StageGraph::builder()
        .stage(StageSpec::new("fast", "Fast", "[fast]"))
        .stage(StageSpec::new("slow", "Slow", "[slow]"))
        .stage(StageSpec::new("last", "Last", "[last] {{output.slow}}").after(["slow"]))
        .build()
        .unwrap();
    let gw = Arc::new(
        ScriptedGateway::new()
            .fail("[fast]", GatewayError::Timeout { after_ms: 10 })
            .reply("[slow]", "late")
            .delayed(Duration::from_secs(5))
            .reply("[last]", "never"),
    );
    let exec = StageExecutor::new(gw.clone(), test_model()).with_max_concurrent(2);
    let mut outputs = OutputMap::new();

    let err = exec
        .execute(&graph, StageInput::default(), &mut outputs, &EventSink::disabled())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), &StageId::new("fast"));
    assert!(outputs.is_empty());
    assert!(gw.calls_matching("[last]").is_empty());
}

proptest! {
    #[test]
    fn prop_forward_edges_build_and_order(
        n in 1..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..40)
    ) {
        let mut prereqs: HashMap<usize, Vec<String>> = HashMap::new();
        for (x, y) in edges {
            let (lo, hi) = (x.min(y), x.max(y));
            if lo != hi && hi < n {
                prereqs.entry(hi).or_default().push(format!("s{lo}"));
            }
        }
        let mut builder = StageGraph::builder();
        for i in 0..n {
            let deps = prereqs.get(&i).cloned().unwrap_or_default();
            builder = builder.stage(
                StageSpec::new(format!("s{i}").as_str(), "S", "").after(deps.iter().map(String::as_str)),
            );
        }
        let graph = builder.build().unwrap();
        let order: Vec<String> = graph.order().iter().map(|s| s.to_string()).collect();
        prop_assert_eq!(order.len(), n);
        for stage in graph.stages() {
            let pos = order.iter().position(|s| s == stage.id().as_str()).unwrap();
            for p in stage.prerequisites() {
                let ppos = order.iter().position(|s| s == p.as_str()).unwrap();
                prop_assert!(ppos < pos);
            }
        }
    }
}
