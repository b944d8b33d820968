//! Pipeline orchestrator
//!
//! Runs a job through a stage graph. The job moves `new → running →
//! completed | failed`; outputs are reset at the start of a run and hold
//! exactly the stages that finished when it ends.

use crate::error::CoreError;
use crate::stages::default_graph;
use specflow_artifact::{render_references, Job, Status};
use specflow_gateway::{ModelId, SharedGateway};
use specflow_kernel::{
    EventSink, ExecutionReport, RunRegistry, Stage, StageExecutor, StageGraph, StageInput,
};

/// Drives jobs through the analysis graph
#[derive(Debug, Clone)]
pub struct Orchestrator {
    graph: StageGraph,
    executor: StageExecutor,
    registry: RunRegistry,
}

impl Orchestrator {
    /// Create new orchestrator over the default graph
    ///
    /// # Errors
    /// `CoreError::Graph` if the default graph is inconsistent.
    pub fn new(gateway: SharedGateway, model: ModelId) -> Result<Self, CoreError> {
        Ok(Self::with_graph(default_graph()?, gateway, model))
    }

    /// Create new orchestrator over a custom graph
    #[must_use]
    pub fn with_graph(graph: StageGraph, gateway: SharedGateway, model: ModelId) -> Self {
        Self {
            graph,
            executor: StageExecutor::new(gateway, model),
            registry: RunRegistry::new(),
        }
    }

    /// Set the stage concurrency bound
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.executor = self.executor.with_max_concurrent(max);
        self
    }

    /// Share a run registry with other components
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Stage graph in use
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Run registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Stage groups in execution order
    #[must_use]
    pub fn plan(&self) -> Vec<Vec<&Stage>> {
        self.graph.layers()
    }

    /// Run every stage for `job`
    ///
    /// On success the job is `completed` and every stage id is in its
    /// outputs. On gateway failure the job is `failed`, its outputs hold
    /// the stages that completed, and the failure is returned.
    ///
    /// # Errors
    /// - `CoreError::Run` if a run for this job is already active; the job
    ///   is left untouched
    /// - `CoreError::Execution` when a stage fails
    pub async fn run(&self, job: &mut Job, events: &EventSink) -> Result<ExecutionReport, CoreError> {
        let guard = self.registry.begin(job.id.0)?;
        tracing::info!(job = %job.id, version = job.version, stages = self.graph.len(), "pipeline started");

        job.status = Status::Running;
        job.active_run = Some(guard.token());
        job.outputs.clear();
        job.touch();

        let references = render_references(&job.references);
        let input = StageInput {
            title: &job.title,
            description: &job.description,
            references: &references,
        };
        let result = self
            .executor
            .execute(&self.graph, input, &mut job.outputs, events)
            .await;

        job.active_run = None;
        job.touch();
        drop(guard);

        match result {
            Ok(report) => {
                job.status = Status::Completed;
                tracing::info!(job = %job.id, elapsed_ms = report.elapsed_ms, "pipeline completed");
                Ok(report)
            }
            Err(e) => {
                job.status = Status::Failed;
                tracing::error!(job = %job.id, error = %e, completed = job.outputs.len(), "pipeline failed");
                Err(e.into())
            }
        }
    }
}
