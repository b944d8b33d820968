//! Stage executor
//!
//! Runs a [`StageGraph`] against an output map. A stage is dispatched once
//! all of its prerequisites have stored their output; up to
//! `max_concurrent` stages are in flight at once. Outputs are written only
//! by the executing task, between awaits, so dropping the run future never
//! leaves a half-written map.
//!
//! The first gateway failure stops dispatch and drops every in-flight
//! request. Outputs stored before the failure was observed are kept.

use crate::error::ExecutionError;
use crate::events::{percent, EventSink};
use crate::graph::{Stage, StageGraph};
use futures::stream::{FuturesUnordered, StreamExt};
use specflow_artifact::{OutputMap, StageId};
use specflow_gateway::{Gateway, GatewayError, ModelId, SharedGateway, TemplateContext};
use std::collections::HashSet;
use std::time::Instant;

/// Job fields templates may read
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInput<'a> {
    /// Job title
    pub title: &'a str,
    /// Job description
    pub description: &'a str,
    /// Rendered references
    pub references: &'a str,
}

/// Summary of a successful execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Stages in the order their outputs were stored
    pub completed: Vec<StageId>,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

/// Executes stage graphs through a gateway
#[derive(Clone)]
pub struct StageExecutor {
    gateway: SharedGateway,
    default_model: ModelId,
    max_concurrent: usize,
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor")
            .field("default_model", &self.default_model)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl StageExecutor {
    /// Create new executor
    #[inline]
    #[must_use]
    pub fn new(gateway: SharedGateway, default_model: ModelId) -> Self {
        Self {
            gateway,
            default_model,
            max_concurrent: 1,
        }
    }

    /// Set the concurrency bound; zero is treated as one
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Concurrency bound
    #[inline]
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run every stage of `graph`, storing results in `outputs`
    ///
    /// # Errors
    /// `ExecutionError::Gateway` for the first stage whose gateway call
    /// failed. `outputs` then holds exactly the stages stored before it.
    pub async fn execute(
        &self,
        graph: &StageGraph,
        input: StageInput<'_>,
        outputs: &mut OutputMap,
        events: &EventSink,
    ) -> Result<ExecutionReport, ExecutionError> {
        let start = Instant::now();
        let total = graph.len();
        let mut done: HashSet<StageId> = HashSet::with_capacity(total);
        let mut launched: HashSet<StageId> = HashSet::with_capacity(total);
        let mut completed = Vec::with_capacity(total);
        let mut in_flight = FuturesUnordered::new();

        loop {
            for stage in graph.stages() {
                if in_flight.len() >= self.max_concurrent {
                    break;
                }
                if launched.contains(stage.id())
                    || !stage.prerequisites().iter().all(|p| done.contains(p))
                {
                    continue;
                }

                let prompt = render(stage, input, outputs);
                let model = stage.model().unwrap_or(&self.default_model).clone();
                let gateway = self.gateway.clone();
                let id = stage.id().clone();
                tracing::debug!(stage = %id, model = %model, "dispatching stage");

                launched.insert(id.clone());
                in_flight.push(async move {
                    let result = gateway.generate(&prompt, &model).await;
                    (id, result)
                });
                events.progress(stage.label(), percent(done.len(), total));
            }

            let Some((id, result)) = in_flight.next().await else {
                break;
            };
            match result {
                Ok(text) => {
                    tracing::debug!(stage = %id, chars = text.len(), "stage complete");
                    outputs.insert(id.clone(), text);
                    done.insert(id.clone());
                    let label = graph.get(id.as_str()).map_or(id.as_str(), Stage::label);
                    events.step_complete(label);
                    completed.push(id);
                }
                Err(source) => {
                    tracing::warn!(stage = %id, error = %source, "stage failed, aborting run");
                    return Err(stage_failed(id, source));
                }
            }
        }

        Ok(ExecutionReport {
            completed,
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn render(stage: &Stage, input: StageInput<'_>, outputs: &OutputMap) -> String {
    stage.template().render(&TemplateContext {
        title: input.title,
        description: input.description,
        references: input.references,
        outputs: Some(outputs),
    })
}

fn stage_failed(stage: StageId, source: GatewayError) -> ExecutionError {
    ExecutionError::Gateway { stage, source }
}
