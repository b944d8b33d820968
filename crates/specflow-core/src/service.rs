//! Specflow service
//!
//! Wires the orchestrator, grading engine, parser and reconciler to one
//! gateway and one run registry, configured from [`SpecflowConfig`].

use crate::config::SpecflowConfig;
use crate::error::CoreError;
use crate::grading::GradingEngine;
use crate::pipeline::Orchestrator;
use crate::reconcile::{Reconciled, Reconciler};
use specflow_artifact::{GradingJob, Job, Requirement, UnitOfWork};
use specflow_gateway::{SharedGateway, TimeoutGateway};
use specflow_kernel::{EventSink, ExecutionReport, RunRegistry, StageGraph};
use specflow_parser::{DocumentParser, GatewayNormalizer, PreprocessingParser};
use std::sync::Arc;

/// Entry point for hosts embedding specflow
#[derive(Clone)]
pub struct Specflow {
    config: SpecflowConfig,
    gateway: SharedGateway,
    orchestrator: Orchestrator,
    grading: GradingEngine,
    reconciler: Reconciler,
}

impl std::fmt::Debug for Specflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Specflow")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("grading", &self.grading)
            .finish_non_exhaustive()
    }
}

impl Specflow {
    /// Create new service over the default analysis graph
    ///
    /// Every gateway call is bounded by `gateway_timeout_secs`.
    ///
    /// # Errors
    /// `CoreError::Config` for invalid configuration.
    pub fn new(config: SpecflowConfig, gateway: SharedGateway) -> Result<Self, CoreError> {
        Self::with_graph(config, gateway, crate::stages::default_graph()?)
    }

    /// Create new service over a custom graph
    ///
    /// # Errors
    /// `CoreError::Config` for invalid configuration.
    pub fn with_graph(
        config: SpecflowConfig,
        gateway: SharedGateway,
        graph: StageGraph,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let gateway: SharedGateway = Arc::new(TimeoutGateway::new(gateway, config.gateway_timeout()));
        let registry = RunRegistry::new();
        let model = config.default_model.clone();

        let orchestrator = Orchestrator::with_graph(graph, gateway.clone(), model.clone())
            .with_max_concurrent(config.max_concurrent_stages)
            .with_registry(registry.clone());
        let grading = GradingEngine::new(gateway.clone(), model)
            .with_scope(config.team_ready_scope)
            .with_registry(registry.clone());

        Ok(Self {
            config,
            gateway,
            orchestrator,
            grading,
            reconciler: Reconciler::new(registry),
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SpecflowConfig {
        &self.config
    }

    /// Pipeline orchestrator
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Grading engine
    #[inline]
    #[must_use]
    pub fn grading(&self) -> &GradingEngine {
        &self.grading
    }

    /// Run the analysis pipeline for a job
    ///
    /// # Errors
    /// See [`Orchestrator::run`].
    pub async fn run_pipeline(
        &self,
        job: &mut Job,
        events: &EventSink,
    ) -> Result<ExecutionReport, CoreError> {
        self.orchestrator.run(job, events).await
    }

    /// First grading pass
    ///
    /// # Errors
    /// See [`GradingEngine::grade_requirements`].
    pub async fn grade_requirements(
        &self,
        job: &mut GradingJob,
        events: &EventSink,
    ) -> Result<(), CoreError> {
        self.grading.grade_requirements(job, events).await
    }

    /// Second grading pass
    ///
    /// # Errors
    /// See [`GradingEngine::review_team_readiness`].
    pub async fn review_team_readiness(
        &self,
        job: &mut GradingJob,
        events: &EventSink,
    ) -> Result<(), CoreError> {
        self.grading.review_team_readiness(job, events).await
    }

    /// Deterministic parse
    ///
    /// # Errors
    /// `CoreError::Parse` when nothing could be extracted.
    pub fn parse(&self, text: &str) -> Result<Vec<Requirement>, CoreError> {
        Ok(DocumentParser::new().parse(text)?)
    }

    /// Preprocess through the gateway, then parse and decide
    ///
    /// # Errors
    /// `CoreError::Parse` when neither parse yields anything.
    pub async fn parse_with_preprocessing(&self, text: &str) -> Result<Vec<Requirement>, CoreError> {
        let normalizer = GatewayNormalizer::new(self.gateway.clone(), self.config.default_model.clone())?;
        let outcome = PreprocessingParser::new(normalizer)
            .with_threshold(self.config.preprocess_threshold_chars)
            .parse(text)
            .await?;
        tracing::debug!(source = ?outcome.source, count = outcome.requirements.len(), "preprocessed parse");
        Ok(outcome.requirements)
    }

    /// Reconcile a unit just loaded from storage
    pub fn reconcile<U: UnitOfWork>(&self, unit: &mut U) -> Reconciled {
        self.reconciler.reconcile(unit)
    }
}
