//! Error types for graph construction, execution and run bookkeeping

use specflow_artifact::StageId;
use specflow_gateway::{GatewayError, TemplateError};
use ulid::Ulid;

/// Stage graph rejected at build time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two stages share an id
    #[error("duplicate stage id: {0}")]
    DuplicateStage(StageId),

    /// A prerequisite names no declared stage
    #[error("stage {stage} depends on unknown stage {prerequisite}")]
    UnknownPrerequisite {
        /// Dependent stage
        stage: StageId,
        /// Missing prerequisite
        prerequisite: StageId,
    },

    /// A stage lists itself as prerequisite
    #[error("stage {0} depends on itself")]
    SelfDependency(StageId),

    /// Prerequisites form a cycle
    #[error("dependency cycle through stage {0}")]
    Cycle(StageId),

    /// Template failed to compile
    #[error("stage {stage} template: {source}")]
    Template {
        /// Stage owning the template
        stage: StageId,
        /// Compile error
        #[source]
        source: TemplateError,
    },

    /// Template reads an output the stage does not depend on
    #[error("stage {stage} reads output of {input}, which is not a prerequisite")]
    UndeclaredInput {
        /// Stage owning the template
        stage: StageId,
        /// Referenced stage
        input: StageId,
    },
}

/// Stage execution aborted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Gateway failed or timed out for a stage
    #[error("stage {stage} failed: {source}")]
    Gateway {
        /// Failing stage
        stage: StageId,
        /// Gateway failure
        #[source]
        source: GatewayError,
    },
}

impl ExecutionError {
    /// Stage that failed
    #[must_use]
    pub fn stage(&self) -> &StageId {
        match self {
            Self::Gateway { stage, .. } => stage,
        }
    }
}

/// Run bookkeeping conflict
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// A run is already active for the unit
    #[error("a run is already active for {0}")]
    AlreadyRunning(Ulid),
}
