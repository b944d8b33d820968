//! Specflow Core
//!
//! Document analysis pipeline, requirement grading and version history
//! over the specflow kernel.
//!
//! # Core Operations
//!
//! - **Pipeline**: [`Orchestrator::run`] runs a job through the stage graph
//! - **Grading**: [`GradingEngine::grade_requirements`] then
//!   [`GradingEngine::review_team_readiness`]
//! - **Versions**: [`versions::create_version`], [`versions::delete_version`],
//!   [`versions::compare_snapshots`]
//! - **Reconciliation**: [`Reconciler`] resets stale `running` state on load
//!
//! # Example
//!
//! ```rust,ignore
//! use specflow_core::{Specflow, SpecflowConfig};
//! use specflow_kernel::EventSink;
//!
//! # async fn example(gateway: specflow_gateway::SharedGateway) -> Result<(), specflow_core::CoreError> {
//! let specflow = Specflow::new(SpecflowConfig::default(), gateway)?;
//! let mut job = specflow_artifact::Job::new("Portal", "Customer self-service portal");
//! let (events, mut rx) = EventSink::channel();
//! specflow.run_pipeline(&mut job, &events).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod grading;
pub mod pipeline;
pub mod reconcile;
mod response;
pub mod service;
pub mod stages;
pub mod versions;

pub use config::{SpecflowConfig, TeamReadyScope};
pub use error::{CoreError, ErrorKind};
pub use grading::GradingEngine;
pub use pipeline::Orchestrator;
pub use reconcile::{Reconciled, Reconciler};
pub use service::Specflow;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts embedding specflow
    pub use crate::config::{SpecflowConfig, TeamReadyScope};
    pub use crate::error::{CoreError, ErrorKind};
    pub use crate::service::Specflow;
    pub use specflow_artifact::{GradingJob, Job, Requirement, Status, VersionDetails};
    pub use specflow_gateway::{Gateway, GatewayError, ModelId, SharedGateway};
    pub use specflow_kernel::{EventSink, ProgressEvent};
}
