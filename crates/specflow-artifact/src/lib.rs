//! Specflow Artifact Model
//!
//! Plain, serializable records for every unit of work the pipeline and the
//! grading engine operate on, plus the append-only version history.
//!
//! # Core Concepts
//!
//! - [`Job`]: analysis unit of work with an output map and version history
//! - [`VersionSnapshot`]: immutable capture of a job at one version
//! - [`SnapshotDiff`]: result of [`compare_snapshots`]
//! - [`Requirement`]: one extracted requirement
//! - [`GradingJob`]: requirement grading unit of work with two passes
//!
//! # Example
//!
//! ```rust
//! use specflow_artifact::{Job, VersionDetails};
//!
//! let job = Job::new("Portal", "Customer self-service portal");
//! let v2 = job
//!     .create_version(VersionDetails::new().with_reason("new scope"), true)
//!     .unwrap();
//! assert_eq!(v2.version, 2);
//! assert_eq!(v2.history().len(), 1);
//! ```

#![warn(unreachable_pub)]

mod grading;
mod ids;
mod job;
mod reference;
mod requirement;
mod snapshot;
mod status;
mod unit;

pub use grading::{
    GradedRequirement, Grade, GradingJob, InvalidGrade, Team, TeamReadyRequirement,
};
pub use ids::{GradingJobId, JobId, RunToken, StageId};
pub use job::{Job, VersionDetails, VersionError};
pub use reference::{render_references, ReferenceKey, ReferenceMaterial};
pub use requirement::Requirement;
pub use snapshot::{
    compare_snapshots, ChangeCategory, Changelog, ChangelogEntry, OutputMap, SnapshotDiff,
    VersionSnapshot,
};
pub use status::Status;
pub use unit::UnitOfWork;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
