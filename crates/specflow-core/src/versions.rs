//! Version manager
//!
//! Facade over the job history operations with errors mapped to
//! [`CoreError`]. History is append-only: snapshots are only added by
//! [`create_version`] and removed by [`delete_version`].

use crate::error::CoreError;
use specflow_artifact::{Job, SnapshotDiff, VersionDetails};

pub use specflow_artifact::compare_snapshots;

/// Archive the current state and start the next version
///
/// The returned job has the next unused version number (deleted numbers
/// are skipped), one more history entry, empty outputs and status `new`. `include_old_references` unions the old and
/// supplied references; otherwise the supplied ones replace them.
///
/// # Errors
/// `CoreError::Version` (a state conflict) while a run owns the job.
pub fn create_version(
    job: &Job,
    details: VersionDetails,
    include_old_references: bool,
) -> Result<Job, CoreError> {
    let next = job.create_version(details, include_old_references)?;
    tracing::info!(
        job = %job.id,
        from = job.version,
        to = next.version,
        references = next.references.len(),
        "version created"
    );
    Ok(next)
}

/// Remove a version; deleting the current one promotes the latest snapshot
///
/// # Errors
/// `CoreError::Version` when `version` is the sole version, is unknown, or
/// a run owns the job.
pub fn delete_version(job: &Job, version: u32) -> Result<Job, CoreError> {
    let next = job.delete_version(version)?;
    tracing::info!(job = %job.id, deleted = version, current = next.version, "version deleted");
    Ok(next)
}

/// Diff two versions of a job, the current one included
///
/// # Errors
/// `CoreError::Version` for an unknown version.
pub fn compare_versions(job: &Job, older: u32, newer: u32) -> Result<SnapshotDiff, CoreError> {
    Ok(job.compare_versions(older, newer)?)
}
