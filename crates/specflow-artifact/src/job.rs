//! Analysis jobs and their version history
//!
//! A [`Job`] carries its current mutable state plus an append-only list of
//! [`VersionSnapshot`]s. History is only changed through
//! [`Job::create_version`] and [`Job::delete_version`].

use crate::ids::{JobId, RunToken, StageId};
use crate::reference::ReferenceMaterial;
use crate::snapshot::{compare_snapshots, Changelog, OutputMap, SnapshotDiff, VersionSnapshot};
use crate::status::Status;
use crate::unit::UnitOfWork;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ulid::Ulid;

/// Top-level unit of work for the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Identity, preserved across versions
    pub id: JobId,
    /// Title
    pub title: String,
    /// Free-form project description
    pub description: String,
    /// Reference folders and files
    pub references: Vec<ReferenceMaterial>,
    /// Generated text per stage
    pub outputs: OutputMap,
    /// Lifecycle status
    pub status: Status,
    /// Current version, starting at 1
    pub version: u32,
    /// Lowest version number never handed out; 0 when not yet recorded
    #[serde(default)]
    next_version: u32,
    /// Why the current version was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_reason: Option<String>,
    /// Structured changelog of the current version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
    /// Token of the run that owns the outputs, while one is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_run: Option<RunToken>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    history: Vec<VersionSnapshot>,
}

/// New inputs for [`Job::create_version`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionDetails {
    /// Replacement title (kept when `None`)
    pub title: Option<String>,
    /// Replacement description (kept when `None`)
    pub description: Option<String>,
    /// References supplied for the new version
    pub references: Vec<ReferenceMaterial>,
    /// Why the version is created
    pub change_reason: Option<String>,
    /// Structured changelog
    pub changelog: Option<Changelog>,
}

impl VersionDetails {
    /// Create empty details
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With new title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With new description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With references
    #[inline]
    #[must_use]
    pub fn with_references(mut self, references: Vec<ReferenceMaterial>) -> Self {
        self.references = references;
        self
    }

    /// With change reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.change_reason = Some(reason.into());
        self
    }

    /// With changelog
    #[inline]
    #[must_use]
    pub fn with_changelog(mut self, changelog: Changelog) -> Self {
        self.changelog = Some(changelog);
        self
    }
}

/// Version history errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The only remaining version cannot be deleted
    #[error("cannot delete version {0}: it is the only remaining version")]
    SoleVersion(u32),

    /// No such version in history
    #[error("version {0} not found")]
    UnknownVersion(u32),

    /// Outputs are owned by an in-flight run
    #[error("job has an active run; history cannot change until it finishes")]
    RunActive,
}

impl Job {
    /// Create new job at version 1 with empty outputs
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            description: description.into(),
            references: Vec::new(),
            outputs: OutputMap::new(),
            status: Status::New,
            version: 1,
            next_version: 2,
            change_reason: None,
            changelog: None,
            active_run: None,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// With references
    #[inline]
    #[must_use]
    pub fn with_references(mut self, references: Vec<ReferenceMaterial>) -> Self {
        self.references = references;
        self
    }

    /// Archived versions, oldest first
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[VersionSnapshot] {
        &self.history
    }

    /// Output text of a stage
    #[inline]
    #[must_use]
    pub fn output(&self, stage: &str) -> Option<&str> {
        self.outputs.get(stage).map(String::as_str)
    }

    /// Capture the current mutable state
    #[must_use]
    pub fn snapshot(&self) -> VersionSnapshot {
        VersionSnapshot {
            version: self.version,
            timestamp: self.updated_at,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            references: self.references.clone(),
            outputs: self.outputs.clone(),
            change_reason: self.change_reason.clone(),
            changelog: self.changelog.clone(),
        }
    }

    /// Any version entry, the current one included
    #[must_use]
    pub fn entry(&self, version: u32) -> Option<VersionSnapshot> {
        if version == self.version {
            return Some(self.snapshot());
        }
        self.history.iter().find(|s| s.version == version).cloned()
    }

    /// All version numbers, oldest first, current last
    #[must_use]
    pub fn versions(&self) -> Vec<u32> {
        self.history
            .iter()
            .map(|s| s.version)
            .chain(std::iter::once(self.version))
            .collect()
    }

    /// Record a stage output
    pub fn set_output(&mut self, stage: StageId, text: String) {
        self.outputs.insert(stage, text);
        self.touch();
    }

    /// Bump `updated_at`
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Archive the current state and start the next version.
    ///
    /// The new number comes from the job's high-water mark, so a number
    /// freed by [`Job::delete_version`] is never handed out again.
    /// `include_old_references` selects union (`true`, de-duplicated by
    /// fingerprint, old entries first) or replacement (`false`). Outputs
    /// are cleared and status reset to `new`.
    ///
    /// # Errors
    /// - `VersionError::RunActive` if a run currently owns the outputs
    pub fn create_version(
        &self,
        details: VersionDetails,
        include_old_references: bool,
    ) -> Result<Job, VersionError> {
        if self.status.is_running() || self.active_run.is_some() {
            return Err(VersionError::RunActive);
        }

        let mut next = self.clone();
        next.history.push(self.snapshot());

        next.version = self.next_version_number();
        next.next_version = next.version + 1;
        if let Some(title) = details.title {
            next.title = title;
        }
        if let Some(description) = details.description {
            next.description = description;
        }
        next.references = if include_old_references {
            merge_references(&self.references, details.references)
        } else {
            details.references
        };
        next.outputs.clear();
        next.status = Status::New;
        next.change_reason = details.change_reason;
        next.changelog = details.changelog;
        next.touch();

        Ok(next)
    }

    /// Remove one version.
    ///
    /// Deleting the current version promotes the most recent remaining
    /// snapshot to be current.
    ///
    /// # Errors
    /// - `VersionError::SoleVersion` if only one version exists
    /// - `VersionError::UnknownVersion` if `version` is not present
    /// - `VersionError::RunActive` if a run currently owns the outputs
    pub fn delete_version(&self, version: u32) -> Result<Job, VersionError> {
        if self.status.is_running() || self.active_run.is_some() {
            return Err(VersionError::RunActive);
        }

        let mut next = self.clone();
        next.next_version = self.next_version_number();

        if version == self.version {
            let Some(promoted) = next.history.pop() else {
                return Err(VersionError::SoleVersion(version));
            };
            next.restore(promoted);
            return Ok(next);
        }

        let idx = next
            .history
            .iter()
            .position(|s| s.version == version)
            .ok_or(VersionError::UnknownVersion(version))?;
        next.history.remove(idx);
        next.touch();
        Ok(next)
    }

    /// Diff two version entries, current included
    ///
    /// # Errors
    /// - `VersionError::UnknownVersion` for a missing version
    pub fn compare_versions(&self, older: u32, newer: u32) -> Result<SnapshotDiff, VersionError> {
        let a = self.entry(older).ok_or(VersionError::UnknownVersion(older))?;
        let b = self.entry(newer).ok_or(VersionError::UnknownVersion(newer))?;
        Ok(compare_snapshots(&a, &b))
    }

    /// Number the next created version will get.
    ///
    /// Never lower than one past any version this job has held, including
    /// deleted ones.
    fn next_version_number(&self) -> u32 {
        let highest = self
            .history
            .iter()
            .map(|s| s.version)
            .fold(self.version, u32::max);
        self.next_version.max(highest + 1)
    }

    fn restore(&mut self, snapshot: VersionSnapshot) {
        self.version = snapshot.version;
        self.title = snapshot.title;
        self.description = snapshot.description;
        self.status = snapshot.status;
        self.references = snapshot.references;
        self.outputs = snapshot.outputs;
        self.change_reason = snapshot.change_reason;
        self.changelog = snapshot.changelog;
        self.updated_at = snapshot.timestamp;
    }
}

fn merge_references(
    old: &[ReferenceMaterial],
    new: Vec<ReferenceMaterial>,
) -> Vec<ReferenceMaterial> {
    let mut seen: HashSet<_> = old.iter().map(ReferenceMaterial::fingerprint).collect();
    let mut merged = old.to_vec();
    for reference in new {
        if seen.insert(reference.fingerprint()) {
            merged.push(reference);
        }
    }
    merged
}

impl UnitOfWork for Job {
    fn unit_id(&self) -> Ulid {
        self.id.0
    }

    fn active_run(&self) -> Option<RunToken> {
        self.active_run
    }

    fn has_running_status(&self) -> bool {
        self.status.is_running()
    }

    fn reset_stale_run(&mut self) {
        if self.status.is_running() {
            self.status = Status::New;
        }
        self.active_run = None;
        self.touch();
    }
}
