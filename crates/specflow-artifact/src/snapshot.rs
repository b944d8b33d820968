//! Immutable version snapshots and snapshot diffs

use crate::ids::StageId;
use crate::reference::{ReferenceKey, ReferenceMaterial};
use crate::status::Status;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stage id → generated text, in completion order
pub type OutputMap = IndexMap<StageId, String>;

/// Kind of a changelog line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    /// Something new
    Added,
    /// Something altered
    Changed,
    /// Something dropped
    Removed,
    /// A correction
    Fixed,
}

/// One changelog line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Category
    pub category: ChangeCategory,
    /// Description
    pub text: String,
}

/// Structured changelog attached to a version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// One-line summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Individual entries
    #[serde(default)]
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// Create empty changelog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Add entry
    #[inline]
    #[must_use]
    pub fn entry(mut self, category: ChangeCategory, text: impl Into<String>) -> Self {
        self.entries.push(ChangelogEntry {
            category,
            text: text.into(),
        });
        self
    }
}

/// Immutable capture of a job's mutable state at one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    /// Version number, never reused within a job
    pub version: u32,
    /// When this version was last written
    pub timestamp: DateTime<Utc>,
    /// Title at that version
    #[serde(default)]
    pub title: String,
    /// Description at that version
    pub description: String,
    /// Status at that version
    pub status: Status,
    /// References at that version
    pub references: Vec<ReferenceMaterial>,
    /// Outputs at that version
    pub outputs: OutputMap,
    /// Why this version was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_reason: Option<String>,
    /// Structured changelog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
}

/// Differences between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Description text differs
    pub description_changed: bool,
    /// References present only in the newer snapshot
    pub added_references: BTreeSet<ReferenceKey>,
    /// References present only in the older snapshot
    pub removed_references: BTreeSet<ReferenceKey>,
    /// Output keys present only in the newer snapshot
    pub added_outputs: BTreeSet<StageId>,
    /// Output keys present only in the older snapshot
    pub removed_outputs: BTreeSet<StageId>,
    /// Output keys present in both with different text
    pub changed_outputs: BTreeSet<StageId>,
    /// `(old, new)` when the status differs
    pub status_change: Option<(Status, Status)>,
}

impl SnapshotDiff {
    /// True when no field reports a change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.description_changed
            && self.added_references.is_empty()
            && self.removed_references.is_empty()
            && self.added_outputs.is_empty()
            && self.removed_outputs.is_empty()
            && self.changed_outputs.is_empty()
            && self.status_change.is_none()
    }
}

/// Compare two snapshots, `a` taken as the older side.
///
/// Pure: the result depends only on the two arguments, and comparing a
/// snapshot with itself yields an empty diff.
#[must_use]
pub fn compare_snapshots(a: &VersionSnapshot, b: &VersionSnapshot) -> SnapshotDiff {
    let refs_a: BTreeSet<ReferenceKey> =
        a.references.iter().map(ReferenceMaterial::fingerprint).collect();
    let refs_b: BTreeSet<ReferenceKey> =
        b.references.iter().map(ReferenceMaterial::fingerprint).collect();

    let keys_a: BTreeSet<&StageId> = a.outputs.keys().collect();
    let keys_b: BTreeSet<&StageId> = b.outputs.keys().collect();

    let changed_outputs = keys_a
        .intersection(&keys_b)
        .filter(|k| a.outputs.get(**k) != b.outputs.get(**k))
        .map(|k| (*k).clone())
        .collect();

    SnapshotDiff {
        description_changed: a.description != b.description,
        added_references: refs_b.difference(&refs_a).cloned().collect(),
        removed_references: refs_a.difference(&refs_b).cloned().collect(),
        added_outputs: keys_b.difference(&keys_a).map(|k| (*k).clone()).collect(),
        removed_outputs: keys_a.difference(&keys_b).map(|k| (*k).clone()).collect(),
        changed_outputs,
        status_change: (a.status != b.status).then_some((a.status, b.status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(version: u32) -> VersionSnapshot {
        let mut outputs = OutputMap::new();
        outputs.insert(StageId::new("technical"), "tech".to_string());
        outputs.insert(StageId::new("business"), "biz".to_string());
        VersionSnapshot {
            version,
            timestamp: Utc::now(),
            title: "Portal".to_string(),
            description: "Build a portal".to_string(),
            status: Status::Completed,
            references: vec![
                ReferenceMaterial::folder("docs"),
                ReferenceMaterial::file("a.md", "a", "alpha"),
            ],
            outputs,
            change_reason: None,
            changelog: None,
        }
    }

    #[test]
    fn self_comparison_is_empty() {
        let s = snapshot(1);
        let diff = compare_snapshots(&s, &s);
        assert!(diff.is_empty());
        assert_eq!(diff, SnapshotDiff::default());
    }

    #[test]
    fn detects_every_field() {
        let a = snapshot(1);
        let mut b = snapshot(2);
        b.description = "Build a better portal".to_string();
        b.status = Status::New;
        b.references = vec![
            ReferenceMaterial::file("a.md", "a", "alpha v2"),
            ReferenceMaterial::folder("specs"),
        ];
        b.outputs.shift_remove("business");
        b.outputs.insert(StageId::new("technical"), "tech v2".to_string());
        b.outputs.insert(StageId::new("executive"), "exec".to_string());

        let diff = compare_snapshots(&a, &b);
        assert!(diff.description_changed);
        assert_eq!(diff.status_change, Some((Status::Completed, Status::New)));
        assert_eq!(diff.added_references.len(), 2);
        assert_eq!(diff.removed_references.len(), 2);
        assert!(diff.added_outputs.contains("executive"));
        assert!(diff.removed_outputs.contains("business"));
        assert!(diff.changed_outputs.contains("technical"));
    }

    #[test]
    fn changelog_builder() {
        let log = Changelog::new()
            .with_summary("Scope change")
            .entry(ChangeCategory::Added, "Mobile app")
            .entry(ChangeCategory::Removed, "Fax support");
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[1].category, ChangeCategory::Removed);
    }
}
