//! Reference materials attached to a job

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference folder or a materialized reference file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceMaterial {
    /// Folder path; its files are materialized elsewhere
    Folder {
        /// Folder path
        path: String,
    },
    /// File with its content loaded
    File {
        /// Source path
        path: String,
        /// Display name
        name: String,
        /// File content
        content: String,
    },
}

impl ReferenceMaterial {
    /// Create folder reference
    #[inline]
    #[must_use]
    pub fn folder(path: impl Into<String>) -> Self {
        Self::Folder { path: path.into() }
    }

    /// Create file reference
    #[inline]
    #[must_use]
    pub fn file(
        path: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::File {
            path: path.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Source path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Folder { path } | Self::File { path, .. } => path,
        }
    }

    /// Identity used for merging and diffing.
    ///
    /// Files include a content hash, so the same path with edited content
    /// is a different reference.
    #[must_use]
    pub fn fingerprint(&self) -> ReferenceKey {
        match self {
            Self::Folder { path } => ReferenceKey(format!("folder:{path}")),
            Self::File { path, content, .. } => ReferenceKey(format!(
                "file:{path}#{}",
                content_digest(content)
            )),
        }
    }

    /// Render for inclusion in a prompt
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Folder { path } => format!("Folder: {path}"),
            Self::File {
                path,
                name,
                content,
            } => format!("### {name} ({path})\n{content}"),
        }
    }
}

/// First 8 bytes of the BLAKE3 digest, hex encoded
fn content_digest(content: &str) -> String {
    hex::encode(&blake3::hash(content.as_bytes()).as_bytes()[..8])
}

/// Stable identity of a reference material
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceKey(String);

impl ReferenceKey {
    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render all references for prompt substitution, separated by blank lines
#[must_use]
pub fn render_references(references: &[ReferenceMaterial]) -> String {
    references
        .iter()
        .map(ReferenceMaterial::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_tracks_file_content() {
        let a = ReferenceMaterial::file("docs/a.md", "a.md", "one");
        let b = ReferenceMaterial::file("docs/a.md", "a.md", "two");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());

        let key = a.fingerprint();
        let digest = key.as_str().strip_prefix("file:docs/a.md#").unwrap();
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn folder_fingerprint_is_path() {
        let f = ReferenceMaterial::folder("docs");
        assert_eq!(f.fingerprint().as_str(), "folder:docs");
    }

    #[test]
    fn serde_is_tagged() {
        let f = ReferenceMaterial::folder("docs");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["path"], "docs");
    }

    #[test]
    fn render_joins_entries() {
        let refs = vec![
            ReferenceMaterial::folder("docs"),
            ReferenceMaterial::file("a.md", "a", "body"),
        ];
        assert_eq!(render_references(&refs), "Folder: docs\n\n### a (a.md)\nbody");
        assert_eq!(render_references(&[]), "");
    }
}
