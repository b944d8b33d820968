//! Requirement records extracted from documents

use serde::{Deserialize, Serialize};

/// An atomic, identifiable piece of extracted specification text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Identifier, stable across a parse
    pub id: String,
    /// Short name/title
    pub name: String,
    /// Free-form descriptive text
    pub description: String,
    /// Category section the requirement was listed under, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// User story, filled in by team-readiness review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story: Option<String>,
    /// Acceptance criteria, filled in by team-readiness review
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
}

impl Requirement {
    /// Create new requirement
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            section: None,
            user_story: None,
            acceptance_criteria: Vec::new(),
        }
    }

    /// With section context
    #[inline]
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}
