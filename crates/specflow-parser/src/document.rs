//! Deterministic document parser
//!
//! Three rules are tried in order and the first that yields anything wins:
//!
//! 1. [`ParseRule::Delimited`]: two or more non-blank blocks separated by
//!    `---` lines, one requirement per block
//! 2. [`ParseRule::Sections`]: top-level list items under requirement
//!    category headings or label lines
//! 3. [`ParseRule::Whole`]: the entire text as a single requirement

use crate::blocks::Blocks;
use crate::error::ParseError;
use crate::ident::{assign_ids, Draft};
use crate::sections;
use serde::{Deserialize, Serialize};
use specflow_artifact::Requirement;
use std::fmt;

/// Rule that produced a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseRule {
    /// Delimiter-separated blocks
    Delimited,
    /// List items under category sections
    Sections,
    /// Whole text as one requirement
    Whole,
    /// Blank input
    Empty,
}

impl fmt::Display for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delimited => "delimited",
            Self::Sections => "sections",
            Self::Whole => "whole",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Parse result with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Rule applied
    pub rule: ParseRule,
    /// Requirements in document order
    pub requirements: Vec<Requirement>,
}

impl ParsedDocument {
    /// Number of requirements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Whether nothing was extracted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// Pure text-to-requirements parser
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentParser;

impl DocumentParser {
    /// Create new parser
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse and report which rule applied
    ///
    /// Blank input yields an empty [`ParseRule::Empty`] result.
    ///
    /// # Errors
    /// `ParseError::NoRequirements` when the input is non-blank but holds
    /// nothing except delimiter lines.
    pub fn parse_detailed(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        if text.trim().is_empty() {
            return Ok(ParsedDocument {
                rule: ParseRule::Empty,
                requirements: Vec::new(),
            });
        }

        let blocks = Blocks::split(text);
        if blocks.had_delimiter && blocks.non_empty.is_empty() {
            return Err(ParseError::NoRequirements {
                chars: text.chars().count(),
            });
        }

        let (rule, drafts) = if blocks.is_multi() {
            let drafts = blocks
                .non_empty
                .iter()
                .filter_map(|block| Draft::from_text(block, None))
                .collect();
            (ParseRule::Delimited, drafts)
        } else {
            let rest = blocks.remainder();
            let drafts = sections::scan(rest);
            if drafts.is_empty() {
                (ParseRule::Whole, Draft::from_text(rest, None).into_iter().collect())
            } else {
                (ParseRule::Sections, drafts)
            }
        };

        if drafts.is_empty() {
            return Err(ParseError::NoRequirements {
                chars: text.chars().count(),
            });
        }

        let requirements = assign_ids(drafts);
        tracing::debug!(%rule, count = requirements.len(), "document parsed");
        Ok(ParsedDocument { rule, requirements })
    }

    /// Parse into requirements
    ///
    /// # Errors
    /// See [`DocumentParser::parse_detailed`].
    pub fn parse(&self, text: &str) -> Result<Vec<Requirement>, ParseError> {
        self.parse_detailed(text).map(|doc| doc.requirements)
    }
}

/// Parse a document with the default parser
///
/// # Errors
/// See [`DocumentParser::parse_detailed`].
pub fn parse_structured_document(text: &str) -> Result<Vec<Requirement>, ParseError> {
    DocumentParser::new().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(reqs: &[Requirement]) -> Vec<&str> {
        reqs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn delimited_blocks_win() {
        let doc = DocumentParser::new()
            .parse_detailed("A1\n---\nA2\n---\nA3")
            .unwrap();
        assert_eq!(doc.rule, ParseRule::Delimited);
        assert_eq!(ids(&doc.requirements), vec!["REQ-1", "REQ-2", "REQ-3"]);
        let names: Vec<&str> = doc.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn delimited_blocks_keep_explicit_ids() {
        let reqs = parse_structured_document("FR-2: Search\n---\nOther thing").unwrap();
        assert_eq!(ids(&reqs), vec!["FR-2", "REQ-2"]);
    }

    #[test]
    fn sections_when_no_delimiters() {
        let text = "# Spec\n\n## Functional Requirements\n\n- Login\n- Logout\n";
        let doc = DocumentParser::new().parse_detailed(text).unwrap();
        assert_eq!(doc.rule, ParseRule::Sections);
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.requirements[1].section.as_deref(),
            Some("Functional Requirements")
        );
    }

    #[test]
    fn single_block_with_delimiter_falls_through() {
        let text = "---\nRequirements:\n- One\n- Two\n---\n";
        let doc = DocumentParser::new().parse_detailed(text).unwrap();
        assert_eq!(doc.rule, ParseRule::Sections);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn whole_text_is_one_requirement() {
        let text = "The system must export monthly reports.\nIn CSV and PDF.";
        let doc = DocumentParser::new().parse_detailed(text).unwrap();
        assert_eq!(doc.rule, ParseRule::Whole);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.requirements[0].id, "REQ-1");
        assert_eq!(doc.requirements[0].description, text);
    }

    #[test]
    fn blank_input_is_empty() {
        let doc = DocumentParser::new().parse_detailed(" \n\t ").unwrap();
        assert_eq!(doc.rule, ParseRule::Empty);
        assert!(doc.is_empty());
    }

    #[test]
    fn only_delimiters_is_an_error() {
        assert_eq!(
            parse_structured_document("---\n\n-----\n"),
            Err(ParseError::NoRequirements { chars: 11 })
        );
    }
}
