//! Stage prompt templates
//!
//! Templates use `{{name}}` placeholders from a fixed set:
//!
//! | placeholder            | value                                   |
//! |------------------------|-----------------------------------------|
//! | `{{title}}`            | job title                               |
//! | `{{description}}`      | job description                         |
//! | `{{references}}`       | rendered reference materials            |
//! | `{{output.<stage>}}`   | output of a prior stage                 |
//!
//! Unknown names are rejected at compile time. Recognized placeholders
//! without a value render as the empty string.

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;
use specflow_artifact::{OutputMap, StageId};

static STAGE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^output\.([A-Za-z0-9_\-]*)$").expect("static regex")
});

/// A recognized template variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateVar {
    /// Job title
    Title,
    /// Job description
    Description,
    /// Rendered references
    References,
    /// Output of a prior stage
    StageOutput(StageId),
}

impl TemplateVar {
    fn parse(name: &str) -> Result<Self, TemplateError> {
        match name {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "references" => Ok(Self::References),
            _ => match STAGE_REF.captures(name) {
                Some(caps) if caps[1].is_empty() => Err(TemplateError::EmptyStageRef),
                Some(caps) => Ok(Self::StageOutput(StageId::new(&caps[1]))),
                None => Err(TemplateError::UnknownPlaceholder(name.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(TemplateVar),
}

/// Values available while rendering a prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    /// Job title
    pub title: &'a str,
    /// Job description
    pub description: &'a str,
    /// Pre-rendered references
    pub references: &'a str,
    /// Outputs of completed stages
    pub outputs: Option<&'a OutputMap>,
}

/// Compiled prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Compile a template
    ///
    /// # Errors
    /// - `TemplateError::UnknownPlaceholder` for names outside the set
    /// - `TemplateError::Unterminated` for a dangling `{{`
    /// - `TemplateError::EmptyStageRef` for `{{output.}}`
    pub fn compile(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut rest = source.as_str();
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(TemplateError::Unterminated(offset + open))?;
            let name = after_open[..close].trim();
            segments.push(Segment::Var(TemplateVar::parse(name)?));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { source, segments })
    }

    /// Original template text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stage outputs this template reads
    pub fn stage_refs(&self) -> impl Iterator<Item = &StageId> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(TemplateVar::StageOutput(id)) => Some(id),
            _ => None,
        })
    }

    /// Substitute every placeholder; missing values become ""
    #[must_use]
    pub fn render(&self, ctx: &TemplateContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(TemplateVar::Title) => out.push_str(ctx.title),
                Segment::Var(TemplateVar::Description) => out.push_str(ctx.description),
                Segment::Var(TemplateVar::References) => out.push_str(ctx.references),
                Segment::Var(TemplateVar::StageOutput(id)) => {
                    if let Some(text) = ctx.outputs.and_then(|o| o.get(id)) {
                        out.push_str(text);
                    }
                }
            }
        }
        out
    }
}
