//! Default analysis graph
//!
//! ```text
//! technical ──┐
//!             ├─→ cross_review ─→ requirements ─→ executive
//! business ───┘
//! ```

use specflow_kernel::{GraphError, StageGraph, StageSpec};

/// Technical analysis stage id
pub const TECHNICAL: &str = "technical";
/// Business analysis stage id
pub const BUSINESS: &str = "business";
/// Cross review stage id
pub const CROSS_REVIEW: &str = "cross_review";
/// Requirements stage id
pub const REQUIREMENTS: &str = "requirements";
/// Executive summary stage id
pub const EXECUTIVE: &str = "executive";

const PROJECT: &str = "Project: {{title}}\n\n{{description}}\n\nReference material:\n{{references}}";

/// Stage declarations of the default analysis graph
#[must_use]
pub fn default_stage_specs() -> Vec<StageSpec> {
    vec![
        StageSpec::new(
            TECHNICAL,
            "Technical analysis",
            format!(
                "Write a technical analysis of the project below: architecture, \
                 components, integrations, data, risks and open technical questions.\n\n{PROJECT}"
            ),
        ),
        StageSpec::new(
            BUSINESS,
            "Business analysis",
            format!(
                "Write a business analysis of the project below: goals, stakeholders, \
                 value, costs, constraints and success measures.\n\n{PROJECT}"
            ),
        ),
        StageSpec::new(
            CROSS_REVIEW,
            "Cross review",
            "Review the technical and business analyses of {{title}} against each other. \
             List contradictions, gaps and assumptions that need confirmation.\n\n\
             Technical analysis:\n{{output.technical}}\n\n\
             Business analysis:\n{{output.business}}",
        )
        .after([TECHNICAL, BUSINESS]),
        StageSpec::new(
            REQUIREMENTS,
            "Requirements",
            "Derive a numbered list of functional and non-functional requirements for \
             {{title}}. Start each with an identifier such as REQ-1 and separate \
             requirements with a line containing only ---.\n\n\
             Technical analysis:\n{{output.technical}}\n\n\
             Business analysis:\n{{output.business}}\n\n\
             Cross review:\n{{output.cross_review}}",
        )
        .after([TECHNICAL, BUSINESS, CROSS_REVIEW]),
        StageSpec::new(
            EXECUTIVE,
            "Executive summary",
            "Write a one-page executive summary of {{title}} for decision makers.\n\n\
             Business analysis:\n{{output.business}}\n\n\
             Cross review:\n{{output.cross_review}}\n\n\
             Requirements:\n{{output.requirements}}",
        )
        .after([BUSINESS, CROSS_REVIEW, REQUIREMENTS]),
    ]
}

/// Build the default analysis graph
///
/// # Errors
/// Only if the built-in declarations are inconsistent.
pub fn default_graph() -> Result<StageGraph, GraphError> {
    default_stage_specs()
        .into_iter()
        .fold(StageGraph::builder(), specflow_kernel::StageGraphBuilder::stage)
        .build()
}
