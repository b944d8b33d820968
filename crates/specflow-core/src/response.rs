//! Decoding of structured gateway answers
//!
//! Models often wrap JSON in prose or code fences. The first balanced
//! `{...}` object in the answer is decoded; fields missing from it take
//! their defaults.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use specflow_artifact::Grade;
use specflow_gateway::GatewayError;

/// First-pass answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct GradeAnswer {
    pub(crate) grade: String,
    #[serde(alias = "ready", alias = "readyForHandoff")]
    pub(crate) ready_for_handoff: bool,
    pub(crate) explanation: String,
    #[serde(alias = "assigned_team", alias = "suggestedTeam")]
    pub(crate) team: Option<String>,
}

impl GradeAnswer {
    pub(crate) fn grade(&self) -> Result<Grade, GatewayError> {
        self.grade
            .parse()
            .map_err(|e| GatewayError::malformed(format!("{e}")))
    }
}

/// Second-pass answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct TeamReadyAnswer {
    #[serde(alias = "teamReady", alias = "ready")]
    pub(crate) team_ready: bool,
    #[serde(alias = "userStory")]
    pub(crate) user_story: String,
    #[serde(alias = "acceptanceCriteria")]
    pub(crate) acceptance_criteria: Vec<String>,
    #[serde(alias = "storyPoints")]
    pub(crate) story_points: Option<u32>,
    #[serde(alias = "splitNote")]
    pub(crate) split_note: Option<String>,
    #[serde(alias = "notReadyNotes")]
    pub(crate) not_ready_notes: Option<String>,
}

/// Locate the first balanced JSON object in `text`
fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode the JSON object embedded in a gateway answer
pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    let object = json_object(text)
        .ok_or_else(|| GatewayError::malformed("no JSON object in response"))?;
    serde_json::from_str(object).map_err(|e| GatewayError::malformed(e.to_string()))
}
