//! Grading engine
//!
//! Two sequential passes over a [`GradingJob`]:
//!
//! 1. [`GradingEngine::grade_requirements`]: grade, readiness, explanation
//!    and, when teams exist, a suggested team per requirement
//! 2. [`GradingEngine::review_team_readiness`]: user story, acceptance
//!    criteria, estimate and readiness for the graded requirements
//!
//! Each pass has its own status. A gateway failure marks only that pass
//! `failed` and keeps what it produced so far.

use crate::config::TeamReadyScope;
use crate::error::CoreError;
use crate::response::{decode, GradeAnswer, TeamReadyAnswer};
use specflow_artifact::{
    GradedRequirement, GradingJob, Requirement, RunToken, Status, Team, TeamReadyRequirement,
};
use specflow_gateway::{Gateway, GatewayError, ModelId, SharedGateway};
use specflow_kernel::{EventSink, RunRegistry};

/// Label of the team-readiness progress event
pub const TEAM_READY_LABEL: &str = "Team readiness";

/// Sequential per-requirement grading
#[derive(Clone)]
pub struct GradingEngine {
    gateway: SharedGateway,
    model: ModelId,
    scope: TeamReadyScope,
    registry: RunRegistry,
}

impl std::fmt::Debug for GradingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradingEngine")
            .field("model", &self.model)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl GradingEngine {
    /// Create new engine
    #[inline]
    #[must_use]
    pub fn new(gateway: SharedGateway, model: ModelId) -> Self {
        Self {
            gateway,
            model,
            scope: TeamReadyScope::default(),
            registry: RunRegistry::new(),
        }
    }

    /// With team-readiness scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: TeamReadyScope) -> Self {
        self.scope = scope;
        self
    }

    /// Share a run registry with other components
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// First pass: grade every requirement in order
    ///
    /// Replaces `job.graded`. Emits `ItemProgress` after each requirement.
    ///
    /// # Errors
    /// - `CoreError::Run` if a pass is already active for the job
    /// - `CoreError::Grading` for the first requirement whose gateway call
    ///   or answer failed; `job.status` is then `failed` and `job.graded`
    ///   holds the requirements graded before it
    pub async fn grade_requirements(
        &self,
        job: &mut GradingJob,
        events: &EventSink,
    ) -> Result<(), CoreError> {
        let guard = self.registry.begin(job.id.0)?;
        let total = job.requirements.len();
        tracing::info!(job = %job.id, total, "grading started");

        job.status = Status::Running;
        job.active_run = Some(guard.token());
        job.graded.clear();
        job.touch();

        let requirements = job.requirements.clone();
        for (idx, requirement) in requirements.into_iter().enumerate() {
            match self.grade_one(&requirement, &job.teams).await {
                Ok(graded) => {
                    tracing::debug!(requirement = %requirement.id, grade = %graded.grade, "requirement graded");
                    job.graded.push(graded);
                    job.touch();
                    events.item(idx + 1, total, &requirement.name);
                }
                Err(source) => {
                    finish(job, guard.token(), Status::Failed, Pass::Grading);
                    tracing::error!(job = %job.id, requirement = %requirement.id, error = %source, "grading failed");
                    return Err(CoreError::Grading {
                        requirement: requirement.id,
                        source,
                    });
                }
            }
        }

        finish(job, guard.token(), Status::Completed, Pass::Grading);
        tracing::info!(job = %job.id, graded = job.graded.len(), "grading completed");
        Ok(())
    }

    /// Second pass: review graded requirements for team readiness
    ///
    /// Operates on `job.graded` filtered by the configured scope and
    /// replaces `job.team_ready`. An empty selection completes at 100%
    /// without calling the gateway.
    ///
    /// # Errors
    /// - `CoreError::Run` if a pass is already active for the job
    /// - `CoreError::Grading` for the first failing requirement;
    ///   `job.team_ready_status` is then `failed`
    pub async fn review_team_readiness(
        &self,
        job: &mut GradingJob,
        events: &EventSink,
    ) -> Result<(), CoreError> {
        let guard = self.registry.begin(job.id.0)?;
        let eligible: Vec<GradedRequirement> = job
            .graded
            .iter()
            .filter(|g| self.scope == TeamReadyScope::All || g.ready_for_handoff)
            .cloned()
            .collect();
        let total = eligible.len();
        tracing::info!(job = %job.id, total, scope = ?self.scope, "team readiness review started");

        job.team_ready_status = Status::Running;
        job.active_run = Some(guard.token());
        job.team_ready.clear();
        job.touch();

        if eligible.is_empty() {
            events.progress(TEAM_READY_LABEL, 100);
            finish(job, guard.token(), Status::Completed, Pass::TeamReady);
            return Ok(());
        }

        for (idx, graded) in eligible.into_iter().enumerate() {
            match self.review_one(&graded).await {
                Ok(ready) => {
                    job.team_ready.push(ready);
                    job.touch();
                    events.item(idx + 1, total, &graded.requirement.name);
                }
                Err(source) => {
                    finish(job, guard.token(), Status::Failed, Pass::TeamReady);
                    tracing::error!(job = %job.id, requirement = %graded.requirement.id, error = %source, "team readiness review failed");
                    return Err(CoreError::Grading {
                        requirement: graded.requirement.id,
                        source,
                    });
                }
            }
        }

        finish(job, guard.token(), Status::Completed, Pass::TeamReady);
        tracing::info!(job = %job.id, reviewed = job.team_ready.len(), "team readiness review completed");
        Ok(())
    }

    async fn grade_one(
        &self,
        requirement: &Requirement,
        teams: &[Team],
    ) -> Result<GradedRequirement, GatewayError> {
        let prompt = grade_prompt(requirement, teams);
        let text = self.gateway.generate(&prompt, &self.model).await?;
        let answer: GradeAnswer = decode(&text)?;
        let grade = answer.grade()?;

        let assigned_team = answer.team.as_deref().and_then(|name| {
            let found = teams.iter().find(|t| t.name.eq_ignore_ascii_case(name.trim()));
            if found.is_none() {
                tracing::debug!(requirement = %requirement.id, team = name, "dropping unknown team");
            }
            found.map(|t| t.name.clone())
        });

        Ok(GradedRequirement {
            requirement: requirement.clone(),
            grade,
            ready_for_handoff: answer.ready_for_handoff,
            explanation: answer.explanation,
            assigned_team,
        })
    }

    async fn review_one(
        &self,
        graded: &GradedRequirement,
    ) -> Result<TeamReadyRequirement, GatewayError> {
        let prompt = team_ready_prompt(graded);
        let text = self.gateway.generate(&prompt, &self.model).await?;
        let answer: TeamReadyAnswer = decode(&text)?;

        let mut requirement = graded.requirement.clone();
        requirement.user_story = Some(answer.user_story.clone()).filter(|s| !s.is_empty());
        requirement.acceptance_criteria = answer.acceptance_criteria.clone();

        let not_ready_notes = if answer.team_ready {
            None
        } else {
            answer.not_ready_notes
        };
        Ok(TeamReadyRequirement {
            requirement,
            team_ready: answer.team_ready,
            user_story: answer.user_story,
            acceptance_criteria: answer.acceptance_criteria,
            story_points: answer.story_points,
            split_note: answer.split_note,
            not_ready_notes,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Grading,
    TeamReady,
}

fn finish(job: &mut GradingJob, token: RunToken, status: Status, pass: Pass) {
    match pass {
        Pass::Grading => job.status = status,
        Pass::TeamReady => job.team_ready_status = status,
    }
    if job.active_run == Some(token) {
        job.active_run = None;
    }
    job.touch();
}

fn requirement_block(requirement: &Requirement) -> String {
    let mut block = format!("[{}] {}\n{}", requirement.id, requirement.name, requirement.description);
    if let Some(section) = &requirement.section {
        block.push_str(&format!("\nSection: {section}"));
    }
    block
}

fn grade_prompt(requirement: &Requirement, teams: &[Team]) -> String {
    let mut prompt = String::from(
        "Grade the requirement below from A (clear, complete, testable) to F (unusable). \
         Decide whether it is ready to hand off to a delivery team and explain why.\n",
    );
    if teams.is_empty() {
        prompt.push_str(
            "\nAnswer with a JSON object: \
             {\"grade\": \"A-F\", \"ready_for_handoff\": true|false, \"explanation\": \"...\"}\n",
        );
    } else {
        prompt.push_str("\nTeams:\n");
        for team in teams {
            prompt.push_str(&format!("- {}: {}\n", team.name, team.description));
        }
        prompt.push_str(
            "\nAnswer with a JSON object: \
             {\"grade\": \"A-F\", \"ready_for_handoff\": true|false, \"explanation\": \"...\", \
             \"team\": \"one of the team names\"}\n",
        );
    }
    prompt.push_str("\nRequirement:\n");
    prompt.push_str(&requirement_block(requirement));
    prompt
}

fn team_ready_prompt(graded: &GradedRequirement) -> String {
    let mut prompt = String::from(
        "Prepare the requirement below for a delivery team. Write a user story and \
         acceptance criteria, estimate story points, and decide whether the team can start. \
         If it is too large, say how to split it. If it is not ready, say what is missing.\n\
         \nAnswer with a JSON object: {\"team_ready\": true|false, \"user_story\": \"...\", \
         \"acceptance_criteria\": [\"...\"], \"story_points\": 3, \"split_note\": null, \
         \"not_ready_notes\": null}\n\nRequirement:\n",
    );
    prompt.push_str(&requirement_block(&graded.requirement));
    prompt.push_str(&format!(
        "\n\nGrade: {}\nAssessment: {}",
        graded.grade, graded.explanation
    ));
    if let Some(team) = &graded.assigned_team {
        prompt.push_str(&format!("\nTeam: {team}"));
    }
    prompt
}
