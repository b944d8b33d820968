//! Grading jobs: graded and team-ready requirement records

use crate::ids::{GradingJobId, RunToken};
use crate::requirement::Requirement;
use crate::status::Status;
use crate::unit::UnitOfWork;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Team that requirements can be routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team name
    pub name: String,
    /// What the team owns
    pub description: String,
}

impl Team {
    /// Create team descriptor
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Letter grade A (best) to F
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Excellent
    A,
    /// Good
    B,
    /// Adequate
    C,
    /// Weak
    D,
    /// Unusable
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Unrecognized grade letter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grade: {0:?}")]
pub struct InvalidGrade(pub String);

impl FromStr for Grade {
    type Err = InvalidGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            _ => Err(InvalidGrade(s.to_string())),
        }
    }
}

/// Requirement with the first-pass assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedRequirement {
    /// The requirement
    pub requirement: Requirement,
    /// Letter grade
    pub grade: Grade,
    /// Ready to hand off
    pub ready_for_handoff: bool,
    /// Reasoning
    pub explanation: String,
    /// Suggested team, when teams are configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_team: Option<String>,
}

/// Requirement with the team-readiness assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamReadyRequirement {
    /// The requirement, with user story and acceptance criteria filled in
    pub requirement: Requirement,
    /// Team can start work
    pub team_ready: bool,
    /// User story
    pub user_story: String,
    /// Acceptance criteria
    pub acceptance_criteria: Vec<String>,
    /// Story point estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    /// How to split the requirement, when too large
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_note: Option<String>,
    /// What is missing, when not ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_ready_notes: Option<String>,
}

/// Unit of work for requirement grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingJob {
    /// Identity
    pub id: GradingJobId,
    /// Title
    pub title: String,
    /// Requirements as parsed, in original order
    pub requirements: Vec<Requirement>,
    /// Teams available for routing
    pub teams: Vec<Team>,
    /// First-pass results
    pub graded: Vec<GradedRequirement>,
    /// Second-pass results
    pub team_ready: Vec<TeamReadyRequirement>,
    /// Grading pass status
    pub status: Status,
    /// Team-readiness pass status
    pub team_ready_status: Status,
    /// Token of the active pass, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_run: Option<RunToken>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl GradingJob {
    /// Create new grading job
    #[must_use]
    pub fn new(title: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        let now = Utc::now();
        Self {
            id: GradingJobId::new(),
            title: title.into(),
            requirements,
            teams: Vec::new(),
            graded: Vec::new(),
            team_ready: Vec::new(),
            status: Status::New,
            team_ready_status: Status::New,
            active_run: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// With teams
    #[inline]
    #[must_use]
    pub fn with_teams(mut self, teams: Vec<Team>) -> Self {
        self.teams = teams;
        self
    }

    /// Look up a team by case-insensitive name
    #[must_use]
    pub fn find_team(&self, name: &str) -> Option<&Team> {
        let name = name.trim();
        self.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Bump `updated_at`
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl UnitOfWork for GradingJob {
    fn unit_id(&self) -> Ulid {
        self.id.0
    }

    fn active_run(&self) -> Option<RunToken> {
        self.active_run
    }

    fn has_running_status(&self) -> bool {
        self.status.is_running() || self.team_ready_status.is_running()
    }

    fn reset_stale_run(&mut self) {
        if self.status.is_running() {
            self.status = Status::New;
        }
        if self.team_ready_status.is_running() {
            self.team_ready_status = Status::New;
        }
        self.active_run = None;
        self.touch();
    }
}
