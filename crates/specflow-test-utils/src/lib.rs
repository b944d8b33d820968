//! Testing utilities for the specflow workspace
//!
//! Scripted gateway and fixtures shared by the crate test suites.

#![allow(missing_docs)]

use parking_lot::Mutex;
use specflow_artifact::{Job, ReferenceMaterial, Requirement, Team};
use specflow_gateway::{Gateway, GatewayError, ModelId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Fail(GatewayError),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn into_result(self) -> Result<String, GatewayError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Fail(err) => Err(err),
        }
    }
}

#[derive(Debug)]
struct Rule {
    marker: String,
    replies: VecDeque<Reply>,
    delay: Option<Duration>,
}

impl Rule {
    /// Pop the next reply; the last one repeats
    fn next_reply(&mut self) -> Reply {
        if self.replies.len() > 1 {
            self.replies.pop_front().unwrap_or_else(|| Reply::text(""))
        } else {
            self.replies.front().cloned().unwrap_or_else(|| Reply::text(""))
        }
    }
}

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub prompt: String,
    pub model: String,
    pub started_at: u64,
    pub finished_at: Option<u64>,
}

/// Gateway answering from a script keyed by prompt substrings.
///
/// The first rule whose marker occurs in the prompt answers. Prompts with
/// no matching rule get the fallback reply.
#[derive(Debug)]
pub struct ScriptedGateway {
    rules: Mutex<Vec<Rule>>,
    fallback: Reply,
    latency: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    clock: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            fallback: Reply::Fail(GatewayError::Rejected("no scripted reply".to_string())),
            latency: None,
            calls: Mutex::new(Vec::new()),
            clock: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answer prompts containing `marker` with `text`
    #[must_use]
    pub fn reply(self, marker: impl Into<String>, text: impl Into<String>) -> Self {
        self.reply_seq(marker, vec![Reply::text(text)])
    }

    /// Fail prompts containing `marker`
    #[must_use]
    pub fn fail(self, marker: impl Into<String>, err: GatewayError) -> Self {
        self.reply_seq(marker, vec![Reply::Fail(err)])
    }

    /// Answer successive matching prompts in order; the last reply repeats
    #[must_use]
    pub fn reply_seq(self, marker: impl Into<String>, replies: Vec<Reply>) -> Self {
        self.rules.lock().push(Rule {
            marker: marker.into(),
            replies: replies.into(),
            delay: None,
        });
        self
    }

    /// Delay answers for the most recently added rule
    #[must_use]
    pub fn delayed(self, delay: Duration) -> Self {
        if let Some(rule) = self.rules.lock().last_mut() {
            rule.delay = Some(delay);
        }
        self
    }

    /// Reply for prompts no rule matches
    #[must_use]
    pub fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    /// Delay every answer
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.prompt.clone()).collect()
    }

    /// Calls whose prompt contains `marker`
    pub fn calls_matching(&self, marker: &str) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.prompt.contains(marker))
            .cloned()
            .collect()
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Whether every call matching `first` finished before any call
    /// matching `then` started
    pub fn finished_before(&self, first: &str, then: &str) -> bool {
        let calls = self.calls.lock();
        let last_finish = calls
            .iter()
            .filter(|c| c.prompt.contains(first))
            .map(|c| c.finished_at.unwrap_or(u64::MAX))
            .max();
        let first_start = calls
            .iter()
            .filter(|c| c.prompt.contains(then))
            .map(|c| c.started_at)
            .min();
        match (last_finish, first_start) {
            (Some(finish), Some(start)) => finish < start,
            _ => false,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn lookup(&self, prompt: &str) -> (Reply, Option<Duration>) {
        let mut rules = self.rules.lock();
        match rules.iter_mut().find(|r| prompt.contains(&r.marker)) {
            Some(rule) => (rule.next_reply(), rule.delay.or(self.latency)),
            None => (self.fallback.clone(), self.latency),
        }
    }
}

#[async_trait::async_trait]
impl Gateway for ScriptedGateway {
    async fn generate(&self, prompt: &str, model: &ModelId) -> Result<String, GatewayError> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(Call {
                prompt: prompt.to_string(),
                model: model.to_string(),
                started_at: self.tick(),
                finished_at: None,
            });
            calls.len() - 1
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (reply, delay) = self.lookup(prompt);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let finished = self.tick();
        if let Some(call) = self.calls.lock().get_mut(index) {
            call.finished_at = Some(finished);
        }
        reply.into_result()
    }
}

// Fixtures

pub fn sample_job() -> Job {
    Job::new("Portal", "Customer self-service portal with SSO login.").with_references(vec![
        ReferenceMaterial::folder("docs/"),
        ReferenceMaterial::file("docs/api.md", "api.md", "GET /users"),
    ])
}

pub fn sample_requirements() -> Vec<Requirement> {
    vec![
        Requirement::new("REQ-1", "Login", "Users sign in with SSO."),
        Requirement::new("REQ-2", "Export", "Admins export monthly reports as CSV."),
        Requirement::new("REQ-3", "Audit", "Every change is recorded."),
    ]
}

pub fn sample_teams() -> Vec<Team> {
    vec![
        Team::new("Identity", "Authentication and accounts"),
        Team::new("Reporting", "Exports and dashboards"),
    ]
}

/// Model id used throughout the test suites
pub fn test_model() -> ModelId {
    ModelId::new("test-model")
}
