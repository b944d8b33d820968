//! In-process run registry
//!
//! Tracks which units of work have a run in flight. [`RunRegistry::begin`]
//! is the single-flight gate; the returned [`RunGuard`] releases the slot
//! when dropped, including when the run future itself is dropped.

use crate::error::RunError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use specflow_artifact::RunToken;
use std::sync::Arc;
use ulid::Ulid;

/// Active runs keyed by unit id
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Arc<DashMap<Ulid, RunToken>>,
}

impl RunRegistry {
    /// Create new registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot for `unit`
    ///
    /// # Errors
    /// `RunError::AlreadyRunning` when a run is already registered.
    pub fn begin(&self, unit: Ulid) -> Result<RunGuard, RunError> {
        match self.active.entry(unit) {
            Entry::Occupied(_) => Err(RunError::AlreadyRunning(unit)),
            Entry::Vacant(slot) => {
                let token = RunToken::new();
                slot.insert(token);
                tracing::debug!(%unit, %token, "run registered");
                Ok(RunGuard {
                    active: Arc::clone(&self.active),
                    unit,
                    token,
                })
            }
        }
    }

    /// Whether `token` is the live run for `unit`
    #[must_use]
    pub fn is_live(&self, unit: Ulid, token: RunToken) -> bool {
        self.active.get(&unit).is_some_and(|t| *t == token)
    }

    /// Whether any run is registered for `unit`
    #[must_use]
    pub fn is_running(&self, unit: Ulid) -> bool {
        self.active.contains_key(&unit)
    }

    /// Number of registered runs
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Held for the duration of a run
#[derive(Debug)]
pub struct RunGuard {
    active: Arc<DashMap<Ulid, RunToken>>,
    unit: Ulid,
    token: RunToken,
}

impl RunGuard {
    /// Token identifying this run
    #[inline]
    #[must_use]
    pub fn token(&self) -> RunToken {
        self.token
    }

    /// Unit the run belongs to
    #[inline]
    #[must_use]
    pub fn unit(&self) -> Ulid {
        self.unit
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.remove_if(&self.unit, |_, t| *t == self.token);
    }
}
