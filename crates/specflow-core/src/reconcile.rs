//! Stale run reconciliation
//!
//! A unit persisted while a run was in flight still says `running` after a
//! restart. On load, a unit whose recorded run token is not live in the
//! registry is reset to `new`. A unit whose token is live belongs to a
//! genuine run and is left alone.

use specflow_artifact::UnitOfWork;
use specflow_kernel::RunRegistry;

/// Outcome for one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing to do
    Clean,
    /// A live run owns the unit
    Live,
    /// Stale `running` state was reset
    Reset,
}

/// Resets stale `running` units against a run registry
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    registry: RunRegistry,
}

impl Reconciler {
    /// Create new reconciler
    #[inline]
    #[must_use]
    pub fn new(registry: RunRegistry) -> Self {
        Self { registry }
    }

    /// Reconcile one freshly loaded unit
    pub fn reconcile<U: UnitOfWork>(&self, unit: &mut U) -> Reconciled {
        let token = unit.active_run();
        if !unit.has_running_status() && token.is_none() {
            return Reconciled::Clean;
        }
        if token.is_some_and(|t| self.registry.is_live(unit.unit_id(), t)) {
            return Reconciled::Live;
        }
        tracing::warn!(unit = %unit.unit_id(), "resetting stale running state");
        unit.reset_stale_run();
        Reconciled::Reset
    }

    /// Reconcile a batch of loaded units, returning how many were reset
    pub fn reconcile_all<'a, U, I>(&self, units: I) -> usize
    where
        U: UnitOfWork + 'a,
        I: IntoIterator<Item = &'a mut U>,
    {
        units.into_iter().fold(0, |resets, unit| {
            resets + usize::from(self.reconcile(unit) == Reconciled::Reset)
        })
    }
}

/// Deserialize a persisted unit and reconcile it in one step
///
/// # Errors
/// Propagates the JSON error.
pub fn load_json<U>(text: &str, reconciler: &Reconciler) -> Result<U, serde_json::Error>
where
    U: UnitOfWork + serde::de::DeserializeOwned,
{
    let mut unit: U = serde_json::from_str(text)?;
    reconciler.reconcile(&mut unit);
    Ok(unit)
}
