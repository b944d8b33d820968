//! Common view over jobs and grading jobs for run bookkeeping

use crate::ids::RunToken;
use ulid::Ulid;

/// A persisted unit of work that runs can be attached to.
///
/// At most one run may be active per `unit_id`.
pub trait UnitOfWork {
    /// Identity used for single-flight bookkeeping
    fn unit_id(&self) -> Ulid;

    /// Token of the run recorded as owning this unit
    fn active_run(&self) -> Option<RunToken>;

    /// Whether any status field says `running`
    fn has_running_status(&self) -> bool;

    /// Reset `running` statuses to `new` and drop the run token
    fn reset_stale_run(&mut self);
}
