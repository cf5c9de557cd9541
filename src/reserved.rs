//! The boundary to an external reservation facility.
//!
//! A reservation facility parks a few pool threads and hands them out for
//! immediate dispatch, bypassing the queue. The pool only depends on this
//! contract; the facility itself lives outside the crate and is installed
//! through [`Builder::try_executor_factory`](crate::Builder).

use std::sync::Arc;

use crate::job::Job;

/// Best-effort executor that runs a job only if a spare thread is
/// immediately available. Never blocks, never enqueues.
pub trait TryExecutor: Send + Sync {
    /// Attempts to run the job now, returning it when no thread is ready.
    fn try_execute(&self, job: Job) -> Result<(), Job>;

    /// Maximum number of threads the facility may reserve.
    fn capacity(&self) -> usize {
        0
    }

    /// Number of reserved threads ready for immediate dispatch.
    fn available(&self) -> usize {
        0
    }

    /// Releases any reserved threads back to the pool.
    fn stop(&self) {}
}

/// The always-refusing executor installed when reservation is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTry;

impl TryExecutor for NoTry {
    fn try_execute(&self, job: Job) -> Result<(), Job> {
        Err(job)
    }
}

/// Builds a reservation facility of the requested capacity.
pub type TryExecutorFactory = dyn Fn(usize) -> Arc<dyn TryExecutor> + Send + Sync;

/// Resolves the configured reserved-thread count: non-negative values are
/// taken as-is, the `-1` sentinel picks a heuristic from the machine size.
pub(crate) fn reserved_capacity(reserved_threads: i32, max_threads: usize) -> usize {
    if reserved_threads >= 0 {
        reserved_threads as usize
    } else {
        (max_threads / 10).min(num_cpus::get()).max(1)
    }
}
