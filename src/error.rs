//! Error types surfaced by the pool.

use std::fmt;

use thiserror::Error;

use crate::job::Job;

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedReason {
    /// The pool is stopping or stopped.
    Stopped,
    /// The bounded queue refused the job.
    QueueFull,
}

/// Error returned by a submission the pool could not accept.
///
/// Ownership of the job travels back to the caller, which may retry it
/// elsewhere or close it.
#[derive(Error)]
#[error("job rejected: {reason:?}")]
pub struct Rejected {
    /// The job that was not accepted.
    pub job: Job,
    /// Why it was not accepted.
    pub reason: RejectedReason,
}

impl Rejected {
    /// Recovers the rejected job.
    pub fn into_job(self) -> Job {
        self.job
    }
}

impl fmt::Debug for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("job", &self.job)
            .field("reason", &self.reason)
            .finish()
    }
}

/// Error raised by configuration that cannot be applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Maximum threads below minimum threads.
    #[error("max threads ({max}) less than min threads ({min})")]
    MaxLessThanMin {
        /// Proposed maximum.
        max: usize,
        /// Configured minimum.
        min: usize,
    },

    /// A shrink count below one.
    #[error("invalid shrink count {0}")]
    InvalidShrinkCount(u32),

    /// A setter that requires a stopped pool was called while running.
    #[error("{0} may only be changed while the pool is stopped")]
    NotStopped(&'static str),

    /// `start` was called on a pool that is already running.
    #[error("pool is already running")]
    AlreadyRunning,

    /// The proposed maximum does not cover the threads already leased.
    #[error("budget exceeded: {leased} threads leased, {max} proposed maximum")]
    BudgetExceeded {
        /// Threads currently leased to internal components.
        leased: usize,
        /// The proposed maximum.
        max: usize,
    },
}
