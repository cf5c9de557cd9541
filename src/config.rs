//! Frozen configuration shared between the pool and its workers.

use std::sync::Arc;

use crate::reserved::TryExecutorFactory;

/// Hook wrapping the execution of every job; the callback must invoke the
/// closure it receives exactly once.
pub(crate) type AroundJob = Arc<dyn Fn(&mut dyn FnMut()) + Send + Sync>;

/// Settings fixed at build time. Runtime-tunable values live on the pool
/// itself as atomics.
pub(crate) struct Config {
    /// Pool name, used as the worker thread name prefix.
    pub(crate) name: String,
    /// Stack size for worker threads.
    pub(crate) stack_size: Option<usize>,
    /// Pre/post instrumentation around each job.
    pub(crate) around_job: Option<AroundJob>,
    /// Supplies the reservation facility installed at start.
    pub(crate) try_executor_factory: Option<Arc<TryExecutorFactory>>,
}
