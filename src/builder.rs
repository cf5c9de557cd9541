//! Builds `ThreadPool` instances.

use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AroundJob, Config};
use crate::error::ConfigError;
use crate::pool::{PoolSeed, ThreadPool};
use crate::queue::{ChannelQueue, JobQueue};
use crate::reserved::{TryExecutor, TryExecutorFactory};

static POOL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Configures and constructs a [`ThreadPool`].
///
/// ```
/// use std::time::Duration;
/// use queued_threadpool::Builder;
///
/// let pool = Builder::new()
///     .min_threads(2)
///     .max_threads(8)
///     .idle_timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// pool.start().unwrap();
/// # pool.stop();
/// ```
pub struct Builder {
    min_threads: Option<usize>,
    max_threads: usize,
    idle_timeout: Duration,
    max_shrink_count: u32,
    stop_timeout: Duration,
    low_threads_threshold: i64,
    reserved_threads: i32,
    detailed_dump: bool,
    name: Option<String>,
    stack_size: Option<usize>,
    queue: Option<Arc<dyn JobQueue>>,
    around_job: Option<AroundJob>,
    try_executor_factory: Option<Arc<TryExecutorFactory>>,
}

impl Builder {
    /// Returns a builder with the default configuration: at most 200
    /// threads, at least 8 (capped by the maximum), a 60 second idle
    /// timeout and a 5 second stop timeout.
    pub fn new() -> Builder {
        Builder {
            min_threads: None,
            max_threads: 200,
            idle_timeout: Duration::from_secs(60),
            max_shrink_count: 1,
            stop_timeout: Duration::from_secs(5),
            low_threads_threshold: 1,
            reserved_threads: -1,
            detailed_dump: false,
            name: None,
            stack_size: None,
            queue: None,
            around_job: None,
            try_executor_factory: None,
        }
    }

    /// Minimum number of worker threads kept alive.
    pub fn min_threads(&mut self, val: usize) -> &mut Self {
        self.min_threads = Some(val);
        self
    }

    /// Maximum number of worker threads.
    pub fn max_threads(&mut self, val: usize) -> &mut Self {
        self.max_threads = val;
        self
    }

    /// How long a worker may stay idle before it becomes a shrink
    /// candidate. Zero disables shrinking.
    pub fn idle_timeout(&mut self, val: Duration) -> &mut Self {
        self.idle_timeout = val;
        self
    }

    /// Maximum number of idle workers exited per idle timeout period.
    pub fn max_shrink_count(&mut self, val: u32) -> &mut Self {
        self.max_shrink_count = val;
        self
    }

    /// Time budget granted to `stop` for a graceful shutdown.
    pub fn stop_timeout(&mut self, val: Duration) -> &mut Self {
        self.stop_timeout = val;
        self
    }

    /// Threshold for the low-on-threads warning state.
    pub fn low_threads_threshold(&mut self, val: i64) -> &mut Self {
        self.low_threads_threshold = val;
        self
    }

    /// Number of threads the reservation facility may park, or `-1` to
    /// size it heuristically from the machine. Zero disables reservation.
    pub fn reserved_threads(&mut self, val: i32) -> &mut Self {
        self.reserved_threads = val;
        self
    }

    /// Whether dumps include queue details.
    pub fn detailed_dump(&mut self, val: bool) -> &mut Self {
        self.detailed_dump = val;
        self
    }

    /// Pool name, used as the worker thread name prefix.
    pub fn name<S: Into<String>>(&mut self, val: S) -> &mut Self {
        self.name = Some(val.into());
        self
    }

    /// Stack size for worker threads.
    pub fn stack_size(&mut self, val: usize) -> &mut Self {
        self.stack_size = Some(val);
        self
    }

    /// Replaces the default bounded queue.
    pub fn queue(&mut self, val: Arc<dyn JobQueue>) -> &mut Self {
        self.queue = Some(val);
        self
    }

    /// Wraps the execution of every job for pre/post instrumentation.
    /// The callback must invoke the closure it is given exactly once.
    pub fn around_job<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut dyn FnMut()) + Send + Sync + 'static,
    {
        self.around_job = Some(Arc::new(hook));
        self
    }

    /// Supplies the reservation facility installed at start when
    /// `reserved_threads` is non-zero; the argument is the capacity the
    /// facility should be built with.
    pub fn try_executor_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(usize) -> Arc<dyn TryExecutor> + Send + Sync + 'static,
    {
        self.try_executor_factory = Some(Arc::new(factory));
        self
    }

    /// Builds the pool. The pool does not run any threads until
    /// [`ThreadPool::start`] is called.
    pub fn build(&self) -> Result<ThreadPool, ConfigError> {
        let min_threads = self.min_threads.unwrap_or_else(|| self.max_threads.min(8));
        if self.max_threads < min_threads {
            return Err(ConfigError::MaxLessThanMin {
                max: self.max_threads,
                min: min_threads,
            });
        }
        if self.max_shrink_count < 1 {
            return Err(ConfigError::InvalidShrinkCount(self.max_shrink_count));
        }

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("qtp{}", POOL_SEQ.fetch_add(1, SeqCst)));
        let queue = self.queue.clone().unwrap_or_else(|| {
            let capacity = min_threads.max(8) * 1024;
            Arc::new(ChannelQueue::with_capacity(capacity))
        });

        Ok(ThreadPool::from_seed(PoolSeed {
            min_threads,
            max_threads: self.max_threads,
            idle_timeout: self.idle_timeout,
            max_shrink_count: self.max_shrink_count,
            stop_timeout: self.stop_timeout,
            low_threads_threshold: self.low_threads_threshold,
            reserved_threads: self.reserved_threads,
            detailed_dump: self.detailed_dump,
            queue,
            config: Config {
                name,
                stack_size: self.stack_size,
                around_job: self.around_job.clone(),
                try_executor_factory: self.try_executor_factory.clone(),
            },
        }))
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_max_below_min() {
        let err = Builder::new().min_threads(8).max_threads(4).build();
        assert_eq!(
            err.err(),
            Some(ConfigError::MaxLessThanMin { max: 4, min: 8 })
        );
    }

    #[test]
    fn rejects_zero_shrink_count() {
        let err = Builder::new().max_shrink_count(0).build();
        assert_eq!(err.err(), Some(ConfigError::InvalidShrinkCount(0)));
    }

    #[test]
    fn default_min_is_capped_by_max() {
        let pool = Builder::new().max_threads(4).build().unwrap();
        assert_eq!(pool.min_threads(), 4);
        assert_eq!(pool.max_threads(), 4);
    }

    #[test]
    fn names_are_unique_by_default() {
        let a = Builder::new().build().unwrap();
        let b = Builder::new().build().unwrap();
        assert_ne!(a.name(), b.name());
    }
}
