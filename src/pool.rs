//! The thread pool: submission path, counters and lifecycle control.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{
    AtomicBool, AtomicI32, AtomicI64, AtomicU32, AtomicU64, AtomicU8, Ordering::SeqCst,
};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::bi_integer::{self, AtomicBiInteger};
use crate::budget::{Budget, Lease};
use crate::builder::Builder;
use crate::config::Config;
use crate::error::{ConfigError, Rejected, RejectedReason};
use crate::job::Job;
use crate::queue::JobQueue;
use crate::reserved::{reserved_capacity, NoTry, TryExecutor};
use crate::shrink::ShrinkStrategy;
use crate::worker::{self, WorkerHandle, WorkerSet};

/// Hi half of the counters while the pool is stopping or stopped; workers
/// interpret it as an exit signal and no growth is permitted.
pub(crate) const STOP_SIGNAL: i32 = i32::MIN;

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

/// A bounded, elastic pool of worker threads draining a FIFO job queue.
///
/// Producers submit jobs with [`execute`](ThreadPool::execute); workers
/// drain them concurrently. The pool grows on demand up to `max_threads`,
/// shrinks back toward `min_threads` when idle, and stops gracefully in
/// two phases within a configurable time budget.
///
/// Growth and demand are tracked in a single [`AtomicBiInteger`]: the hi
/// half counts live workers, the lo half is the net idle count (idle
/// workers minus queued jobs), so a negative lo is the effective queue
/// length.
///
/// ```
/// use queued_threadpool::{Builder, Job};
///
/// let pool = Builder::new().min_threads(1).max_threads(4).build().unwrap();
/// pool.start().unwrap();
/// pool.execute(Job::new(|| println!("hello from the pool"))).unwrap();
/// pool.stop();
/// ```
pub struct ThreadPool {
    inner: Arc<Inner>,
}

/// Seed values handed over by the builder.
pub(crate) struct PoolSeed {
    pub(crate) min_threads: usize,
    pub(crate) max_threads: usize,
    pub(crate) idle_timeout: Duration,
    pub(crate) max_shrink_count: u32,
    pub(crate) stop_timeout: Duration,
    pub(crate) low_threads_threshold: i64,
    pub(crate) reserved_threads: i32,
    pub(crate) detailed_dump: bool,
    pub(crate) queue: Arc<dyn JobQueue>,
    pub(crate) config: Config,
}

/// Shared pool state. Workers hold an `Arc<Inner>` for their lifetime.
pub(crate) struct Inner {
    /// `(threads, net idle)`; hi pinned to [`STOP_SIGNAL`] once stopping.
    pub(crate) counts: AtomicBiInteger,
    pub(crate) queue: Arc<dyn JobQueue>,
    pub(crate) workers: WorkerSet,
    pub(crate) config: Config,
    lifecycle: AtomicU8,
    join_lock: Mutex<()>,
    join_cond: Condvar,
    shrink: RwLock<Arc<ShrinkStrategy>>,
    try_executor: RwLock<Arc<dyn TryExecutor>>,
    budget: Arc<Budget>,
    slots: Mutex<SlotAllocator>,
    next_worker_id: AtomicU64,
    min_threads: AtomicU64,
    max_threads: AtomicU64,
    idle_timeout_ms: AtomicU64,
    max_shrink_count: AtomicU32,
    stop_timeout_ms: AtomicU64,
    low_threads_threshold: AtomicI64,
    reserved_threads: AtomicI32,
    detailed_dump: AtomicBool,
}

/// Hands out the smallest free shrink-arena slot to starting workers.
#[derive(Default)]
struct SlotAllocator {
    free: Vec<usize>,
    next: usize,
}

impl SlotAllocator {
    fn acquire(&mut self) -> usize {
        self.free.pop().unwrap_or_else(|| {
            let slot = self.next;
            self.next += 1;
            slot
        })
    }

    fn release(&mut self, slot: usize) {
        self.free.push(slot);
    }
}

impl Inner {
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn min_threads(&self) -> usize {
        self.min_threads.load(SeqCst) as usize
    }

    pub(crate) fn max_threads(&self) -> usize {
        self.max_threads.load(SeqCst) as usize
    }

    pub(crate) fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms.load(SeqCst))
    }

    pub(crate) fn max_shrink_count(&self) -> u32 {
        self.max_shrink_count.load(SeqCst)
    }

    fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms.load(SeqCst))
    }

    pub(crate) fn shrink(&self) -> Arc<ShrinkStrategy> {
        self.shrink.read().expect("shrink lock").clone()
    }

    fn try_executor(&self) -> Arc<dyn TryExecutor> {
        self.try_executor.read().expect("try executor lock").clone()
    }

    /// Swaps in the strategy matching the current tuning. Called after any
    /// setter that participates in strategy selection.
    fn reselect_shrink(&self) {
        let mut guard = self.shrink.write().expect("shrink lock");
        if let Some(next) = ShrinkStrategy::select(
            self.idle_timeout(),
            self.max_shrink_count(),
            self.max_threads(),
            Some(&**guard),
        ) {
            *guard = Arc::new(next);
        }
    }

    /// Applies `(delta_threads, delta_idle)` to the counters. Once the hi
    /// half carries the stop signal only the idle half moves, and `false`
    /// tells the caller not to attempt growth-related side effects.
    pub(crate) fn add_counts(&self, delta_threads: i32, delta_idle: i32) -> bool {
        loop {
            let encoded = self.counts.get();
            let threads = bi_integer::hi(encoded);
            let idle = bi_integer::lo(encoded);
            if threads == STOP_SIGNAL {
                if self.counts.compare_and_set(encoded, threads, idle + delta_idle) {
                    return false;
                }
            } else if self.counts.compare_and_set(
                encoded,
                threads + delta_threads,
                idle + delta_idle,
            ) {
                return true;
            }
        }
    }

    /// Runs one job through the instrumentation hook, isolating panics so
    /// a failing job never takes its worker down with it.
    pub(crate) fn run_job(&self, job: Job) {
        let outcome = match self.config.around_job.as_ref() {
            Some(hook) => {
                let mut pending = Some(job);
                let mut call = || {
                    if let Some(job) = pending.take() {
                        job.run();
                    }
                };
                panic::catch_unwind(AssertUnwindSafe(|| hook(&mut call)))
            }
            None => panic::catch_unwind(AssertUnwindSafe(|| job.run())),
        };
        if outcome.is_err() {
            warn!("{}: job failed", self.name());
        }
    }

    pub(crate) fn remove_worker(&self, handle: &WorkerHandle) {
        self.workers.remove(handle.id());
        self.slots.lock().expect("slot lock").release(handle.slot());
    }

    /// Guarantees the pool holds at least `min(min_threads, max_threads)`
    /// workers and that unmet demand grows the pool while there is room.
    /// Closes the race between the last worker exiting and a job arriving.
    pub(crate) fn ensure_threads(inner: &Arc<Inner>) {
        loop {
            let encoded = inner.counts.get();
            let threads = bi_integer::hi(encoded);
            if threads == STOP_SIGNAL {
                break;
            }
            let idle = bi_integer::lo(encoded);
            let min = inner.min_threads().min(inner.max_threads()) as i64;
            let max = inner.max_threads() as i64;
            if i64::from(threads) < min || (idle < 0 && i64::from(threads) < max) {
                if inner.counts.compare_and_set(encoded, threads + 1, idle + 1) {
                    Inner::start_thread(inner);
                }
                continue;
            }
            break;
        }
    }

    /// Spawns one worker. The caller has already grown the counters; a
    /// failed spawn reverses that growth.
    pub(crate) fn start_thread(inner: &Arc<Inner>) {
        let id = inner.next_worker_id.fetch_add(1, SeqCst);
        let slot = inner.slots.lock().expect("slot lock").acquire();
        let handle = Arc::new(WorkerHandle::new(id, slot));
        inner.workers.insert(handle.clone());
        // Reset the shrink baseline so fresh growth is not immediately
        // undone by an eviction.
        inner.shrink().init();

        let mut builder = thread::Builder::new().name(format!("{}-{}", inner.name(), id));
        if let Some(stack_size) = inner.config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        debug!("{}: starting worker {}", inner.name(), id);
        let spawned = {
            let inner = inner.clone();
            let handle = handle.clone();
            builder.spawn(move || worker::run(inner, handle))
        };
        if let Err(e) = spawned {
            warn!("{}: unable to start worker {}: {}", inner.name(), id, e);
            inner.remove_worker(&handle);
            inner.add_counts(-1, -1);
        }
    }
}

impl ThreadPool {
    /// Creates a pool with the default configuration; it runs no threads
    /// until [`start`](ThreadPool::start) is called.
    pub fn new() -> ThreadPool {
        Builder::new().build().expect("default configuration is valid")
    }

    /// Returns a builder for a customized pool.
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn from_seed(seed: PoolSeed) -> ThreadPool {
        let shrink = ShrinkStrategy::select(
            seed.idle_timeout,
            seed.max_shrink_count,
            seed.max_threads,
            None,
        )
        .expect("initial strategy selection always yields a strategy");

        ThreadPool {
            inner: Arc::new(Inner {
                counts: AtomicBiInteger::new(STOP_SIGNAL, 0),
                queue: seed.queue,
                workers: WorkerSet::new(),
                config: seed.config,
                lifecycle: AtomicU8::new(STOPPED),
                join_lock: Mutex::new(()),
                join_cond: Condvar::new(),
                shrink: RwLock::new(Arc::new(shrink)),
                try_executor: RwLock::new(Arc::new(NoTry)),
                budget: Budget::new(),
                slots: Mutex::new(SlotAllocator::default()),
                next_worker_id: AtomicU64::new(0),
                min_threads: AtomicU64::new(seed.min_threads as u64),
                max_threads: AtomicU64::new(seed.max_threads as u64),
                idle_timeout_ms: AtomicU64::new(seed.idle_timeout.as_millis() as u64),
                max_shrink_count: AtomicU32::new(seed.max_shrink_count),
                stop_timeout_ms: AtomicU64::new(seed.stop_timeout.as_millis() as u64),
                low_threads_threshold: AtomicI64::new(seed.low_threads_threshold),
                reserved_threads: AtomicI32::new(seed.reserved_threads),
                detailed_dump: AtomicBool::new(seed.detailed_dump),
            }),
        }
    }

    /// Starts the pool: installs the reservation facility, resets the
    /// shrink baseline and primes the minimum number of workers.
    pub fn start(&self) -> Result<(), ConfigError> {
        let inner = &self.inner;
        inner.budget.check(inner.max_threads())?;
        if inner
            .lifecycle
            .compare_exchange(STOPPED, RUNNING, SeqCst, SeqCst)
            .is_err()
        {
            return Err(ConfigError::AlreadyRunning);
        }

        let reserved = inner.reserved_threads.load(SeqCst);
        if reserved != 0 {
            if let Some(factory) = &inner.config.try_executor_factory {
                let capacity = reserved_capacity(reserved, inner.max_threads());
                if capacity > 0 {
                    *inner.try_executor.write().expect("try executor lock") = factory(capacity);
                }
            }
        }

        inner.reselect_shrink();
        inner.shrink().init();

        inner.counts.set(0, 0);
        Inner::ensure_threads(inner);
        debug!("{}: started", inner.name());
        Ok(())
    }

    /// Stops the pool in two phases within the stop timeout: wake and
    /// drain workers for half the budget, interrupt stragglers and wait
    /// the other half, then close or report whatever is left in the queue.
    pub fn stop(&self) {
        let inner = &self.inner;
        if inner
            .lifecycle
            .compare_exchange(RUNNING, STOPPING, SeqCst, SeqCst)
            .is_err()
        {
            return;
        }
        debug!("{}: stopping", inner.name());

        // Detach the reservation facility before the stop signal so no
        // job slips past the queue from here on.
        let try_executor = {
            let mut guard = inner.try_executor.write().expect("try executor lock");
            std::mem::replace(&mut *guard, Arc::new(NoTry))
        };
        try_executor.stop();

        // Publish the stop signal, capturing how many workers need waking.
        let threads = inner.counts.get_and_set_hi(STOP_SIGNAL).max(0);

        let timeout = inner.stop_timeout();
        if !timeout.is_zero() {
            // Wake idle workers blocked in a queue poll.
            for _ in 0..threads {
                if inner.queue.offer(Job::Noop).is_err() {
                    break;
                }
            }

            // Let jobs complete naturally for half the budget.
            let half = timeout / 2;
            inner.workers.join_until(Instant::now() + half);

            // Get more aggressive with whoever is still around.
            for handle in inner.workers.handles() {
                if handle.is_current() {
                    continue;
                }
                debug!("{}: interrupting worker {}", inner.name(), handle.id());
                handle.interrupt();
            }

            inner.workers.join_until(Instant::now() + half);
            thread::yield_now();

            for handle in inner.workers.handles() {
                if handle.is_current() {
                    continue;
                }
                warn!("{}: could not stop worker {}", inner.name(), handle.id());
                debug!(
                    "{}: worker {} state {}",
                    inner.name(),
                    handle.id(),
                    handle.state_tag()
                );
            }
        }

        // Close or report jobs that will never run. Only what the queue
        // yields after the stop signal is drained here; a job picked up
        // earlier completes in its worker, so a job is either run or
        // closed, never both.
        while let Some(job) = inner.queue.try_poll() {
            match job {
                Job::Noop => {}
                Job::Closeable(task) => {
                    if let Err(e) = task.close() {
                        warn!("{}: unable to close job: {}", inner.name(), e);
                    }
                }
                job => warn!(
                    "{}: stopped without executing or closing {:?}",
                    inner.name(),
                    job
                ),
            }
        }

        inner.budget.reset();

        inner.lifecycle.store(STOPPED, SeqCst);
        let _guard = inner.join_lock.lock().expect("join lock");
        inner.join_cond.notify_all();
    }

    /// Blocks until the pool has stopped.
    pub fn join(&self) {
        let inner = &self.inner;
        let mut guard = inner.join_lock.lock().expect("join lock");
        while inner.lifecycle.load(SeqCst) == RUNNING {
            guard = inner.join_cond.wait(guard).expect("join lock");
        }
        drop(guard);
        while inner.lifecycle.load(SeqCst) == STOPPING {
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Submits a job, growing the pool by at most one worker when idle
    /// capacity cannot cover the new demand. The only failure is
    /// rejection: the pool is stopping, or the bounded queue is full.
    pub fn execute(&self, job: Job) -> Result<(), Rejected> {
        let inner = &self.inner;
        let mut start_thread;
        loop {
            let encoded = inner.counts.get();
            let threads = bi_integer::hi(encoded);
            if threads == STOP_SIGNAL {
                return Err(Rejected {
                    job,
                    reason: RejectedReason::Stopped,
                });
            }

            // The idle half is reduced by the queue size, so workers that
            // are about to take a queued job are not counted as capacity.
            let idle = bi_integer::lo(encoded);

            // Start a worker when there is no surplus capacity and room
            // to grow.
            start_thread =
                if idle <= 0 && i64::from(threads) < inner.max_threads() as i64 { 1 } else { 0 };

            // The -1 registers the new demand; the +start_thread
            // pre-registers the new worker as idle.
            if inner.counts.compare_and_set(
                encoded,
                threads + start_thread,
                idle + start_thread - 1,
            ) {
                break;
            }
        }

        if let Err(job) = inner.queue.offer(job) {
            // Reverse the counter change. A reversal that observes the
            // pool already stopped is a log-only condition.
            if inner.add_counts(-start_thread, 1 - start_thread) {
                warn!("{}: rejected {:?}", inner.name(), job);
            }
            return Err(Rejected {
                job,
                reason: RejectedReason::QueueFull,
            });
        }

        trace!("{}: queued job, start_thread={}", inner.name(), start_thread);

        if start_thread == 1 {
            Inner::start_thread(inner);
        }
        Ok(())
    }

    /// Convenience wrapper around [`execute`](ThreadPool::execute) for
    /// plain closures.
    pub fn spawn<F>(&self, f: F) -> Result<(), Rejected>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Job::new(f))
    }

    /// Hands the job to the reservation facility for immediate dispatch.
    /// Never blocks and never enqueues; the job comes back when no
    /// reserved thread is available.
    pub fn try_execute(&self, job: Job) -> Result<(), Job> {
        self.inner.try_executor().try_execute(job)
    }

    // ===== lifecycle observers =====

    /// Whether the pool accepts jobs.
    pub fn is_running(&self) -> bool {
        self.inner.lifecycle.load(SeqCst) == RUNNING
    }

    /// Whether the pool is in the middle of stopping.
    pub fn is_stopping(&self) -> bool {
        self.inner.lifecycle.load(SeqCst) == STOPPING
    }

    /// Whether `start` has completed; start is synchronous, so this is
    /// the same condition as [`is_running`](ThreadPool::is_running).
    pub fn is_started(&self) -> bool {
        self.is_running()
    }

    // ===== fundamental counters =====

    /// Number of workers the pool currently counts as live.
    pub fn threads(&self) -> usize {
        self.inner.counts.hi().max(0) as usize
    }

    /// Number of idle workers, not counting reserved threads.
    pub fn idle_threads(&self) -> usize {
        self.inner.counts.lo().max(0) as usize
    }

    /// Number of jobs waiting for a worker. The idle counter encodes
    /// demand, which is the effective queue size.
    pub fn queue_size(&self) -> usize {
        (-self.inner.counts.lo()).max(0) as usize
    }

    /// Number of threads ready to run a transient job, including
    /// available reserved threads.
    pub fn ready_threads(&self) -> usize {
        self.idle_threads() + self.available_reserved_threads()
    }

    /// Number of threads executing any kind of job.
    pub fn busy_threads(&self) -> usize {
        self.threads().saturating_sub(self.ready_threads())
    }

    /// Number of threads executing transient jobs.
    pub fn utilized_threads(&self) -> usize {
        self.threads()
            .saturating_sub(self.leased_threads())
            .saturating_sub(self.ready_threads())
    }

    /// Maximum number of threads available to run transient jobs.
    pub fn max_available_threads(&self) -> usize {
        self.max_threads().saturating_sub(self.leased_threads())
    }

    /// Ratio of utilized threads to the maximum available; 0.0 when the
    /// pool cannot run transient jobs at all.
    pub fn utilization_rate(&self) -> f64 {
        let max_available = self.max_available_threads();
        if max_available == 0 {
            return 0.0;
        }
        self.utilized_threads() as f64 / max_available as f64
    }

    /// Capacity of the reservation facility.
    pub fn max_reserved_threads(&self) -> usize {
        self.inner.try_executor().capacity()
    }

    /// Reserved threads ready for immediate dispatch.
    pub fn available_reserved_threads(&self) -> usize {
        self.inner.try_executor().available()
    }

    /// Maximum number of threads leased to internal components.
    pub fn max_leased_threads(&self) -> usize {
        self.inner.budget.leased()
    }

    /// Threads leased to internal components and therefore unavailable
    /// for transient jobs.
    pub fn leased_threads(&self) -> usize {
        self.max_leased_threads()
            .saturating_sub(self.max_reserved_threads())
    }

    /// Whether the pool is close to exhausting its threads:
    /// `max - threads + ready - queued <= low_threads_threshold`.
    pub fn is_low_on_threads(&self) -> bool {
        self.max_threads() as i64 - self.threads() as i64 + self.ready_threads() as i64
            - self.queue_size() as i64
            <= self.low_threads_threshold()
    }

    // ===== tuning =====

    /// The pool name, also the worker thread name prefix.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Minimum number of worker threads.
    pub fn min_threads(&self) -> usize {
        self.inner.min_threads()
    }

    /// Sets the minimum number of worker threads, raising the maximum to
    /// match if necessary, and primes workers when running.
    pub fn set_min_threads(&self, min_threads: usize) {
        let inner = &self.inner;
        inner.min_threads.store(min_threads as u64, SeqCst);
        if min_threads > inner.max_threads() {
            inner.max_threads.store(min_threads as u64, SeqCst);
            inner.reselect_shrink();
        }
        if self.is_running() {
            Inner::ensure_threads(inner);
        }
    }

    /// Maximum number of worker threads.
    pub fn max_threads(&self) -> usize {
        self.inner.max_threads()
    }

    /// Sets the maximum number of worker threads, lowering the minimum to
    /// match if necessary. Fails when the outstanding thread leases do
    /// not fit the new maximum.
    pub fn set_max_threads(&self, max_threads: usize) -> Result<(), ConfigError> {
        let inner = &self.inner;
        inner.budget.check(max_threads)?;
        inner.max_threads.store(max_threads as u64, SeqCst);
        inner.reselect_shrink();
        if inner.min_threads() > max_threads {
            inner.min_threads.store(max_threads as u64, SeqCst);
        }
        Ok(())
    }

    /// How long a worker may stay idle before it becomes a shrink
    /// candidate; zero disables shrinking.
    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout()
    }

    /// Sets the idle timeout and re-selects the shrink strategy.
    pub fn set_idle_timeout(&self, idle_timeout: Duration) {
        self.inner
            .idle_timeout_ms
            .store(idle_timeout.as_millis() as u64, SeqCst);
        self.inner.reselect_shrink();
    }

    /// Maximum number of idle workers exited per idle timeout period.
    pub fn max_shrink_count(&self) -> u32 {
        self.inner.max_shrink_count()
    }

    /// Sets the shrink quota and re-selects the shrink strategy.
    pub fn set_max_shrink_count(&self, max_shrink_count: u32) -> Result<(), ConfigError> {
        if max_shrink_count < 1 {
            return Err(ConfigError::InvalidShrinkCount(max_shrink_count));
        }
        self.inner.max_shrink_count.store(max_shrink_count, SeqCst);
        self.inner.reselect_shrink();
        Ok(())
    }

    /// Time budget granted to [`stop`](ThreadPool::stop).
    pub fn stop_timeout(&self) -> Duration {
        self.inner.stop_timeout()
    }

    /// Sets the stop time budget.
    pub fn set_stop_timeout(&self, stop_timeout: Duration) {
        self.inner
            .stop_timeout_ms
            .store(stop_timeout.as_millis() as u64, SeqCst);
    }

    /// Threshold for [`is_low_on_threads`](ThreadPool::is_low_on_threads).
    pub fn low_threads_threshold(&self) -> i64 {
        self.inner.low_threads_threshold.load(SeqCst)
    }

    /// Sets the low-on-threads threshold.
    pub fn set_low_threads_threshold(&self, threshold: i64) {
        self.inner.low_threads_threshold.store(threshold, SeqCst);
    }

    /// Configured reserved thread count, `-1` meaning heuristic.
    pub fn reserved_threads(&self) -> i32 {
        self.inner.reserved_threads.load(SeqCst)
    }

    /// Sets the reserved thread count; only allowed while stopped because
    /// the facility is installed at start.
    pub fn set_reserved_threads(&self, reserved_threads: i32) -> Result<(), ConfigError> {
        if self.is_running() || self.is_stopping() {
            return Err(ConfigError::NotStopped("reserved_threads"));
        }
        self.inner.reserved_threads.store(reserved_threads, SeqCst);
        Ok(())
    }

    /// Whether dumps include queue details.
    pub fn is_detailed_dump(&self) -> bool {
        self.inner.detailed_dump.load(SeqCst)
    }

    /// Controls whether dumps include queue details.
    pub fn set_detailed_dump(&self, detailed_dump: bool) {
        self.inner.detailed_dump.store(detailed_dump, SeqCst);
    }

    // ===== budget =====

    /// Leases `threads` workers to an internal component; the lease is
    /// released on drop.
    pub fn lease(&self, threads: usize) -> Lease {
        self.inner.budget.lease(threads)
    }

    /// The budget tracking leased threads.
    pub fn budget(&self) -> Arc<Budget> {
        self.inner.budget.clone()
    }

    // ===== diagnostics =====

    /// Interrupts the worker with the given id. Returns whether it was
    /// found.
    pub fn interrupt_worker(&self, id: u64) -> bool {
        match self.inner.workers.get(id) {
            Some(handle) => {
                handle.interrupt();
                true
            }
            None => false,
        }
    }

    /// One-line state report for the worker with the given id.
    pub fn dump_worker(&self, id: u64) -> Option<String> {
        self.inner.workers.get(id).map(|handle| {
            let tag = handle.state_tag();
            if tag.is_empty() {
                format!("{}-{} RUNNING", self.name(), handle.id())
            } else {
                format!("{}-{} {}", self.name(), handle.id(), tag)
            }
        })
    }

    /// Multi-line report of the pool, its workers and the queue.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "{}", self);
        for handle in self.inner.workers.handles() {
            let tag = handle.state_tag();
            if tag.is_empty() {
                let _ = writeln!(out, "  {}-{} RUNNING", self.name(), handle.id());
            } else {
                let _ = writeln!(out, "  {}-{} {}", self.name(), handle.id(), tag);
            }
        }
        if self.is_detailed_dump() {
            let _ = writeln!(
                out,
                "  queue: {} jobs, capacity {:?}",
                self.inner.queue.len(),
                self.inner.queue.capacity()
            );
            if let Some(jobs) = self.inner.queue.snapshot() {
                for job in jobs {
                    let _ = writeln!(out, "    {}", job);
                }
            }
        } else {
            let _ = writeln!(out, "  queue: {} jobs", self.queue_size());
        }
        out
    }
}

impl Default for ThreadPool {
    fn default() -> ThreadPool {
        ThreadPool::new()
    }
}

impl fmt::Display for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.inner.counts.get();
        let threads = bi_integer::hi(encoded).max(0);
        let idle = bi_integer::lo(encoded).max(0);
        let state = match self.inner.lifecycle.load(SeqCst) {
            RUNNING => "RUNNING",
            STOPPING => "STOPPING",
            _ => "STOPPED",
        };
        write!(
            f,
            "{}{{{},{}<={}<={},i={},r={},q={}}}",
            self.name(),
            state,
            self.min_threads(),
            threads,
            self.max_threads(),
            idle,
            self.reserved_threads(),
            self.queue_size()
        )
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.name())
            .field("threads", &self.threads())
            .field("idle", &self.idle_threads())
            .field("queued", &self.queue_size())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}
