//! Worker threads draining the job queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering::SeqCst};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::pool::{Inner, STOP_SIGNAL};

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// Per-worker bookkeeping shared between the worker thread and the pool.
///
/// The handle is registered before the OS thread is spawned so that the
/// stop sequence can never miss a worker that is still starting; the
/// `Thread` binding arrives once the worker begins running.
pub(crate) struct WorkerHandle {
    id: u64,
    slot: usize,
    state: AtomicU8,
    interrupted: AtomicBool,
    thread: OnceLock<Thread>,
}

impl WorkerHandle {
    pub(crate) fn new(id: u64, slot: usize) -> WorkerHandle {
        WorkerHandle {
            id,
            slot,
            state: AtomicU8::new(STATE_IDLE),
            interrupted: AtomicBool::new(false),
            thread: OnceLock::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    fn bind(&self, thread: Thread) {
        let _ = self.thread.set(thread);
    }

    /// Requests that the worker stop what it is doing. Cooperative: the
    /// flag is observed between jobs and after a poll wakes up.
    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, SeqCst);
        if let Some(thread) = self.thread.get() {
            thread.unpark();
        }
    }

    pub(crate) fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, SeqCst)
    }

    fn set_idle(&self) {
        self.state.store(STATE_IDLE, SeqCst);
    }

    fn set_running(&self) {
        self.state.store(STATE_RUNNING, SeqCst);
    }

    /// Compressed state tag for dumps: `IDLE` while polling, empty while
    /// running a job.
    pub(crate) fn state_tag(&self) -> &'static str {
        match self.state.load(SeqCst) {
            STATE_IDLE => "IDLE",
            _ => "",
        }
    }

    pub(crate) fn is_current(&self) -> bool {
        self.thread
            .get()
            .map_or(false, |t| t.id() == thread::current().id())
    }
}

/// The set of live workers.
pub(crate) struct WorkerSet {
    workers: Mutex<HashMap<u64, Arc<WorkerHandle>>>,
    exited: Condvar,
}

impl WorkerSet {
    pub(crate) fn new() -> WorkerSet {
        WorkerSet {
            workers: Mutex::new(HashMap::new()),
            exited: Condvar::new(),
        }
    }

    pub(crate) fn insert(&self, handle: Arc<WorkerHandle>) {
        self.workers
            .lock()
            .expect("worker set lock")
            .insert(handle.id(), handle);
    }

    pub(crate) fn remove(&self, id: u64) {
        self.workers.lock().expect("worker set lock").remove(&id);
        self.exited.notify_all();
    }

    pub(crate) fn get(&self, id: u64) -> Option<Arc<WorkerHandle>> {
        self.workers
            .lock()
            .expect("worker set lock")
            .get(&id)
            .cloned()
    }

    /// Snapshot of the live handles, ordered by id for stable dumps.
    pub(crate) fn handles(&self) -> Vec<Arc<WorkerHandle>> {
        let mut handles: Vec<_> = self
            .workers
            .lock()
            .expect("worker set lock")
            .values()
            .cloned()
            .collect();
        handles.sort_by_key(|h| h.id());
        handles
    }

    /// Waits until every worker other than the calling thread has exited,
    /// or the deadline passes.
    pub(crate) fn join_until(&self, deadline: Instant) {
        let mut guard = self.workers.lock().expect("worker set lock");
        loop {
            let remaining = guard.values().filter(|h| !h.is_current()).count();
            if remaining == 0 {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            let (g, _) = self
                .exited
                .wait_timeout(guard, deadline - now)
                .expect("worker set lock");
            guard = g;
        }
    }
}

/// The loop every worker executes: poll, run, rebalance the counters,
/// consult the shrink policy, exit when evicted or told to stop.
pub(crate) fn run(inner: Arc<Inner>, handle: Arc<WorkerHandle>) {
    handle.bind(thread::current());
    debug!("{}: worker {} started", inner.name(), handle.id());

    let mut was_idle = true;
    let mut prune_on_exit = inner.shrink().on_idle(handle.slot());

    while inner.counts.hi() != STOP_SIGNAL {
        handle.set_idle();
        let idle_timeout = inner.idle_timeout();
        let polled = if idle_timeout > Duration::ZERO {
            inner.queue.poll(idle_timeout)
        } else {
            inner.queue.take()
        };

        if polled.is_none() && handle.take_interrupt() {
            // Shutdown is signaled through the counters and noop fillers,
            // not through interrupts.
            trace!("{}: worker {} ignoring interrupt", inner.name(), handle.id());
            continue;
        }

        if let Some(mut job) = polled {
            prune_on_exit = inner.shrink().on_busy(handle.slot());
            loop {
                was_idle = false;
                handle.set_running();
                trace!("{}: worker {} run {:?}", inner.name(), handle.id(), job);
                inner.run_job(job);
                handle.take_interrupt();
                handle.set_idle();

                // Submission pre-claimed this worker by decrementing the
                // idle half; compensate once per executed job.
                if !inner.add_counts(0, 1) {
                    break;
                }
                was_idle = true;

                // Drain opportunistically without going back to idle.
                match inner.queue.try_poll() {
                    Some(next) => job = next,
                    None => break,
                }
            }
            prune_on_exit = inner.shrink().on_idle(handle.slot());
        }

        if inner
            .shrink()
            .evict(handle.slot(), idle_timeout, inner.max_shrink_count())
        {
            prune_on_exit = false;
            break;
        }
    }

    if prune_on_exit {
        inner.shrink().prune(handle.slot());
    }
    inner.remove_worker(&handle);
    inner.add_counts(-1, if was_idle { -1 } else { 0 });
    debug!("{}: worker {} exited", inner.name(), handle.id());

    // A job may have been queued just as this worker decided to exit, so
    // check once more that the remaining threads can meet demand.
    Inner::ensure_threads(&inner);
}
