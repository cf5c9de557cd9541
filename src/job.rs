//! Units of work accepted by the pool.

use std::fmt;
use std::io;

/// A job that owns a resource which must be released if the job is thrown
/// away without running, typically because the pool stopped while the job
/// was still queued.
///
/// The drain performed at shutdown guarantees that such a job is either run
/// or closed, never both.
pub trait CloseableTask: Send {
    /// Runs the job, consuming it.
    fn run(self: Box<Self>);

    /// Releases the job's resources without running it.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// A unit of work submitted to the pool.
///
/// The closeable capability is expressed as a variant so that the shutdown
/// drain can detect it with a plain match.
pub enum Job {
    /// A do-nothing job offered into the queue during shutdown solely to
    /// wake up a blocked poll.
    Noop,
    /// An ordinary fire-and-forget job.
    Run(Box<dyn FnOnce() + Send>),
    /// A job that must be closed if it is discarded without running.
    Closeable(Box<dyn CloseableTask>),
}

impl Job {
    /// Wraps a closure as a job.
    pub fn new<F>(f: F) -> Job
    where
        F: FnOnce() + Send + 'static,
    {
        Job::Run(Box::new(f))
    }

    /// Wraps a closeable task as a job.
    pub fn closeable<T>(task: T) -> Job
    where
        T: CloseableTask + 'static,
    {
        Job::Closeable(Box::new(task))
    }

    /// Runs the job, consuming it.
    pub fn run(self) {
        match self {
            Job::Noop => {}
            Job::Run(f) => f(),
            Job::Closeable(task) => task.run(),
        }
    }

    /// Returns true for the shutdown wakeup sentinel.
    pub fn is_noop(&self) -> bool {
        matches!(self, Job::Noop)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Noop => f.write_str("Job::Noop"),
            Job::Run(_) => f.write_str("Job::Run"),
            Job::Closeable(_) => f.write_str("Job::Closeable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
    use std::sync::Arc;

    struct Probe {
        ran: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl CloseableTask for Probe {
        fn run(self: Box<Self>) {
            self.ran.fetch_add(1, SeqCst);
        }

        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.fetch_add(1, SeqCst);
            Ok(())
        }
    }

    #[test]
    fn run_consumes_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        Job::new(move || {
            h.fetch_add(1, SeqCst);
        })
        .run();
        assert_eq!(hits.load(SeqCst), 1);
    }

    #[test]
    fn closeable_runs_or_closes_never_both() {
        let ran = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        Job::closeable(Probe {
            ran: ran.clone(),
            closed: closed.clone(),
        })
        .run();
        assert_eq!((ran.load(SeqCst), closed.load(SeqCst)), (1, 0));

        if let Job::Closeable(task) = Job::closeable(Probe {
            ran: ran.clone(),
            closed: closed.clone(),
        }) {
            task.close().unwrap();
        }
        assert_eq!((ran.load(SeqCst), closed.load(SeqCst)), (1, 1));
    }

    #[test]
    fn noop_is_detectable() {
        assert!(Job::Noop.is_noop());
        assert!(!Job::new(|| {}).is_noop());
        assert_eq!(format!("{:?}", Job::Noop), "Job::Noop");
    }
}
