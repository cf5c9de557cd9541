//! The blocking FIFO boundary between producers and workers.

use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::job::Job;

/// A blocking FIFO of jobs.
///
/// The pool only requires this contract from its queue; back-pressure is
/// supplied by the queue being bounded. Implementations must be safe for
/// many producers and many consumers.
pub trait JobQueue: Send + Sync {
    /// Non-blocking insert. Returns the job when the queue refuses it.
    fn offer(&self, job: Job) -> Result<(), Job>;

    /// Blocks until a job is available.
    fn take(&self) -> Option<Job>;

    /// Blocks up to `timeout` for a job.
    fn poll(&self, timeout: Duration) -> Option<Job>;

    /// Non-blocking poll.
    fn try_poll(&self) -> Option<Job>;

    /// Number of queued jobs.
    fn len(&self) -> usize;

    /// Whether the queue is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued jobs, or `None` when unbounded.
    fn capacity(&self) -> Option<usize>;

    /// Point-in-time description of the queued jobs, for diagnostics.
    /// `None` when the implementation cannot observe its contents without
    /// consuming them, as is the case for the default channel queue.
    fn snapshot(&self) -> Option<Vec<String>> {
        None
    }
}

/// The default [`JobQueue`], backed by a crossbeam MPMC channel.
pub struct ChannelQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

impl ChannelQueue {
    /// Creates a queue holding at most `capacity` jobs.
    pub fn with_capacity(capacity: usize) -> ChannelQueue {
        let (tx, rx) = bounded(capacity);
        ChannelQueue { tx, rx }
    }

    /// Creates a queue without a capacity bound.
    pub fn unbounded() -> ChannelQueue {
        let (tx, rx) = unbounded();
        ChannelQueue { tx, rx }
    }
}

impl JobQueue for ChannelQueue {
    fn offer(&self, job: Job) -> Result<(), Job> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => Err(job),
        }
    }

    fn take(&self) -> Option<Job> {
        self.rx.recv().ok()
    }

    fn poll(&self, timeout: Duration) -> Option<Job> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn try_poll(&self) -> Option<Job> {
        self.rx.try_recv().ok()
    }

    fn len(&self) -> usize {
        self.rx.len()
    }

    fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
    use std::sync::Arc;

    #[test]
    fn fifo_order() {
        let q = ChannelQueue::unbounded();
        let order = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            let order = order.clone();
            q.offer(Job::new(move || {
                assert_eq!(order.fetch_add(1, SeqCst), i);
            }))
            .unwrap();
        }
        assert_eq!(q.len(), 3);
        while let Some(job) = q.try_poll() {
            job.run();
        }
        assert_eq!(order.load(SeqCst), 3);
    }

    #[test]
    fn bounded_refuses_when_full() {
        let q = ChannelQueue::with_capacity(1);
        assert_eq!(q.capacity(), Some(1));
        assert!(q.offer(Job::Noop).is_ok());
        let refused = q.offer(Job::Noop);
        assert!(refused.is_err());
        assert!(refused.unwrap_err().is_noop());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn poll_times_out_empty() {
        let q = ChannelQueue::with_capacity(1);
        assert!(q.poll(Duration::from_millis(10)).is_none());
        assert!(q.try_poll().is_none());
        assert!(q.is_empty());
    }
}
