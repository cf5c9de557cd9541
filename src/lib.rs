//! A bounded, elastic worker thread pool with a queue of jobs to execute.
//!
//! Jobs are submitted concurrently from many producers; a dynamically sized
//! set of worker threads drains them from a blocking FIFO and runs them.
//! The pool grows on demand up to a configured ceiling, shrinks back toward
//! a floor when idle, and stops gracefully in two phases within a
//! configurable time budget.
//!
//! Producers and workers coordinate through a single atomic word encoding
//! both the live worker count and a signed net-idle counter (idle workers
//! minus queued jobs), so every growth decision and every idle/busy
//! transition is one compare-and-set over the pair.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use queued_threadpool::Builder;
//!
//! let pool = Builder::new()
//!     .min_threads(2)
//!     .max_threads(8)
//!     .idle_timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//! pool.start().unwrap();
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! for _ in 0..16 {
//!     let done = done.clone();
//!     pool.spawn(move || {
//!         done.fetch_add(1, SeqCst);
//!     })
//!     .unwrap();
//! }
//! while done.load(SeqCst) < 16 {
//!     std::thread::sleep(Duration::from_millis(1));
//! }
//!
//! pool.stop();
//! pool.join();
//! assert!(!pool.is_running());
//! ```
//!
//! Internal components that permanently occupy workers (an acceptor, a
//! poller) take a [`Lease`] from the pool's [`Budget`]; a reservation
//! facility implementing [`TryExecutor`] can be installed to dispatch jobs
//! to parked threads without touching the queue.

#![warn(missing_docs)]

mod bi_integer;
mod budget;
mod builder;
mod config;
mod error;
mod job;
mod pool;
mod queue;
mod reserved;
mod shrink;
mod worker;

pub use bi_integer::AtomicBiInteger;
pub use budget::{Budget, Lease};
pub use builder::Builder;
pub use error::{ConfigError, Rejected, RejectedReason};
pub use job::{CloseableTask, Job};
pub use pool::ThreadPool;
pub use queue::{ChannelQueue, JobQueue};
pub use reserved::{NoTry, TryExecutor, TryExecutorFactory};
