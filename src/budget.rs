//! A ledger of threads leased to internal components.
//!
//! Components such as acceptors take a [`Lease`] for the threads they will
//! permanently occupy; the pool checks proposed maximums against the ledger
//! so that transient jobs are never starved by configuration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering::SeqCst};
use std::sync::{Arc, Mutex};

use crate::error::ConfigError;

/// Tracks thread leases against a pool.
#[derive(Debug, Default)]
pub struct Budget {
    leases: Mutex<HashMap<u64, usize>>,
    next_id: AtomicU64,
}

impl Budget {
    pub(crate) fn new() -> Arc<Budget> {
        Arc::new(Budget::default())
    }

    /// Total number of threads currently leased.
    pub fn leased(&self) -> usize {
        self.leases.lock().expect("budget lock").values().sum()
    }

    /// Verifies that `max_threads` still covers the outstanding leases.
    pub fn check(&self, max_threads: usize) -> Result<(), ConfigError> {
        let leased = self.leased();
        if leased > max_threads {
            return Err(ConfigError::BudgetExceeded {
                leased,
                max: max_threads,
            });
        }
        Ok(())
    }

    /// Clears every lease; outstanding guards become inert.
    pub fn reset(&self) {
        self.leases.lock().expect("budget lock").clear();
    }

    pub(crate) fn lease(self: &Arc<Self>, threads: usize) -> Lease {
        let id = self.next_id.fetch_add(1, SeqCst);
        self.leases.lock().expect("budget lock").insert(id, threads);
        Lease {
            budget: self.clone(),
            id,
            threads,
        }
    }

    fn release(&self, id: u64) {
        self.leases.lock().expect("budget lock").remove(&id);
    }
}

/// A claim on pool threads, released on drop.
#[derive(Debug)]
pub struct Lease {
    budget: Arc<Budget>,
    id: u64,
    threads: usize,
}

impl Lease {
    /// Number of threads this lease claims.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.budget.release(self.id);
    }
}
