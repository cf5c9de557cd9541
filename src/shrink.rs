//! Policies deciding when an idle worker may exit.
//!
//! A strategy is consulted by every worker on its idle/busy transitions and
//! before exiting. `evict` returning true means the strategy has already
//! accounted for the shrinkage: the worker must exit and must not call
//! `prune`. Exiting through any other path while the last `on_idle` returned
//! true requires a `prune` call to clear per-worker residue.

use std::sync::atomic::{AtomicU64, Ordering::SeqCst};
use std::time::{Duration, Instant};

use crate::bi_integer::{self, AtomicBiInteger};

/// The shrink policy, selected from the pool's tuning.
///
/// `idle_timeout == 0` disables shrinking entirely; `max_shrink_count == 1`
/// rate-limits the whole pool to one exit per idle timeout; a larger count
/// gives each worker its own idle TTL plus a per-interval eviction quota.
pub(crate) enum ShrinkStrategy {
    /// Never evicts.
    Noop,
    /// One eviction per interval, pool wide.
    Default(DefaultShrink),
    /// Per-worker TTL with a per-interval quota.
    Linear(LinearShrink),
}

impl ShrinkStrategy {
    /// Picks the strategy matching the tuning values. `reuse` keeps an
    /// existing `Default` instance alive so its timeline survives unrelated
    /// setter calls.
    pub(crate) fn select(
        idle_timeout: Duration,
        max_shrink_count: u32,
        max_threads: usize,
        reuse: Option<&ShrinkStrategy>,
    ) -> Option<ShrinkStrategy> {
        if idle_timeout.is_zero() {
            Some(ShrinkStrategy::Noop)
        } else if max_shrink_count != 1 {
            Some(ShrinkStrategy::Linear(LinearShrink::new(max_threads)))
        } else if matches!(reuse, Some(ShrinkStrategy::Default(_))) {
            None
        } else {
            Some(ShrinkStrategy::Default(DefaultShrink::new()))
        }
    }

    /// Reports a worker transitioning to idle. Returns whether `prune` must
    /// run if the worker exits through a non-eviction path.
    pub(crate) fn on_idle(&self, slot: usize) -> bool {
        match self {
            ShrinkStrategy::Noop | ShrinkStrategy::Default(_) => false,
            ShrinkStrategy::Linear(linear) => linear.on_idle(slot),
        }
    }

    /// Reports a worker transitioning idle to busy. Always returns false.
    pub(crate) fn on_busy(&self, slot: usize) -> bool {
        if let ShrinkStrategy::Linear(linear) = self {
            linear.clear(slot);
        }
        false
    }

    /// Asks whether the calling worker may exit now. On true the shrinkage
    /// is already accounted for and the caller must not `prune`.
    pub(crate) fn evict(&self, slot: usize, idle_timeout: Duration, max_evict: u32) -> bool {
        match self {
            ShrinkStrategy::Noop => false,
            ShrinkStrategy::Default(default) => default.evict(idle_timeout),
            ShrinkStrategy::Linear(linear) => linear.evict(slot, idle_timeout, max_evict),
        }
    }

    /// Clears per-worker residue on a non-eviction exit.
    pub(crate) fn prune(&self, slot: usize) {
        match self {
            ShrinkStrategy::Noop | ShrinkStrategy::Default(_) => {
                debug_assert!(false, "no per-worker state to prune");
            }
            ShrinkStrategy::Linear(linear) => linear.clear(slot),
        }
    }

    /// Resets the baseline timestamp, called at pool start and whenever a
    /// new worker starts so that growth is not immediately undone.
    pub(crate) fn init(&self) {
        match self {
            ShrinkStrategy::Noop => {}
            ShrinkStrategy::Default(default) => default.init(),
            ShrinkStrategy::Linear(linear) => linear.init(),
        }
    }
}

/// One global last-shrink timestamp; at most one eviction per interval.
pub(crate) struct DefaultShrink {
    epoch: Instant,
    last_shrink: AtomicU64,
}

impl DefaultShrink {
    fn new() -> DefaultShrink {
        DefaultShrink {
            epoch: Instant::now(),
            last_shrink: AtomicU64::new(0),
        }
    }

    fn now(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn init(&self) {
        self.last_shrink.store(self.now(), SeqCst);
    }

    fn evict(&self, idle_timeout: Duration) -> bool {
        let interval = idle_timeout.as_nanos() as u64;
        if interval == 0 {
            return false;
        }
        let last = self.last_shrink.load(SeqCst);
        let now = self.now();
        // Advance the timeline by at least one interval instead of jumping
        // to `now`: when many workers observe the timeout together only the
        // CAS winner exits, and the timeline never falls more than one
        // interval behind.
        now.saturating_sub(last) > interval
            && self
                .last_shrink
                .compare_exchange(
                    last,
                    (last + interval).max(now.saturating_sub(interval)),
                    SeqCst,
                    SeqCst,
                )
                .is_ok()
    }
}

/// Per-worker became-idle timestamps plus a windowed eviction quota.
///
/// Idle ages live in an arena indexed by the slot a worker is handed at
/// spawn time, so residue can be cleared without thread-local storage. The
/// window is a `(start_millis, evicted)` pair in one atomic cell; elapsed
/// comparisons use wrapping arithmetic on the 32 bit millisecond clock.
pub(crate) struct LinearShrink {
    epoch: Instant,
    window: AtomicBiInteger,
    idle_since: Box<[AtomicU64]>,
}

impl LinearShrink {
    fn new(capacity: usize) -> LinearShrink {
        let mut idle_since = Vec::with_capacity(capacity);
        idle_since.resize_with(capacity, || AtomicU64::new(0));
        LinearShrink {
            epoch: Instant::now(),
            window: AtomicBiInteger::new(0, 0),
            idle_since: idle_since.into_boxed_slice(),
        }
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn now_millis(&self) -> i32 {
        self.epoch.elapsed().as_millis() as u32 as i32
    }

    fn init(&self) {
        self.window.set(self.now_millis(), 0);
    }

    fn on_idle(&self, slot: usize) -> bool {
        match self.idle_since.get(slot) {
            Some(since) => {
                // 0 means "not idle", so pin the stamp to at least 1.
                since.store(self.now_nanos().max(1), SeqCst);
                true
            }
            None => false,
        }
    }

    fn clear(&self, slot: usize) {
        if let Some(since) = self.idle_since.get(slot) {
            since.store(0, SeqCst);
        }
    }

    fn evict(&self, slot: usize, idle_timeout: Duration, max_evict: u32) -> bool {
        let since = match self.idle_since.get(slot) {
            Some(since) => since,
            None => return false,
        };
        let stamp = since.load(SeqCst);
        if stamp == 0 {
            return false;
        }
        let interval = idle_timeout.as_nanos() as u64;
        if self.now_nanos().saturating_sub(stamp) < interval {
            return false;
        }

        let interval_millis = idle_timeout.as_millis().min(i32::MAX as u128) as i64;
        loop {
            let encoded = self.window.get();
            let start = bi_integer::hi(encoded);
            let evicted = bi_integer::lo(encoded);
            let now = self.now_millis();
            if i64::from(now.wrapping_sub(start)) > interval_millis {
                // Stale window: restart it and take the first slot of the
                // new quota.
                if self.window.compare_and_set(encoded, now, 1) {
                    since.store(0, SeqCst);
                    return true;
                }
            } else if evicted < max_evict as i32 {
                if self.window.compare_and_set(encoded, start, evicted + 1) {
                    since.store(0, SeqCst);
                    return true;
                }
            } else {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const IT: Duration = Duration::from_millis(40);

    #[test]
    fn noop_never_evicts() {
        let s = ShrinkStrategy::Noop;
        assert!(!s.on_idle(0));
        assert!(!s.on_busy(0));
        thread::sleep(IT * 2);
        assert!(!s.evict(0, IT, 1));
    }

    #[test]
    fn default_rate_limits_to_one_per_interval() {
        let s = ShrinkStrategy::select(IT, 1, 4, None).unwrap();
        s.init();
        assert!(!s.evict(0, IT, 1), "no eviction before the interval");
        thread::sleep(IT + Duration::from_millis(10));
        assert!(s.evict(0, IT, 1));
        assert!(!s.evict(1, IT, 1), "timeline advanced, second exit denied");
    }

    #[test]
    fn default_instance_is_reused() {
        let current = ShrinkStrategy::select(IT, 1, 4, None).unwrap();
        assert!(ShrinkStrategy::select(IT, 1, 4, Some(&current)).is_none());
        assert!(ShrinkStrategy::select(IT, 3, 4, Some(&current)).is_some());
    }

    #[test]
    fn linear_gates_on_idle_age() {
        let s = ShrinkStrategy::select(IT, 2, 4, None).unwrap();
        s.init();
        assert!(s.on_idle(0));
        assert!(!s.evict(0, IT, 2), "just became idle");
        thread::sleep(IT + Duration::from_millis(10));
        assert!(s.evict(0, IT, 2));
        assert!(!s.evict(0, IT, 2), "eviction cleared the idle stamp");
    }

    #[test]
    fn linear_caps_evictions_per_window() {
        let s = ShrinkStrategy::select(IT, 2, 8, None).unwrap();
        s.init();
        for slot in 0..4 {
            assert!(s.on_idle(slot));
        }
        thread::sleep(IT + Duration::from_millis(10));
        let exited = (0..4).filter(|&slot| s.evict(slot, IT, 2)).count();
        assert_eq!(exited, 2, "quota is two per window");
        thread::sleep(IT + Duration::from_millis(10));
        let exited = (0..4).filter(|&slot| s.evict(slot, IT, 2)).count();
        assert_eq!(exited, 2, "next window admits the rest");
    }

    #[test]
    fn linear_busy_and_prune_clear_residue() {
        let s = ShrinkStrategy::select(IT, 2, 4, None).unwrap();
        assert!(s.on_idle(1));
        assert!(!s.on_busy(1));
        thread::sleep(IT + Duration::from_millis(10));
        assert!(!s.evict(1, IT, 2), "busy cleared the stamp");

        assert!(s.on_idle(2));
        s.prune(2);
        thread::sleep(IT + Duration::from_millis(10));
        assert!(!s.evict(2, IT, 2), "prune cleared the stamp");
    }

    #[test]
    fn linear_ignores_out_of_range_slots() {
        let s = ShrinkStrategy::select(IT, 2, 2, None).unwrap();
        assert!(!s.on_idle(9));
        thread::sleep(IT + Duration::from_millis(10));
        assert!(!s.evict(9, IT, 2));
    }
}
