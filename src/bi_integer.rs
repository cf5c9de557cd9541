//! A 64 bit atomic cell holding two 32 bit halves that update together.

use std::sync::atomic::{AtomicI64, Ordering::SeqCst};

/// Packs two `i32` values into the encoded `i64` representation.
pub fn encode(hi: i32, lo: i32) -> i64 {
    ((hi as i64) << 32) | ((lo as i64) & 0xFFFF_FFFF)
}

/// Extracts the hi half from an encoded value.
pub fn hi(encoded: i64) -> i32 {
    (encoded >> 32) as i32
}

/// Extracts the lo half from an encoded value.
pub fn lo(encoded: i64) -> i32 {
    encoded as i32
}

/// An atomic pair of signed 32 bit integers sharing one 64 bit cell.
///
/// The two halves can only change together, via a compare-and-set over the
/// whole cell, which is what makes correlated updates of the pair safe under
/// concurrency. All operations are sequentially consistent. Overflow of
/// either half is the caller's responsibility.
#[derive(Debug)]
pub struct AtomicBiInteger {
    cell: AtomicI64,
}

impl AtomicBiInteger {
    /// Creates a cell initialized to the given halves.
    pub fn new(hi: i32, lo: i32) -> AtomicBiInteger {
        AtomicBiInteger {
            cell: AtomicI64::new(encode(hi, lo)),
        }
    }

    /// Returns the encoded value of both halves.
    pub fn get(&self) -> i64 {
        self.cell.load(SeqCst)
    }

    /// Returns the hi half.
    pub fn hi(&self) -> i32 {
        hi(self.get())
    }

    /// Returns the lo half.
    pub fn lo(&self) -> i32 {
        lo(self.get())
    }

    /// Unconditionally sets both halves.
    pub fn set(&self, hi: i32, lo: i32) {
        self.cell.store(encode(hi, lo), SeqCst);
    }

    /// Sets both halves if the current encoded value is `expect`.
    pub fn compare_and_set(&self, expect: i64, hi: i32, lo: i32) -> bool {
        self.cell
            .compare_exchange(expect, encode(hi, lo), SeqCst, SeqCst)
            .is_ok()
    }

    /// Sets the hi half, preserving lo, and returns the previous hi.
    pub fn get_and_set_hi(&self, new_hi: i32) -> i32 {
        let mut encoded = self.get();
        loop {
            match self
                .cell
                .compare_exchange(encoded, encode(new_hi, lo(encoded)), SeqCst, SeqCst)
            {
                Ok(_) => return hi(encoded),
                Err(actual) => encoded = actual,
            }
        }
    }

    /// Adds `delta` to the hi half, preserving lo, and returns the new hi.
    pub fn add_hi(&self, delta: i32) -> i32 {
        let mut encoded = self.get();
        loop {
            let next = hi(encoded) + delta;
            match self
                .cell
                .compare_exchange(encoded, encode(next, lo(encoded)), SeqCst, SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => encoded = actual,
            }
        }
    }

    /// Adds `delta` to the lo half, preserving hi, and returns the new lo.
    pub fn add_lo(&self, delta: i32) -> i32 {
        let mut encoded = self.get();
        loop {
            let next = lo(encoded) + delta;
            match self
                .cell
                .compare_exchange(encoded, encode(hi(encoded), next), SeqCst, SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => encoded = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_round_trips_signs() {
        for &h in &[0, 1, -1, i32::MAX, i32::MIN] {
            for &l in &[0, 1, -1, i32::MAX, i32::MIN] {
                let e = encode(h, l);
                assert_eq!(hi(e), h);
                assert_eq!(lo(e), l);
            }
        }
    }

    #[test]
    fn set_and_get() {
        let c = AtomicBiInteger::new(7, -3);
        assert_eq!(c.hi(), 7);
        assert_eq!(c.lo(), -3);
        c.set(-10, 42);
        assert_eq!(c.hi(), -10);
        assert_eq!(c.lo(), 42);
    }

    #[test]
    fn compare_and_set_pair() {
        let c = AtomicBiInteger::new(1, 2);
        let snapshot = c.get();
        assert!(c.compare_and_set(snapshot, 3, 4));
        assert!(!c.compare_and_set(snapshot, 5, 6));
        assert_eq!(c.hi(), 3);
        assert_eq!(c.lo(), 4);
    }

    #[test]
    fn add_halves_preserve_each_other() {
        let c = AtomicBiInteger::new(10, -5);
        assert_eq!(c.add_hi(3), 13);
        assert_eq!(c.lo(), -5);
        assert_eq!(c.add_lo(-2), -7);
        assert_eq!(c.hi(), 13);
    }

    #[test]
    fn get_and_set_hi_preserves_lo() {
        let c = AtomicBiInteger::new(5, 9);
        assert_eq!(c.get_and_set_hi(i32::MIN), 5);
        assert_eq!(c.hi(), i32::MIN);
        assert_eq!(c.lo(), 9);
    }
}
