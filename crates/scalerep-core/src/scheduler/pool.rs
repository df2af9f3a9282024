//! Worker slots: the cap on reports in flight at once.

/// Fixed number of worker slots. A slot is taken when a report is accepted
/// and given back when its artifact shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPool {
    total: usize,
    available: usize,
}

impl WorkerPool {
    /// Create a pool with `total` slots (at least one).
    pub fn new(total: usize) -> Self {
        let total = total.max(1);
        Self {
            total,
            available: total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Free slots, in `0..=total`.
    pub fn available(&self) -> usize {
        self.available
    }

    pub fn in_use(&self) -> usize {
        self.total - self.available
    }

    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }

    /// Take one slot. Returns false (and takes nothing) when none is free.
    pub fn acquire(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        true
    }

    /// Give one slot back. Never exceeds `total`.
    pub fn release(&mut self) {
        self.available = (self.available + 1).min(self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release() {
        let mut pool = WorkerPool::new(2);
        assert_eq!(pool.available(), 2);
        assert!(pool.acquire());
        assert!(pool.acquire());
        assert!(pool.is_exhausted());
        assert_eq!(pool.in_use(), 2);
        assert!(!pool.acquire());
        assert_eq!(pool.available(), 0);
        pool.release();
        assert_eq!(pool.available(), 1);
        pool.release();
        pool.release();
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn zero_total_becomes_one() {
        let mut pool = WorkerPool::new(0);
        assert_eq!(pool.total(), 1);
        assert!(pool.acquire());
        assert!(!pool.acquire());
    }
}
