use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for a ring.
///
/// All counters use `Relaxed` ordering: they are purely statistical, no
/// control flow depends on exact values, and eventual visibility is enough
/// for observability.
#[derive(Debug)]
pub struct Metrics {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    full_rejections: AtomicU64,
    cas_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            full_rejections: AtomicU64::new(0),
            cas_failures: AtomicU64::new(0),
        }
    }

    /// Count successful enqueues.
    #[inline]
    pub fn add_enqueued(&self, n: u64) {
        self.enqueued.fetch_add(n, Ordering::Relaxed);
    }

    /// Count successful dequeues.
    #[inline]
    pub fn add_dequeued(&self, n: u64) {
        self.dequeued.fetch_add(n, Ordering::Relaxed);
    }

    /// Count enqueues that found the ring full.
    #[inline]
    pub fn add_full_rejections(&self, n: u64) {
        self.full_rejections.fetch_add(n, Ordering::Relaxed);
    }

    /// Count lost claim races in the multi-consumer dequeue loop.
    #[inline]
    pub fn add_cas_failures(&self, n: u64) {
        self.cas_failures.fetch_add(n, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            cas_failures: self.cas_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-value copy of [`Metrics`] counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Entries stored by the producer.
    pub enqueued: u64,
    /// Entries removed by consumers.
    pub dequeued: u64,
    /// Enqueue attempts rejected because the ring was full.
    pub full_rejections: u64,
    /// Multi-consumer claim attempts that lost the head race and retried.
    pub cas_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.add_enqueued(3);
        metrics.add_dequeued(2);
        metrics.add_full_rejections(1);
        metrics.add_cas_failures(5);

        let snap = metrics.snapshot();
        assert_eq!(snap.enqueued, 3);
        assert_eq!(snap.dequeued, 2);
        assert_eq!(snap.full_rejections, 1);
        assert_eq!(snap.cas_failures, 5);
    }

    #[test]
    fn snapshot_is_detached() {
        let metrics = Metrics::new();
        let before = metrics.snapshot();
        metrics.add_enqueued(1);
        assert_eq!(before.enqueued, 0);
        assert_ne!(before, metrics.snapshot());
    }
}
