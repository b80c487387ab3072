use crate::buffer::BufferRef;
use crate::entry::Entry;
use crate::invariants::{debug_assert_buffer_covers, debug_assert_occupancy_bounded};
use crate::{Config, Metrics, MetricsSnapshot};
use std::marker::PhantomData;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

// =============================================================================
// MEMORY ORDERING PROTOCOL
// =============================================================================
//
// Two monotonically increasing counters drive the ring:
//
// - `tail`: entries inserted; written only by the single producer.
// - `head`: entries removed; written by the single consumer (SPSC) or
//   advanced by CAS from any consumer (SPMC).
//
// Counters wrap the machine word deliberately. Occupancy is the wrapping
// difference `tail - head`, a slot index is `counter & mask`, and the full
// and empty conditions compare masked counters. That keeps the protocol
// correct across counter wraparound for any capacity up to half the word
// range.
//
// The handoff is fence-based rather than per-operation acquire/release:
//
// **Producer:** write slot, release fence, relaxed store of `tail`. Any
// consumer that observes the new tail and then issues an acquire fence also
// observes the slot write.
//
// **SPSC consumer:** relaxed load of `tail`, acquire fence, slot read,
// release fence, relaxed store of `head`. The trailing release fence keeps
// the slot read from drifting past the head advance that hands the slot
// back to the producer.
//
// **SPMC consumer:** same observation fences, then a full barrier between
// the slot read and the head CAS. Between a consumer's head snapshot and
// its CAS, another consumer can claim the slot and the producer can rewrite
// it; the slot read is an atomic load so that racing read stays defined and
// is re-issued every iteration, and the CAS decides whether the latched
// word still belonged to this consumer's generation. A failed CAS discards
// the word and retries from the observed head.
//
// `head` and `tail` live on separate 128-byte blocks so producer and
// consumer traffic never invalidates the other side's cache line.
//
// =============================================================================

/// Bounded lock-free ring buffer control block.
///
/// The control block holds only the counters and geometry; slot storage is
/// caller-owned and passed to every operation as a [`BufferRef`]. One slot
/// always stays empty to distinguish full from empty, so a ring of capacity
/// `n` holds at most `n - 1` entries.
///
/// Concurrency contract: at most one thread enqueues at a time. Dequeuing
/// is either single-consumer ([`dequeue_spsc`]) or multi-consumer
/// ([`dequeue_spmc`] / [`try_dequeue_spmc`]); the two consumer disciplines
/// must not be mixed on one ring. Violating the contract cannot corrupt
/// memory, since all shared state is atomic, but entries may then be lost
/// or duplicated. The typed handles in [`channel`](crate::channel) encode
/// the contract in the type system.
///
/// [`dequeue_spsc`]: Ring::dequeue_spsc
/// [`dequeue_spmc`]: Ring::dequeue_spmc
/// [`try_dequeue_spmc`]: Ring::try_dequeue_spmc
#[repr(C)]
pub struct Ring<T> {
    /// Count of entries removed. Own cache-line block; see module banner.
    head: CacheAligned<AtomicUsize>,
    /// Count of entries inserted. Own cache-line block.
    tail: CacheAligned<AtomicUsize>,
    config: Config,
    metrics: Metrics,
    _entry: PhantomData<fn(T) -> T>,
}

impl<T: Entry> Ring<T> {
    /// Creates a ring with both counters at zero.
    ///
    /// Publishing the ring to other threads is the caller's job; anything
    /// that hands out a reference (spawn, `Arc`, scoped threads) provides
    /// the release edge.
    pub fn new(config: Config) -> Self {
        Self {
            head: CacheAligned::new(AtomicUsize::new(0)),
            tail: CacheAligned::new(AtomicUsize::new(0)),
            config,
            metrics: Metrics::new(),
            _entry: PhantomData,
        }
    }

    /// Total slot count, including the always-empty slot.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.config.mask()
    }

    /// Number of resident entries.
    ///
    /// Best-effort snapshot: the two counter loads are not atomic as a pair,
    /// so the result is a length that was current at some point during the
    /// call and may briefly read `capacity - 1` while a dequeue is in
    /// flight. Safe to call from any thread.
    #[inline]
    pub fn len(&self) -> usize {
        let consumer = self.head.load(Ordering::Relaxed);
        let producer = self.tail.load(Ordering::Relaxed);
        producer.wrapping_sub(consumer) & self.mask()
    }

    /// True if no entries were resident at the observation point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if an enqueue at the observation point would have been refused.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.mask()
    }

    /// Returns a counters snapshot; all zeros unless
    /// [`Config::enable_metrics`] was set.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Stores `entry` at the tail. Returns `true` on success, `false` if
    /// the ring was full at the linearization point (the tail publication).
    /// Never blocks.
    ///
    /// Only one thread may enqueue at a time; any number of consumers may
    /// run concurrently. The same producer side serves both the SPSC and
    /// SPMC disciplines.
    #[inline]
    pub fn enqueue(&self, buf: BufferRef<'_, T>, entry: T) -> bool {
        self.enqueue_inner(buf, entry).0
    }

    /// [`enqueue`](Ring::enqueue) that also reports the occupancy observed
    /// just before the insertion attempt.
    ///
    /// The snapshot is pre-insertion: after a successful enqueue the ring
    /// holds one entry more than the returned length, and on a full ring
    /// the snapshot reads `capacity - 1`. The producer can expose queue
    /// depth this way without consumers ever writing a shared line for it.
    #[inline]
    pub fn enqueue_with_len(&self, buf: BufferRef<'_, T>, entry: T) -> (bool, usize) {
        self.enqueue_inner(buf, entry)
    }

    #[inline]
    fn enqueue_inner(&self, buf: BufferRef<'_, T>, entry: T) -> (bool, usize) {
        debug_assert_buffer_covers!(buf.len(), self.capacity());
        let mask = self.mask();

        // A stale head can only under-report free space, never invent it,
        // so an acquire edge is not needed here. Only this thread writes
        // `tail`, so the relaxed load observes the current value.
        let consumer = self.head.load(Ordering::Relaxed);
        let producer = self.tail.load(Ordering::Relaxed);
        let next = producer.wrapping_add(1);
        let occupancy = producer.wrapping_sub(consumer) & mask;
        debug_assert_occupancy_bounded!(producer, consumer, mask);

        if next & mask == consumer & mask {
            if self.config.enable_metrics {
                self.metrics.add_full_rejections(1);
            }
            return (false, occupancy);
        }

        buf.slot(producer & mask).store(entry.into_word());

        // The slot write must be visible before the tail update announces
        // the slot as consumable.
        fence(Ordering::Release);
        self.tail.store(next, Ordering::Relaxed);

        if self.config.enable_metrics {
            self.metrics.add_enqueued(1);
        }
        (true, occupancy)
    }

    /// Removes the entry at the head. Returns `None` if the ring was empty.
    /// Never blocks.
    ///
    /// Single-consumer discipline: exactly one thread may call this,
    /// concurrently with at most one producer.
    pub fn dequeue_spsc(&self, buf: BufferRef<'_, T>) -> Option<T> {
        debug_assert_buffer_covers!(buf.len(), self.capacity());
        let mask = self.mask();

        // Only this thread writes `head`.
        let consumer = self.head.load(Ordering::Relaxed);
        let producer = self.tail.load(Ordering::Relaxed);

        if consumer == producer {
            return None;
        }
        debug_assert_occupancy_bounded!(producer, consumer, mask);

        // Serialize the slot read against the tail snapshot; pairs with the
        // producer's release fence.
        fence(Ordering::Acquire);

        let word = buf.slot(consumer & mask).load();

        // The word must be latched before the head advance returns the slot
        // to the producer for rewriting.
        fence(Ordering::Release);
        self.head.store(consumer.wrapping_add(1), Ordering::Relaxed);

        if self.config.enable_metrics {
            self.metrics.add_dequeued(1);
        }
        Some(T::from_word(word))
    }

    /// Removes the entry at the head, racing other consumers for the claim.
    /// Returns `None` only when the ring was observed empty. Never blocks,
    /// but retries the claim while losing races (lock-free, not wait-free).
    ///
    /// Any number of threads may call this concurrently with at most one
    /// producer.
    pub fn dequeue_spmc(&self, buf: BufferRef<'_, T>) -> Option<T> {
        debug_assert_buffer_covers!(buf.len(), self.capacity());
        let mask = self.mask();

        let mut consumer = self.head.load(Ordering::Relaxed);

        loop {
            // The tail must represent state no older than the head snapshot
            // it is compared against.
            fence(Ordering::Acquire);
            let producer = self.tail.load(Ordering::Relaxed);

            if consumer == producer {
                return None;
            }
            debug_assert_occupancy_bounded!(producer, consumer, mask);

            fence(Ordering::Acquire);

            // Atomic load, re-issued on every iteration: a rival consumer
            // can claim this slot and the producer can rewrite it while we
            // race toward the CAS. The CAS below validates that the latched
            // word still belonged to our generation of the slot.
            let word = buf.slot(consumer & mask).load();

            // Full barrier between the slot read and the head CAS.
            fence(Ordering::SeqCst);

            // The claim itself is sequentially consistent, like the fences
            // around it; a weaker CAS would not take part in their total
            // order.
            match self.head.compare_exchange(
                consumer,
                consumer.wrapping_add(1),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    if self.config.enable_metrics {
                        self.metrics.add_dequeued(1);
                    }
                    return Some(T::from_word(word));
                }
                Err(observed) => {
                    if self.config.enable_metrics {
                        self.metrics.add_cas_failures(1);
                    }
                    consumer = observed;
                }
            }
        }
    }

    /// [`dequeue_spmc`](Ring::dequeue_spmc) with exactly one claim attempt.
    ///
    /// Returns `None` when the ring was observed empty *or* when the claim
    /// race was lost; callers cannot tell the two apart and retry under
    /// whatever backoff policy suits them.
    pub fn try_dequeue_spmc(&self, buf: BufferRef<'_, T>) -> Option<T> {
        debug_assert_buffer_covers!(buf.len(), self.capacity());
        let mask = self.mask();

        let consumer = self.head.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        let producer = self.tail.load(Ordering::Relaxed);

        if consumer == producer {
            return None;
        }
        debug_assert_occupancy_bounded!(producer, consumer, mask);

        fence(Ordering::Acquire);
        let word = buf.slot(consumer & mask).load();
        fence(Ordering::SeqCst);

        match self.head.compare_exchange(
            consumer,
            consumer.wrapping_add(1),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                if self.config.enable_metrics {
                    self.metrics.add_dequeued(1);
                }
                Some(T::from_word(word))
            }
            Err(_) => {
                if self.config.enable_metrics {
                    self.metrics.add_cas_failures(1);
                }
                None
            }
        }
    }

    /// Starts both counters at `sequence` instead of zero. Test seam for
    /// exercising counter wraparound; the public protocol never depends on
    /// the absolute counter values.
    #[cfg(test)]
    fn seed_counters(&self, sequence: usize) {
        self.head.store(sequence, Ordering::Relaxed);
        self.tail.store(sequence, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------
// HELPER: cache-line separation for the counters
// ---------------------------------------------------------------------

/// 128-byte-aligned wrapper. Two of these in a `#[repr(C)]` struct can
/// never share a cache line, and the doubled line size also defeats
/// adjacent-line prefetching on common x86 parts.
#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
