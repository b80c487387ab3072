//! Typed producer/consumer handles over a ring.
//!
//! The raw [`Ring`] trusts its callers to uphold the one-producer contract.
//! This layer encodes the contract in types instead: construction yields
//! exactly one [`Producer`], the SPSC [`Consumer`] cannot be cloned, and the
//! SPMC [`SpmcConsumer`] clones freely because its claim protocol tolerates
//! any number of rivals. The handles own the control block and the slot
//! storage together, and dropping a side is visible to the other as a
//! disconnect.
//!
//! ```
//! use ringspmc::{channel, Config};
//!
//! let (mut tx, rx) = channel::spmc::<u64>(Config::with_capacity(8));
//! let rx2 = rx.clone();
//!
//! tx.push(7).unwrap();
//! tx.push(11).unwrap();
//! assert_eq!(rx.pop(), Ok(7));
//! assert_eq!(rx2.pop(), Ok(11));
//! ```

use crate::buffer::{BufferRef, SlotBuffer};
use crate::entry::Entry;
use crate::{Config, MetricsSnapshot, Ring};
use std::hint;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

/// Why a push did not store its entry. Entries are `Copy`, so the caller
/// still holds the value and can simply push it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrySendError {
    /// The ring was full at the attempt.
    #[error("ring is full")]
    Full,
    /// Every consumer handle has been dropped; nothing will ever drain the
    /// ring again.
    #[error("all consumers disconnected")]
    Disconnected,
}

/// Why a pop did not return an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// The ring was observed empty. [`SpmcConsumer::try_pop`] also reports
    /// this after a lost claim race; callers cannot tell the two apart.
    #[error("ring is empty")]
    Empty,
    /// The producer handle was dropped and the ring is drained.
    #[error("producer disconnected")]
    Disconnected,
}

struct Shared<T: Entry> {
    ring: Ring<T>,
    slots: SlotBuffer<T>,
    producer_alive: AtomicBool,
    consumers: AtomicUsize,
}

impl<T: Entry> Shared<T> {
    fn new(config: Config) -> Self {
        Self {
            ring: Ring::new(config),
            slots: SlotBuffer::new(config.capacity()),
            producer_alive: AtomicBool::new(true),
            consumers: AtomicUsize::new(1),
        }
    }

    #[inline]
    fn buf(&self) -> BufferRef<'_, T> {
        self.slots.handle()
    }
}

/// Poll schedule shared by the `*_with_backoff` methods.
///
/// One burst of PAUSE spins sized to the ring, on the estimate that the
/// counterpart thread turns a slot around in roughly one pass over its own
/// hot path, so a small ring clears in fewer iterations than a large one.
/// After the burst, a handful of scheduler yields covers a descheduled
/// counterpart; past that the ring is genuinely stuck and the caller gets
/// the verdict back.
fn poll_until<R>(capacity: usize, mut attempt: impl FnMut() -> Option<R>) -> Option<R> {
    const SPIN_BURST_MAX: usize = 512;
    const YIELD_ROUNDS: usize = 4;

    for _ in 0..capacity.min(SPIN_BURST_MAX) {
        if let Some(result) = attempt() {
            return Some(result);
        }
        hint::spin_loop();
    }
    for _ in 0..YIELD_ROUNDS {
        thread::yield_now();
        if let Some(result) = attempt() {
            return Some(result);
        }
    }
    None
}

/// Creates a single-producer single-consumer ring.
///
/// Both handles are single-owner; move each to its thread.
pub fn spsc<T: Entry>(config: Config) -> (Producer<T>, Consumer<T>) {
    let shared = Arc::new(Shared::new(config));
    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

/// Creates a single-producer multi-consumer ring.
///
/// Clone the consumer once per consuming thread.
pub fn spmc<T: Entry>(config: Config) -> (Producer<T>, SpmcConsumer<T>) {
    let shared = Arc::new(Shared::new(config));
    (
        Producer {
            shared: Arc::clone(&shared),
        },
        SpmcConsumer { shared },
    )
}

/// The unique producing handle. Not cloneable; `&mut self` methods make the
/// one-at-a-time enqueue contract a compile-time fact.
pub struct Producer<T: Entry> {
    shared: Arc<Shared<T>>,
}

impl<T: Entry> Producer<T> {
    /// Stores an entry, or reports why it could not be stored.
    pub fn push(&mut self, entry: T) -> Result<(), TrySendError> {
        if self.shared.consumers.load(Ordering::Acquire) == 0 {
            return Err(TrySendError::Disconnected);
        }
        if self.shared.ring.enqueue(self.shared.buf(), entry) {
            Ok(())
        } else {
            Err(TrySendError::Full)
        }
    }

    /// [`push`](Producer::push) that also reports the occupancy observed
    /// just before the insertion attempt (pre-insertion snapshot: a push
    /// into an empty ring returns `Ok(0)`).
    pub fn push_with_len(&mut self, entry: T) -> Result<usize, TrySendError> {
        if self.shared.consumers.load(Ordering::Acquire) == 0 {
            return Err(TrySendError::Disconnected);
        }
        let (stored, len) = self.shared.ring.enqueue_with_len(self.shared.buf(), entry);
        if stored {
            Ok(len)
        } else {
            Err(TrySendError::Full)
        }
    }

    /// [`push`](Producer::push) that polls a full ring for a bounded spin
    /// and yield budget before giving up with [`TrySendError::Full`].
    pub fn push_with_backoff(&mut self, entry: T) -> Result<(), TrySendError> {
        poll_until(self.shared.ring.capacity(), || match self.push(entry) {
            Err(TrySendError::Full) => None,
            result => Some(result),
        })
        .unwrap_or(Err(TrySendError::Full))
    }

    /// Occupancy snapshot; see [`Ring::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    /// True if no entries were resident at the observation point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// True if a push at the observation point would have been refused.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    /// Ring counters snapshot; see [`Ring::metrics`].
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.ring.metrics()
    }
}

impl<T: Entry> Drop for Producer<T> {
    fn drop(&mut self) {
        self.shared.producer_alive.store(false, Ordering::Release);
    }
}

/// The unique SPSC consuming handle. Not cloneable; `&mut self` methods
/// make the single-consumer contract a compile-time fact.
pub struct Consumer<T: Entry> {
    shared: Arc<Shared<T>>,
}

impl<T: Entry> Consumer<T> {
    /// Removes the oldest entry, or reports why there was none.
    pub fn pop(&mut self) -> Result<T, TryRecvError> {
        if let Some(entry) = self.shared.ring.dequeue_spsc(self.shared.buf()) {
            return Ok(entry);
        }
        if self.shared.producer_alive.load(Ordering::Acquire) {
            return Err(TryRecvError::Empty);
        }
        // The producer is gone, but anything it published before dropping
        // is still in the ring; only an empty ring is a hangup.
        self.shared
            .ring
            .dequeue_spsc(self.shared.buf())
            .ok_or(TryRecvError::Disconnected)
    }

    /// [`pop`](Consumer::pop) that polls an empty ring for a bounded spin
    /// and yield budget before giving up with [`TryRecvError::Empty`].
    pub fn pop_with_backoff(&mut self) -> Result<T, TryRecvError> {
        poll_until(self.shared.ring.capacity(), || match self.pop() {
            Err(TryRecvError::Empty) => None,
            result => Some(result),
        })
        .unwrap_or(Err(TryRecvError::Empty))
    }

    /// Occupancy snapshot; see [`Ring::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    /// True if no entries were resident at the observation point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    /// Ring counters snapshot; see [`Ring::metrics`].
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.ring.metrics()
    }
}

impl<T: Entry> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.shared.consumers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A cloneable SPMC consuming handle. All clones race for claims through
/// the CAS protocol, so `&self` methods are safe to share.
pub struct SpmcConsumer<T: Entry> {
    shared: Arc<Shared<T>>,
}

impl<T: Entry> Clone for SpmcConsumer<T> {
    fn clone(&self) -> Self {
        self.shared.consumers.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Entry> SpmcConsumer<T> {
    /// Claims the oldest entry, retrying lost races, or reports why there
    /// was none.
    pub fn pop(&self) -> Result<T, TryRecvError> {
        if let Some(entry) = self.shared.ring.dequeue_spmc(self.shared.buf()) {
            return Ok(entry);
        }
        if self.shared.producer_alive.load(Ordering::Acquire) {
            return Err(TryRecvError::Empty);
        }
        self.shared
            .ring
            .dequeue_spmc(self.shared.buf())
            .ok_or(TryRecvError::Disconnected)
    }

    /// Attempts exactly one claim. `Empty` covers both an empty ring and a
    /// lost race; callers that must distinguish should use
    /// [`pop`](SpmcConsumer::pop).
    pub fn try_pop(&self) -> Result<T, TryRecvError> {
        if let Some(entry) = self.shared.ring.try_dequeue_spmc(self.shared.buf()) {
            return Ok(entry);
        }
        if self.shared.producer_alive.load(Ordering::Acquire) {
            return Err(TryRecvError::Empty);
        }
        // A dead producer with entries still resident is not a hangup; a
        // lost race in that state must also read as Empty so the caller
        // keeps draining.
        if self.shared.ring.is_empty() {
            Err(TryRecvError::Disconnected)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// [`pop`](SpmcConsumer::pop) that polls an empty ring for a bounded
    /// spin and yield budget before giving up with [`TryRecvError::Empty`].
    pub fn pop_with_backoff(&self) -> Result<T, TryRecvError> {
        poll_until(self.shared.ring.capacity(), || match self.pop() {
            Err(TryRecvError::Empty) => None,
            result => Some(result),
        })
        .unwrap_or(Err(TryRecvError::Empty))
    }

    /// Occupancy snapshot; see [`Ring::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    /// True if no entries were resident at the observation point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    /// Ring counters snapshot; see [`Ring::metrics`].
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.ring.metrics()
    }
}

impl<T: Entry> Drop for SpmcConsumer<T> {
    fn drop(&mut self) {
        self.shared.consumers.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spsc_round_trip() {
        let (mut tx, mut rx) = spsc::<u64>(Config::with_capacity(4));
        tx.push(1).unwrap();
        tx.push(2).unwrap();
        assert_eq!(rx.pop(), Ok(1));
        assert_eq!(rx.pop(), Ok(2));
        assert_eq!(rx.pop(), Err(TryRecvError::Empty));
    }

    #[test]
    fn full_ring_refuses_push() {
        let (mut tx, _rx) = spsc::<u64>(Config::with_capacity(2));
        tx.push(5).unwrap();
        assert_eq!(tx.push(6), Err(TrySendError::Full));
        // The refused entry was not stored; the resident one is untouched.
        assert_eq!(tx.len(), 1);
    }

    #[test]
    fn push_with_len_reports_pre_insertion_depth() {
        let (mut tx, _rx) = spsc::<u64>(Config::with_capacity(8));
        assert_eq!(tx.push_with_len(10), Ok(0));
        assert_eq!(tx.push_with_len(11), Ok(1));
        assert_eq!(tx.push_with_len(12), Ok(2));
        assert_eq!(tx.len(), 3);
    }

    #[test]
    fn dropping_consumer_disconnects_producer() {
        let (mut tx, rx) = spsc::<u64>(Config::with_capacity(4));
        drop(rx);
        assert_eq!(tx.push(9), Err(TrySendError::Disconnected));
    }

    #[test]
    fn dropping_producer_lets_consumer_drain() {
        let (mut tx, mut rx) = spsc::<u64>(Config::with_capacity(4));
        tx.push(1).unwrap();
        tx.push(2).unwrap();
        drop(tx);

        assert_eq!(rx.pop(), Ok(1));
        assert_eq!(rx.pop(), Ok(2));
        assert_eq!(rx.pop(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn spmc_clones_share_the_stream() {
        let (mut tx, rx) = spmc::<u64>(Config::with_capacity(8));
        let rx2 = rx.clone();

        for v in 0..4 {
            tx.push(v).unwrap();
        }
        assert_eq!(rx.pop(), Ok(0));
        assert_eq!(rx2.pop(), Ok(1));
        assert_eq!(rx.try_pop(), Ok(2));
        assert_eq!(rx2.pop(), Ok(3));
        assert_eq!(rx.try_pop(), Err(TryRecvError::Empty));
    }

    #[test]
    fn last_spmc_consumer_drop_disconnects() {
        let (mut tx, rx) = spmc::<u64>(Config::with_capacity(4));
        let rx2 = rx.clone();
        drop(rx);
        tx.push(1).unwrap();
        drop(rx2);
        assert_eq!(tx.push(2), Err(TrySendError::Disconnected));
    }

    #[test]
    fn spmc_drains_after_producer_drop() {
        let (mut tx, rx) = spmc::<u64>(Config::with_capacity(8));
        tx.push(7).unwrap();
        drop(tx);
        assert_eq!(rx.try_pop(), Ok(7));
        assert_eq!(rx.try_pop(), Err(TryRecvError::Disconnected));
        assert_eq!(rx.pop(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn backoff_variants_give_up_cleanly() {
        let (mut tx, mut rx) = spsc::<u64>(Config::with_capacity(2));
        assert_eq!(rx.pop_with_backoff(), Err(TryRecvError::Empty));
        tx.push(1).unwrap();
        assert_eq!(tx.push_with_backoff(2), Err(TrySendError::Full));
    }
}
