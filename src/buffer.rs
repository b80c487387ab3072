//! Caller-owned slot storage.
//!
//! The ring control block holds no payload memory of its own. The caller
//! supplies the slot array and hands the ring a [`BufferRef`], a small
//! `Copy` value wrapping a borrow of the slots, with every operation. The
//! array's lifetime must enclose every concurrent operation on the ring, and
//! it must hold at least `capacity` slots.
//!
//! [`Slot::empty`] is `const`, so the array can live wherever the caller
//! wants it:
//!
//! ```
//! use ringspmc::{BufferRef, Config, Ring, Slot};
//!
//! // Inline storage, no heap allocation.
//! let slots: [Slot<usize>; 8] = std::array::from_fn(|_| Slot::empty());
//! let ring = Ring::new(Config::with_capacity(8));
//! let buf = BufferRef::new(&slots);
//!
//! assert!(ring.enqueue(buf, 1));
//! assert_eq!(ring.dequeue_spsc(buf), Some(1));
//! ```
//!
//! [`SlotBuffer`] is the heap-owned convenience for when inline placement
//! does not matter.

use crate::entry::Entry;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One word-sized cell of ring storage.
///
/// The cell is an atomic word rather than a plain one: under the SPMC
/// protocol a consumer may read a slot while losing the claim race, at the
/// same moment the producer rewrites it for the next generation. The atomic
/// keeps that read defined, and keeps the compiler from hoisting or merging
/// it across the fences in the dequeue loop.
#[repr(transparent)]
pub struct Slot<T> {
    cell: AtomicUsize,
    _entry: PhantomData<T>,
}

// A populated slot logically owns a T in transit between threads, so the
// storage is shareable exactly when T may change threads.
unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

impl<T: Entry> Slot<T> {
    /// Creates an empty slot. The initial word is never observed by a
    /// conforming consumer; slots only surface values after an enqueue.
    pub const fn empty() -> Self {
        Self {
            cell: AtomicUsize::new(0),
            _entry: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn load(&self) -> usize {
        self.cell.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn store(&self, word: usize) {
        self.cell.store(word, Ordering::Relaxed);
    }
}

impl<T: Entry> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Heap-owned slot storage for a ring of a given capacity.
pub struct SlotBuffer<T> {
    slots: Box<[Slot<T>]>,
}

impl<T: Entry> SlotBuffer<T> {
    /// Allocates `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| Slot::empty()).collect();
        Self { slots }
    }

    /// Returns the by-value handle the ring operations take.
    #[inline]
    pub fn handle(&self) -> BufferRef<'_, T> {
        BufferRef { slots: &self.slots }
    }

    /// Number of slots in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the buffer holds no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Borrowed view of a slot array, passed by value to every ring operation.
///
/// The handle is `Copy`; clone it freely into producer and consumer threads.
/// It must reference at least `capacity` slots of the ring it is used with.
pub struct BufferRef<'a, T> {
    slots: &'a [Slot<T>],
}

impl<T> Clone for BufferRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BufferRef<'_, T> {}

impl<'a, T: Entry> BufferRef<'a, T> {
    /// Wraps a borrowed slot array.
    #[inline]
    pub fn new(slots: &'a [Slot<T>]) -> Self {
        Self { slots }
    }

    /// Number of slots behind the handle.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the handle references no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &'a Slot<T> {
        &self.slots[index]
    }
}

impl<'a, T: Entry> From<&'a [Slot<T>]> for BufferRef<'a, T> {
    fn from(slots: &'a [Slot<T>]) -> Self {
        Self::new(slots)
    }
}

impl<'a, T: Entry> From<&'a SlotBuffer<T>> for BufferRef<'a, T> {
    fn from(buffer: &'a SlotBuffer<T>) -> Self {
        buffer.handle()
    }
}
