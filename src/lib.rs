//! ringspmc - Bounded Lock-Free SPSC/SPMC Ring Buffer
//!
//! A single ring protocol with two consumer disciplines: exactly one
//! consumer ([`Ring::dequeue_spsc`]) or any number of consumers racing for
//! claims ([`Ring::dequeue_spmc`] / [`Ring::try_dequeue_spmc`]). The
//! producer side is the same for both. No operation ever blocks; callers
//! poll, optionally through the handle layer's bounded `*_with_backoff`
//! variants.
//!
//! # Key properties
//!
//! - Fence-based handoff: a release fence publishes each slot before the
//!   tail store, paired with acquire fences on the consumer side
//! - 128-byte counter separation (no producer/consumer false sharing)
//! - Wrapping word-sized counters; the protocol survives counter wrap
//! - Caller-owned slot storage, heap or inline, handed to every operation
//!   as a by-value [`BufferRef`]
//! - Entries are opaque machine words ([`Entry`]): integers or raw
//!   pointers, never interpreted, never dropped
//!
//! # Example
//!
//! ```
//! use ringspmc::{Config, Ring, SlotBuffer};
//!
//! let ring = Ring::new(Config::with_capacity(4));
//! let storage = SlotBuffer::<usize>::new(4);
//! let buf = storage.handle();
//!
//! assert!(ring.enqueue(buf, 1));
//! assert!(ring.enqueue(buf, 2));
//! assert!(ring.enqueue(buf, 3));
//! assert!(!ring.enqueue(buf, 4)); // one slot always stays empty
//!
//! assert_eq!(ring.dequeue_spsc(buf), Some(1));
//! ```
//!
//! The raw [`Ring`] leaves the one-producer / consumer-discipline contract
//! to the caller, like any control block shared by address. The
//! [`channel`] module encodes the contract in handle types instead; start
//! there unless you need to place the storage yourself.

mod buffer;
pub mod channel;
mod config;
mod entry;
mod invariants;
mod metrics;
mod ring;

pub use buffer::{BufferRef, Slot, SlotBuffer};
pub use channel::{Consumer, Producer, SpmcConsumer, TryRecvError, TrySendError};
pub use config::Config;
pub use entry::Entry;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::Ring;
