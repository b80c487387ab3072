//! Boundary behavior of the ring operations, single-threaded.

use ringspmc::{Config, Ring, SlotBuffer};

fn ring_and_buffer(capacity: usize) -> (Ring<u64>, SlotBuffer<u64>) {
    (
        Ring::new(Config::with_capacity(capacity)),
        SlotBuffer::new(capacity),
    )
}

#[test]
fn dequeue_from_empty_ring_fails() {
    let (ring, storage) = ring_and_buffer(4);
    let buf = storage.handle();

    assert_eq!(ring.dequeue_spsc(buf), None);
    assert_eq!(ring.dequeue_spmc(buf), None);
    assert_eq!(ring.try_dequeue_spmc(buf), None);
    assert!(ring.is_empty());
    assert_eq!(ring.len(), 0);
}

#[test]
fn capacity_four_holds_three_entries() {
    let (ring, storage) = ring_and_buffer(4);
    let buf = storage.handle();

    assert!(ring.enqueue(buf, 0xA));
    assert!(ring.enqueue(buf, 0xB));
    assert!(ring.enqueue(buf, 0xC));
    assert!(!ring.enqueue(buf, 0xD));

    assert_eq!(ring.len(), 3);
    assert!(ring.is_full());
    assert_eq!(ring.capacity(), 4);
}

#[test]
fn filled_ring_drains_in_order_then_reports_empty() {
    let (ring, storage) = ring_and_buffer(4);
    let buf = storage.handle();

    for v in [0xA, 0xB, 0xC] {
        assert!(ring.enqueue(buf, v));
    }

    assert_eq!(ring.dequeue_spsc(buf), Some(0xA));
    assert_eq!(ring.dequeue_spsc(buf), Some(0xB));
    assert_eq!(ring.dequeue_spsc(buf), Some(0xC));
    assert_eq!(ring.dequeue_spsc(buf), None);
}

#[test]
fn smallest_ring_ping_pongs() {
    let (ring, storage) = ring_and_buffer(2);
    let buf = storage.handle();

    for v in [0x58, 0x59, 0x5A] {
        assert!(ring.enqueue(buf, v));
        assert_eq!(ring.dequeue_spsc(buf), Some(v));
    }
    assert!(ring.is_empty());
    assert_eq!(ring.dequeue_spsc(buf), None);
}

#[test]
fn wrap_around_slot_reuse() {
    let (ring, storage) = ring_and_buffer(4);
    let buf = storage.handle();

    // Walk the counters several times around the slot array.
    for v in 0..32u64 {
        assert!(ring.enqueue(buf, v));
        assert!(ring.enqueue(buf, v + 1000));
        assert_eq!(ring.dequeue_spsc(buf), Some(v));
        assert_eq!(ring.dequeue_spsc(buf), Some(v + 1000));
    }
    assert!(ring.is_empty());
}

#[test]
fn len_tracks_enqueue_dequeue_pairs() {
    let (ring, storage) = ring_and_buffer(8);
    let buf = storage.handle();

    for i in 0..7u64 {
        assert_eq!(ring.len(), i as usize);
        assert!(ring.enqueue(buf, i));
    }
    assert!(ring.is_full());

    for i in (0..7u64).rev() {
        assert_eq!(ring.dequeue_spmc(buf), Some(6 - i));
        assert_eq!(ring.len(), i as usize);
    }
}

#[test]
fn pre_insertion_snapshot_via_public_api() {
    let (ring, storage) = ring_and_buffer(4);
    let buf = storage.handle();

    assert_eq!(ring.enqueue_with_len(buf, 1), (true, 0));
    assert_eq!(ring.enqueue_with_len(buf, 2), (true, 1));
    assert_eq!(ring.enqueue_with_len(buf, 3), (true, 2));
    assert_eq!(ring.enqueue_with_len(buf, 4), (false, 3));

    // Draining and refilling keeps the snapshot consistent with len().
    assert_eq!(ring.dequeue_spsc(buf), Some(1));
    assert_eq!(ring.enqueue_with_len(buf, 5), (true, 2));
}

#[test]
fn mixed_spmc_dequeue_flavors_preserve_order() {
    let (ring, storage) = ring_and_buffer(8);
    let buf = storage.handle();

    for v in 0..6u64 {
        assert!(ring.enqueue(buf, v));
    }
    assert_eq!(ring.dequeue_spmc(buf), Some(0));
    assert_eq!(ring.try_dequeue_spmc(buf), Some(1));
    assert_eq!(ring.dequeue_spmc(buf), Some(2));
    assert_eq!(ring.try_dequeue_spmc(buf), Some(3));
    assert_eq!(ring.dequeue_spmc(buf), Some(4));
    assert_eq!(ring.dequeue_spmc(buf), Some(5));
    assert_eq!(ring.try_dequeue_spmc(buf), None);
}

#[test]
fn pointer_entries_round_trip() {
    let values = [10u32, 20, 30];
    let ring: Ring<*const u32> = Ring::new(Config::with_capacity(4));
    let storage = SlotBuffer::<*const u32>::new(4);
    let buf = storage.handle();

    for v in &values {
        assert!(ring.enqueue(buf, v as *const u32));
    }
    for v in &values {
        let ptr = ring.dequeue_spsc(buf).unwrap();
        assert_eq!(ptr, v as *const u32);
        // The handle is the caller's own pointer; reading through it is fine.
        assert_eq!(unsafe { *ptr }, *v);
    }
}
