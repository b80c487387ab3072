//! Debug assertion macros for ring invariants.
//!
//! Active only in debug builds; release builds pay nothing. The checks are
//! written with wrapping arithmetic because the counters are allowed to wrap
//! the word: occupancy is the wrapping difference, never a plain one.

/// Assert that the occupancy implied by a tail/head pair fits the ring.
///
/// One slot always stays empty, so `tail - head` (wrapping) never exceeds
/// `mask`. A violation means a counter was corrupted or the single-producer
/// contract was broken.
macro_rules! debug_assert_occupancy_bounded {
    ($producer:expr, $consumer:expr, $mask:expr) => {
        debug_assert!(
            $producer.wrapping_sub($consumer) <= $mask,
            "ring occupancy {} exceeds the {} resident entries the ring can hold",
            $producer.wrapping_sub($consumer),
            $mask
        )
    };
}

/// Assert that the supplied slot storage covers the ring's index range.
macro_rules! debug_assert_buffer_covers {
    ($buf_len:expr, $capacity:expr) => {
        debug_assert!(
            $buf_len >= $capacity,
            "slot buffer holds {} slots but the ring addresses {}",
            $buf_len,
            $capacity
        )
    };
}

pub(crate) use debug_assert_buffer_covers;
pub(crate) use debug_assert_occupancy_bounded;
