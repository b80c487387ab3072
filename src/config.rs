/// Construction parameters for a [`Ring`](crate::Ring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Slot count; power of two, at least 2. One slot always stays empty,
    /// so at most `capacity - 1` entries are resident at once.
    capacity: usize,
    /// Collect [`Metrics`](crate::Metrics) counters (slight overhead on
    /// every operation).
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a configuration with the given slot count.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two or is less than 2. The
    /// index arithmetic masks counters with `capacity - 1`, which only maps
    /// counters to slots when the capacity is a power of two.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        assert!(
            capacity.is_power_of_two(),
            "ring capacity must be a power of two"
        );
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// [`Config::new`] with metrics collection off.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, false)
    }

    /// Total slot count.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mask applied to counters to obtain a slot index.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}
