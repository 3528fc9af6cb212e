//! Wraparound arithmetic for physical slot positions.

/// A physical slot position paired with the capacity it was computed against.
///
/// Every step is bounded by the capacity, so wrapping is a single conditional
/// subtract or add instead of a modulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircularIndex {
    pos: usize,
    capacity: usize,
}

impl CircularIndex {
    /// Creates an index at `pos`. `pos` must be below `capacity`, except for the
    /// zero-capacity index which only admits position 0.
    #[inline]
    pub const fn new(pos: usize, capacity: usize) -> Self {
        debug_assert!(pos < capacity || (pos == 0 && capacity == 0));
        Self { pos, capacity }
    }

    #[inline]
    pub const fn zero(capacity: usize) -> Self {
        Self { pos: 0, capacity }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn capacity(self) -> usize {
        self.capacity
    }

    /// Moves forward by `n` slots, wrapping past the end. `n <= capacity`.
    #[inline]
    pub fn advance(self, n: usize) -> Self {
        debug_assert!(n <= self.capacity);
        let pos = self.pos + n;
        let pos = if pos >= self.capacity && self.capacity != 0 {
            pos - self.capacity
        } else {
            pos
        };
        Self { pos, ..self }
    }

    /// Moves backward by `n` slots, wrapping before the start. `n <= capacity`.
    #[inline]
    pub fn retreat(self, n: usize) -> Self {
        debug_assert!(n <= self.capacity);
        let pos = if n <= self.pos {
            self.pos - n
        } else {
            self.pos + self.capacity - n
        };
        Self { pos, ..self }
    }

    /// Number of forward steps from `self` to `other`.
    #[inline]
    pub fn distance_to(self, other: CircularIndex) -> usize {
        debug_assert_eq!(self.capacity, other.capacity);
        if other.pos >= self.pos {
            other.pos - self.pos
        } else {
            other.pos + self.capacity - self.pos
        }
    }
}
