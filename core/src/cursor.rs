//! Random-access positions into a buffer.
//!
//! A cursor is the buffer's identity plus a signed logical index. It borrows
//! nothing, so it can be held across any mutation; every dereference goes back
//! through the buffer and translates the index against the buffer's current
//! layout. Growth and `data()` therefore never disturb a cursor, while
//! insertions and erasures before it change which element it denotes.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use crate::alloc::RawAllocator;
use crate::buffer::{BufferId, CircularBuffer};

/// Position in a `CircularBuffer<T>`. `MUT` selects whether the cursor may be
/// used for mutable access.
pub struct Cursor<T, const MUT: bool> {
    owner: Option<BufferId>,
    index: isize,
    _marker: PhantomData<fn() -> T>,
}

pub type ConstCursor<T> = Cursor<T, false>;
pub type MutCursor<T> = Cursor<T, true>;

impl<T, const MUT: bool> Cursor<T, MUT> {
    pub(crate) fn new(owner: BufferId, index: isize) -> Self {
        Self {
            owner: Some(owner),
            index,
            _marker: PhantomData,
        }
    }

    /// A cursor into no buffer. Only comparable with other null cursors.
    pub const fn null() -> Self {
        Self {
            owner: None,
            index: 0,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> isize {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.owner.is_none()
    }

    pub fn belongs_to<A: RawAllocator>(&self, buf: &CircularBuffer<T, A>) -> bool {
        self.owner == Some(buf.id())
    }

    pub fn inc(&mut self) -> &mut Self {
        *self = self.offset(1);
        self
    }

    pub fn dec(&mut self) -> &mut Self {
        *self = self.offset(-1);
        self
    }

    /// Advances and returns the position before the step.
    pub fn post_inc(&mut self) -> Self {
        let old = *self;
        *self = self.offset(1);
        old
    }

    pub fn post_dec(&mut self) -> Self {
        let old = *self;
        *self = self.offset(-1);
        old
    }

    /// Moves by `n` positions. Panics if the index leaves the `isize` range.
    fn offset(self, n: isize) -> Self {
        match self.index.checked_add(n) {
            Some(index) => Cursor { index, ..self },
            None => panic!("cursor {self:?} overflowed moving by {n}"),
        }
    }

    fn offset_back(self, n: isize) -> Self {
        match self.index.checked_sub(n) {
            Some(index) => Cursor { index, ..self },
            None => panic!("cursor {self:?} overflowed moving back by {n}"),
        }
    }

    pub fn to_const(self) -> ConstCursor<T> {
        Cursor {
            owner: self.owner,
            index: self.index,
            _marker: PhantomData,
        }
    }

    fn resolve<A: RawAllocator>(&self, buf: &CircularBuffer<T, A>) -> Option<usize> {
        if !self.belongs_to(buf) {
            return None;
        }
        usize::try_from(self.index)
            .ok()
            .filter(|&index| index < buf.len())
    }

    /// The element this cursor denotes, if it belongs to `buf` and is in range.
    pub fn get<'a, A: RawAllocator>(&self, buf: &'a CircularBuffer<T, A>) -> Option<&'a T> {
        self.resolve(buf).and_then(|index| buf.get(index))
    }
}

impl<T> Cursor<T, true> {
    pub fn get_mut<'a, A: RawAllocator>(
        &self,
        buf: &'a mut CircularBuffer<T, A>,
    ) -> Option<&'a mut T> {
        self.resolve(buf).and_then(move |index| buf.get_mut(index))
    }
}

impl<T, const MUT: bool> Clone for Cursor<T, MUT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const MUT: bool> Copy for Cursor<T, MUT> {}

impl<T, const MUT: bool> Default for Cursor<T, MUT> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T, const MUT: bool> fmt::Debug for Cursor<T, MUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("owner", &self.owner)
            .field("index", &self.index)
            .field("mutable", &MUT)
            .finish()
    }
}

impl<T> From<MutCursor<T>> for ConstCursor<T> {
    fn from(cursor: MutCursor<T>) -> Self {
        cursor.to_const()
    }
}

impl<T, const A: bool, const B: bool> PartialEq<Cursor<T, B>> for Cursor<T, A> {
    fn eq(&self, other: &Cursor<T, B>) -> bool {
        self.owner == other.owner && self.index == other.index
    }
}

impl<T, const MUT: bool> Eq for Cursor<T, MUT> {}

impl<T, const A: bool, const B: bool> PartialOrd<Cursor<T, B>> for Cursor<T, A> {
    fn partial_cmp(&self, other: &Cursor<T, B>) -> Option<Ordering> {
        if self.owner == other.owner {
            Some(self.index.cmp(&other.index))
        } else {
            None
        }
    }
}

impl<T, const MUT: bool> Hash for Cursor<T, MUT> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.index.hash(state);
    }
}

impl<T, const MUT: bool> Add<isize> for Cursor<T, MUT> {
    type Output = Self;

    fn add(self, n: isize) -> Self {
        self.offset(n)
    }
}

impl<T, const MUT: bool> Sub<isize> for Cursor<T, MUT> {
    type Output = Self;

    fn sub(self, n: isize) -> Self {
        self.offset_back(n)
    }
}

impl<T, const MUT: bool> AddAssign<isize> for Cursor<T, MUT> {
    fn add_assign(&mut self, n: isize) {
        *self = self.offset(n);
    }
}

impl<T, const MUT: bool> SubAssign<isize> for Cursor<T, MUT> {
    fn sub_assign(&mut self, n: isize) {
        *self = self.offset_back(n);
    }
}

/// Signed distance between two cursors into the same buffer.
impl<T, const A: bool, const B: bool> Sub<Cursor<T, B>> for Cursor<T, A> {
    type Output = isize;

    fn sub(self, other: Cursor<T, B>) -> isize {
        debug_assert!(
            self.owner == other.owner,
            "distance between cursors of different buffers"
        );
        match self.index.checked_sub(other.index) {
            Some(distance) => distance,
            None => panic!("distance from {other:?} to {self:?} overflows isize"),
        }
    }
}

impl<T, A: RawAllocator, const MUT: bool> Index<Cursor<T, MUT>> for CircularBuffer<T, A> {
    type Output = T;

    fn index(&self, at: Cursor<T, MUT>) -> &T {
        match at.get(self) {
            Some(item) => item,
            None => panic!(
                "cursor {at:?} does not denote an element of this buffer (len {})",
                self.len()
            ),
        }
    }
}

impl<T, A: RawAllocator> IndexMut<MutCursor<T>> for CircularBuffer<T, A> {
    fn index_mut(&mut self, at: MutCursor<T>) -> &mut T {
        let len = self.len();
        match at.resolve(self) {
            Some(index) => &mut self[index],
            None => panic!("cursor {at:?} does not denote an element of this buffer (len {len})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstCursor, MutCursor};
    use crate::CircularBuffer;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn sample() -> CircularBuffer<i32> {
        let mut buf = CircularBuffer::with_capacity(5);
        for v in 0..4 {
            buf.push_back(v);
        }
        buf.pop_front();
        buf.pop_front();
        for v in 4..=6 {
            buf.push_back(v);
        }
        // physical layout wraps: [2, 3, 4, 5] then [6]
        assert!(!buf.as_slices().1.is_empty());
        buf
    }

    #[test]
    fn walks_across_the_wrap_point() {
        let buf = sample();
        let mut it = buf.begin();
        let mut seen = Vec::new();
        while it != buf.end() {
            seen.push(buf[it]);
            it.inc();
        }
        assert_eq!(seen, vec![2, 3, 4, 5, 6]);
        assert_eq!(buf.end() - buf.begin(), 5);
    }

    #[test]
    fn arithmetic_moves_the_logical_index() {
        let buf = sample();
        let it = buf.begin() + 3;
        assert_eq!(buf[it], 5);
        assert_eq!(buf[it - 2isize], 3);
        let mut jt = it;
        jt -= 3;
        assert_eq!(jt, buf.begin());
        jt += 4;
        assert_eq!(buf[jt], 6);
        assert_eq!(jt - it, 1);
        assert_eq!(it - jt, -1);

        let before = jt.post_dec();
        assert_eq!(buf[before], 6);
        assert_eq!(buf[jt], 5);
        let before = jt.post_inc();
        assert_eq!(buf[before], 5);
        jt.dec().dec();
        assert_eq!(buf[jt], 4);
    }

    #[test]
    fn out_of_range_positions_are_representable_but_not_dereferenceable() {
        let buf = sample();
        let before_start = buf.begin() - 1isize;
        assert_eq!(before_start.index(), -1);
        assert_eq!(before_start.get(&buf), None);
        assert_eq!(buf.end().get(&buf), None);
        assert_eq!((before_start + 1).get(&buf), Some(&2));
    }

    #[test]
    fn mixed_constness_compares() {
        let mut buf = sample();
        let m: MutCursor<i32> = buf.cursor_mut(2);
        let c: ConstCursor<i32> = buf.cursor(2);
        assert_eq!(m, c);
        assert_eq!(c, m);
        assert!(buf.cursor(1) < m);
        assert!(m <= buf.end());
        let converted: ConstCursor<i32> = m.into();
        assert_eq!(converted, c);
        assert_eq!(m - c, 0);
    }

    #[test]
    fn cursors_of_different_buffers_never_compare_equal() {
        let a: CircularBuffer<i32> = [1, 2].into();
        let b: CircularBuffer<i32> = [1, 2].into();
        assert_ne!(a.begin(), b.begin());
        assert_eq!(a.begin().partial_cmp(&b.begin()), None);
        assert!(!(a.begin() < b.begin()));
        assert_eq!(a.begin().get(&b), None);
        assert!(a.begin().belongs_to(&a));
        assert!(!a.begin().belongs_to(&b));
    }

    #[test]
    fn null_cursors() {
        let a = ConstCursor::<i32>::default();
        let b = MutCursor::<i32>::null();
        assert!(a.is_null());
        assert_eq!(a, b);
        let buf: CircularBuffer<i32> = [1].into();
        assert_ne!(a, buf.begin());
        assert_eq!(a.get(&buf), None);
    }

    #[test]
    fn mutable_cursor_writes_through() {
        let mut buf = sample();
        let it = buf.cursor_mut(1);
        buf[it] = 30;
        *it.get_mut(&mut buf).unwrap() += 1;
        assert_eq!(buf[1], 31);
        let past = buf.end_mut();
        assert!(past.get_mut(&mut buf).is_none());
    }

    #[test]
    fn survives_growth() {
        let mut buf = sample();
        let it = buf.cursor(3);
        let value = buf[it];
        let capacity = buf.capacity();
        for v in 0..50 {
            buf.push_back(v);
        }
        assert!(buf.capacity() > capacity);
        assert_eq!(buf[it], value);
    }

    #[test]
    fn survives_data_rotation() {
        let mut buf = sample();
        let it = buf.cursor(4);
        buf.data();
        assert_eq!(buf[it], 6);
        assert!(buf.as_slices().1.is_empty());
    }

    #[test]
    fn interior_edits_shift_later_cursors_only() {
        let mut buf: CircularBuffer<i32> = (0..8).collect();
        let early = buf.cursor(1);
        let late = buf.cursor(6);
        buf.erase(3);
        assert_eq!(buf[early], 1);
        assert_eq!(buf[late], 7);
        buf.insert(2, 100);
        assert_eq!(buf[early], 1);
        assert_eq!(buf[late], 6);
    }

    #[test]
    fn clear_leaves_cursors_out_of_range() {
        let mut buf = sample();
        let it = buf.begin();
        buf.clear();
        assert_eq!(it.get(&buf), None);
    }

    #[test]
    fn swap_carries_cursors_with_the_contents() {
        let mut a: CircularBuffer<i32> = [1, 2, 3].into();
        let mut b: CircularBuffer<i32> = [7, 8].into();
        let into_a = a.cursor(2);
        a.swap(&mut b);
        assert_eq!(into_a.get(&a), None);
        assert_eq!(b[into_a], 3);
    }

    #[test]
    fn moved_buffer_keeps_its_cursors() {
        let mut a: CircularBuffer<i32> = [1, 2, 3].into();
        let it = a.cursor(1);
        let moved = a.take();
        assert_eq!(moved[it], 2);
        assert!(!it.belongs_to(&a));
    }

    #[test]
    fn cursor_positioned_edits() {
        let mut buf: CircularBuffer<i32> = [1, 2, 4, 5].into();
        let at = buf.cursor_mut(2);
        let inserted = buf.insert_at(at, 3);
        assert_eq!(buf[inserted], 3);
        let next = buf.erase_at(buf.begin());
        assert_eq!(buf[next], 2);
        let first = buf.begin() + 1;
        let last = buf.end() - 1isize;
        let after = buf.erase_between(first, last);
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(buf[after], 5);
        let end = buf.end();
        buf.insert_at(end, 6);
        assert_eq!(buf.back(), Some(&6));
    }

    #[test]
    fn foreign_cursor_is_rejected() {
        let mut a: CircularBuffer<i32> = [1, 2].into();
        let b: CircularBuffer<i32> = [1, 2].into();
        let foreign = b.begin();
        let result = catch_unwind(AssertUnwindSafe(|| a.insert_at(foreign, 0)));
        assert!(result.is_err());
        assert_eq!(a.len(), 2);
        let result = catch_unwind(AssertUnwindSafe(|| a.erase_at(a.end())));
        assert!(result.is_err());
        assert_eq!(a.len(), 2);
    }

    #[test]
    #[should_panic(expected = "does not denote an element")]
    fn indexing_with_end_panics() {
        let buf = sample();
        let _ = buf[buf.end()];
    }

    #[test]
    fn far_moves_within_isize_come_back() {
        let buf = sample();
        let far = buf.begin() + isize::MAX;
        assert!(far.get(&buf).is_none());
        assert_eq!(far - isize::MAX, buf.begin());
        assert_eq!(far - buf.begin(), isize::MAX);
    }

    #[test]
    #[should_panic(expected = "overflowed moving by 1")]
    fn stepping_past_isize_max_panics() {
        let buf = sample();
        let mut it = buf.begin() + isize::MAX;
        it += 1;
    }

    #[test]
    #[should_panic(expected = "overflowed moving back by")]
    fn stepping_below_isize_min_panics() {
        let buf = sample();
        let mut it = buf.begin() - isize::MAX;
        it.dec();
        let _ = it - 1;
    }

    #[test]
    fn overflowing_distance_panics() {
        let buf = sample();
        let high = buf.begin() + isize::MAX;
        let low = buf.begin() - isize::MAX;
        let result = catch_unwind(AssertUnwindSafe(|| high - low));
        assert!(result.is_err());
    }
}
