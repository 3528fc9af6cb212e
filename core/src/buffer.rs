//! The growable circular buffer.
//!
//! Elements live in one allocated block between a tail cursor (first element)
//! and a head cursor (one past the last element), wrapping around the end of
//! the block. One slot always stays free so that `head == tail` can only mean
//! "empty". The length is derived from the two cursors and never stored.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Bound, Range, RangeBounds};
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::alloc::{Global, RawAllocator};
use crate::circular_index::CircularIndex;
use crate::cursor::{ConstCursor, Cursor, MutCursor};
use crate::error::{infallible, CircularBufferError};
use crate::growth::GrowthPolicy;
use crate::iter::{Iter, IterMut};

/// Identity of a buffer value, shared by every cursor it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BufferId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A double-ended, randomly indexable buffer over wraparound storage.
pub struct CircularBuffer<T, A: RawAllocator = Global> {
    storage: NonNull<T>,
    tail: CircularIndex,
    head: CircularIndex,
    id: BufferId,
    growth: GrowthPolicy,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: RawAllocator + Send> Send for CircularBuffer<T, A> {}
unsafe impl<T: Sync, A: RawAllocator + Sync> Sync for CircularBuffer<T, A> {}

impl<T> CircularBuffer<T> {
    /// Creates an empty buffer with a single (reserved) slot.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty buffer that can hold `n` elements without growing.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_in(n, Global)
    }

    /// Creates a buffer holding `n` clones of `value`.
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut buf = Self::with_capacity(n);
        buf.resize(n, value);
        buf
    }

    /// Creates a buffer holding `n` default values.
    pub fn from_default(n: usize) -> Self
    where
        T: Default,
    {
        let mut buf = Self::with_capacity(n);
        buf.resize_with(n, T::default);
        buf
    }
}

impl<T, A: RawAllocator> CircularBuffer<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self::with_capacity_in(0, alloc)
    }

    pub fn with_capacity_in(n: usize, alloc: A) -> Self {
        infallible(Self::try_with_capacity_in(n, alloc))
    }

    pub fn try_with_capacity_in(n: usize, alloc: A) -> Result<Self, CircularBufferError> {
        let capacity = n
            .checked_add(1)
            .ok_or(CircularBufferError::CapacityOverflow)?;
        let storage = Self::allocate_block(&alloc, capacity)?;
        Ok(Self {
            storage,
            tail: CircularIndex::zero(capacity),
            head: CircularIndex::zero(capacity),
            id: BufferId::next(),
            growth: GrowthPolicy::default(),
            alloc,
            _marker: PhantomData,
        })
    }

    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Self {
        let iter = iter.into_iter();
        let mut buf = Self::with_capacity_in(iter.size_hint().0, alloc);
        buf.extend(iter);
        buf
    }

    /// The zero-capacity state left behind by `take`.
    fn unallocated_in(alloc: A) -> Self {
        Self {
            storage: NonNull::dangling(),
            tail: CircularIndex::zero(0),
            head: CircularIndex::zero(0),
            id: BufferId::next(),
            growth: GrowthPolicy::default(),
            alloc,
            _marker: PhantomData,
        }
    }

    /// Moves the contents out, leaving `self` empty with no storage at all.
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let empty = Self::unallocated_in(self.alloc.clone());
        mem::replace(self, empty)
    }

    fn block_layout(capacity: usize) -> Result<Layout, CircularBufferError> {
        Layout::array::<T>(capacity).map_err(|_| CircularBufferError::CapacityOverflow)
    }

    fn allocate_block(alloc: &A, capacity: usize) -> Result<NonNull<T>, CircularBufferError> {
        let layout = Self::block_layout(capacity)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        alloc
            .allocate(layout)
            .map(NonNull::cast)
            .inspect_err(|err| log::warn!("circular buffer storage for {capacity} slots: {err}"))
    }

    /// # Safety
    /// `storage` must have come from `allocate_block(alloc, capacity)`.
    unsafe fn release_block(alloc: &A, storage: NonNull<T>, capacity: usize) {
        if let Ok(layout) = Self::block_layout(capacity) {
            if layout.size() != 0 {
                unsafe { alloc.deallocate(storage.cast(), layout) };
            }
        }
    }

    pub(crate) fn id(&self) -> BufferId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: BufferId) {
        self.id = id;
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn set_growth_policy(&mut self, policy: GrowthPolicy) {
        self.growth = policy;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tail.distance_to(self.head)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Total slot count, including the one kept free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.tail.capacity()
    }

    /// Largest length the buffer could ever reach.
    pub fn max_size(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX - 1,
            size => isize::MAX as usize / size - 1,
        }
    }

    #[inline]
    fn phys_ptr(&self, idx: CircularIndex) -> *mut T {
        unsafe { self.storage.as_ptr().add(idx.get()) }
    }

    /// Pointer to the slot holding logical element `index`. `index <= capacity`.
    #[inline]
    fn slot_ptr(&self, index: usize) -> *mut T {
        self.phys_ptr(self.tail.advance(index))
    }

    /// Physical ranges of the live elements, in logical order.
    fn runs(&self) -> (Range<usize>, Range<usize>) {
        let (tail, head) = (self.tail.get(), self.head.get());
        if tail <= head {
            (tail..head, 0..0)
        } else {
            (tail..self.capacity(), 0..head)
        }
    }

    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (front, back) = self.runs();
        let base = self.storage.as_ptr();
        unsafe {
            (
                slice::from_raw_parts(base.add(front.start), front.len()),
                slice::from_raw_parts(base.add(back.start), back.len()),
            )
        }
    }

    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let (front, back) = self.runs();
        let base = self.storage.as_ptr();
        unsafe {
            (
                slice::from_raw_parts_mut(base.add(front.start), front.len()),
                slice::from_raw_parts_mut(base.add(back.start), back.len()),
            )
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let (front, back) = self.as_slices();
        Iter::new(front, back)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let (front, back) = self.as_mut_slices();
        IterMut::new(front, back)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            Some(unsafe { &*self.slot_ptr(index) })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            Some(unsafe { &mut *self.slot_ptr(index) })
        } else {
            None
        }
    }

    /// # Safety
    /// `index` must be below `len()`.
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len());
        unsafe { &*self.slot_ptr(index) }
    }

    /// # Safety
    /// `index` must be below `len()`.
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len());
        unsafe { &mut *self.slot_ptr(index) }
    }

    /// Bounds-checked access reporting `OutOfRange`.
    pub fn at(&self, index: usize) -> Result<&T, CircularBufferError> {
        let len = self.len();
        self.get(index)
            .ok_or(CircularBufferError::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, CircularBufferError> {
        let len = self.len();
        self.get_mut(index)
            .ok_or(CircularBufferError::OutOfRange { index, len })
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.len().checked_sub(1).and_then(move |last| self.get_mut(last))
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|item| item == value)
    }

    /// Makes sure `additional` more elements fit, growing per the policy.
    fn ensure_headroom(&mut self, additional: usize) -> Result<(), CircularBufferError> {
        let required = self
            .len()
            .checked_add(additional)
            .and_then(|n| n.checked_add(1))
            .ok_or(CircularBufferError::CapacityOverflow)?;
        if required <= self.capacity() {
            return Ok(());
        }
        let target = self.growth.next_capacity(self.capacity(), required)?;
        self.relocate(target)
    }

    /// Moves every element into a fresh block of `new_capacity` slots, logical
    /// element 0 first. On failure nothing has changed.
    fn relocate(&mut self, new_capacity: usize) -> Result<(), CircularBufferError> {
        let len = self.len();
        debug_assert!(new_capacity > len);
        let new_storage = Self::allocate_block(&self.alloc, new_capacity)?;
        let (front, back) = self.runs();
        let old = self.storage.as_ptr();
        unsafe {
            ptr::copy_nonoverlapping(old.add(front.start), new_storage.as_ptr(), front.len());
            ptr::copy_nonoverlapping(
                old.add(back.start),
                new_storage.as_ptr().add(front.len()),
                back.len(),
            );
            Self::release_block(&self.alloc, self.storage, self.capacity());
        }
        log::trace!(
            "relocated {len} elements, capacity {} -> {new_capacity}",
            self.capacity()
        );
        self.storage = new_storage;
        self.tail = CircularIndex::zero(new_capacity);
        self.head = CircularIndex::new(len, new_capacity);
        Ok(())
    }

    /// Reserves room for at least `additional` more elements, growing per the
    /// policy.
    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CircularBufferError> {
        self.ensure_headroom(additional)
    }

    /// Reserves room for exactly `additional` more elements if it is missing.
    pub fn reserve_exact(&mut self, additional: usize) {
        infallible(self.try_reserve_exact(additional))
    }

    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), CircularBufferError> {
        let required = self
            .len()
            .checked_add(additional)
            .and_then(|n| n.checked_add(1))
            .ok_or(CircularBufferError::CapacityOverflow)?;
        if required <= self.capacity() {
            return Ok(());
        }
        self.relocate(required)
    }

    /// Releases every slot beyond `len() + 1`.
    pub fn shrink_to_fit(&mut self) {
        let target = self.len() + 1;
        if self.capacity() > target {
            infallible(self.relocate(target));
        }
    }

    pub fn push_back(&mut self, value: T) {
        infallible(self.try_push_back(value))
    }

    /// Appends `value`. If storage cannot grow the value is dropped and the
    /// buffer is unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), CircularBufferError> {
        self.ensure_headroom(1)?;
        unsafe { self.alloc.construct(self.phys_ptr(self.head), value) };
        self.head = self.head.advance(1);
        Ok(())
    }

    pub fn push_front(&mut self, value: T) {
        infallible(self.try_push_front(value))
    }

    pub fn try_push_front(&mut self, value: T) -> Result<(), CircularBufferError> {
        self.ensure_headroom(1)?;
        let tail = self.tail.retreat(1);
        unsafe { self.alloc.construct(self.phys_ptr(tail), value) };
        self.tail = tail;
        Ok(())
    }

    /// Appends the value produced by `make`, returning a reference to it.
    ///
    /// If `make` panics the elements are untouched, though the buffer may
    /// already have grown.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        infallible(self.ensure_headroom(1));
        let slot = self.phys_ptr(self.head);
        unsafe { self.alloc.construct(slot, make()) };
        self.head = self.head.advance(1);
        unsafe { &mut *slot }
    }

    pub fn emplace_front<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        infallible(self.ensure_headroom(1));
        let tail = self.tail.retreat(1);
        let slot = self.phys_ptr(tail);
        unsafe { self.alloc.construct(slot, make()) };
        self.tail = tail;
        unsafe { &mut *slot }
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.head = self.head.retreat(1);
        Some(unsafe { ptr::read(self.phys_ptr(self.head)) })
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = unsafe { ptr::read(self.phys_ptr(self.tail)) };
        self.tail = self.tail.advance(1);
        Some(value)
    }

    /// Moves `count` slots starting at `src` so they start at `dst`.
    /// `backwards` must be set when `dst` lies after `src`.
    unsafe fn move_slots(
        &mut self,
        src: CircularIndex,
        dst: CircularIndex,
        count: usize,
        backwards: bool,
    ) {
        let base = self.storage.as_ptr();
        let step = |i: usize| unsafe {
            ptr::copy(
                base.add(src.advance(i).get()),
                base.add(dst.advance(i).get()),
                1,
            )
        };
        if backwards {
            (0..count).rev().for_each(step);
        } else {
            (0..count).for_each(step);
        }
    }

    /// Opens `count` uninitialised slots at logical `pos` by shifting whichever
    /// side of `pos` is shorter. Elements before `pos` keep their logical index.
    ///
    /// # Safety
    /// `pos <= len()` and the buffer must already have `count` free slots beyond
    /// the reserved one. The gap must be filled or closed before the buffer is
    /// used again.
    unsafe fn open_gap(&mut self, pos: usize, count: usize) {
        let len = self.len();
        debug_assert!(pos <= len && len + count < self.capacity());
        if pos < len - pos {
            let new_tail = self.tail.retreat(count);
            unsafe { self.move_slots(self.tail, new_tail, pos, false) };
            self.tail = new_tail;
        } else {
            let src = self.tail.advance(pos);
            unsafe { self.move_slots(src, src.advance(count), len - pos, true) };
            self.head = self.head.advance(count);
        }
    }

    /// Removes the dead slots `pos..pos + count` by shifting the shorter side.
    ///
    /// # Safety
    /// Those slots must hold no live values and lie inside `0..len()`.
    unsafe fn close_gap(&mut self, pos: usize, count: usize) {
        let len = self.len();
        debug_assert!(pos + count <= len);
        let suffix = len - pos - count;
        if pos < suffix {
            let new_tail = self.tail.advance(count);
            unsafe { self.move_slots(self.tail, new_tail, pos, true) };
            self.tail = new_tail;
        } else {
            let dst = self.tail.advance(pos);
            unsafe { self.move_slots(dst.advance(count), dst, suffix, false) };
            self.head = self.head.retreat(count);
        }
    }

    fn check_insert_index(&self, index: usize) {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) {
        infallible(self.try_insert(index, value))
    }

    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), CircularBufferError> {
        self.check_insert_index(index);
        self.ensure_headroom(1)?;
        unsafe {
            self.open_gap(index, 1);
            self.alloc.construct(self.slot_ptr(index), value);
        }
        Ok(())
    }

    /// Inserts the value produced by `make` at `index`. The value is built
    /// before any element moves, so a panic leaves the elements as they were.
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, make: F) -> &mut T {
        self.check_insert_index(index);
        infallible(self.ensure_headroom(1));
        let value = make();
        unsafe {
            self.open_gap(index, 1);
            let slot = self.slot_ptr(index);
            self.alloc.construct(slot, value);
            &mut *slot
        }
    }

    /// Inserts `count` clones of `value` at `index`.
    ///
    /// If a clone panics, the copies made so far are dropped and the elements
    /// return to their previous positions.
    pub fn insert_n(&mut self, index: usize, count: usize, value: &T)
    where
        T: Clone,
    {
        self.check_insert_index(index);
        infallible(self.ensure_headroom(count));
        unsafe { self.open_gap(index, count) };
        let mut gap = GapGuard {
            buf: self,
            pos: index,
            len: count,
            live: 0,
        };
        while gap.live < count {
            let slot = gap.buf.slot_ptr(index + gap.live);
            unsafe { gap.buf.alloc.construct(slot, value.clone()) };
            gap.live += 1;
        }
        mem::forget(gap);
    }

    /// Inserts every item of `iter` at `index`, keeping their order.
    ///
    /// The items are appended at the back, then rotated into place. A panic
    /// from the iterator drops whatever it already produced and leaves the
    /// contents as they were.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
        self.check_insert_index(index);
        let old_len = self.len();
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        let staged = Rollback {
            buf: self,
            len: old_len,
        };
        for item in iter {
            staged.buf.push_back(item);
        }
        mem::forget(staged);
        let count = self.len() - old_len;
        if count > 0 && index < old_len {
            self.data()[index..].rotate_right(count);
        }
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }
        unsafe {
            let value = ptr::read(self.slot_ptr(index));
            self.close_gap(index, 1);
            Some(value)
        }
    }

    /// Drops the element at `index` and returns the index of the element that
    /// now follows it.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        let len = self.len();
        assert!(index < len, "erase index (is {index}) should be < len (is {len})");
        self.erase_range(index..index + 1)
    }

    /// Drops the elements in `range` and returns the index of the first element
    /// after the removed range.
    ///
    /// If an element's drop panics, the remaining elements of the range are
    /// leaked and the gap is still closed.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let Range { start, end } = self.resolve_range(range);
        let count = end - start;
        if count == 0 {
            return start;
        }
        let gap = GapGuard {
            buf: self,
            pos: start,
            len: count,
            live: 0,
        };
        for i in start..end {
            unsafe { gap.buf.alloc.destroy(gap.buf.slot_ptr(i)) };
        }
        drop(gap);
        start
    }

    fn resolve_range<R: RangeBounds<usize>>(&self, range: R) -> Range<usize> {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        };
        assert!(start <= end, "range start (is {start}) should be <= end (is {end})");
        assert!(end <= len, "range end (is {end}) should be <= len (is {len})");
        start..end
    }

    /// Keeps only the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.erase_range(len..);
        }
    }

    /// Keeps the elements for which `keep` returns true, in order.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        let len = self.len();
        let mut kept = 0;
        for i in 0..len {
            if keep(&self[i]) {
                if i != kept {
                    self.swap_elements(i, kept);
                }
                kept += 1;
            }
        }
        self.truncate(kept);
    }

    /// Exchanges the elements at logical indices `i` and `j`.
    pub fn swap_elements(&mut self, i: usize, j: usize) {
        let len = self.len();
        assert!(i < len && j < len, "swap indices ({i}, {j}) out of range for length {len}");
        unsafe { ptr::swap(self.slot_ptr(i), self.slot_ptr(j)) };
    }

    /// Drops every element. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.destroy_all();
        let capacity = self.capacity();
        self.tail = CircularIndex::zero(capacity);
        self.head = CircularIndex::zero(capacity);
    }

    /// Drops elements from the front until the buffer is empty. The tail
    /// passes each slot before its value is dropped, so a panicking drop
    /// leaves only untouched elements live.
    fn destroy_all(&mut self) {
        while !self.is_empty() {
            let slot = self.phys_ptr(self.tail);
            self.tail = self.tail.advance(1);
            unsafe { self.alloc.destroy(slot) };
        }
    }

    /// Replaces the contents with the items of `iter`.
    pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.clear();
        for item in iter {
            self.push_back(item);
        }
    }

    /// Replaces the contents with `n` clones of `value`.
    pub fn assign_n(&mut self, n: usize, value: &T)
    where
        T: Clone,
    {
        self.clear();
        self.resize_with(n, || value.clone());
    }

    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone());
    }

    /// Grows with values from `make` or truncates to `new_len`. If `make`
    /// panics, the values produced so far stay in the buffer.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut make: F) {
        let len = self.len();
        if new_len <= len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len - len);
        for _ in len..new_len {
            self.emplace_back(&mut make);
        }
    }

    /// Rotates the storage so logical element 0 sits in the first slot and
    /// returns all elements as one slice.
    ///
    /// References into the buffer do not survive the rotation; cursors do,
    /// since they only carry logical indices.
    pub fn data(&mut self) -> &mut [T] {
        let len = self.len();
        let tail = self.tail.get();
        if tail != 0 {
            let head = self.head.get();
            let capacity = self.capacity();
            let base = self.storage.as_ptr();
            unsafe {
                if tail <= head {
                    ptr::copy(base.add(tail), base, len);
                } else {
                    // Close the free gap, then swap the two runs in place.
                    ptr::copy(base.add(tail), base.add(head), capacity - tail);
                    slice::from_raw_parts_mut(base, len).rotate_left(head);
                }
            }
            log::trace!("moved {len} elements down from slot {tail}");
            self.tail = CircularIndex::zero(capacity);
            self.head = CircularIndex::new(len, capacity);
        }
        unsafe { slice::from_raw_parts_mut(self.storage.as_ptr(), len) }
    }

    /// Exchanges the whole state with `other`. Cursors follow the contents.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    pub fn begin(&self) -> ConstCursor<T> {
        Cursor::new(self.id, 0)
    }

    pub fn end(&self) -> ConstCursor<T> {
        Cursor::new(self.id, self.len() as isize)
    }

    pub fn cursor(&self, index: usize) -> ConstCursor<T> {
        Cursor::new(self.id, index as isize)
    }

    pub fn begin_mut(&mut self) -> MutCursor<T> {
        Cursor::new(self.id, 0)
    }

    pub fn end_mut(&mut self) -> MutCursor<T> {
        Cursor::new(self.id, self.len() as isize)
    }

    pub fn cursor_mut(&mut self, index: usize) -> MutCursor<T> {
        Cursor::new(self.id, index as isize)
    }

    /// Logical index of `at`, which must belong to this buffer and lie in
    /// `0..len()` (or `0..=len()` when `allow_end`).
    fn position_of<const MUT: bool>(&self, at: Cursor<T, MUT>, allow_end: bool) -> usize {
        assert!(at.belongs_to(self), "cursor {at:?} belongs to another buffer");
        let len = self.len();
        let limit = if allow_end { len } else { len.saturating_sub(1) };
        match usize::try_from(at.index()) {
            Ok(index) if index <= limit && (allow_end || len > 0) => index,
            _ => panic!("cursor {at:?} out of range for buffer of length {len}"),
        }
    }

    /// Inserts `value` before `at`; returns a cursor to the new element.
    pub fn insert_at<const MUT: bool>(&mut self, at: Cursor<T, MUT>, value: T) -> MutCursor<T> {
        let index = self.position_of(at, true);
        self.insert(index, value);
        self.cursor_mut(index)
    }

    /// Erases the element at `at`; returns a cursor to the element after it.
    pub fn erase_at<const MUT: bool>(&mut self, at: Cursor<T, MUT>) -> MutCursor<T> {
        let index = self.position_of(at, false);
        self.erase(index);
        self.cursor_mut(index)
    }

    /// Erases `[first, last)`; returns a cursor to the element after the range.
    pub fn erase_between<const F: bool, const L: bool>(
        &mut self,
        first: Cursor<T, F>,
        last: Cursor<T, L>,
    ) -> MutCursor<T> {
        let start = self.position_of(first, true);
        let end = self.position_of(last, true);
        self.erase_range(start..end);
        self.cursor_mut(start)
    }

    /// Deep copy that reports allocation failure instead of panicking. The
    /// source is never modified.
    pub fn try_clone(&self) -> Result<Self, CircularBufferError>
    where
        T: Clone,
        A: Clone,
    {
        let mut copy = Self::try_with_capacity_in(self.len(), self.alloc.clone())?;
        copy.growth = self.growth;
        for item in self.iter() {
            copy.push_back(item.clone());
        }
        Ok(copy)
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.head.capacity(), self.tail.capacity());
        if self.capacity() == 0 {
            assert!(self.is_empty());
        } else {
            assert!(self.capacity() > self.len());
            assert!(self.head.get() < self.capacity());
            assert!(self.tail.get() < self.capacity());
        }
        let (front, back) = self.as_slices();
        assert_eq!(front.len() + back.len(), self.len());
    }
}

/// Uninitialised (or already dropped) run of slots inside the live range.
/// Dropping the guard drops the first `live` slots of the run and closes it.
struct GapGuard<'a, T, A: RawAllocator> {
    buf: &'a mut CircularBuffer<T, A>,
    pos: usize,
    len: usize,
    live: usize,
}

impl<T, A: RawAllocator> Drop for GapGuard<'_, T, A> {
    fn drop(&mut self) {
        unsafe {
            for i in 0..self.live {
                self.buf.alloc.destroy(self.buf.slot_ptr(self.pos + i));
            }
            self.buf.close_gap(self.pos, self.len);
        }
    }
}

/// Truncates back to `len` unless forgotten.
struct Rollback<'a, T, A: RawAllocator> {
    buf: &'a mut CircularBuffer<T, A>,
    len: usize,
}

impl<T, A: RawAllocator> Drop for Rollback<'_, T, A> {
    fn drop(&mut self) {
        self.buf.truncate(self.len);
    }
}

/// Finishes dropping the elements and frees the block, also while unwinding
/// from a panicking element drop.
struct Teardown<'a, T, A: RawAllocator>(&'a mut CircularBuffer<T, A>);

impl<T, A: RawAllocator> Drop for Teardown<'_, T, A> {
    fn drop(&mut self) {
        let buf = &mut *self.0;
        buf.destroy_all();
        unsafe { CircularBuffer::<T, A>::release_block(&buf.alloc, buf.storage, buf.capacity()) };
    }
}

impl<T, A: RawAllocator> Drop for CircularBuffer<T, A> {
    fn drop(&mut self) {
        let teardown = Teardown(self);
        teardown.0.destroy_all();
    }
}
