//! Raw storage policy used by the buffer.
//!
//! The buffer asks its allocator for uninitialised blocks and writes or drops
//! individual slots through it, so a caller can swap in a different memory
//! source without touching the index logic.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::error::CircularBufferError;

/// Allocation and slot lifecycle hooks.
///
/// The buffer never calls `allocate` or `deallocate` with a zero-sized layout.
pub trait RawAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, CircularBufferError>;

    /// # Safety
    /// `ptr` must come from `allocate` on this allocator (or a clone of it) with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Writes `value` into an uninitialised slot.
    ///
    /// # Safety
    /// `slot` must be valid for writes and hold no live value.
    #[inline]
    unsafe fn construct<T>(&self, slot: *mut T, value: T) {
        unsafe { ptr::write(slot, value) }
    }

    /// Drops the live value in `slot`, leaving it uninitialised.
    ///
    /// # Safety
    /// `slot` must hold a live value that is not used afterwards.
    #[inline]
    unsafe fn destroy<T>(&self, slot: *mut T) {
        unsafe { ptr::drop_in_place(slot) }
    }
}

/// The process-wide system allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

impl RawAllocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, CircularBufferError> {
        debug_assert!(layout.size() > 0);
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(CircularBufferError::AllocFailed { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[derive(Debug, Default)]
struct Budget {
    limit: Cell<usize>,
    in_use: Cell<usize>,
    live_blocks: Cell<usize>,
}

/// System allocator capped at a byte budget.
///
/// Clones share one budget, so a buffer and its clones draw from the same pool.
/// Requests that would exceed the budget fail with `AllocFailed`.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    budget: Rc<Budget>,
}

impl BudgetAllocator {
    pub fn new(limit_bytes: usize) -> Self {
        let budget = Budget::default();
        budget.limit.set(limit_bytes);
        Self {
            budget: Rc::new(budget),
        }
    }

    pub fn limit(&self) -> usize {
        self.budget.limit.get()
    }

    /// Changes the budget. Blocks already handed out are not affected.
    pub fn set_limit(&self, limit_bytes: usize) {
        self.budget.limit.set(limit_bytes);
    }

    pub fn in_use(&self) -> usize {
        self.budget.in_use.get()
    }

    pub fn live_blocks(&self) -> usize {
        self.budget.live_blocks.get()
    }
}

impl RawAllocator for BudgetAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, CircularBufferError> {
        let wanted = self
            .in_use()
            .checked_add(layout.size())
            .ok_or(CircularBufferError::AllocFailed { layout })?;
        if wanted > self.limit() {
            log::warn!(
                "allocation of {} bytes refused: {} of {} bytes in use",
                layout.size(),
                self.in_use(),
                self.limit()
            );
            return Err(CircularBufferError::AllocFailed { layout });
        }
        let ptr = Global.allocate(layout)?;
        self.budget.in_use.set(wanted);
        self.budget.live_blocks.set(self.live_blocks() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { Global.deallocate(ptr, layout) };
        self.budget.in_use.set(self.in_use() - layout.size());
        self.budget.live_blocks.set(self.live_blocks() - 1);
    }
}
