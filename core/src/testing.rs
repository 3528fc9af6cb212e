//! Instrumented element type for the unit tests.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct TrackerState {
    live: Cell<isize>,
    clones_left: Cell<Option<usize>>,
    poisoned: Cell<Option<i32>>,
}

/// Counts live `Tracked` values and injects clone and drop failures.
#[derive(Clone, Default)]
pub(crate) struct Tracker {
    state: Rc<TrackerState>,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn make(&self, value: i32) -> Tracked {
        self.state.live.set(self.state.live.get() + 1);
        Tracked {
            value,
            state: Rc::clone(&self.state),
        }
    }

    pub(crate) fn live(&self) -> isize {
        self.state.live.get()
    }

    /// The next `n` clones succeed, the one after panics.
    pub(crate) fn allow_clones(&self, n: usize) {
        self.state.clones_left.set(Some(n));
    }

    /// Dropping the value `value` panics once.
    pub(crate) fn poison(&self, value: i32) {
        self.state.poisoned.set(Some(value));
    }
}

pub(crate) struct Tracked {
    pub(crate) value: i32,
    state: Rc<TrackerState>,
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        match self.state.clones_left.get() {
            Some(0) => panic!("clone of {} refused", self.value),
            Some(n) => self.state.clones_left.set(Some(n - 1)),
            None => {}
        }
        self.state.live.set(self.state.live.get() + 1);
        Tracked {
            value: self.value,
            state: Rc::clone(&self.state),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.state.live.set(self.state.live.get() - 1);
        if self.state.poisoned.get() == Some(self.value) {
            self.state.poisoned.set(None);
            panic!("drop of {} failed", self.value);
        }
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}
