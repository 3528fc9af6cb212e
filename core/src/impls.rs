//! Standard trait implementations for `CircularBuffer`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};

use crate::alloc::{Global, RawAllocator};
use crate::buffer::CircularBuffer;
use crate::iter::{IntoIter, Iter, IterMut};

impl<T> Default for CircularBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: RawAllocator + Clone> Clone for CircularBuffer<T, A> {
    /// Exact-size copy with a fresh identity. A panicking element clone drops
    /// the partial copy and leaves the source untouched.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity_in(self.len(), self.allocator().clone());
        copy.set_growth_policy(self.growth_policy());
        for item in self.iter() {
            copy.push_back(item.clone());
        }
        copy
    }

    /// Replaces the contents with a copy of `source` while keeping this
    /// buffer's identity, so its cursors keep denoting this buffer.
    fn clone_from(&mut self, source: &Self) {
        let copy = source.clone();
        let id = self.id();
        *self = copy;
        self.set_id(id);
    }
}

impl<T: fmt::Debug, A: RawAllocator> fmt::Debug for CircularBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A: RawAllocator, B: RawAllocator> PartialEq<CircularBuffer<U, B>>
    for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &CircularBuffer<U, B>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, A: RawAllocator> Eq for CircularBuffer<T, A> {}

macro_rules! __impl_slice_eq {
    ([$($vars:tt)*] $rhs:ty) => {
        impl<T, U, A: RawAllocator, $($vars)*> PartialEq<$rhs> for CircularBuffer<T, A>
        where
            T: PartialEq<U>,
        {
            fn eq(&self, other: &$rhs) -> bool {
                self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
            }
        }
    };
}

__impl_slice_eq! { [] Vec<U> }
__impl_slice_eq! { [] [U] }
__impl_slice_eq! { [] &[U] }
__impl_slice_eq! { [] &mut [U] }
__impl_slice_eq! { [const N: usize] [U; N] }
__impl_slice_eq! { [const N: usize] &[U; N] }

impl<T: PartialOrd, A: RawAllocator> PartialOrd for CircularBuffer<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, A: RawAllocator> Ord for CircularBuffer<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, A: RawAllocator> Hash for CircularBuffer<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        self.iter().for_each(|item| item.hash(state));
    }
}

impl<T, A: RawAllocator> Index<usize> for CircularBuffer<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len();
        match self.get(index) {
            Some(item) => item,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A: RawAllocator> IndexMut<usize> for CircularBuffer<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A: RawAllocator> Extend<T> for CircularBuffer<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Copy + 'a, A: RawAllocator> Extend<&'a T> for CircularBuffer<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for CircularBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<T> From<Vec<T>> for CircularBuffer<T> {
    fn from(vec: Vec<T>) -> Self {
        let mut buf = Self::with_capacity(vec.len());
        buf.extend(vec);
        buf
    }
}

impl<T, const N: usize> From<[T; N]> for CircularBuffer<T> {
    fn from(array: [T; N]) -> Self {
        let mut buf = Self::with_capacity(N);
        buf.extend(array);
        buf
    }
}

impl<T, A: RawAllocator> From<CircularBuffer<T, A>> for Vec<T> {
    fn from(buf: CircularBuffer<T, A>) -> Self {
        let mut vec = Vec::with_capacity(buf.len());
        vec.extend(buf);
        vec
    }
}

impl<T, A: RawAllocator> IntoIterator for CircularBuffer<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a CircularBuffer<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a mut CircularBuffer<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
