//! Integration tests: container properties checked through the public API,
//! with seeded random operation streams and a `VecDeque` model.

use circbuf::{circbuf, BudgetAllocator, CircularBuffer, CircularBufferError, GrowthPolicy};
use circbuf_bench::model::verify;
use circbuf_bench::workload::{generate, Op, Profile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Counts how many instances are alive.
#[derive(Debug)]
struct Counted {
    value: u32,
    live: Rc<Cell<i64>>,
}

impl Counted {
    fn new(value: u32, live: &Rc<Cell<i64>>) -> Self {
        live.set(live.get() + 1);
        Counted {
            value,
            live: Rc::clone(live),
        }
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Counted::new(self.value, &self.live)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

fn values(buf: &CircularBuffer<Counted>) -> Vec<u32> {
    buf.iter().map(|c| c.value).collect()
}

// ── Ordering and layout ─────────────────────────────────────────────

#[test]
fn mixed_end_pushes_stay_logically_contiguous() {
    let mut buf = CircularBuffer::new();
    for v in 1..=50 {
        if v % 2 == 0 {
            buf.push_back(v);
        } else {
            buf.push_front(v);
        }
    }
    let mut expected: Vec<i32> = (1..=50).filter(|v| v % 2 == 1).rev().collect();
    expected.extend((1..=50).filter(|v| v % 2 == 0));
    assert_eq!(buf, expected);
    for (i, v) in expected.iter().enumerate() {
        assert_eq!(buf[i], *v);
    }
}

#[test]
fn random_streams_match_the_model() {
    for seed in 0..8 {
        for profile in Profile::ALL {
            let ops = generate(profile, 2_000, seed);
            if let Err(err) = verify(&ops, GrowthPolicy::default()) {
                panic!("{} seed {seed}: {err:#}", profile.name());
            }
        }
    }
}

#[test]
fn random_streams_match_the_model_with_tight_growth() {
    let tight = GrowthPolicy {
        numerator: 1,
        denominator: 1,
        additive: 1,
        min_capacity: 1,
    };
    let ops = generate(Profile::Mixed, 3_000, 42);
    let stats = verify(&ops, tight).unwrap();
    assert!(stats.growth_events > 10);
}

#[test]
fn growth_preserves_order_across_many_reallocations() {
    let mut buf = CircularBuffer::with_capacity(2);
    let mut capacities = vec![buf.capacity()];
    buf.push_back(0u32);
    buf.pop_front();
    for v in 0..200u32 {
        buf.push_back(v);
        if buf.capacity() != *capacities.last().unwrap() {
            capacities.push(buf.capacity());
        }
    }
    assert!(capacities.len() >= 4, "only saw {capacities:?}");
    assert!(buf.iter().copied().eq(0..200));
}

#[test]
fn wraparound_indexing_and_iteration() {
    let mut buf = CircularBuffer::with_capacity(6);
    buf.extend(0..6);
    for _ in 0..4 {
        buf.pop_front();
    }
    buf.extend(6..9);
    let (front, back) = buf.as_slices();
    assert_eq!(front, &[4, 5, 6]);
    assert_eq!(back, &[7, 8]);
    assert_eq!(buf, [4, 5, 6, 7, 8]);
    assert!(buf.iter().rev().copied().eq((4..9).rev()));
    assert_eq!(buf.get(4), Some(&8));
    assert_eq!(buf.get(5), None);
}

#[test]
fn data_is_idempotent() {
    let mut buf = CircularBuffer::with_capacity(6);
    buf.extend(0..6);
    for _ in 0..3 {
        buf.pop_front();
    }
    buf.extend([10, 11]);
    let first: Vec<i32> = buf.data().to_vec();
    let ptr = buf.data().as_ptr();
    let second: Vec<i32> = buf.data().to_vec();
    assert_eq!(first, vec![3, 4, 5, 10, 11]);
    assert_eq!(first, second);
    assert_eq!(buf.data().as_ptr(), ptr);
    assert_eq!(buf.as_slices().0, &[3, 4, 5, 10, 11]);
}

// ── Interior edits ──────────────────────────────────────────────────

#[test]
fn erase_then_insert_on_a_small_buffer() {
    let mut buf = circbuf![1, 2, 3, 4, 5];
    let next = buf.erase(2);
    assert_eq!(buf[next], 4);
    assert_eq!(buf, [1, 2, 4, 5]);
    buf.insert(2, 3);
    assert_eq!(buf, [1, 2, 3, 4, 5]);
}

#[test]
fn interior_edits_match_vecdeque_at_every_position() {
    let mut rng = StdRng::seed_from_u64(0xC1C);
    for _ in 0..200 {
        let len = rng.gen_range(0..20usize);
        let offset = rng.gen_range(0..8usize);
        let mut buf = CircularBuffer::with_capacity(len + 2);
        let mut model = VecDeque::new();
        for v in 0..offset {
            buf.push_back(v);
            buf.pop_front();
        }
        for v in 0..len {
            buf.push_back(v);
            model.push_back(v);
        }
        let index = rng.gen_range(0..=len);
        let count = rng.gen_range(0..4usize);
        buf.insert_n(index, count, &99);
        for _ in 0..count {
            model.insert(index, 99);
        }
        assert!(buf.iter().eq(model.iter()));
        if !model.is_empty() {
            let start = rng.gen_range(0..model.len());
            let end = rng.gen_range(start..=model.len());
            assert_eq!(buf.erase_range(start..end), start);
            model.drain(start..end);
            assert!(buf.iter().eq(model.iter()));
        }
        assert!(buf.capacity() > buf.len());
    }
}

// ── Cursors ─────────────────────────────────────────────────────────

#[test]
fn cursor_survives_growth() {
    let mut buf: CircularBuffer<u32> = (0..5).collect();
    let third = buf.cursor(3);
    let capacity = buf.capacity();
    for v in 5..500 {
        buf.push_back(v);
    }
    assert!(buf.capacity() > capacity);
    assert_eq!(buf[third], 3);
    assert_eq!(buf.end() - third, 497);
}

#[test]
fn cursor_walk_matches_index_access() {
    let mut buf = CircularBuffer::with_capacity(8);
    buf.extend(0..8);
    for _ in 0..5 {
        buf.pop_front();
    }
    buf.extend(8..12);
    let mut it = buf.begin();
    let mut i = 0;
    while it < buf.end() {
        assert_eq!(buf[it], buf[i]);
        it += 1;
        i += 1;
    }
    assert_eq!(i, buf.len());
    let mut back = buf.end();
    back.dec();
    assert_eq!(buf[back], 11);
}

// ── Copy, move, swap ────────────────────────────────────────────────

#[test]
fn clone_is_deep_and_independent() {
    let live = Rc::new(Cell::new(0));
    let mut buf = CircularBuffer::new();
    for v in 0..10 {
        buf.push_back(Counted::new(v, &live));
    }
    let copy = buf.clone();
    assert_eq!(live.get(), 20);
    assert_eq!(values(&copy), values(&buf));
    buf.pop_back();
    buf[0].value = 100;
    assert_eq!(values(&copy), (0..10).collect::<Vec<_>>());
    drop(copy);
    drop(buf);
    assert_eq!(live.get(), 0);
}

#[test]
fn take_leaves_an_empty_unallocated_source() {
    let mut buf: CircularBuffer<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    let moved = buf.take();
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.capacity(), 0);
    assert_eq!(moved, ["a", "b"]);
    buf.push_back("c".to_string());
    assert_eq!(buf, ["c"]);
    assert!(buf.capacity() >= 2);
}

#[test]
fn swap_exchanges_contents_and_cursors() {
    let mut a = circbuf![1, 2, 3];
    let mut b = circbuf![4];
    let in_a = a.cursor(1);
    circbuf::swap(&mut a, &mut b);
    assert_eq!(a, [4]);
    assert_eq!(b, [1, 2, 3]);
    assert!(in_a.belongs_to(&b));
    assert_eq!(b[in_a], 2);
}

// ── Failure behaviour ───────────────────────────────────────────────

#[test]
fn budget_allocator_failures_are_strong() {
    let alloc = BudgetAllocator::new(256);
    let mut buf = CircularBuffer::new_in(alloc.clone());
    let mut pushed = 0u64;
    let err = loop {
        match buf.try_push_back(pushed) {
            Ok(()) => pushed += 1,
            Err(err) => break err,
        }
    };
    assert!(matches!(err, CircularBufferError::AllocFailed { .. }));
    assert!(buf.iter().copied().eq(0..pushed));
    assert!(alloc.in_use() <= 256);
    assert!(buf.try_reserve_exact(1_000).is_err());
    assert!(buf.iter().copied().eq(0..pushed));
    drop(buf);
    assert_eq!(alloc.in_use(), 0);
}

#[test]
fn panicking_producer_keeps_produced_values() {
    let live = Rc::new(Cell::new(0));
    let mut buf: CircularBuffer<Counted> = CircularBuffer::new();
    let mut made = 0;
    let result = catch_unwind(AssertUnwindSafe(|| {
        buf.resize_with(8, || {
            made += 1;
            assert!(made < 5, "producer exhausted");
            Counted::new(made, &live)
        });
    }));
    assert!(result.is_err());
    assert_eq!(values(&buf), vec![1, 2, 3, 4]);
    assert_eq!(live.get(), 4);
    buf.clear();
    assert_eq!(live.get(), 0);
}

#[test]
fn replay_of_handwritten_stream() {
    let ops = vec![
        Op::PushFront(1),
        Op::PushBack(2),
        Op::Insert { index: 1, value: 3 },
        Op::Data,
        Op::Erase { index: 0 },
        Op::PopBack,
        Op::PopBack,
        Op::PopFront,
        Op::Clear,
        Op::PushBack(4),
    ];
    let stats = verify(&ops, GrowthPolicy::default()).unwrap();
    assert_eq!(stats.final_len, 1);
    assert_eq!(stats.peak_len, 3);
}
