//! Replays operation streams against the circular buffer and a `VecDeque`.
//!
//! `verify` checks the buffer against the model after every step and reports
//! the first divergence. The `run_*` functions replay without checks and are
//! what the runner and the criterion benches time.

use anyhow::{ensure, Result};
use circbuf::{CircularBuffer, GrowthPolicy};
use std::collections::VecDeque;

use crate::workload::Op;

/// What a verified replay observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub ops: usize,
    /// Number of times the buffer's capacity changed.
    pub growth_events: usize,
    pub peak_len: usize,
    pub peak_capacity: usize,
    pub final_len: usize,
}

fn apply_circular(buf: &mut CircularBuffer<u64>, op: Op) -> Option<u64> {
    match op {
        Op::PushBack(value) => {
            buf.push_back(value);
            None
        }
        Op::PushFront(value) => {
            buf.push_front(value);
            None
        }
        Op::PopBack => buf.pop_back(),
        Op::PopFront => buf.pop_front(),
        Op::Insert { index, value } => {
            buf.insert(index, value);
            None
        }
        Op::Erase { index } => buf.remove(index),
        Op::Data => buf.data().first().copied(),
        Op::Clear => {
            buf.clear();
            None
        }
    }
}

fn apply_model(model: &mut VecDeque<u64>, op: Op) -> Option<u64> {
    match op {
        Op::PushBack(value) => {
            model.push_back(value);
            None
        }
        Op::PushFront(value) => {
            model.push_front(value);
            None
        }
        Op::PopBack => model.pop_back(),
        Op::PopFront => model.pop_front(),
        Op::Insert { index, value } => {
            model.insert(index, value);
            None
        }
        Op::Erase { index } => model.remove(index),
        Op::Data => model.make_contiguous().first().copied(),
        Op::Clear => {
            model.clear();
            None
        }
    }
}

/// Replays `ops` on both containers, comparing results, length, capacity
/// headroom and (periodically) full contents.
pub fn verify(ops: &[Op], policy: GrowthPolicy) -> Result<ReplayStats> {
    let mut buf = CircularBuffer::new();
    buf.set_growth_policy(policy);
    let mut model = VecDeque::new();
    let mut stats = ReplayStats {
        peak_capacity: buf.capacity(),
        ..ReplayStats::default()
    };

    for (step, &op) in ops.iter().enumerate() {
        let capacity = buf.capacity();
        let got = apply_circular(&mut buf, op);
        let expected = apply_model(&mut model, op);
        ensure!(
            got == expected,
            "step {step} ({op:?}): buffer returned {got:?}, model {expected:?}"
        );
        ensure!(
            buf.len() == model.len(),
            "step {step} ({op:?}): length {} vs model {}",
            buf.len(),
            model.len()
        );
        ensure!(
            buf.capacity() > buf.len(),
            "step {step} ({op:?}): capacity {} leaves no free slot for length {}",
            buf.capacity(),
            buf.len()
        );
        if buf.capacity() != capacity {
            stats.growth_events += 1;
            log::debug!(
                "step {step}: capacity {capacity} -> {} at length {}",
                buf.capacity(),
                buf.len()
            );
        }
        if step % 64 == 0 || matches!(op, Op::Data) {
            ensure!(
                buf.iter().eq(model.iter()),
                "step {step} ({op:?}): contents diverged from model"
            );
        }
        stats.peak_len = stats.peak_len.max(buf.len());
        stats.peak_capacity = stats.peak_capacity.max(buf.capacity());
    }

    ensure!(
        buf.iter().eq(model.iter()),
        "final contents diverged from model"
    );
    stats.ops = ops.len();
    stats.final_len = buf.len();
    Ok(stats)
}

/// Replays `ops` on a fresh buffer and returns a checksum of popped values.
pub fn run_circular(ops: &[Op], policy: GrowthPolicy) -> u64 {
    let mut buf = CircularBuffer::new();
    buf.set_growth_policy(policy);
    ops.iter().fold(0u64, |sum, &op| {
        sum.wrapping_add(apply_circular(&mut buf, op).unwrap_or(0))
    })
}

/// Same replay on a `VecDeque`.
pub fn run_vecdeque(ops: &[Op]) -> u64 {
    let mut model = VecDeque::new();
    ops.iter().fold(0u64, |sum, &op| {
        sum.wrapping_add(apply_model(&mut model, op).unwrap_or(0))
    })
}
