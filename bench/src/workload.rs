//! Seeded operation streams.
//!
//! Every stream is valid for the container state it will meet: the generator
//! tracks the length it has produced so far, so interior indices are always in
//! range and pops on an empty container are still generated (they must yield
//! `None` on both sides).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    PushBack(u64),
    PushFront(u64),
    PopBack,
    PopFront,
    Insert { index: usize, value: u64 },
    Erase { index: usize },
    /// Make the storage contiguous.
    Data,
    Clear,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// FIFO: push back, pop front.
    Queue,
    /// Pushes and pops at both ends.
    Deque,
    /// Random interior insertions and erasures.
    Interior,
    /// Everything, including `data()` and the occasional `clear`.
    Mixed,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Queue,
        Profile::Deque,
        Profile::Interior,
        Profile::Mixed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Queue => "queue",
            Profile::Deque => "deque",
            Profile::Interior => "interior",
            Profile::Mixed => "mixed",
        }
    }
}

/// Builds `count` operations for `profile`, deterministic in `seed`.
pub fn generate(profile: Profile, count: usize, seed: u64) -> Vec<Op> {
    let mut rng = StdRng::seed_from_u64(seed ^ profile as u64);
    let mut len = 0usize;
    let mut ops = Vec::with_capacity(count);

    for step in 0..count as u64 {
        let op = match profile {
            Profile::Queue => {
                // Slight push bias so the queue grows through several capacities.
                if rng.gen_range(0..100) < 55 {
                    Op::PushBack(step)
                } else {
                    Op::PopFront
                }
            }
            Profile::Deque => match rng.gen_range(0..4) {
                0 => Op::PushBack(step),
                1 => Op::PushFront(step),
                2 if rng.gen_bool(0.8) => Op::PopBack,
                2 => Op::PushBack(step),
                _ => Op::PopFront,
            },
            Profile::Interior => {
                if len == 0 || rng.gen_range(0..100) < 60 {
                    Op::Insert {
                        index: rng.gen_range(0..=len),
                        value: step,
                    }
                } else {
                    Op::Erase {
                        index: rng.gen_range(0..len),
                    }
                }
            }
            Profile::Mixed => match rng.gen_range(0..100) {
                0..=24 => Op::PushBack(step),
                25..=44 => Op::PushFront(step),
                45..=54 => Op::PopBack,
                55..=64 => Op::PopFront,
                65..=79 => Op::Insert {
                    index: rng.gen_range(0..=len),
                    value: step,
                },
                80..=93 if len > 0 => Op::Erase {
                    index: rng.gen_range(0..len),
                },
                94..=98 => Op::Data,
                99 => Op::Clear,
                _ => Op::PushBack(step),
            },
        };
        len = match op {
            Op::PushBack(_) | Op::PushFront(_) | Op::Insert { .. } => len + 1,
            Op::PopBack | Op::PopFront => len.saturating_sub(1),
            Op::Erase { .. } => len - 1,
            Op::Data => len,
            Op::Clear => 0,
        };
        ops.push(op);
    }
    ops
}
