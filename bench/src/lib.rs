//! Circular buffer workload benchmark
//!
//! Generates seeded operation streams (queue, deque, interior edits and a
//! mixed profile), replays each one against `circbuf::CircularBuffer` while
//! checking every step against a `VecDeque` model, then times both containers
//! on the same stream.
//!
//! Run benchmarks: `cargo bench`
//! Run the report: `cargo run --release -p circbuf-bench`

pub mod config;
pub mod model;
pub mod report;
pub mod workload;
