use std::alloc::Layout;
use thiserror::Error;

/// Failures reported by the fallible (`try_*`, `at`) buffer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircularBufferError {
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocFailed { layout: Layout },
    #[error("capacity overflow")]
    CapacityOverflow,
    #[error("index {index} out of range for buffer of length {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Unwraps the result of an allocating operation for the infallible API.
///
/// Allocation problems become a panic carrying the error message, so callers
/// that need to recover use the `try_*` form instead.
#[inline]
pub(crate) fn infallible<R>(result: Result<R, CircularBufferError>) -> R {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
