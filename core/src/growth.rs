use serde::{Deserialize, Serialize};

use crate::error::CircularBufferError;

/// How much a buffer grows when an insertion runs out of headroom.
///
/// The next capacity is `current * numerator / denominator + additive`, raised
/// to at least the required slot count and `min_capacity`. The defaults give
/// 1.5x growth with a small bump so tiny buffers do not reallocate on every
/// push.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct GrowthPolicy {
    pub numerator: usize,
    pub denominator: usize,
    pub additive: usize,
    pub min_capacity: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy {
            numerator: 3,
            denominator: 2,
            additive: 2,
            min_capacity: 2,
        }
    }
}

impl GrowthPolicy {
    /// Capacity to grow to from `current` when at least `required` slots are needed.
    pub fn next_capacity(
        &self,
        current: usize,
        required: usize,
    ) -> Result<usize, CircularBufferError> {
        let scaled = current
            .checked_mul(self.numerator)
            .ok_or(CircularBufferError::CapacityOverflow)?
            / self.denominator.max(1);
        let grown = scaled
            .checked_add(self.additive)
            .ok_or(CircularBufferError::CapacityOverflow)?;
        Ok(grown.max(required).max(self.min_capacity))
    }
}
