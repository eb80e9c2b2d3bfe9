//! Synthetic demand generation used by the "add data" action.
//!
//! The default range is a placeholder business rule carried over from the
//! dashboard: a uniform whole number in `[110, 160)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use tracing::trace;

use crate::error::{ComputeError, Result};

/// Lowest value the default sampler can produce
pub const DEFAULT_MIN_DEMAND: u32 = 110;
/// Exclusive upper bound of the default sampler
pub const DEFAULT_MAX_DEMAND: u32 = 160;

/// Draws bounded whole-number demand values.
#[derive(Debug, Clone)]
pub struct DemandSampler {
    rng: StdRng,
    range: Range<u32>,
}

impl DemandSampler {
    /// Creates a sampler over `[min, max)` seeded from the OS.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        Self::build(min, max, StdRng::from_os_rng())
    }

    /// Creates a reproducible sampler over `[min, max)`.
    pub fn seeded(min: u32, max: u32, seed: u64) -> Result<Self> {
        Self::build(min, max, StdRng::seed_from_u64(seed))
    }

    fn build(min: u32, max: u32, rng: StdRng) -> Result<Self> {
        if min >= max {
            return Err(ComputeError::InvalidRange { min, max });
        }
        Ok(Self { rng, range: min..max })
    }

    /// Values drawn by [`sample`](Self::sample), upper bound exclusive.
    pub fn range(&self) -> Range<u32> {
        self.range.clone()
    }

    /// Next synthetic demand value.
    pub fn sample(&mut self) -> f64 {
        let value = self.rng.random_range(self.range.clone());
        trace!(value, "Sampled synthetic demand");
        f64::from(value)
    }
}
