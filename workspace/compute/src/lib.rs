pub mod demand;
pub mod error;
pub mod sampler;

pub use demand::{DemandSummary, Trend, average_demand, trend};
pub use error::{ComputeError, Result};
pub use sampler::{DEFAULT_MAX_DEMAND, DEFAULT_MIN_DEMAND, DemandSampler};
