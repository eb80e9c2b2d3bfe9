use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Sampler bounds that do not describe a non-empty range
    #[error("Invalid demand range: {min}..{max}")]
    InvalidRange { min: u32, max: u32 },
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
