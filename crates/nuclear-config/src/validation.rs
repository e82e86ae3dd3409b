//! Range checks for lattice configuration values.
//!
//! Every check runs; failures are collected so a user fixing a config file
//! sees all problems at once rather than one per attempt.

use thiserror::Error;

use crate::config::LatticeConfig;

/// Highest channel count accepted on either side of the lattice.
pub const MAX_CHANNELS: u32 = 128;

/// Largest accepted period, in frames.
pub const MAX_PERIOD_FRAMES: u32 = 65_536;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its accepted range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The value that was out of range.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },

    /// Required string field is empty.
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks every field of a lattice config.
pub fn validate_config(config: &LatticeConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_range(&mut errors, "in_channels", config.in_channels, 1, MAX_CHANNELS);
    check_range(&mut errors, "out_channels", config.out_channels, 1, MAX_CHANNELS);
    check_range(&mut errors, "period_frames", config.period_frames, 1, MAX_PERIOD_FRAMES);
    check_range(&mut errors, "sample_rate", config.sample_rate, 1, u32::MAX);
    if config.threads.name_prefix.trim().is_empty() {
        errors.push(ValidationError::Empty("threads.name_prefix"));
    }
    if let Some(bytes) = config.threads.stack_size
        && bytes == 0
    {
        errors.push(ValidationError::OutOfRange {
            field: "threads.stack_size",
            value: 0,
            min: 1,
            max: u64::MAX,
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &'static str, value: u32, min: u32, max: u32) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field,
            value: u64::from(value),
            min: u64::from(min),
            max: u64::from(max),
        });
    }
}
