//! Range validation for [`SynthConfig`](crate::SynthConfig).
//!
//! Every violation is collected, not just the first, so a hand-edited file
//! can be fixed in one pass.

use thiserror::Error;
use wavestack_synth::{MAX_DETUNE, MAX_MASTER_AMPLITUDE, MAX_STACKS, MAX_UNISON};

use crate::synth_config::{MAX_BASE_FREQUENCY, MAX_SAMPLE_RATE, MIN_BASE_FREQUENCY, MIN_SAMPLE_RATE};
use crate::SynthConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the field, e.g. `stacks[1].detune`.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Wrong number of stacks.
    #[error("expected 1 to {max} stacks, found {count}")]
    StackCount {
        /// Number of stacks in the configuration.
        count: usize,
        /// Maximum number of stacks.
        max: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(
    errors: &mut Vec<ValidationError>,
    field: impl Into<String>,
    value: f64,
    min: f64,
    max: f64,
) {
    // NaN fails both comparisons, so it is reported too.
    if !(value >= min && value <= max) {
        errors.push(ValidationError::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        });
    }
}

/// Check every field of `config` against its valid range.
pub fn validate_config(config: &SynthConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_range(
        &mut errors,
        "sample_rate",
        f64::from(config.sample_rate),
        f64::from(MIN_SAMPLE_RATE),
        f64::from(MAX_SAMPLE_RATE),
    );
    check_range(
        &mut errors,
        "base_frequency",
        config.base_frequency,
        MIN_BASE_FREQUENCY,
        MAX_BASE_FREQUENCY,
    );
    check_range(
        &mut errors,
        "master_amplitude",
        f64::from(config.master_amplitude),
        0.0,
        f64::from(MAX_MASTER_AMPLITUDE),
    );

    if config.stacks.is_empty() || config.stacks.len() > MAX_STACKS {
        errors.push(ValidationError::StackCount {
            count: config.stacks.len(),
            max: MAX_STACKS,
        });
    }

    for (i, stack) in config.stacks.iter().enumerate() {
        check_range(
            &mut errors,
            format!("stacks[{i}].voices"),
            stack.voices as f64,
            1.0,
            MAX_UNISON as f64,
        );
        check_range(
            &mut errors,
            format!("stacks[{i}].detune"),
            f64::from(stack.detune),
            0.0,
            f64::from(MAX_DETUNE),
        );
        check_range(
            &mut errors,
            format!("stacks[{i}].amplitude"),
            f64::from(stack.amplitude),
            0.0,
            1.0,
        );
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
