//! Configuration for the wavestack synthesizer engine.
//!
//! A [`SynthConfig`] describes everything needed to set up a
//! [`Synth`](wavestack_synth::Synth): sample rate, wavetable base
//! frequency, master amplitude, and one [`StackConfig`] per voice stack.
//! Configurations are stored as TOML and checked with
//! [`SynthConfig::validate`], which reports every out-of-range field at once.
//!
//! # Example
//!
//! ```rust
//! use wavestack_config::{StackConfig, SynthConfig, WaveshapeName};
//! use wavestack_synth::Synth;
//!
//! let config = SynthConfig::from_toml(r#"
//!     master_amplitude = 0.05
//!
//!     [[stacks]]
//!     waveshape = "saw"
//!     voices = 4
//!     detune = 25.0
//! "#).unwrap();
//!
//! assert_eq!(config.stacks[0].waveshape, WaveshapeName::Sawtooth);
//! config.validate().unwrap();
//!
//! let mut synth: Synth = config.build_synth().unwrap();
//! synth.note_on(60);
//! ```

mod error;
mod synth_config;

/// Range validation.
pub mod validation;

pub use error::ConfigError;
pub use synth_config::{
    MAX_BASE_FREQUENCY, MAX_SAMPLE_RATE, MIN_BASE_FREQUENCY, MIN_SAMPLE_RATE, StackConfig,
    SynthConfig, WaveshapeName,
};
pub use validation::{ValidationError, ValidationResult, validate_config};
