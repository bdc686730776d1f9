//! Wavestack Core - wavetable construction and playback primitives
//!
//! This crate provides the offline wavetable pipeline and the per-sample
//! oscillators that read from it. Nothing in the playback path allocates.
//!
//! # Wavetable Pipeline
//!
//! Tables are built once, before playback starts:
//!
//! - [`fill_spectrum`] - Harmonic series for a [`Waveshape`], one bin per harmonic
//! - [`fft`] - In-place radix-2 complex FFT turning the spectrum into a waveform
//! - [`WaveTableSet`] - One band-limited [`WaveTable`] per octave, peak-normalized
//! - [`TableBank`] - A shared [`WaveTableSet`] for every waveshape
//!
//! ```rust
//! use wavestack_core::{TableBank, Waveshape};
//!
//! let bank = TableBank::build(20.0, 44100.0).unwrap();
//! let saw = bank.get(Waveshape::Sawtooth);
//!
//! // Low notes get the harmonically rich tables, high notes the sparse ones
//! assert!(saw.select(100.0 / 44100.0) < saw.select(5000.0 / 44100.0));
//! ```
//!
//! # Oscillators
//!
//! - [`WaveTableOscillator`] - Single phase accumulator with explicit re-trigger
//! - [`PolyOscillator`] - One phase accumulator per polyphony slot, sharing a table set
//!
//! ```rust
//! use std::sync::Arc;
//! use wavestack_core::{PolyOscillator, WaveTableSet, Waveshape};
//!
//! let sine = Arc::new(WaveTableSet::build(Waveshape::Sine, 20.0, 44100.0).unwrap());
//! let mut osc: PolyOscillator<8> = PolyOscillator::new(44100.0);
//! osc.set_tables(sine);
//! osc.set_frequency(0, 440.0);
//! osc.set_frequency(1, 660.0);
//!
//! let sample = osc.process();
//! assert!(sample.is_finite());
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for the tables).
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! wavestack-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod fft;
pub mod math;
pub mod oscillator;
pub mod spectrum;
pub mod wavetable;

// Re-export main types at crate root
pub use fft::{FftError, fft, try_fft};
pub use math::{PhaseRng, midi_to_freq, semitones_to_ratio};
pub use oscillator::{MAX_INCREMENT, NoteSlot, PolyOscillator, Tone, WaveTableOscillator};
pub use spectrum::{ParseWaveshapeError, Waveshape, fill_spectrum};
pub use wavetable::{
    MAX_TABLE_LENGTH, MAX_TABLES, OVERSAMPLING, PEAK_LEVEL, TableBank, TableError, WaveTable,
    WaveTableSet,
};
