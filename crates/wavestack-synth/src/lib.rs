//! Wavestack Synth - polyphonic unison wavetable engine
//!
//! Builds a playable instrument on top of the `wavestack-core` oscillators:
//! up to three layered voice stacks, each a group of up to eight detuned
//! polyphonic oscillators, driven by MIDI note-on / note-off.
//!
//! # Components
//!
//! - [`NoteAllocator`] - Maps MIDI keys onto a fixed pool of polyphony slots (first free, no stealing)
//! - [`VoiceStack`] - Unison layer: detuned oscillators sharing one waveshape
//! - [`Mixer`] - Sums the active stacks and applies the master amplitude
//! - [`Synth`] - Engine context owning all of the above plus the table bank
//!
//! ```rust
//! use wavestack_core::Waveshape;
//! use wavestack_synth::{NoteOn, Synth};
//!
//! let mut synth: Synth = Synth::with_defaults(44100.0).unwrap();
//! synth.set_stack_count(2);
//! synth.set_waveshape(1, Waveshape::Square);
//! synth.set_voices(1, 3);
//! synth.set_detune(1, 20.0);
//!
//! assert_eq!(synth.note_on(69), NoteOn::Assigned { slot: 0 });
//! assert_eq!(synth.note_on(69), NoteOn::AlreadyHeld { slot: 0 });
//!
//! let mut stereo = [0.0f32; 512];
//! synth.render_interleaved(&mut stereo, 2);
//! ```
//!
//! # Threading
//!
//! With the `std` feature, [`Synth::split`] returns a [`SynthController`]
//! for the control thread and a [`SynthRenderer`] for the audio callback.
//! Parameters travel through atomics, notes through a bounded queue, and
//! rebuilt table banks through an `ArcSwap`; the audio side never blocks.
//!
//! ```rust
//! use wavestack_synth::Synth;
//!
//! let synth: Synth = Synth::with_defaults(44100.0).unwrap();
//! let (controller, mut renderer) = synth.split();
//!
//! controller.note_on(60);
//! controller.set_voices(0, 4);
//!
//! let mut block = [0.0f32; 256];
//! renderer.render(&mut block);
//! assert_eq!(renderer.synth().stack_settings(0).unwrap().voices, 4);
//! ```
//!
//! # no_std Support
//!
//! Without `std` the single-threaded engine is still available:
//!
//! ```toml
//! [dependencies]
//! wavestack-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allocator;
pub mod detune;
pub mod engine;
pub mod mixer;
#[cfg(feature = "std")]
pub mod shared;
pub mod stack;

pub use allocator::{MAX_KEY, NoteAllocator, NoteOff, NoteOn};
pub use detune::{DETUNE_SEMITONES, MAX_DETUNE, MAX_UNISON, detune_ratio, detune_row};
pub use engine::{DEFAULT_BASE_FREQUENCY, DEFAULT_SAMPLE_RATE, POLYPHONY, Synth};
pub use mixer::{DEFAULT_MASTER_AMPLITUDE, MAX_MASTER_AMPLITUDE, MAX_STACKS, Mixer};
#[cfg(feature = "std")]
pub use shared::{
    ControlEvent, EVENT_QUEUE_CAPACITY, SharedParams, SynthController, SynthRenderer,
};
pub use stack::{DEFAULT_STACK_AMPLITUDE, StackSettings, VoiceStack};
