//! Wavetable oscillators.
//!
//! Both oscillators keep their phase in `f64` and read tables with linear
//! interpolation. The phase increment (frequency / sample rate) decides
//! which octave table is read, so the spectrum stays band-limited as pitch
//! rises.

use alloc::sync::Arc;

use crate::wavetable::WaveTableSet;

/// Largest phase increment, half a cycle per sample (Nyquist).
///
/// Frequencies above half the sample rate play at exactly Nyquist rather
/// than aliasing back down. Such tones only make sense as a limit, so the
/// clamp keeps the table choice and the phase step in the range the
/// band-limited tables were built for.
pub const MAX_INCREMENT: f64 = 0.5;

fn increment_for(freq: f64, sample_rate: f64) -> f64 {
    (freq / sample_rate).min(MAX_INCREMENT)
}

#[inline]
fn wrap_phase(phase: f64) -> f64 {
    if phase >= 1.0 { phase - 1.0 } else { phase }
}

/// Reduce an arbitrary phase into [0.0, 1.0).
fn normalize_phase(phase: f64) -> f64 {
    let wrapped = phase - libm::floor(phase);
    if wrapped >= 1.0 || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}

/// Frequency assigned to a sounding slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Phase advance per sample, in (0, [`MAX_INCREMENT`]].
    pub increment: f64,
    /// Index of the table selected for `increment`.
    pub table: usize,
}

/// One polyphony slot: a phase accumulator and, when sounding, its tone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteSlot {
    /// Current phase in [0.0, 1.0).
    pub phase: f64,
    /// `None` while the slot is silent.
    pub tone: Option<Tone>,
}

impl NoteSlot {
    /// True if this slot contributes to the output.
    pub fn is_active(&self) -> bool {
        self.tone.is_some()
    }
}

/// Wavetable oscillator with `N` independent frequency slots.
///
/// All slots read the same [`WaveTableSet`]. Silent slots neither advance
/// nor read a table. A slot is silenced by assigning a non-positive
/// frequency.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use wavestack_core::{PolyOscillator, WaveTableSet, Waveshape};
///
/// let square = Arc::new(WaveTableSet::build(Waveshape::Square, 20.0, 48000.0).unwrap());
/// let mut osc: PolyOscillator<4> = PolyOscillator::new(48000.0);
/// osc.set_tables(square);
///
/// osc.set_frequency(2, 220.0);
/// assert_eq!(osc.active_slots(), 1);
///
/// osc.set_frequency(2, 0.0);
/// assert_eq!(osc.process(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PolyOscillator<const N: usize> {
    tables: Option<Arc<WaveTableSet>>,
    slots: [NoteSlot; N],
    sample_rate: f64,
}

impl<const N: usize> PolyOscillator<N> {
    /// Create an oscillator with every slot silent and no tables attached.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            tables: None,
            slots: [NoteSlot::default(); N],
            sample_rate,
        }
    }

    /// Attach a table set. Sounding slots re-select their table.
    pub fn set_tables(&mut self, tables: Arc<WaveTableSet>) {
        for slot in &mut self.slots {
            if let Some(tone) = &mut slot.tone {
                tone.table = tables.select(tone.increment);
            }
        }
        self.tables = Some(tables);
    }

    /// Currently attached tables.
    pub fn tables(&self) -> Option<&Arc<WaveTableSet>> {
        self.tables.as_ref()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Set the sample rate. Sounding slots keep their increment.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Assign `freq` Hz to `slot`.
    ///
    /// Zero, negative and non-finite frequencies silence the slot.
    /// Frequencies above Nyquist are clamped to it (see [`MAX_INCREMENT`]).
    /// The phase is left untouched. Returns `false` if `slot` is out of range.
    pub fn set_frequency(&mut self, slot: usize, freq: f64) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            return false;
        };

        target.tone = if freq.is_finite() && freq > 0.0 {
            let increment = increment_for(freq, self.sample_rate);
            let table = self.tables.as_ref().map_or(0, |t| t.select(increment));
            Some(Tone { increment, table })
        } else {
            None
        };
        true
    }

    /// Silence one slot.
    pub fn silence(&mut self, slot: usize) {
        if let Some(target) = self.slots.get_mut(slot) {
            target.tone = None;
        }
    }

    /// Silence every slot.
    pub fn silence_all(&mut self) {
        for slot in &mut self.slots {
            slot.tone = None;
        }
    }

    /// Set every slot's phase to `phase` (wrapped into [0.0, 1.0)).
    pub fn set_phases(&mut self, phase: f64) {
        let phase = normalize_phase(phase);
        for slot in &mut self.slots {
            slot.phase = phase;
        }
    }

    /// Give every slot an independent random phase.
    pub fn randomise_phases(&mut self, rng: &mut crate::PhaseRng) {
        for slot in &mut self.slots {
            slot.phase = rng.next_phase();
        }
    }

    /// State of `slot`, if in range.
    pub fn slot(&self, slot: usize) -> Option<&NoteSlot> {
        self.slots.get(slot)
    }

    /// All slots.
    pub fn slots(&self) -> &[NoteSlot; N] {
        &self.slots
    }

    /// Number of sounding slots.
    pub fn active_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Sum of every sounding slot at the current phases.
    #[inline]
    pub fn output(&self) -> f32 {
        let Some(tables) = &self.tables else {
            return 0.0;
        };

        let mut sum = 0.0;
        for slot in &self.slots {
            if let Some(tone) = slot.tone {
                sum += tables.table(tone.table).lookup(slot.phase);
            }
        }
        sum
    }

    /// Advance every sounding slot by its increment.
    #[inline]
    pub fn advance(&mut self) {
        for slot in &mut self.slots {
            if let Some(tone) = slot.tone {
                slot.phase = wrap_phase(slot.phase + tone.increment);
            }
        }
    }

    /// Read the current output, then advance.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let out = self.output();
        self.advance();
        out
    }
}

/// Single-voice wavetable oscillator.
///
/// The building block for monophonic use: one phase accumulator with an
/// explicit [`retrigger`](Self::retrigger) for hard phase resets.
#[derive(Debug, Clone)]
pub struct WaveTableOscillator {
    tables: Option<Arc<WaveTableSet>>,
    phase: f64,
    frequency: f64,
    increment: f64,
    table: usize,
    sample_rate: f64,
}

impl WaveTableOscillator {
    /// Create a silent oscillator.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            tables: None,
            phase: 0.0,
            frequency: 0.0,
            increment: 0.0,
            table: 0,
            sample_rate,
        }
    }

    /// Attach a table set and re-select the table for the current frequency.
    pub fn set_tables(&mut self, tables: Arc<WaveTableSet>) {
        self.table = tables.select(self.increment);
        self.tables = Some(tables);
    }

    /// Set frequency in Hz. Non-positive or non-finite values silence.
    ///
    /// [`frequency`](Self::frequency) keeps the requested value, while the
    /// increment stops at [`MAX_INCREMENT`].
    pub fn set_frequency(&mut self, freq: f64) {
        if freq.is_finite() && freq > 0.0 {
            self.frequency = freq;
            self.increment = increment_for(freq, self.sample_rate);
        } else {
            self.frequency = 0.0;
            self.increment = 0.0;
        }
        self.table = self.tables.as_ref().map_or(0, |t| t.select(self.increment));
    }

    /// Frequency in Hz, 0.0 while silent.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Phase increment per sample.
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Index of the table currently read.
    pub fn table_index(&self) -> usize {
        self.table
    }

    /// Current phase in [0.0, 1.0).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Set the phase (wrapped into [0.0, 1.0)).
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = normalize_phase(phase);
    }

    /// Restart the waveform from phase zero.
    pub fn retrigger(&mut self) {
        self.phase = 0.0;
    }

    /// Sample at the current phase.
    #[inline]
    pub fn output(&self) -> f32 {
        match &self.tables {
            Some(tables) if self.increment > 0.0 => tables.table(self.table).lookup(self.phase),
            _ => 0.0,
        }
    }

    /// Advance the phase by one sample.
    #[inline]
    pub fn advance(&mut self) {
        self.phase = wrap_phase(self.phase + self.increment);
    }

    /// Read the current output, then advance.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let out = self.output();
        self.advance();
        out
    }
}
