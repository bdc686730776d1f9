//! Voice stack: one unison layer of detuned polyphonic oscillators.

use alloc::sync::Arc;

use wavestack_core::{PhaseRng, PolyOscillator, WaveTableSet, Waveshape};

use crate::detune::{MAX_DETUNE, MAX_UNISON, detune_ratio, detune_row};

/// Default stack amplitude.
pub const DEFAULT_STACK_AMPLITUDE: f32 = 0.5;

/// Scalar parameters of a [`VoiceStack`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackSettings {
    /// Disabled stacks output silence.
    pub enabled: bool,
    /// Waveshape of every oscillator in the stack.
    pub waveshape: Waveshape,
    /// Unison voice count, 1 to [`MAX_UNISON`].
    pub voices: usize,
    /// Detune in percent of the full ±1 semitone spread, 0 to 100.
    pub detune: f32,
    /// Output gain, 0 to 1.
    pub amplitude: f32,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            waveshape: Waveshape::Sine,
            voices: 1,
            detune: 0.0,
            amplitude: DEFAULT_STACK_AMPLITUDE,
        }
    }
}

impl StackSettings {
    /// Copy with every field clamped to its valid range.
    pub fn clamped(self) -> Self {
        Self {
            voices: self.voices.clamp(1, MAX_UNISON),
            detune: clamp_or(self.detune, 0.0, MAX_DETUNE, 0.0),
            amplitude: clamp_or(self.amplitude, 0.0, 1.0, 0.0),
            ..self
        }
    }

    /// True if changing from `self` to `other` requires re-pushing note frequencies.
    pub fn needs_repush(&self, other: &Self) -> bool {
        self.waveshape != other.waveshape
            || self.voices != other.voices
            || self.detune != other.detune
    }
}

/// Clamp `value` into `[min, max]`, mapping NaN to `fallback`.
pub(crate) fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// A unison group of up to [`MAX_UNISON`] oscillators with `N` note slots each.
///
/// Oscillator `n` plays voice `n` of every note; only the first
/// `voices` oscillators are processed. Frequencies are pushed per note
/// slot with [`set_frequencies`](Self::set_frequencies). Changing the
/// waveshape, voice count or detune does not re-push them: the owner
/// must call `set_frequencies` again for every sounding note.
#[derive(Debug, Clone)]
pub struct VoiceStack<const N: usize> {
    oscillators: [PolyOscillator<N>; MAX_UNISON],
    settings: StackSettings,
    rng: PhaseRng,
}

impl<const N: usize> VoiceStack<N> {
    /// Create a stack with default settings and randomised start phases.
    ///
    /// `seed` drives the phase randomiser; different stacks should get
    /// different seeds.
    pub fn new(sample_rate: f64, seed: u32) -> Self {
        let mut rng = PhaseRng::new(seed);
        let oscillators = core::array::from_fn(|_| {
            let mut osc = PolyOscillator::new(sample_rate);
            osc.randomise_phases(&mut rng);
            osc
        });

        Self {
            oscillators,
            settings: StackSettings::default(),
            rng,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    /// Attach a table set to every oscillator and adopt its waveshape.
    pub fn set_tables(&mut self, tables: &Arc<WaveTableSet>) {
        self.settings.waveshape = tables.shape();
        for osc in &mut self.oscillators {
            osc.set_tables(Arc::clone(tables));
        }
    }

    /// Set the unison voice count, clamped to `1..=MAX_UNISON`.
    ///
    /// Oscillators beyond the new count are silenced.
    pub fn set_voices(&mut self, voices: usize) {
        let voices = voices.clamp(1, MAX_UNISON);
        self.settings.voices = voices;
        for osc in &mut self.oscillators[voices..] {
            osc.silence_all();
        }
    }

    /// Set detune in percent, clamped to `0..=100`.
    pub fn set_detune(&mut self, detune: f32) {
        self.settings.detune = clamp_or(detune, 0.0, MAX_DETUNE, 0.0);
    }

    /// Set output gain, clamped to `0..=1`.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.settings.amplitude = clamp_or(amplitude, 0.0, 1.0, 0.0);
    }

    /// Enable or disable the stack.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Push `base_freq` Hz into note `slot` of every active unison voice.
    ///
    /// Voice `n` plays `base_freq · 2^((detune/100) · offset_n / 12)`.
    /// A non-positive `base_freq` silences the slot.
    pub fn set_frequencies(&mut self, base_freq: f64, slot: usize) {
        let voices = self.settings.voices;
        for (osc, &offset) in self.oscillators[..voices]
            .iter_mut()
            .zip(detune_row(voices))
        {
            osc.set_frequency(slot, base_freq * detune_ratio(self.settings.detune, offset));
        }
    }

    /// Silence note `slot` in every oscillator.
    pub fn silence_slot(&mut self, slot: usize) {
        for osc in &mut self.oscillators {
            osc.silence(slot);
        }
    }

    /// Silence every slot of every oscillator.
    pub fn silence_all(&mut self) {
        for osc in &mut self.oscillators {
            osc.silence_all();
        }
    }

    /// Move every slot phase back to zero.
    pub fn reset_phases(&mut self) {
        for osc in &mut self.oscillators {
            osc.set_phases(0.0);
        }
    }

    /// Give every slot phase a fresh pseudo-random value.
    pub fn randomise_phases(&mut self) {
        for osc in &mut self.oscillators {
            osc.randomise_phases(&mut self.rng);
        }
    }

    /// Unison oscillator `index`.
    pub fn oscillator(&self, index: usize) -> Option<&PolyOscillator<N>> {
        self.oscillators.get(index)
    }

    /// Sum of the active oscillators times the stack amplitude.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if !self.settings.enabled {
            return 0.0;
        }

        let mut sum = 0.0;
        for osc in &mut self.oscillators[..self.settings.voices] {
            sum += osc.process();
        }
        sum * self.settings.amplitude
    }
}
