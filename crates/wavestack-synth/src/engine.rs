//! The synthesizer engine context.
//!
//! [`Synth`] owns every piece of mutable playback state: the table bank,
//! the stacks, the key buffer and the hold state. One instance drives one
//! audio stream. For use from two threads, see `Synth::split`.

use alloc::sync::Arc;

use wavestack_core::{TableBank, TableError, Waveshape, midi_to_freq};

use crate::allocator::{NoteAllocator, NoteOff, NoteOn};
use crate::mixer::{MAX_STACKS, Mixer};
use crate::stack::StackSettings;

/// Default polyphony (simultaneous notes).
pub const POLYPHONY: usize = 8;

/// Default lowest pitch the wavetables are built for, in Hz.
pub const DEFAULT_BASE_FREQUENCY: f64 = 20.0;

/// Default output sample rate, in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Polyphonic unison wavetable synthesizer with `N` note slots.
///
/// ## Signal path
///
/// note-on → [`NoteAllocator`] → slot frequency pushed into every stack →
/// per sample: each stack sums its unison oscillators → [`Mixer`] sums the
/// active stacks and applies the master amplitude.
///
/// The output is exactly zero while no key is held.
///
/// ## Example
///
/// ```rust
/// use wavestack_core::Waveshape;
/// use wavestack_synth::Synth;
///
/// let mut synth: Synth = Synth::with_defaults(44100.0).unwrap();
/// synth.set_waveshape(0, Waveshape::Sawtooth);
/// synth.set_voices(0, 4);
/// synth.set_detune(0, 30.0);
///
/// synth.note_on(60);
/// let mut block = [0.0f32; 256];
/// synth.render(&mut block);
/// assert!(block.iter().any(|&s| s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Synth<const N: usize = POLYPHONY> {
    bank: Arc<TableBank>,
    mixer: Mixer<N>,
    allocator: NoteAllocator<N>,
    hold: bool,
    sustained: [bool; N],
    sample_rate: f64,
}

impl<const N: usize> Synth<N> {
    /// Create an engine playing from `bank`, at the bank's sample rate.
    ///
    /// Every stack starts with default settings and sine tables.
    pub fn new(bank: Arc<TableBank>) -> Self {
        let sample_rate = bank.sample_rate();
        let mut mixer = Mixer::new(sample_rate);
        for stack in mixer.stacks_mut() {
            stack.set_tables(bank.get(Waveshape::Sine));
        }

        Self {
            bank,
            mixer,
            allocator: NoteAllocator::new(),
            hold: false,
            sustained: [false; N],
            sample_rate,
        }
    }

    /// Build tables for [`DEFAULT_BASE_FREQUENCY`] and create an engine.
    pub fn with_defaults(sample_rate: f64) -> Result<Self, TableError> {
        let bank = TableBank::build(DEFAULT_BASE_FREQUENCY, sample_rate)?;
        Ok(Self::new(Arc::new(bank)))
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Tables currently played.
    pub fn bank(&self) -> &Arc<TableBank> {
        &self.bank
    }

    /// Stacks and master gain.
    pub fn mixer(&self) -> &Mixer<N> {
        &self.mixer
    }

    /// Key buffer.
    pub fn allocator(&self) -> &NoteAllocator<N> {
        &self.allocator
    }

    // -- Notes ---------------------------------------------------------------

    /// Start `key`. Already-held keys are not re-triggered.
    pub fn note_on(&mut self, key: u8) -> NoteOn {
        let mixer = &mut self.mixer;
        let outcome = self.allocator.note_on(key, |key, slot| {
            mixer.set_frequencies(key.map_or(0.0, midi_to_freq), slot);
        });

        if let NoteOn::Assigned { slot } | NoteOn::AlreadyHeld { slot } = outcome {
            // A key pressed again while held no longer waits for hold release.
            self.sustained[slot] = false;
        }
        outcome
    }

    /// Stop `key`, or mark it sustained while hold is on.
    pub fn note_off(&mut self, key: u8) -> NoteOff {
        if self.hold
            && let Some(slot) = self.allocator.slot_of(key)
        {
            self.sustained[slot] = true;
            return NoteOff::Sustained { slot };
        }
        self.release(key)
    }

    fn release(&mut self, key: u8) -> NoteOff {
        let mixer = &mut self.mixer;
        let outcome = self.allocator.note_off(key, |_, slot| mixer.silence_slot(slot));
        if let NoteOff::Released { slot } = outcome {
            self.sustained[slot] = false;
        }
        outcome
    }

    /// Whether hold is on.
    pub fn hold(&self) -> bool {
        self.hold
    }

    /// Turn hold on or off. Turning it off releases every sustained key.
    pub fn set_hold(&mut self, hold: bool) {
        if self.hold == hold {
            return;
        }
        self.hold = hold;
        if hold {
            return;
        }

        for slot in 0..N {
            if self.sustained[slot] {
                if let Some(key) = self.allocator.key_in(slot) {
                    self.release(key);
                }
                self.sustained[slot] = false;
            }
        }
    }

    /// Free every slot and silence every oscillator. Hold stays as it is.
    pub fn all_notes_off(&mut self) {
        self.allocator.clear();
        self.mixer.silence_all();
        self.sustained = [false; N];
    }

    // -- Stack parameters ----------------------------------------------------

    /// Settings of stack `stack`.
    pub fn stack_settings(&self, stack: usize) -> Option<StackSettings> {
        self.mixer.stack(stack).map(|s| *s.settings())
    }

    /// Switch stack `stack` to `shape` and re-push sounding notes.
    ///
    /// Returns `false` if `stack` is out of range.
    pub fn set_waveshape(&mut self, stack: usize, shape: Waveshape) -> bool {
        let tables = Arc::clone(self.bank.get(shape));
        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        target.set_tables(&tables);
        self.repush(stack);
        true
    }

    /// Set the unison voice count of `stack` and re-push sounding notes.
    pub fn set_voices(&mut self, stack: usize, voices: usize) -> bool {
        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        target.set_voices(voices);
        self.repush(stack);
        true
    }

    /// Set the detune of `stack` and re-push sounding notes.
    pub fn set_detune(&mut self, stack: usize, detune: f32) -> bool {
        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        target.set_detune(detune);
        self.repush(stack);
        true
    }

    /// Set the amplitude of `stack`.
    pub fn set_amplitude(&mut self, stack: usize, amplitude: f32) -> bool {
        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        target.set_amplitude(amplitude);
        true
    }

    /// Enable or disable `stack`.
    pub fn set_enabled(&mut self, stack: usize, enabled: bool) -> bool {
        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        target.set_enabled(enabled);
        true
    }

    /// Apply every field of `settings` to `stack`, re-pushing notes only
    /// when the waveshape, voice count or detune changed.
    pub fn apply_stack_settings(&mut self, stack: usize, settings: &StackSettings) -> bool {
        let Some(current) = self.stack_settings(stack) else {
            return false;
        };
        let settings = settings.clamped();
        let repush = current.needs_repush(&settings);
        let tables = Arc::clone(self.bank.get(settings.waveshape));

        let Some(target) = self.mixer.stack_mut(stack) else {
            return false;
        };
        if current.waveshape != settings.waveshape {
            target.set_tables(&tables);
        }
        target.set_voices(settings.voices);
        target.set_detune(settings.detune);
        target.set_amplitude(settings.amplitude);
        target.set_enabled(settings.enabled);

        if repush {
            self.repush(stack);
        }
        true
    }

    /// Number of contributing stacks.
    pub fn stack_count(&self) -> usize {
        self.mixer.active_stacks()
    }

    /// Set the number of contributing stacks, clamped to `1..=MAX_STACKS`.
    pub fn set_stack_count(&mut self, count: usize) {
        self.mixer.set_active_stacks(count);
    }

    /// Master amplitude.
    pub fn master_amplitude(&self) -> f32 {
        self.mixer.master_amplitude()
    }

    /// Set the master amplitude, clamped to `0..=MAX_MASTER_AMPLITUDE`.
    pub fn set_master_amplitude(&mut self, amplitude: f32) {
        self.mixer.set_master_amplitude(amplitude);
    }

    /// Move every oscillator phase of every stack to zero.
    pub fn reset_phases(&mut self) {
        for stack in self.mixer.stacks_mut() {
            stack.reset_phases();
        }
    }

    /// Give every oscillator phase of every stack a fresh random value.
    pub fn randomise_phases(&mut self) {
        for stack in self.mixer.stacks_mut() {
            stack.randomise_phases();
        }
    }

    /// Play from `bank` from now on.
    ///
    /// Every stack keeps its waveshape and re-selects its tables; sounding
    /// notes keep their phases. `bank` must be built for this engine's
    /// sample rate.
    ///
    /// Returns the previous bank so the caller decides where it is freed.
    pub fn replace_bank(&mut self, bank: Arc<TableBank>) -> Arc<TableBank> {
        debug_assert!(
            (bank.sample_rate() - self.sample_rate).abs() < f64::EPSILON,
            "table bank built for a different sample rate"
        );
        for stack in self.mixer.stacks_mut() {
            let shape = stack.settings().waveshape;
            stack.set_tables(bank.get(shape));
        }
        core::mem::replace(&mut self.bank, bank)
    }

    /// Push the frequencies of every held key into `stack` again.
    fn repush(&mut self, stack: usize) {
        let Some(target) = self.mixer.stack_mut(stack) else {
            return;
        };
        for (slot, key) in self.allocator.held() {
            target.set_frequencies(midi_to_freq(key), slot);
        }
    }

    // -- Rendering -----------------------------------------------------------

    /// Produce one output sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if self.allocator.is_empty() {
            return 0.0;
        }
        self.mixer.process()
    }

    /// Fill `output` with consecutive samples.
    pub fn render(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.process();
        }
    }

    /// Fill interleaved `output`, copying each sample into all `channels`.
    ///
    /// A trailing partial frame is zeroed. `channels == 0` leaves `output`
    /// untouched.
    pub fn render_interleaved(&mut self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let mut frames = output.chunks_exact_mut(channels);
        for frame in &mut frames {
            frame.fill(self.process());
        }
        frames.into_remainder().fill(0.0);
    }
}
