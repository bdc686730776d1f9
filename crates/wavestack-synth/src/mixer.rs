//! Sums voice stacks into one output sample.

use crate::stack::{VoiceStack, clamp_or};

/// Number of voice stacks allocated by a [`Mixer`].
pub const MAX_STACKS: usize = 3;

/// Upper bound of the master amplitude.
pub const MAX_MASTER_AMPLITUDE: f32 = 0.1;

/// Default master amplitude.
pub const DEFAULT_MASTER_AMPLITUDE: f32 = 0.02;

/// [`MAX_STACKS`] voice stacks, of which the first `active` contribute.
///
/// Note frequencies are pushed to every stack, active or not, so a stack
/// that becomes active picks up the notes already sounding.
#[derive(Debug, Clone)]
pub struct Mixer<const N: usize> {
    stacks: [VoiceStack<N>; MAX_STACKS],
    active: usize,
    master_amplitude: f32,
}

impl<const N: usize> Mixer<N> {
    /// Create a mixer with one active stack and the default master amplitude.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            stacks: core::array::from_fn(|i| {
                VoiceStack::new(sample_rate, 0x9E37_79B9_u32.wrapping_mul(i as u32 + 1))
            }),
            active: 1,
            master_amplitude: DEFAULT_MASTER_AMPLITUDE,
        }
    }

    /// Number of contributing stacks.
    pub fn active_stacks(&self) -> usize {
        self.active
    }

    /// Set the number of contributing stacks, clamped to `1..=MAX_STACKS`.
    pub fn set_active_stacks(&mut self, count: usize) {
        self.active = count.clamp(1, MAX_STACKS);
    }

    /// Master amplitude applied after summing.
    pub fn master_amplitude(&self) -> f32 {
        self.master_amplitude
    }

    /// Set the master amplitude, clamped to `0..=MAX_MASTER_AMPLITUDE`.
    pub fn set_master_amplitude(&mut self, amplitude: f32) {
        self.master_amplitude = clamp_or(amplitude, 0.0, MAX_MASTER_AMPLITUDE, 0.0);
    }

    /// Stack at `index`.
    pub fn stack(&self, index: usize) -> Option<&VoiceStack<N>> {
        self.stacks.get(index)
    }

    /// Mutable stack at `index`.
    pub fn stack_mut(&mut self, index: usize) -> Option<&mut VoiceStack<N>> {
        self.stacks.get_mut(index)
    }

    /// All stacks, active or not.
    pub fn stacks(&self) -> &[VoiceStack<N>; MAX_STACKS] {
        &self.stacks
    }

    /// Mutable access to all stacks.
    pub fn stacks_mut(&mut self) -> &mut [VoiceStack<N>; MAX_STACKS] {
        &mut self.stacks
    }

    /// Push `freq` Hz into note `slot` of every stack.
    pub fn set_frequencies(&mut self, freq: f64, slot: usize) {
        for stack in &mut self.stacks {
            stack.set_frequencies(freq, slot);
        }
    }

    /// Silence note `slot` in every stack.
    pub fn silence_slot(&mut self, slot: usize) {
        for stack in &mut self.stacks {
            stack.silence_slot(slot);
        }
    }

    /// Silence everything.
    pub fn silence_all(&mut self) {
        for stack in &mut self.stacks {
            stack.silence_all();
        }
    }

    /// Sum of the active stacks times the master amplitude.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let mut sum = 0.0;
        for stack in &mut self.stacks[..self.active] {
            sum += stack.process();
        }
        sum * self.master_amplitude
    }
}
