//! Pitch conversions and a tiny phase randomizer.

/// Convert a MIDI note number to frequency in Hz.
///
/// Standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * libm::pow(2.0, (f64::from(note) - 69.0) / 12.0)
}

/// Convert a pitch offset in semitones to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    libm::pow(2.0, semitones / 12.0)
}

/// Xorshift32 generator for oscillator start phases.
///
/// Not for anything but spreading phases: the output only needs to look
/// uncorrelated between unison voices.
#[derive(Debug, Clone)]
pub struct PhaseRng {
    state: u32,
}

impl PhaseRng {
    /// Create a generator. A zero seed is replaced, since xorshift would stay at zero.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x12345678 } else { seed },
        }
    }

    /// Next phase in [0.0, 1.0).
    #[inline]
    pub fn next_phase(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    }
}

impl Default for PhaseRng {
    fn default() -> Self {
        Self::new(0x12345678)
    }
}
