//! Unison detune spreads.
//!
//! Row `v - 1` of [`DETUNE_SEMITONES`] holds the semitone offsets of a
//! `v`-voice unison at full detune. Offsets are symmetric around zero and
//! span -1 to +1 semitone; odd voice counts keep one voice on pitch.

/// Maximum number of unison voices per stack.
pub const MAX_UNISON: usize = 8;

/// Upper bound of the detune amount (percent of the full spread).
pub const MAX_DETUNE: f32 = 100.0;

/// Semitone offsets at full detune, one row per voice count.
#[rustfmt::skip]
pub const DETUNE_SEMITONES: [[f64; MAX_UNISON]; MAX_UNISON] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-1.0, -1.0 / 3.0, 1.0 / 3.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    [-1.0, -0.5, 0.0, 0.5, 1.0, 0.0, 0.0, 0.0],
    [-1.0, -0.6, -0.2, 0.2, 0.6, 1.0, 0.0, 0.0],
    [-1.0, -2.0 / 3.0, -1.0 / 3.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 0.0],
    [-1.0, -1.0 + 2.0 / 7.0, -1.0 + 4.0 / 7.0, -1.0 + 6.0 / 7.0,
     1.0 - 6.0 / 7.0, 1.0 - 4.0 / 7.0, 1.0 - 2.0 / 7.0, 1.0],
];

/// Offsets for a `voices`-voice unison, clamped to `1..=MAX_UNISON`.
pub fn detune_row(voices: usize) -> &'static [f64] {
    let voices = voices.clamp(1, MAX_UNISON);
    &DETUNE_SEMITONES[voices - 1][..voices]
}

/// Frequency multiplier for a voice at `semitones` offset and `amount` percent detune.
///
/// `2^((amount / 100) · semitones / 12)`
#[inline]
pub fn detune_ratio(amount: f32, semitones: f64) -> f64 {
    libm::pow(2.0, f64::from(amount) / 100.0 * semitones / 12.0)
}
