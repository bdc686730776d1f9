//! Harmonic spectra for the classic waveshapes.
//!
//! [`fill_spectrum`] prepares the input of [`fft`](crate::fft()): harmonic
//! `k` is written as `-a` into bin `k` and `+a` into the mirrored bin
//! `N-k`. After the forward transform the waveform is
//! `im[n] = 2·Σ a_k·sin(2πkn/N)`, real-valued and in the imaginary buffer.
//!
//! Per-harmonic coefficient `a_k`:
//!
//! | Shape | `a_k` |
//! |-------|-------|
//! | Sine | `1` for `k = 1` only |
//! | Sawtooth | `-1/k` (rising ramp) |
//! | Square | `1/k` for odd `k`, `0` for even |
//! | Triangle | `±1/k²` for odd `k`, sign alternating from `-1`, `0` for even |

use core::fmt;
use core::str::FromStr;

/// Waveshape selector for table construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveshape {
    /// Pure fundamental.
    #[default]
    Sine,
    /// Odd harmonics falling at 1/k², soft and flute-like.
    Triangle,
    /// Every harmonic at 1/k, bright.
    Sawtooth,
    /// Odd harmonics at 1/k, hollow.
    Square,
}

impl Waveshape {
    /// Every waveshape, in index order.
    pub const ALL: [Waveshape; 4] = [
        Waveshape::Sine,
        Waveshape::Triangle,
        Waveshape::Sawtooth,
        Waveshape::Square,
    ];

    /// Number of waveshapes.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable index of this shape (0..[`Self::COUNT`]).
    pub fn index(self) -> usize {
        match self {
            Waveshape::Sine => 0,
            Waveshape::Triangle => 1,
            Waveshape::Sawtooth => 2,
            Waveshape::Square => 3,
        }
    }

    /// Shape for an index produced by [`Self::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Waveshape::Sine => "sine",
            Waveshape::Triangle => "triangle",
            Waveshape::Sawtooth => "sawtooth",
            Waveshape::Square => "square",
        }
    }

    /// Coefficient `a_k` of harmonic `k`, before mirroring.
    ///
    /// Triangle signs depend on the position among odd harmonics, which
    /// this computes directly: `k = 1, 5, 9, …` give `-1/k²`,
    /// `k = 3, 7, 11, …` give `+1/k²`.
    fn coefficient(self, k: usize) -> f64 {
        let kf = k as f64;
        match self {
            Waveshape::Sine => {
                if k == 1 {
                    1.0
                } else {
                    0.0
                }
            }
            Waveshape::Sawtooth => -1.0 / kf,
            Waveshape::Square => {
                if k % 2 == 1 {
                    1.0 / kf
                } else {
                    0.0
                }
            }
            Waveshape::Triangle => {
                if k % 2 == 0 {
                    0.0
                } else if k % 4 == 1 {
                    -1.0 / (kf * kf)
                } else {
                    1.0 / (kf * kf)
                }
            }
        }
    }
}

impl fmt::Display for Waveshape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a waveshape name is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseWaveshapeError;

impl fmt::Display for ParseWaveshapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: sine, triangle, sawtooth (saw), square")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseWaveshapeError {}

impl FromStr for Waveshape {
    type Err = ParseWaveshapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("sine") => Ok(Waveshape::Sine),
            s if s.eq_ignore_ascii_case("triangle") || s.eq_ignore_ascii_case("tri") => {
                Ok(Waveshape::Triangle)
            }
            s if s.eq_ignore_ascii_case("sawtooth") || s.eq_ignore_ascii_case("saw") => {
                Ok(Waveshape::Sawtooth)
            }
            s if s.eq_ignore_ascii_case("square") => Ok(Waveshape::Square),
            _ => Err(ParseWaveshapeError),
        }
    }
}

/// Fill `re`/`im` with the mirrored harmonic spectrum of `shape`.
///
/// Both buffers are zeroed first. Harmonics `1..=min(harmonics, N/2)` are
/// written, where `N = re.len()`; `im` stays zero.
pub fn fill_spectrum(shape: Waveshape, harmonics: usize, re: &mut [f64], im: &mut [f64]) {
    re.fill(0.0);
    im.fill(0.0);

    let len = re.len();
    let limit = harmonics.min(len / 2);

    for k in 1..=limit {
        let a = shape.coefficient(k);
        re[k] = -a;
        re[len - k] = a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_index_roundtrip() {
        for shape in Waveshape::ALL {
            assert_eq!(Waveshape::from_index(shape.index()), Some(shape));
        }
        assert_eq!(Waveshape::from_index(4), None);
    }

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("sine".parse(), Ok(Waveshape::Sine));
        assert_eq!("Saw".parse(), Ok(Waveshape::Sawtooth));
        assert_eq!(" SQUARE ".parse(), Ok(Waveshape::Square));
        assert_eq!("tri".parse(), Ok(Waveshape::Triangle));
        assert_eq!("noise".parse::<Waveshape>(), Err(ParseWaveshapeError));
    }

    #[test]
    fn test_sine_single_harmonic() {
        let mut re = vec![9.0; 16];
        let mut im = vec![9.0; 16];
        fill_spectrum(Waveshape::Sine, 8, &mut re, &mut im);

        assert_eq!(re[1], -1.0);
        assert_eq!(re[15], 1.0);
        let nonzero = re.iter().filter(|&&x| x != 0.0).count();
        assert_eq!(nonzero, 2);
        assert!(im.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_sawtooth_every_harmonic() {
        let mut re = vec![0.0; 32];
        let mut im = vec![0.0; 32];
        fill_spectrum(Waveshape::Sawtooth, 4, &mut re, &mut im);

        for k in 1..=4 {
            assert!((re[k] - 1.0 / k as f64).abs() < 1e-15);
            assert!((re[32 - k] + 1.0 / k as f64).abs() < 1e-15);
        }
        assert_eq!(re[5], 0.0);
        assert_eq!(re[27], 0.0);
    }

    #[test]
    fn test_square_odd_harmonics_only() {
        let mut re = vec![0.0; 32];
        let mut im = vec![0.0; 32];
        fill_spectrum(Waveshape::Square, 6, &mut re, &mut im);

        assert!((re[1] + 1.0).abs() < 1e-15);
        assert_eq!(re[2], 0.0);
        assert!((re[3] + 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(re[4], 0.0);
        assert!((re[5] + 0.2).abs() < 1e-15);
        assert_eq!(re[6], 0.0);
    }

    #[test]
    fn test_triangle_alternating_inverse_square() {
        let mut re = vec![0.0; 64];
        let mut im = vec![0.0; 64];
        fill_spectrum(Waveshape::Triangle, 9, &mut re, &mut im);

        // a_1 = -1, a_3 = +1/9, a_5 = -1/25, a_7 = +1/49, a_9 = -1/81
        let expected = [
            (1, -1.0),
            (3, 1.0 / 9.0),
            (5, -1.0 / 25.0),
            (7, 1.0 / 49.0),
            (9, -1.0 / 81.0),
        ];
        for (k, a) in expected {
            assert!((re[k] + a).abs() < 1e-15, "bin {k}: {}", re[k]);
            assert!((re[64 - k] - a).abs() < 1e-15, "mirror of {k}: {}", re[64 - k]);
        }
        for k in [2, 4, 6, 8] {
            assert_eq!(re[k], 0.0);
        }
    }

    #[test]
    fn test_harmonics_clamped_to_half_length() {
        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 8];
        fill_spectrum(Waveshape::Sawtooth, 1000, &mut re, &mut im);
        // Bins 1..=4 written; bin 4 is its own mirror and holds the last write.
        assert!((re[1] - 1.0).abs() < 1e-15);
        assert!((re[3] - 1.0 / 3.0).abs() < 1e-15);
        assert!((re[4] + 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_zeroes_previous_contents() {
        let mut re = vec![0.0; 16];
        let mut im = vec![0.0; 16];
        fill_spectrum(Waveshape::Sawtooth, 8, &mut re, &mut im);
        im[3] = 4.0;
        fill_spectrum(Waveshape::Sine, 8, &mut re, &mut im);
        assert_eq!(re[2], 0.0);
        assert_eq!(im[3], 0.0);
    }
}
