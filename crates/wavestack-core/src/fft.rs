//! In-place radix-2 complex FFT.
//!
//! Iterative Cooley-Tukey, decimation in time: a bit-reversal permutation
//! followed by `log2(N)` butterfly stages. The transform is forward
//! (kernel `e^{-2πikn/N}`) and unnormalized.
//!
//! The wavetable factory never needs a separate inverse: it writes an odd
//! symmetric spectrum into the real input (`re[k] = -re[N-k]`), and the
//! forward transform of that input is purely imaginary, so the time-domain
//! waveform lands in `im`.

use core::f64::consts::PI;
use core::fmt;

/// Reasons [`try_fft`] refuses its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    /// Real and imaginary buffers differ in length.
    LengthMismatch {
        /// Length of the real buffer.
        re: usize,
        /// Length of the imaginary buffer.
        im: usize,
    },
    /// Buffer length is not a power of two.
    NotPowerOfTwo(usize),
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::LengthMismatch { re, im } => {
                write!(f, "fft buffers differ in length: re={re}, im={im}")
            }
            FftError::NotPowerOfTwo(n) => write!(f, "fft length {n} is not a power of two"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

/// Transform `re`/`im` in place.
///
/// Both slices must have the same power-of-two length. This is only
/// checked in debug builds; use [`try_fft`] when the length comes from
/// outside. Lengths 0 and 1 are the identity.
pub fn fft(re: &mut [f64], im: &mut [f64]) {
    debug_assert_eq!(re.len(), im.len(), "fft buffers differ in length");
    debug_assert!(
        re.len() <= 1 || re.len().is_power_of_two(),
        "fft length {} is not a power of two",
        re.len()
    );

    let n = re.len().min(im.len());
    if n < 2 {
        return;
    }

    bit_reverse_permute(&mut re[..n], &mut im[..n]);

    let mut half = 1;
    while half < n {
        let span = half * 2;
        let theta = -PI / half as f64;

        for j in 0..half {
            let (wi, wr) = libm::sincos(theta * j as f64);

            let mut i = j;
            while i < n {
                let ip = i + half;
                let tr = re[ip] * wr - im[ip] * wi;
                let ti = re[ip] * wi + im[ip] * wr;
                re[ip] = re[i] - tr;
                im[ip] = im[i] - ti;
                re[i] += tr;
                im[i] += ti;
                i += span;
            }
        }

        half = span;
    }
}

/// Checked variant of [`fft`].
pub fn try_fft(re: &mut [f64], im: &mut [f64]) -> Result<(), FftError> {
    if re.len() != im.len() {
        return Err(FftError::LengthMismatch {
            re: re.len(),
            im: im.len(),
        });
    }
    if re.len() > 1 && !re.len().is_power_of_two() {
        return Err(FftError::NotPowerOfTwo(re.len()));
    }
    fft(re, im);
    Ok(())
}

fn bit_reverse_permute(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;

        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Naive O(N²) DFT with the same sign convention.
    fn dft(re: &[f64], im: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = re.len();
        let mut out_re = vec![0.0; n];
        let mut out_im = vec![0.0; n];
        for k in 0..n {
            for t in 0..n {
                let (s, c) = libm::sincos(-2.0 * PI * (k * t) as f64 / n as f64);
                out_re[k] += re[t] * c - im[t] * s;
                out_im[k] += re[t] * s + im[t] * c;
            }
        }
        (out_re, out_im)
    }

    #[test]
    fn test_matches_naive_dft() {
        for &n in &[2usize, 4, 8, 16, 64] {
            let re: Vec<f64> = (0..n).map(|i| libm::sin(i as f64 * 0.37) + 0.1).collect();
            let im: Vec<f64> = (0..n).map(|i| libm::cos(i as f64 * 1.3) * 0.5).collect();
            let (want_re, want_im) = dft(&re, &im);

            let mut got_re = re.clone();
            let mut got_im = im.clone();
            fft(&mut got_re, &mut got_im);

            for k in 0..n {
                assert!(
                    (got_re[k] - want_re[k]).abs() < 1e-9,
                    "n={n} bin {k}: re {} vs {}",
                    got_re[k],
                    want_re[k]
                );
                assert!(
                    (got_im[k] - want_im[k]).abs() < 1e-9,
                    "n={n} bin {k}: im {} vs {}",
                    got_im[k],
                    want_im[k]
                );
            }
        }
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut re = vec![0.0; 32];
        let mut im = vec![0.0; 32];
        re[0] = 1.0;
        fft(&mut re, &mut im);
        for k in 0..32 {
            assert!((re[k] - 1.0).abs() < 1e-12);
            assert!(im[k].abs() < 1e-12);
        }
    }

    #[test]
    fn test_odd_real_spectrum_gives_imaginary_sine() {
        // re[1] = -1, re[N-1] = 1  ->  im[n] = 2·sin(2πn/N)
        let n = 64;
        let mut re = vec![0.0; n];
        let mut im = vec![0.0; n];
        re[1] = -1.0;
        re[n - 1] = 1.0;
        fft(&mut re, &mut im);

        for t in 0..n {
            let expected = 2.0 * libm::sin(2.0 * PI * t as f64 / n as f64);
            assert!(re[t].abs() < 1e-12, "real part should vanish at {t}");
            assert!((im[t] - expected).abs() < 1e-12, "im[{t}] = {}", im[t]);
        }
    }

    #[test]
    fn test_trivial_lengths_are_identity() {
        let mut re: Vec<f64> = vec![];
        let mut im: Vec<f64> = vec![];
        fft(&mut re, &mut im);

        let mut re = vec![3.0];
        let mut im = vec![-2.0];
        fft(&mut re, &mut im);
        assert_eq!((re[0], im[0]), (3.0, -2.0));
    }

    #[test]
    fn test_try_fft_rejects_bad_lengths() {
        let mut re = vec![0.0; 12];
        let mut im = vec![0.0; 12];
        assert_eq!(try_fft(&mut re, &mut im), Err(FftError::NotPowerOfTwo(12)));

        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 4];
        assert_eq!(
            try_fft(&mut re, &mut im),
            Err(FftError::LengthMismatch { re: 8, im: 4 })
        );

        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 8];
        assert!(try_fft(&mut re, &mut im).is_ok());
    }
}
