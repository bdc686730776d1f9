//! Band-limited wavetables.
//!
//! A [`WaveTableSet`] holds one table per octave. The lowest table carries
//! enough harmonics for the configured base frequency; each following table
//! has half the harmonics and is valid up to twice the frequency. An
//! oscillator picks the first table whose `top_frequency` lies above its
//! phase increment, so its highest harmonic stays below Nyquist.
//!
//! ## Construction
//!
//! ```text
//! harmonics   = round(sample_rate / (3 · base_frequency))
//! length      = next_pow2(harmonics) · 2 · OVERSAMPLING
//! top_freq[0] = 2 · base_frequency / sample_rate
//! ```
//!
//! then for every octave: spectrum, FFT, normalize to [`PEAK_LEVEL`],
//! halve `harmonics`, double `top_freq`, until no harmonic is left.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::fft::fft;
use crate::spectrum::{Waveshape, fill_spectrum};

/// Oversampling factor applied to every table length.
pub const OVERSAMPLING: usize = 2;

/// Peak absolute sample value of a normalized table.
pub const PEAK_LEVEL: f32 = 0.999;

/// Upper bound on the number of tables in a set.
pub const MAX_TABLES: usize = 40;

/// Upper bound on the length of a single table.
pub const MAX_TABLE_LENGTH: usize = 1 << 17;

/// Reasons a table set cannot be built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// Sample rate is not a positive, finite number.
    InvalidSampleRate(f64),
    /// Base frequency is not a positive, finite number.
    InvalidBaseFrequency(f64),
    /// Base frequency leaves no harmonic below a third of the sample rate.
    NoHarmonics {
        /// Requested base frequency in Hz.
        base_frequency: f64,
        /// Sample rate in Hz.
        sample_rate: f64,
    },
    /// Base frequency is so low that the lowest table would exceed [`MAX_TABLE_LENGTH`].
    TableTooLong(usize),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::InvalidSampleRate(sr) => write!(f, "invalid sample rate: {sr}"),
            TableError::InvalidBaseFrequency(freq) => {
                write!(f, "invalid base frequency: {freq}")
            }
            TableError::NoHarmonics {
                base_frequency,
                sample_rate,
            } => write!(
                f,
                "base frequency {base_frequency} Hz leaves no harmonics at {sample_rate} Hz"
            ),
            TableError::TableTooLong(len) => write!(
                f,
                "lowest table would need {len} samples (limit {MAX_TABLE_LENGTH})"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

/// One period of a band-limited waveform.
///
/// `samples` holds `len() + 1` values; the last duplicates the first so
/// interpolation never wraps an index.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTable {
    top_frequency: f64,
    samples: Vec<f32>,
}

impl WaveTable {
    /// Build a table from one period, scaling it so the peak is [`PEAK_LEVEL`].
    ///
    /// An all-zero period stays zero. An empty period gives a single
    /// silent sample. Otherwise `period.len()` must be a power of two.
    pub fn normalized(period: &[f64], top_frequency: f64) -> Self {
        if period.is_empty() {
            return Self {
                top_frequency,
                samples: vec![0.0; 2],
            };
        }
        debug_assert!(period.len().is_power_of_two());

        let peak = period.iter().fold(0.0_f64, |max, &x| max.max(x.abs()));
        let scale = if peak > 0.0 {
            f64::from(PEAK_LEVEL) / peak
        } else {
            0.0
        };

        let mut samples = Vec::with_capacity(period.len() + 1);
        samples.extend(period.iter().map(|&x| (x * scale) as f32));
        samples.push(samples[0]);

        Self {
            top_frequency,
            samples,
        }
    }

    /// Highest normalized frequency (cycles per sample) this table is meant for.
    pub fn top_frequency(&self) -> f64 {
        self.top_frequency
    }

    /// Number of samples in one period (excluding the wrap sample).
    pub fn len(&self) -> usize {
        self.samples.len() - 1
    }

    /// Always false: a table holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All samples including the trailing wrap sample.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |max, &x| max.max(x.abs()))
    }

    /// Linearly interpolated value at `phase` in [0.0, 1.0).
    #[inline]
    pub fn lookup(&self, phase: f64) -> f32 {
        let len = self.len();
        let position = phase * len as f64;
        // Clamping keeps rounding at phase ≈ 1.0 on the wrap sample.
        let index = (position as usize).min(len - 1);
        let frac = (position - index as f64) as f32;

        let s0 = self.samples[index];
        let s1 = self.samples[index + 1];
        s0 + (s1 - s0) * frac
    }
}

/// Octave-spaced tables for one waveshape, sorted by rising `top_frequency`.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTableSet {
    shape: Waveshape,
    tables: Vec<WaveTable>,
}

impl WaveTableSet {
    /// Build the full set for `shape`.
    ///
    /// `base_frequency` is the lowest pitch (Hz) the first table must cover
    /// without losing harmonics. Not real-time safe: allocates and runs one
    /// FFT per octave.
    pub fn build(
        shape: Waveshape,
        base_frequency: f64,
        sample_rate: f64,
    ) -> Result<Self, TableError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(TableError::InvalidSampleRate(sample_rate));
        }
        if !(base_frequency.is_finite() && base_frequency > 0.0) {
            return Err(TableError::InvalidBaseFrequency(base_frequency));
        }

        let mut harmonics = (sample_rate / (3.0 * base_frequency) + 0.5) as usize;
        if harmonics == 0 {
            return Err(TableError::NoHarmonics {
                base_frequency,
                sample_rate,
            });
        }

        let length = harmonics
            .checked_next_power_of_two()
            .and_then(|p| p.checked_mul(2 * OVERSAMPLING))
            .unwrap_or(usize::MAX);
        if length > MAX_TABLE_LENGTH {
            return Err(TableError::TableTooLong(length));
        }

        let mut re = vec![0.0; length];
        let mut im = vec![0.0; length];
        let mut top_frequency = base_frequency * 2.0 / sample_rate;
        let mut tables = Vec::new();

        while harmonics >= 1 && tables.len() < MAX_TABLES {
            fill_spectrum(shape, harmonics, &mut re, &mut im);
            fft(&mut re, &mut im);
            tables.push(WaveTable::normalized(&im, top_frequency));

            harmonics >>= 1;
            top_frequency *= 2.0;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            shape = shape.name(),
            tables = tables.len(),
            length,
            base_frequency,
            sample_rate,
            "built wavetable set"
        );

        Ok(Self { shape, tables })
    }

    /// Waveshape these tables were built for.
    pub fn shape(&self) -> Waveshape {
        self.shape
    }

    /// All tables, lowest octave first.
    pub fn tables(&self) -> &[WaveTable] {
        &self.tables
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True if the set holds no table.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table at `index`, clamped to the last table.
    #[inline]
    pub fn table(&self, index: usize) -> &WaveTable {
        &self.tables[index.min(self.tables.len() - 1)]
    }

    /// Index of the table to play at normalized frequency `increment`.
    ///
    /// Lowest index whose `top_frequency` exceeds `increment`; frequencies
    /// at or above the last bound clamp to the last table.
    #[inline]
    pub fn select(&self, increment: f64) -> usize {
        let last = self.tables.len().saturating_sub(1);
        let mut index = 0;
        while index < last && increment >= self.tables[index].top_frequency {
            index += 1;
        }
        index
    }
}

/// A [`WaveTableSet`] for every [`Waveshape`], built for one sample rate.
///
/// Sets are reference counted so every oscillator of a stack can share one.
#[derive(Debug, Clone)]
pub struct TableBank {
    sets: [Arc<WaveTableSet>; Waveshape::COUNT],
    base_frequency: f64,
    sample_rate: f64,
}

impl TableBank {
    /// Build the tables of all waveshapes.
    pub fn build(base_frequency: f64, sample_rate: f64) -> Result<Self, TableError> {
        let sine = WaveTableSet::build(Waveshape::Sine, base_frequency, sample_rate)?;
        let triangle = WaveTableSet::build(Waveshape::Triangle, base_frequency, sample_rate)?;
        let sawtooth = WaveTableSet::build(Waveshape::Sawtooth, base_frequency, sample_rate)?;
        let square = WaveTableSet::build(Waveshape::Square, base_frequency, sample_rate)?;

        Ok(Self {
            sets: [
                Arc::new(sine),
                Arc::new(triangle),
                Arc::new(sawtooth),
                Arc::new(square),
            ],
            base_frequency,
            sample_rate,
        })
    }

    /// Shared tables for `shape`.
    pub fn get(&self, shape: Waveshape) -> &Arc<WaveTableSet> {
        &self.sets[shape.index()]
    }

    /// Base frequency the bank was built for, in Hz.
    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    /// Sample rate the bank was built for, in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
