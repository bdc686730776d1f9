//! Property-based tests for wavestack-core table construction and playback.
//!
//! Covers peak normalization, the wrap sample, table ordering and bounded
//! oscillator output across randomized base frequencies and sample rates.

use std::sync::Arc;

use proptest::prelude::*;
use wavestack_core::{PEAK_LEVEL, PolyOscillator, WaveTableSet, Waveshape};

fn any_shape() -> impl Strategy<Value = Waveshape> {
    (0usize..Waveshape::COUNT).prop_map(|i| Waveshape::ALL[i])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every table of every set peaks at the normalization level and ends
    /// with a copy of its first sample.
    #[test]
    fn tables_normalized_and_wrapped(
        shape in any_shape(),
        base in 20.0f64..400.0,
        sample_rate in prop::sample::select(vec![22050.0f64, 44100.0, 48000.0, 96000.0]),
    ) {
        let set = WaveTableSet::build(shape, base, sample_rate).unwrap();
        prop_assert!(!set.is_empty());

        for (i, table) in set.tables().iter().enumerate() {
            let samples = table.samples();
            prop_assert_eq!(samples.len(), table.len() + 1);
            prop_assert_eq!(samples[table.len()], samples[0], "table {} lacks wrap sample", i);
            let peak = table.peak();
            prop_assert!(
                (peak - PEAK_LEVEL).abs() < 1e-5,
                "{} table {} (base={}, sr={}) peaks at {}",
                shape, i, base, sample_rate, peak
            );
        }
    }

    /// Tables are ordered by strictly increasing top frequency, and the
    /// first one covers twice the base frequency.
    #[test]
    fn top_frequencies_increase(
        shape in any_shape(),
        base in 10.0f64..1000.0,
    ) {
        let sr = 44100.0;
        let set = WaveTableSet::build(shape, base, sr).unwrap();
        let first = set.tables()[0].top_frequency();
        prop_assert!((first - 2.0 * base / sr).abs() < 1e-12);
        for pair in set.tables().windows(2) {
            prop_assert!(pair[1].top_frequency() > pair[0].top_frequency());
        }
    }

    /// Table selection is monotonic in the increment.
    #[test]
    fn select_is_monotonic(a in 0.0f64..0.5, b in 0.0f64..0.5) {
        let set = WaveTableSet::build(Waveshape::Sawtooth, 20.0, 44100.0).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(set.select(lo) <= set.select(hi));
        prop_assert!(set.select(hi) < set.len());
    }

    /// A single slot never exceeds the table peak, and N slots never exceed N times it.
    #[test]
    fn oscillator_output_bounded(
        shape in any_shape(),
        freqs in prop::collection::vec(20.0f64..15000.0, 1..=8),
    ) {
        let set = Arc::new(WaveTableSet::build(shape, 20.0, 44100.0).unwrap());
        let mut osc: PolyOscillator<8> = PolyOscillator::new(44100.0);
        osc.set_tables(set);
        for (slot, &freq) in freqs.iter().enumerate() {
            osc.set_frequency(slot, freq);
        }

        let bound = PEAK_LEVEL * freqs.len() as f32 + 1e-4;
        for _ in 0..2048 {
            let out = osc.process();
            prop_assert!(out.is_finite());
            prop_assert!(out.abs() <= bound, "output {} exceeds {}", out, bound);
        }
    }

    /// Interpolated lookup never leaves the envelope of the two neighbouring samples.
    #[test]
    fn lookup_between_neighbours(shape in any_shape(), phase in 0.0f64..1.0) {
        let set = WaveTableSet::build(shape, 20.0, 44100.0).unwrap();
        let table = &set.tables()[0];
        let position = phase * table.len() as f64;
        let index = (position as usize).min(table.len() - 1);
        let s0 = table.samples()[index];
        let s1 = table.samples()[index + 1];
        let value = table.lookup(phase);
        prop_assert!(value >= s0.min(s1) - 1e-6 && value <= s0.max(s1) + 1e-6);
    }
}
