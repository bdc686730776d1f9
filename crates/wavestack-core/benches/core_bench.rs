//! Criterion benchmarks for wavestack-core components
//!
//! Run with: cargo bench -p wavestack-core

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use wavestack_core::{PolyOscillator, TableBank, WaveTableSet, Waveshape, fft};

const SAMPLE_RATE: f64 = 44100.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

// ============================================================================
// Table construction
// ============================================================================

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("FFT");

    for &n in &[1024usize, 4096, 16384] {
        let re: Vec<f64> = (0..n).map(|i| (i % 17) as f64).collect();
        let im = vec![0.0; n];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut r = re.clone();
                let mut i = im.clone();
                fft(&mut r, &mut i);
                black_box(r[1])
            })
        });
    }

    group.finish();
}

fn bench_table_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("TableBuild");
    group.sample_size(20);

    for shape in Waveshape::ALL {
        group.bench_function(shape.name(), |b| {
            b.iter(|| black_box(WaveTableSet::build(shape, 20.0, SAMPLE_RATE)))
        });
    }
    group.bench_function("bank", |b| {
        b.iter(|| black_box(TableBank::build(20.0, SAMPLE_RATE)))
    });

    group.finish();
}

// ============================================================================
// Playback
// ============================================================================

fn bench_poly_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("PolyOscillator");
    let saw = Arc::new(
        WaveTableSet::build(Waveshape::Sawtooth, 20.0, SAMPLE_RATE).expect("sawtooth tables"),
    );

    for active in [1usize, 4, 8] {
        for &block_size in BLOCK_SIZES {
            let mut osc: PolyOscillator<8> = PolyOscillator::new(SAMPLE_RATE);
            osc.set_tables(Arc::clone(&saw));
            for slot in 0..active {
                osc.set_frequency(slot, 110.0 * (slot + 1) as f64);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("{active}_slots"), block_size),
                &block_size,
                |b, &size| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for _ in 0..size {
                            sum += osc.process();
                        }
                        black_box(sum)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fft,
    bench_table_build,
    bench_poly_oscillator,
);

criterion_main!(benches);
