//! Wavetable inspection.

use anyhow::{Context, bail};
use clap::Args;
use std::path::PathBuf;
use wavestack_core::{WaveTableSet, Waveshape};
use wavestack_synth::DEFAULT_BASE_FREQUENCY;

use super::CliWaveshape;
use crate::wav::{OutputFormat, WavSpec, write_wav};

/// List the octave tables built for each waveshape.
#[derive(Args)]
pub struct TablesArgs {
    /// Only this waveshape
    #[arg(long, value_enum)]
    waveshape: Option<CliWaveshape>,

    /// Lowest pitch that keeps every harmonic, in Hz
    #[arg(long, default_value_t = DEFAULT_BASE_FREQUENCY)]
    base_frequency: f64,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Write one period of a table to this WAV file (needs --waveshape)
    #[arg(long, value_name = "OUTPUT", requires = "waveshape")]
    export: Option<PathBuf>,

    /// Index of the table to export
    #[arg(long, default_value = "0")]
    table: usize,
}

pub fn run(args: TablesArgs) -> anyhow::Result<()> {
    let sr = f64::from(args.sample_rate);
    let shapes: Vec<Waveshape> = match args.waveshape {
        Some(shape) => vec![shape.into()],
        None => Waveshape::ALL.to_vec(),
    };

    for shape in shapes {
        let set = WaveTableSet::build(shape, args.base_frequency, sr)
            .with_context(|| format!("cannot build {shape} tables"))?;

        println!(
            "{shape}: {} tables (base {} Hz, {} Hz)",
            set.len(),
            args.base_frequency,
            args.sample_rate
        );
        println!("  {:>3}  {:>7}  {:>10}  {:>6}", "#", "samples", "below Hz", "peak");
        for (i, table) in set.tables().iter().enumerate() {
            println!(
                "  {:>3}  {:>7}  {:>10.1}  {:>6.3}",
                i,
                table.len(),
                table.top_frequency() * sr,
                table.peak()
            );
        }

        if let Some(path) = &args.export {
            if args.table >= set.len() {
                bail!(
                    "table {} does not exist; {shape} has {} tables",
                    args.table,
                    set.len()
                );
            }
            let table = set.table(args.table);
            let period = &table.samples()[..table.len()];
            let spec = WavSpec {
                channels: 1,
                sample_rate: args.sample_rate,
                format: OutputFormat::Float,
            };
            write_wav(path, period, spec)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote table {} ({} samples) to {}",
                args.table,
                period.len(),
                path.display()
            );
        }
    }

    Ok(())
}
