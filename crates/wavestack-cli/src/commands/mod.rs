//! CLI command implementations.

pub mod config;
pub mod render;
pub mod tables;

use clap::ValueEnum;
use wavestack_config::WaveshapeName;
use wavestack_core::Waveshape;

/// Waveshapes accepted on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliWaveshape {
    #[default]
    Sine,
    #[value(alias = "tri")]
    Triangle,
    #[value(alias = "saw")]
    Sawtooth,
    Square,
}

impl From<CliWaveshape> for Waveshape {
    fn from(w: CliWaveshape) -> Self {
        match w {
            CliWaveshape::Sine => Waveshape::Sine,
            CliWaveshape::Triangle => Waveshape::Triangle,
            CliWaveshape::Sawtooth => Waveshape::Sawtooth,
            CliWaveshape::Square => Waveshape::Square,
        }
    }
}

impl From<CliWaveshape> for WaveshapeName {
    fn from(w: CliWaveshape) -> Self {
        Waveshape::from(w).into()
    }
}
