//! WAV output.

use hound::{SampleFormat, WavWriter};
use std::path::Path;

/// Sample encoding written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// 32-bit IEEE float
    #[default]
    Float,
    /// 16-bit signed PCM
    Pcm16,
}

impl OutputFormat {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            OutputFormat::Float => 32,
            OutputFormat::Pcm16 => 16,
        }
    }
}

/// Output file layout.
#[derive(Debug, Clone, Copy)]
pub struct WavSpec {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample encoding.
    pub format: OutputFormat,
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.format.bits_per_sample(),
            sample_format: match spec.format {
                OutputFormat::Float => SampleFormat::Float,
                OutputFormat::Pcm16 => SampleFormat::Int,
            },
        }
    }
}

/// Write interleaved samples to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> hound::Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    match spec.format {
        OutputFormat::Float => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        OutputFormat::Pcm16 => {
            let max_val = f32::from(i16::MAX) + 1.0;
            for &sample in samples {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i16;
                writer.write_sample(int_sample)?;
            }
        }
    }

    writer.finalize()
}
