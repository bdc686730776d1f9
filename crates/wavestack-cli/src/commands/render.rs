//! Offline rendering of held notes.

use anyhow::{Context, bail};
use clap::Args;
use std::path::PathBuf;
use wavestack_config::SynthConfig;
use wavestack_core::midi_to_freq;
use wavestack_synth::{MAX_KEY, POLYPHONY, Synth, SynthController, SynthRenderer};

use super::CliWaveshape;
use crate::wav::{OutputFormat, WavSpec, write_wav};

/// Longest run of frames rendered between control updates, like one audio callback.
const BLOCK_FRAMES: usize = 256;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long, default_value = "57")]
    notes: String,

    /// Engine configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Waveshape for every stack
    #[arg(long, value_enum)]
    waveshape: Option<CliWaveshape>,

    /// Unison voices for every stack (1-8)
    #[arg(long)]
    voices: Option<usize>,

    /// Unison detune for every stack (0-100)
    #[arg(long)]
    detune: Option<f32>,

    /// Sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Master amplitude (0-0.1)
    #[arg(long)]
    master_amplitude: Option<f32>,

    /// Seconds the notes are held
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Seconds of output after the notes are released
    #[arg(long, default_value = "0.0")]
    tail: f32,

    /// Seconds between successive note-ons
    #[arg(long, default_value = "0.0")]
    stagger: f32,

    /// Interleaved output channels
    #[arg(long, default_value = "1")]
    channels: u16,

    /// Sample encoding
    #[arg(long, value_enum, default_value = "float")]
    format: OutputFormat,

    /// Gain applied after the engine output
    #[arg(long, default_value = "1.0")]
    gain: f32,

    /// Start every oscillator at phase zero instead of a random phase
    #[arg(long)]
    reset_phases: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let keys = parse_notes(&args.notes)?;
    if !(args.duration > 0.0) {
        bail!("--duration must be positive");
    }
    if !(args.tail >= 0.0) || !(args.stagger >= 0.0) {
        bail!("--tail and --stagger must not be negative");
    }
    if args.channels == 0 {
        bail!("--channels must be at least 1");
    }

    let mut config = match &args.config {
        Some(path) => SynthConfig::load(path)?,
        None => SynthConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let mut synth: Synth<POLYPHONY> = config
        .build_synth()
        .context("cannot build the engine from this configuration")?;
    if args.reset_phases {
        synth.reset_phases();
    }

    let sample_rate = config.sample_rate;
    let sr = f64::from(sample_rate);
    let release_frame = seconds_to_frames(args.duration, sr);
    let total_frames = release_frame + seconds_to_frames(args.tail, sr);

    let schedule: Vec<(usize, u8)> = keys
        .iter()
        .enumerate()
        .map(|(i, &key)| (seconds_to_frames(args.stagger * i as f32, sr), key))
        .collect();
    let late = schedule.iter().filter(|&&(start, _)| start >= release_frame).count();
    if late > 0 {
        tracing::warn!(late, "notes start after the release and will not sound");
    }

    println!("Rendering {} note(s)...", keys.len());
    println!(
        "  Notes: {}",
        keys.iter()
            .map(|&k| format!("{k} ({:.1} Hz)", midi_to_freq(k)))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  {:.2}s held + {:.2}s tail at {} Hz, {} stack(s)",
        args.duration,
        args.tail,
        sample_rate,
        config.stacks.len()
    );

    let channels = usize::from(args.channels);
    let mut samples = vec![0.0f32; total_frames * channels];
    let (controller, mut renderer) = synth.split();

    play(
        &controller,
        &mut renderer,
        &mut samples,
        channels,
        &schedule,
        release_frame,
    );

    let dropped = controller.params().dropped_notes();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            polyphony = POLYPHONY,
            "more notes than slots; the extra notes were dropped"
        );
    }

    if args.gain != 1.0 {
        for sample in &mut samples {
            *sample *= args.gain;
        }
    }

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        tracing::warn!(peak, "output exceeds full scale and will clip");
    }

    let spec = WavSpec {
        channels: args.channels,
        sample_rate,
        format: args.format,
    };
    write_wav(&args.output, &samples, spec)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("  Peak: {:.4} ({:.1} dBFS)", peak, 20.0 * peak.max(1e-9).log10());
    println!("Wrote {} frames to {}", total_frames, args.output.display());
    Ok(())
}

/// Render into `samples` while playing `schedule`, releasing every key at
/// `release_frame`.
///
/// Blocks are cut short at each note-on and at the release, so every event
/// takes effect on its own frame.
fn play(
    controller: &SynthController,
    renderer: &mut SynthRenderer<POLYPHONY>,
    samples: &mut [f32],
    channels: usize,
    schedule: &[(usize, u8)],
    release_frame: usize,
) {
    let total_frames = samples.len() / channels;
    let mut next = 0;
    let mut released = false;
    let mut frame = 0;

    while frame < total_frames {
        while let Some(&(start, key)) = schedule.get(next)
            && start <= frame
        {
            if start < release_frame {
                controller.note_on(key);
            }
            next += 1;
        }
        if !released && frame >= release_frame {
            for &(_, key) in schedule {
                controller.note_off(key);
            }
            released = true;
        }

        let mut end = (frame + BLOCK_FRAMES).min(total_frames);
        if let Some(&(start, _)) = schedule.get(next) {
            end = end.min(start);
        }
        if !released {
            end = end.min(release_frame);
        }

        renderer.render_interleaved(&mut samples[frame * channels..end * channels], channels);
        frame = end;
    }
}

fn apply_overrides(config: &mut SynthConfig, args: &RenderArgs) {
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(amplitude) = args.master_amplitude {
        config.master_amplitude = amplitude;
    }
    for stack in &mut config.stacks {
        if let Some(shape) = args.waveshape {
            stack.waveshape = shape.into();
        }
        if let Some(voices) = args.voices {
            stack.voices = voices;
        }
        if let Some(detune) = args.detune {
            stack.detune = detune;
        }
    }
}

fn seconds_to_frames(seconds: f32, sample_rate: f64) -> usize {
    (f64::from(seconds) * sample_rate).round() as usize
}

/// Parse a comma-separated list of MIDI keys.
fn parse_notes(notes: &str) -> anyhow::Result<Vec<u8>> {
    let mut keys = Vec::new();
    for token in notes.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let key: u8 = token
            .parse()
            .with_context(|| format!("'{token}' is not a MIDI note number"))?;
        if key > MAX_KEY {
            bail!("MIDI note {key} is above {MAX_KEY}");
        }
        keys.push(key);
    }

    if keys.is_empty() {
        bail!("No valid MIDI notes provided. Use format: --notes \"60,64,67\"");
    }
    Ok(keys)
}
