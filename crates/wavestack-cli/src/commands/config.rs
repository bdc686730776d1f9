//! Engine configuration files.

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use wavestack_config::SynthConfig;
use wavestack_core::Waveshape;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the default configuration, or save it to a file
    Default {
        /// Destination TOML file (stdout when omitted)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Load a configuration and report every out-of-range value
    Check {
        /// TOML file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Default { output } => {
            let config = SynthConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    println!("Wrote default configuration to {}", path.display());
                }
                None => print!("{}", config.to_toml()?),
            }
        }

        ConfigCommand::Check { file } => {
            let config = SynthConfig::load(&file)?;
            config
                .validate()
                .with_context(|| format!("{} is not a valid configuration", file.display()))?;

            println!("{}: ok", file.display());
            println!("  Sample rate:      {} Hz", config.sample_rate);
            println!("  Base frequency:   {} Hz", config.base_frequency);
            println!("  Master amplitude: {}", config.master_amplitude);
            for (i, stack) in config.stacks.iter().enumerate() {
                println!(
                    "  Stack {}: {}, {} voice(s), detune {}, amplitude {}{}",
                    i + 1,
                    Waveshape::from(stack.waveshape),
                    stack.voices,
                    stack.detune,
                    stack.amplitude,
                    if stack.enabled { "" } else { " (disabled)" }
                );
            }
        }
    }

    Ok(())
}
