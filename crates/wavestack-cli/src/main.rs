//! Wavestack CLI - offline rendering and inspection for the wavestack synthesizer.

mod commands;
mod wav;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wavestack")]
#[command(author, version, about = "Wavestack polyphonic wavetable synthesizer", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render held notes to a WAV file
    Render(commands::render::RenderArgs),

    /// Inspect the band-limited wavetables
    Tables(commands::tables::TablesArgs),

    /// Write or check engine configuration files
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Tables(args) => commands::tables::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
