//! vidchan - cluster a video collection into semantic channels.
//!
//! Videos are expected under `<channels_dir>/<group>/<file>`. `encode`
//! embeds every video not yet in the cache; `cluster` groups the cached
//! collection and writes the reports.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod discover;

use commands::{ClusterCommand, ConfigCommand, EncodeCommand};

/// vidchan - cluster a video collection into semantic channels.
///
/// Configuration is read from ~/.vidchan/config.yaml when present.
#[derive(Parser)]
#[command(name = "vidchan")]
#[command(about = "Video collection clustering tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.vidchan/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config(ConfigCommand),
    /// Embed every video not yet cached
    Encode(EncodeCommand),
    /// Cluster the cached collection and write reports
    Cluster(ClusterCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli),
        Commands::Encode(cmd) => cmd.run(&cli),
        Commands::Cluster(cmd) => cmd.run(&cli),
    }
}
