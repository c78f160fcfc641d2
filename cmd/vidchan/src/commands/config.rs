//! Configuration management commands.

use anyhow::Context;
use clap::{Args, Subcommand};
use vidchan_pipeline::{save_config, Config};

use super::{get_config, print_success};
use crate::Cli;

/// Manage configuration.
///
/// Configuration is stored in ~/.vidchan/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Write a config file with every default spelled out
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// View the effective configuration
    View,
    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Init { force } => {
                let path = match &cli.config {
                    Some(p) => p.clone(),
                    None => Config::default_config_path()
                        .context("cannot determine home directory")?,
                };
                if path.exists() && !force {
                    anyhow::bail!("{} already exists, use --force to overwrite", path.display());
                }
                save_config(&Config::default(), &path)?;
                print_success(&format!("wrote {}", path.display()));
            }
            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                print!("{}", serde_yaml::to_string(&cfg)?);
            }
            ConfigSubcommand::Path => {
                let path = cli.config.clone().or_else(Config::default_config_path);
                match path {
                    Some(p) => println!("{}", p.display()),
                    None => anyhow::bail!("cannot determine home directory"),
                }
            }
        }
        Ok(())
    }
}
