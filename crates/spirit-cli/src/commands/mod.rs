//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spirit_core::config::SpiritConfig;
use std::path::PathBuf;

pub mod card;
pub mod quiz;
pub mod serve;

/// Baby Spirit Animal Trading Card Creator
#[derive(Parser)]
#[command(name = "spirit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./spirit.toml when present)
    #[arg(short, long, global = true, env = "SPIRIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve(serve::ServeArgs),

    /// Take the quiz in the terminal
    Quiz(quiz::QuizArgs),

    /// Generate a card from answers given as flags
    Card(card::CardArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = SpiritConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, &config).await,
            Commands::Quiz(args) => quiz::execute(args, &config).await,
            Commands::Card(args) => card::execute(args, &config).await,
        }
    }
}
