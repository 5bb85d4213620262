//! Web server command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use spirit_core::config::SpiritConfig;
use spirit_core::session::Generators;
use spirit_web::AppState;
use std::path::PathBuf;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on [default: from config, 3000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to [default: from config, 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file used with --log
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config: &SpiritConfig) -> Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let generators = Generators::from_config(config).context("Cannot start without provider credentials")?;
    let state = AppState::from_config(config, generators);

    println!();
    println!(
        "  {} {}",
        "Spirit Card".magenta().bold(),
        "Web Server".bold()
    );
    println!();
    println!("  {}       http://{}:{}", "Quiz".green(), host, port);
    println!("  {}        http://{}:{}/api", "API".green(), host, port);
    println!("  {}     http://{}:{}/health", "Health".green(), host, port);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    spirit_web::run_server(state, &host, port).await
}
