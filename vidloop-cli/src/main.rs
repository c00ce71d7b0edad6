//! Vidloop CLI - fetch a video URL and play it on loop
//!
//! The terminal stands in for the screen: loading and errors are printed,
//! playback runs in an external player, and host signals are typed on stdin.

mod commands;
#[cfg(unix)]
mod mpv;

use std::path::PathBuf;

use clap::Parser;
use vidloop_core::VidloopConfig;
use vidloop_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "vidloop")]
#[command(about = "Fetch a video URL and play it on loop")]
struct Cli {
    #[command(subcommand)]
    command: Option<commands::Commands>,

    /// Base URL serving video_url.json
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Player executable (mpv-compatible IPC)
    #[arg(long, global = true)]
    player: Option<String>,

    /// Do not probe connectivity before fetching
    #[arg(long, global = true)]
    skip_probe: bool,

    /// Console log level
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Directory for the full trace log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
}

impl Cli {
    /// Environment first, then flags on top.
    fn config(&self) -> VidloopConfig {
        let mut config = VidloopConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config.network.base_url = base_url.clone();
        }
        if let Some(player) = &self.player {
            config.player.command = player.clone();
        }
        if self.skip_probe {
            config.network.skip_probe = true;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    let config = cli.config();
    config.validate()?;

    let command = cli.command.clone().unwrap_or_default();
    commands::handle_command(command, config).await?;

    Ok(())
}
