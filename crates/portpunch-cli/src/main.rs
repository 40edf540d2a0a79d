//! portpunch CLI
//!
//! Operator tooling for classification policies.
//!
//! # Usage
//!
//! ```bash
//! portpunch check config/port-punch.toml
//! portpunch classify --config config/port-punch.toml 000000000000000000000000080045...
//! portpunch classify --preset port-punch --port 2222 --format json <hex-frame>
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "portpunch")]
#[command(version)]
#[command(about = "Inspect and exercise portpunch packet policies", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a policy file and print its rule table
    Check {
        /// Policy file (.toml or .json)
        config: PathBuf,
    },
    /// Classify hex-encoded Ethernet frames
    Classify {
        /// Policy file (.toml or .json)
        #[arg(long, short, env = "PORTPUNCH_CONFIG", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Built-in policy when no file is given
        #[arg(long, value_enum, default_value = "port-punch")]
        preset: Preset,

        /// Port opened by the port-punch preset
        #[arg(long, default_value_t = portpunch_core::DEFAULT_PUNCH_PORT)]
        port: u16,

        /// Frames as hex; ':' and whitespace are ignored
        #[arg(required = true)]
        frames: Vec<String>,
    },
}

/// Built-in policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Pass every packet
    Pass,
    /// Allow one TCP port, drop other TCP
    PortPunch,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => commands::check(&config, cli.format),
        Commands::Classify {
            config,
            preset,
            port,
            frames,
        } => commands::classify(config.as_deref(), preset, port, &frames, cli.format),
    }
}
