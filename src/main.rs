// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "verify-capture")]
#[command(about = "Photo capture step of the identity-verification wizard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture flow against the virtual camera and submit the photo
    Capture {
        /// Output directory (default: ~/Pictures/verify-capture)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of retakes before submitting
        #[arg(short, long, default_value = "0")]
        retakes: u32,
    },

    /// Demonstrate the permission-denied path until retries are exhausted
    Denied,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=verify_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Capture { output, retakes }) => cli::run_capture(output, retakes),
        Some(Commands::Denied) => cli::run_denied_demo(),
        None => cli::run_capture(None, 0),
    }
}
