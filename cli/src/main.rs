//! nanomon CLI binary
//!
//! Cron-invoked health check runner: every invocation probes the configured
//! services once, updates the durable health record, and prints notification
//! messages for services that crossed an outage or recovery edge.

#![allow(unused_crate_dependencies)]

use clap::{Parser, Subcommand};
use nanomon_core::config::load_config_from_toml_path;
use nanomon_core::notify::CommandMailer;
use nanomon_core::{runner, utils, MailTransport};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "nanomon")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the monitor configuration file
    #[arg(short, long, default_value = "nanomon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the recorded health of every service
    Status,
    /// Reinitialize the health record with every service up
    Reset,
}

#[tokio::main]
async fn main() {
    if let Err(e) = utils::init_tracing("warn") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let config = match load_config_from_toml_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Status) => {
            let report = runner::status(&config);
            println!("{}", report.text);
            std::process::exit(report.exit_code());
        }
        Some(Commands::Reset) => {
            if let Err(e) = runner::reset(&config) {
                error!("Reset failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            let mailer = config.notify.as_ref().map(CommandMailer::new);
            let transport = mailer.as_ref().map(|m| m as &dyn MailTransport);
            match runner::run(&config, transport).await {
                Ok(report) => {
                    // Messages carry their own trailing newline
                    for message in &report.messages {
                        print!("{}", message);
                    }
                }
                Err(e) => {
                    error!("Monitoring run failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
