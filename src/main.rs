mod cli;
mod config;
mod desk;
#[cfg(test)]
mod fixtures;
mod identity;
mod model;
mod pdf;
mod storage;
mod workflow;

use std::process;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::Config;
use storage::Storage;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let path = match identity::resolve_database(cli.db.clone(), &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let storage = match Storage::new(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open database at {}: {e}", path.display());
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Structured logs to stderr, filtered by `--log-level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
