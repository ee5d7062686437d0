//! loopbench: a loopback TCP throughput benchmark.
//!
//! Runs one receiver/sender pair per payload size in a geometric series
//! (10^i bytes for trial i), streaming constant-fill bytes over 127.0.0.1
//! and reporting the achieved throughput for each size on stdout, one line
//! per successful trial:
//!
//! ```text
//! 1000 bytes: 12.34 MB/s
//! ```
//!
//! Diagnostics go to stderr so stdout stays machine-readable.

mod config;
mod orchestrator;
mod receiver;
mod sender;
mod sock;

use config::Config;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        port = config.port,
        trials = config.trials,
        socket_buffer = config.socket_buffer,
        settle_ms = config.settle.as_millis() as u64,
        "starting throughput benchmark"
    );

    match orchestrator::run(&config) {
        Ok(reports) => {
            info!(completed = reports.len(), "benchmark finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "benchmark aborted");
            ExitCode::FAILURE
        }
    }
}
