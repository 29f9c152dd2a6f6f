mod cli;
mod commands;
mod config;
mod error;
mod host;
mod manifest;
mod project;
mod utils;
mod watch;

use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    cli::run();
}

/// Diagnostics go to stderr so stdout carries only user-facing messages.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CMKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
