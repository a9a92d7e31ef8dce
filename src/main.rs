mod browser;
mod cli;
mod config;
mod credentials;
mod drivers;
mod github;
mod priority;
mod report;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(cli::run());
}
