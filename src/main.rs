use clap::Parser;
use argoth::cli::{Cli, run};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "argoth=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}
