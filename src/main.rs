use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tradejournal::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    // stdout carries command output, logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install logger: {e}");
    }

    run(Cli::parse())
}
