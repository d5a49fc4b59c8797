mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

const LOG_ENV: &str = "CREDREPLACER_LOG";

fn main() {
    // stdout carries the rendered template, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli::render::run(cli.region.as_deref(), cli.strict, &cli.file, &cli.context) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
