//! binproxy CLI entry point.

mod cli;
mod run;

use cli::Commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = cli::parse();
    init_tracing(args.verbose);
    match args.command {
        Commands::Gen { graph, out, binaries } => run::generate(graph, out, binaries).await,
        Commands::Metadata { graph, out } => run::metadata(graph, out).await,
    }
}

/// Logs go to stderr; stdout stays clean for tooling that wraps the CLI.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
