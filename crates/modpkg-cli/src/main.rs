//! CLI entry point - the composition root.
//!
//! Wires logging, configuration and adapters, then dispatches to handlers.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modpkg_cli::bootstrap::default_log_filter;
use modpkg_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = bootstrap(CliConfig::from_cli(&cli))?;

    match cli.command {
        Commands::Modules { experimental } => handlers::modules::execute(&ctx, experimental),
        Commands::Versions { module, dev } => handlers::versions::execute(&ctx, &module, dev).await,
        Commands::Fetch {
            module,
            version,
            archive,
        } => handlers::fetch::execute(&ctx, &module, &version, archive).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads `env` defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Cancelled) => {
            eprintln!("canceled");
            ExitCode::from(CliError::Cancelled.exit_code())
        }
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
