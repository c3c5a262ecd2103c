//! CLI entry point.
//!
//! Parses arguments, installs logging and dispatches to handlers. Adapter
//! wiring lives in `bootstrap`.

use std::process::ExitCode;

use clap::Parser;

use ariafetch_cli::{Cli, Commands, exit_code_for, handlers, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads ARIAFETCH_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Get(args) => return handlers::get::execute(&args).await,
        Commands::InstallAria2 { force } => handlers::install::execute(force).await?,
        Commands::Check { aria2_path } => handlers::check::execute(aria2_path).await?,
        Commands::Paths => handlers::paths::execute()?,
    }
    Ok(ExitCode::SUCCESS)
}
