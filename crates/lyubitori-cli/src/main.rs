//! CLI entry point.
//!
//! Configuration is wired once via bootstrap; every command then runs
//! against the composed `CliContext`.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lyubitori_cli::{Cli, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = bootstrap(&cli)?;

    match cli.command {
        Commands::Login { no_save_session } => handlers::login::execute(&ctx, !no_save_session).await,
        Commands::Download { max_scroll, no_login } => {
            handlers::download::execute(&ctx, max_scroll, no_login).await
        }
        Commands::Status => handlers::status::execute(&ctx).await,
        Commands::Logout { confirm } => handlers::logout::execute(&ctx, confirm).await,
        Commands::Serve { host, port } => handlers::serve::execute(&ctx, host, port).await,
    }
}
