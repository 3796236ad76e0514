//! Serve command handler.

use lyubitori_axum::{ServerConfig, start_server};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Run the HTTP API until Ctrl-C. Flags override `API_HOST` and `API_PORT`.
pub async fn execute(ctx: &CliContext, host: Option<String>, port: Option<u16>) -> Result<(), CliError> {
    let defaults = ServerConfig::from_scraper(ctx.config());
    let server = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
    };

    println!("Starting Lyubitori API server on {}", server.addr());
    start_server(ctx.shared_config(), server).await?;
    println!("API server stopped");
    Ok(())
}
