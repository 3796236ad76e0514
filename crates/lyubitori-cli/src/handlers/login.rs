//! Login command handler.

use lyubitori_core::{DiagnosticsSink, ScrapeSession};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Restore the saved session or log in with configured credentials.
///
/// Credentials are required even when a saved session would be restored,
/// so a broken session can always fall back to a fresh login.
pub async fn execute(ctx: &CliContext, save_session: bool) -> Result<(), CliError> {
    let missing = ctx.config().validate();
    if !missing.is_empty() {
        return Err(CliError::Config(format!(
            "Missing required environment variables: {}. Set them in your .env file or environment",
            missing.join(", ")
        )));
    }

    let session = ctx.connect().await?;
    println!("Attempting login...");

    let debug = session.diagnostics(ctx.config().debug_mode);
    let result = session.authenticator(debug.as_ref()).login(save_session).await;
    debug.write_summary().await;
    session.quit().await;

    if !result? {
        return Err(CliError::Auth("Login failed".to_string()));
    }
    println!("Login successful");
    if save_session {
        println!("Session saved to {}", ctx.session_store().path().display());
    }
    Ok(())
}
