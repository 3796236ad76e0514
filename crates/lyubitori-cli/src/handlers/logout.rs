//! Logout command handler.

use lyubitori_core::ScrapeSession;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::utils::input;

/// Clear browser cookies and the saved session.
///
/// When the browser cannot be driven the local session file is still
/// removed.
pub async fn execute(ctx: &CliContext, confirm: bool) -> Result<(), CliError> {
    if !confirm && !input::prompt_confirmation("Are you sure you want to logout and clear saved session?")? {
        println!("Logout cancelled");
        return Ok(());
    }

    let outcome = match ctx.connect().await {
        Ok(session) => {
            let debug = session.diagnostics(ctx.config().debug_mode);
            let result = session.authenticator(debug.as_ref()).logout().await;
            session.quit().await;
            result.map_err(CliError::from)
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => println!("Logged out successfully"),
        Err(e) => {
            println!("Error during logout: {e}");
            ctx.session_store().clear().await?;
            println!("Local session data cleared");
        }
    }
    Ok(())
}
