//! Status command handler.

use lyubitori_core::ScrapeSession;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let config = ctx.config();
    let store = ctx.session_store();

    println!("Lyubitori status");
    println!("{}", "=".repeat(30));

    let missing = config.validate();
    if missing.is_empty() {
        println!("Credentials configured");
    } else {
        println!("Missing credentials: {}", missing.join(", "));
    }

    if store.has_saved().await {
        let modified = store
            .modified_at()
            .await
            .map_or_else(|| "unknown".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        println!("Saved session: {} (modified: {modified})", store.path().display());
    } else {
        println!("No saved session found");
    }

    println!("Download directory: {}", config.save_path.display());
    println!("Session directory: {}", config.session_path.display());
    println!("Screenshot directory: {}", config.screenshot_path.display());
    if config.debug_mode {
        println!("Debug mode: ENABLED");
        println!("Debug directory: {}", config.debug_path.display());
    } else {
        println!("Debug mode: DISABLED");
    }

    // Starting a browser is the only way to know for sure
    println!("\nChecking live authentication status...");
    match ctx.connect().await {
        Ok(session) => {
            let debug = session.diagnostics(config.debug_mode);
            let logged_in = session.authenticator(debug.as_ref()).is_logged_in().await;
            session.quit().await;
            if logged_in {
                println!("Currently logged in");
            } else {
                println!("Not logged in");
            }
        }
        Err(e) => println!("Could not check login status: {e}"),
    }
    Ok(())
}
