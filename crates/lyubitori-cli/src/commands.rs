//! Available subcommands.

use clap::Subcommand;
use lyubitori_download::DEFAULT_MAX_SCROLL;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and optionally save the session
    Login {
        /// Do not save session cookies for reuse
        #[arg(long = "no-save-session")]
        no_save_session: bool,
    },

    /// Download images from your likes
    Download {
        /// Maximum number of scroll iterations
        #[arg(short = 's', long = "max-scroll", default_value_t = DEFAULT_MAX_SCROLL)]
        max_scroll: u32,
        /// Skip the login attempt and use the existing browser session
        #[arg(long = "no-login")]
        no_login: bool,
    },

    /// Check authentication status and session info
    Status,

    /// Log out and clear the saved session
    Logout {
        /// Skip the confirmation prompt
        #[arg(long)]
        confirm: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind (defaults to API_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (defaults to API_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}
