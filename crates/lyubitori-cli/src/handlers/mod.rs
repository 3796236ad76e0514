//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<(), CliError>`
//! - Thin wrappers that call into the browser adapter or the download
//!   service and format the outcome for the terminal.

pub mod download;
pub mod login;
pub mod logout;
pub mod serve;
pub mod status;
