#![doc = include_str!("../README.md")]

pub mod auth;
pub mod cookies;
pub mod debug;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod session;

pub use auth::{Authenticator, LoginLanding, classify_landing};
pub use debug::DebugCapture;
pub use driver::{ChromeConnector, chrome_capabilities, connect};
pub use error::{BrowserError, BrowserResult};
pub use session::BrowserSession;
