//! Login, session restore and logout against the live site.

use std::time::Duration;

use fantoccini::{Client, Locator};
use lyubitori_core::{DiagnosticsSink, FRONT_PAGE, ScrapeError, ScrapeResult, ScraperConfig, SessionStore};

use crate::cookies;
use crate::error::{BrowserError, BrowserResult};

const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const FRONT_PAGE_SETTLE: Duration = Duration::from_secs(3);
const FORM_STEP_PAUSE: Duration = Duration::from_secs(3);
const SUBMIT_PAUSE: Duration = Duration::from_secs(5);

/// Present only when logged in.
pub const LOGGED_IN_INDICATORS: [&str; 5] = [
    "//*[contains(text(), \"What's happening?\")]",
    "//div[@data-testid='SideNav_NewTweet_Button']",
    "//div[@data-testid='primaryColumn']",
    "//a[@href='/compose/tweet']",
    "//span[text()='Home']",
];

/// Present on the login page or the logged-out front page.
pub const LOGGED_OUT_INDICATORS: [&str; 4] = [
    "//*[text()='Phone, email, or username']",
    "//span[text()='Sign in']",
    "//a[contains(@href, '/login')]",
    "//input[@name='text']",
];

const SIGN_IN_BUTTON: &str = "//a[contains(@href, '/login') or contains(text(), 'Sign in')]";
const USERNAME_LABEL: &str = "//*[text()='Phone, email, or username']";
const PASSWORD_LABEL: &str = "//*[text()='Password']";
const CODE_LABEL: &str = "//*[text()='Enter code']";
const NEXT_BUTTON: &str = "//*[text()='Next']";
const LOGIN_BUTTON: &str = "//*[text()='Log in']";
const ADS_PROMPT: &str = "//*[text()='Keep less relevant ads']";

/// Where the browser landed after submitting credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginLanding {
    Success,
    StillOnLogin,
    Unclear,
}

/// Classify the current URL after a login attempt.
pub fn classify_landing(url: &str, username: &str) -> LoginLanding {
    let success = [
        "x.com/home".to_string(),
        "twitter.com/home".to_string(),
        format!("x.com/{username}"),
        format!("twitter.com/{username}"),
    ];
    let failure = [
        "x.com/i/flow/login",
        "twitter.com/i/flow/login",
        "x.com/login",
        "twitter.com/login",
    ];

    if failure.iter().any(|p| url.contains(p)) {
        LoginLanding::StillOnLogin
    } else if success.iter().any(|p| url.contains(p.as_str())) {
        LoginLanding::Success
    } else {
        LoginLanding::Unclear
    }
}

/// Drives the authentication flow for one browser session.
pub struct Authenticator<'a> {
    client: &'a Client,
    config: &'a ScraperConfig,
    store: &'a SessionStore,
    debug: &'a dyn DiagnosticsSink,
}

impl<'a> Authenticator<'a> {
    pub fn new(
        client: &'a Client,
        config: &'a ScraperConfig,
        store: &'a SessionStore,
        debug: &'a dyn DiagnosticsSink,
    ) -> Self {
        Self {
            client,
            config,
            store,
            debug,
        }
    }

    async fn exists(&self, xpath: &str) -> bool {
        self.client.find(Locator::XPath(xpath)).await.is_ok()
    }

    /// Check the front page for logged-in markers.
    ///
    /// Any failure while checking counts as logged out.
    pub async fn is_logged_in(&self) -> bool {
        self.debug.log_action("Checking login status", "Navigating to X.com");
        if let Err(e) = self.client.goto(FRONT_PAGE).await {
            tracing::error!(target: "lyubitori.browser", error = %e, "Error checking login status");
            return false;
        }
        tokio::time::sleep(FRONT_PAGE_SETTLE).await;
        self.debug.capture_step("login_check", "Checking if user is logged in").await;

        for xpath in LOGGED_IN_INDICATORS {
            if self.exists(xpath).await {
                tracing::info!(target: "lyubitori.browser", "User is logged in");
                return true;
            }
        }
        for xpath in LOGGED_OUT_INDICATORS {
            if self.exists(xpath).await {
                tracing::info!(target: "lyubitori.browser", "User is not logged in");
                return false;
            }
        }
        tracing::warn!(target: "lyubitori.browser", "Login status unclear");
        false
    }

    /// Replay saved cookies and verify the result.
    pub async fn try_restore_session(&self) -> BrowserResult<bool> {
        if !self.store.has_saved().await {
            tracing::info!(target: "lyubitori.browser", "No saved session to restore");
            return Ok(false);
        }
        let saved = match self.store.load().await {
            Ok(Some(saved)) => saved,
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::warn!(target: "lyubitori.browser", error = %e, "Saved session unreadable");
                return Ok(false);
            }
        };

        tracing::info!(target: "lyubitori.browser", "Attempting to restore session from saved cookies");
        // Cookies can only be set for the domain currently loaded
        self.client.goto(FRONT_PAGE).await?;
        let accepted = cookies::replay(self.client, &saved).await;
        self.client.refresh().await?;
        tracing::info!(
            target: "lyubitori.browser",
            accepted,
            total = saved.len(),
            "Loaded saved cookies"
        );

        if self.is_logged_in().await {
            tracing::info!(target: "lyubitori.browser", "Successfully restored session");
            Ok(true)
        } else {
            tracing::warn!(target: "lyubitori.browser", "Session restored but login verification failed");
            Ok(false)
        }
    }

    /// Restore the saved session, falling back to a fresh login.
    pub async fn login(&self, save_session: bool) -> ScrapeResult<bool> {
        tracing::info!(target: "lyubitori.browser", "Starting login process");
        match self.try_restore_session().await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(target: "lyubitori.browser", error = %e, "Session restore failed");
            }
        }
        self.fresh_login(save_session).await
    }

    /// Log in with credentials from the configuration.
    ///
    /// Missing credentials are a configuration error raised before the
    /// browser is touched. Flow failures return `Ok(false)`.
    pub async fn fresh_login(&self, save_session: bool) -> ScrapeResult<bool> {
        let missing = self.config.validate();
        if !missing.is_empty() {
            return Err(ScrapeError::configuration(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }

        match self.run_login_form().await {
            Ok(true) => {
                if save_session {
                    self.save_session().await;
                }
                tracing::info!(target: "lyubitori.browser", "Login successful");
                Ok(true)
            }
            Ok(false) => {
                tracing::error!(target: "lyubitori.browser", "Login verification failed");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(target: "lyubitori.browser", error = %e, "Login failed");
                self.debug.capture_error("login_failed", &e.to_string()).await;
                self.snapshot("error-login-error").await;
                Ok(false)
            }
        }
    }

    async fn run_login_form(&self) -> BrowserResult<bool> {
        self.debug
            .log_action("Starting fresh login", &format!("Navigating to {FRONT_PAGE}"));
        self.client.goto(FRONT_PAGE).await?;
        tokio::time::sleep(SUBMIT_PAUSE).await;
        self.debug.capture_step("main_page", "Loaded X.com main page").await;

        match self.client.find(Locator::XPath(SIGN_IN_BUTTON)).await {
            Ok(button) => {
                self.debug.log_action("Found sign in button", "Clicking sign in");
                button.click().await?;
                tokio::time::sleep(FORM_STEP_PAUSE).await;
                self.debug.capture_step("clicked_signin", "Clicked sign in button").await;
            }
            Err(_) => {
                tracing::info!(target: "lyubitori.browser", "No sign in button found, may already be on login page");
            }
        }

        let username = self.config.username.as_deref().unwrap_or_default();
        let password = self.config.password.as_deref().unwrap_or_default();

        self.debug.log_action("Entering username", "Looking for username input field");
        self.fill_labelled(USERNAME_LABEL, username).await?;
        self.snapshot("username-input").await;
        self.debug.capture_step("username_entered", "Username entered in form").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.click(NEXT_BUTTON).await?;
        self.debug.capture_step("username_next_clicked", "Clicked Next after username").await;

        tokio::time::sleep(FORM_STEP_PAUSE).await;
        self.debug.log_action("Entering password", "Looking for password input field");
        self.fill_labelled(PASSWORD_LABEL, password).await?;
        self.snapshot("password-input").await;
        self.debug.capture_step("password_entered", "Password entered in form").await;
        self.click(LOGIN_BUTTON).await?;
        self.debug.capture_step("login_clicked", "Clicked Log in button").await;
        tokio::time::sleep(SUBMIT_PAUSE).await;

        self.handle_two_factor().await?;
        Ok(self.verify_login().await)
    }

    /// Click a form label and type into whatever input it focuses.
    async fn fill_labelled(&self, label_xpath: &str, text: &str) -> BrowserResult<()> {
        let label = self
            .client
            .wait()
            .at_most(ELEMENT_WAIT)
            .for_element(Locator::XPath(label_xpath))
            .await
            .map_err(|_| BrowserError::ElementMissing(label_xpath.to_string()))?;
        label.click().await?;
        self.client.active_element().await?.send_keys(text).await?;
        Ok(())
    }

    async fn click(&self, xpath: &str) -> BrowserResult<()> {
        self.client.find(Locator::XPath(xpath)).await?.click().await?;
        Ok(())
    }

    async fn handle_two_factor(&self) -> BrowserResult<()> {
        self.debug.log_action("Checking for 2FA", "Looking for Enter code field");
        self.debug.capture_step("2fa_check", "Checking if 2FA is required").await;
        if !self.exists(CODE_LABEL).await {
            tracing::info!(target: "lyubitori.browser", "No 2FA required");
            return Ok(());
        }

        tracing::info!(target: "lyubitori.browser", "2FA required");
        let code = match &self.config.backup_code {
            Some(code) => {
                tracing::info!(target: "lyubitori.browser", "Using backup code for 2FA");
                code.clone()
            }
            None => {
                tracing::info!(target: "lyubitori.browser", "Interactive 2FA required");
                self.debug.log_action("Interactive 2FA", "Waiting for user input");
                prompt_for_code().await?
            }
        };

        self.fill_labelled(CODE_LABEL, &code).await?;
        self.debug.capture_step("2fa_code_entered", "2FA code entered").await;
        self.click(NEXT_BUTTON).await?;
        self.snapshot("after-2fa").await;
        self.debug.capture_step("2fa_next_clicked", "Clicked Next after 2FA").await;
        tokio::time::sleep(SUBMIT_PAUSE).await;
        Ok(())
    }

    /// Poll the current URL until it settles on a logged-in page.
    async fn verify_login(&self) -> bool {
        self.debug
            .log_action("Verifying login", "Checking current URL after login attempt");
        let username = self.config.username.as_deref().unwrap_or_default();

        for attempt in 1..=self.config.max_error_count.max(1) {
            let url = match self.client.current_url().await {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::error!(target: "lyubitori.browser", attempt, error = %e, "Login verification error");
                    self.debug
                        .capture_error("login_verification_error", &e.to_string())
                        .await;
                    continue;
                }
            };
            self.debug
                .capture_step(&format!("verify_attempt_{attempt}"), &format!("Checking URL: {url}"))
                .await;

            match classify_landing(&url, username) {
                LoginLanding::Success => {
                    tracing::info!(target: "lyubitori.browser", %url, "Login verified");
                    self.dismiss_ads_prompt().await;
                    return true;
                }
                LoginLanding::StillOnLogin => {
                    tracing::warn!(target: "lyubitori.browser", %url, "Login failed - still on login page");
                    self.debug.capture_step("login_failed", &format!("Still on login URL: {url}")).await;
                    return false;
                }
                LoginLanding::Unclear => {
                    tracing::info!(target: "lyubitori.browser", %url, attempt, "URL unclear, waiting and retrying");
                    tokio::time::sleep(self.config.login_wait).await;
                }
            }
        }

        self.snapshot("error-login-verification-failed").await;
        self.debug
            .capture_step("verification_failed", "All login verification attempts failed")
            .await;
        false
    }

    async fn dismiss_ads_prompt(&self) {
        if let Ok(button) = self.client.find(Locator::XPath(ADS_PROMPT)).await {
            if button.click().await.is_ok() {
                self.debug.log_action("Handled post-login prompt", "Clicked ads preference");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }

    async fn save_session(&self) {
        match cookies::export(self.client).await {
            Ok(cookies) => {
                if let Err(e) = self.store.save(&cookies).await {
                    tracing::error!(target: "lyubitori.browser", error = %e, "Failed to save cookies");
                }
            }
            Err(e) => {
                tracing::error!(target: "lyubitori.browser", error = %e, "Failed to read browser cookies");
            }
        }
    }

    /// Navigate to `url` unless the browser is already there.
    pub async fn ensure_page(&self, url: &str) -> ScrapeResult<()> {
        let current = self
            .client
            .current_url()
            .await
            .map_err(BrowserError::from)?
            .to_string();

        if !current.contains(url) {
            tracing::info!(target: "lyubitori.browser", %url, "Navigating to feed");
            self.debug
                .log_action("Navigating to feed", &format!("From {current} to {url}"));
            if let Err(e) = self.client.goto(url).await {
                self.debug.capture_error("feed_navigation_failed", &e.to_string()).await;
                return Err(BrowserError::from(e).into());
            }
            self.debug.capture_step("feed_loaded", &format!("Loaded {url}")).await;
        }
        Ok(())
    }

    /// Drop browser cookies and the saved session.
    pub async fn logout(&self) -> ScrapeResult<()> {
        self.client
            .delete_all_cookies()
            .await
            .map_err(BrowserError::from)?;
        self.store
            .clear()
            .await
            .map_err(|e| ScrapeError::session(e.to_string()))?;
        tracing::info!(target: "lyubitori.browser", "Logged out successfully");
        Ok(())
    }

    /// Screenshot into the plain screenshot directory, independent of debug mode.
    async fn snapshot(&self, name: &str) {
        let path = self.config.screenshot_path.join(format!("{name}.png"));
        let result = async {
            let png = self.client.screenshot().await?;
            tokio::fs::create_dir_all(&self.config.screenshot_path).await?;
            tokio::fs::write(&path, png).await?;
            Ok::<_, BrowserError>(())
        }
        .await;
        match result {
            Ok(()) => tracing::debug!(target: "lyubitori.browser", path = %path.display(), "Screenshot saved"),
            Err(e) => tracing::warn!(target: "lyubitori.browser", name, error = %e, "Failed to save screenshot"),
        }
    }
}

/// Ask for a 2FA code on the terminal.
async fn prompt_for_code() -> BrowserResult<String> {
    let line = tokio::task::spawn_blocking(|| {
        use std::io::Write;
        eprint!("Please input 2-step auth code: ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>(line)
    })
    .await
    .map_err(|e| BrowserError::Io(std::io::Error::other(e)))??;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_is_success() {
        assert_eq!(classify_landing("https://x.com/home", "alice"), LoginLanding::Success);
        assert_eq!(classify_landing("https://x.com/alice", "alice"), LoginLanding::Success);
    }

    #[test]
    fn test_login_flow_is_failure() {
        assert_eq!(
            classify_landing("https://x.com/i/flow/login?redirect=1", "alice"),
            LoginLanding::StillOnLogin
        );
        assert_eq!(classify_landing("https://twitter.com/login", "alice"), LoginLanding::StillOnLogin);
    }

    #[test]
    fn test_other_pages_are_unclear() {
        assert_eq!(
            classify_landing("https://x.com/account/access", "alice"),
            LoginLanding::Unclear
        );
    }
}
