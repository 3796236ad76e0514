//! Conversions between browser cookies and the stored session bundle.

use fantoccini::Client;
use fantoccini::cookies::Cookie;
use lyubitori_core::StoredCookie;
use time::OffsetDateTime;

use crate::error::BrowserResult;

pub fn to_stored(cookie: &Cookie<'_>) -> StoredCookie {
    let mut stored = StoredCookie::new(cookie.name(), cookie.value());
    stored.domain = cookie.domain().map(str::to_string);
    stored.path = cookie.path().map(str::to_string);
    stored.expiry = cookie.expires_datetime().map(OffsetDateTime::unix_timestamp);
    stored.secure = cookie.secure().unwrap_or(false);
    stored.http_only = cookie.http_only().unwrap_or(false);
    stored.same_site = cookie.same_site().map(|s| s.to_string());
    stored
}

/// Build a browser cookie. `sameSite` is never replayed.
pub fn to_browser(stored: &StoredCookie) -> Cookie<'static> {
    let mut cookie = Cookie::new(stored.name.clone(), stored.value.clone());
    if let Some(domain) = &stored.domain {
        cookie.set_domain(domain.clone());
    }
    if let Some(path) = &stored.path {
        cookie.set_path(path.clone());
    }
    if let Some(expires) = stored
        .expiry
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
    {
        cookie.set_expires(expires);
    }
    cookie.set_secure(stored.secure);
    cookie.set_http_only(stored.http_only);
    cookie
}

/// Read every cookie visible to the current page.
pub async fn export(client: &Client) -> BrowserResult<Vec<StoredCookie>> {
    let cookies = client.get_all_cookies().await?;
    Ok(cookies.iter().map(to_stored).collect())
}

/// Replay cookies into the browser, one at a time.
///
/// A rejected cookie is logged and skipped. Returns how many were accepted.
pub async fn replay(client: &Client, cookies: &[StoredCookie]) -> usize {
    let mut accepted = 0;
    for stored in cookies {
        match client.add_cookie(to_browser(stored)).await {
            Ok(()) => accepted += 1,
            Err(e) => {
                tracing::warn!(
                    target: "lyubitori.browser",
                    cookie = %stored.name,
                    error = %e,
                    "Failed to add cookie"
                );
            }
        }
    }
    accepted
}
