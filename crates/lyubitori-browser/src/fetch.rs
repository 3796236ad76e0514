//! In-page fetch of media as data URLs.
//!
//! The request runs inside the page so it carries the page's cookies and
//! origin. The URL travels as a script argument and is never spliced into
//! the script source.

use fantoccini::Client;
use lyubitori_core::FetchFailed;
use serde_json::Value;

/// Asynchronous script: `arguments[0]` is the URL, the last argument is the
/// WebDriver completion callback. Resolves to a data URL string or to an
/// `{error}` object.
pub const FETCH_AS_DATA_URL_SCRIPT: &str = r"
const url = arguments[0];
const done = arguments[arguments.length - 1];
fetch(url)
  .then(response => {
    if (!response.ok) {
      throw new Error('HTTP ' + response.status);
    }
    return response.blob();
  })
  .then(blob => new Promise((resolve, reject) => {
    const reader = new FileReader();
    reader.onloadend = () => resolve(reader.result);
    reader.onerror = () => reject(reader.error);
    reader.readAsDataURL(blob);
  }))
  .then(dataUrl => done(dataUrl))
  .catch(err => done({ error: String(err) }));
";

/// Run the fetch script for `url`.
pub async fn fetch_as_data_url(client: &Client, url: &str) -> Result<String, FetchFailed> {
    tracing::debug!(target: "lyubitori.browser", %url, "Fetching image");
    let result = client
        .execute_async(FETCH_AS_DATA_URL_SCRIPT, vec![Value::String(url.to_string())])
        .await
        .map_err(|e| FetchFailed::new(url, e.to_string()))?;
    interpret(url, result)
}

/// Turn the script's completion value into a data URL or a failure.
pub fn interpret(url: &str, result: Value) -> Result<String, FetchFailed> {
    match result {
        Value::String(data_url) if data_url.starts_with("data:") => Ok(data_url),
        Value::String(other) => Err(FetchFailed::new(
            url,
            format!("not a data URL: {}", other.chars().take(40).collect::<String>()),
        )),
        Value::Object(map) => {
            let reason = map
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown script error");
            Err(FetchFailed::new(url, reason))
        }
        Value::Null => Err(FetchFailed::new(url, "script returned no result")),
        other => Err(FetchFailed::new(url, format!("unexpected result: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://pbs.twimg.com/media/a?format=png&name=large";

    #[test]
    fn test_data_url_passes_through() {
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(interpret(URL, json!(data)).unwrap(), data);
    }

    #[test]
    fn test_script_error_is_fetch_failed() {
        let err = interpret(URL, json!({"error": "TypeError: Failed to fetch"})).unwrap_err();
        assert_eq!(err.url, URL);
        assert!(err.reason.contains("Failed to fetch"));
    }

    #[test]
    fn test_non_string_results_fail() {
        assert!(interpret(URL, Value::Null).is_err());
        assert!(interpret(URL, json!(42)).is_err());
        assert!(interpret(URL, json!("<html>")).is_err());
    }

    #[test]
    fn test_script_does_not_embed_url() {
        assert!(FETCH_AS_DATA_URL_SCRIPT.contains("arguments[0]"));
        assert!(!FETCH_AS_DATA_URL_SCRIPT.contains("%%"));
    }
}
