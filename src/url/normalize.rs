use crate::UrlError;
use url::Url;

/// Normalizes user input into an absolute URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Prefix `https://` when the input carries no scheme
/// 3. Parse the URL; reject if malformed
/// 4. Accept only `http` and `https` URLs with a host
///
/// # Examples
///
/// ```
/// use botwatch::url::normalize_input;
///
/// let url = normalize_input("example.com/docs").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_input(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}

/// Splits a URL into its origin and base path
///
/// The origin is `scheme://host[:port]`. The base path has its trailing slash
/// stripped and the root path becomes the empty string.
pub fn split_origin(url: &Url) -> (String, String) {
    let origin = url.origin().ascii_serialization();
    let base_path = url.path().trim_end_matches('/').to_string();
    (origin, base_path)
}
