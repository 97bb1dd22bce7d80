use crate::error::{Error, Result};
use url::Url;

/// Checks that `raw` is an absolute URI (scheme included).
pub fn validate_url(raw: &str) -> Result<()> {
    Url::parse(raw).map(|_| ()).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Checks an optional URL; unset and empty values are accepted.
pub fn validate_optional_url(raw: Option<&str>) -> Result<()> {
    match raw {
        Some(url) if !url.is_empty() => validate_url(url),
        _ => Ok(()),
    }
}

/// Maps an empty string to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
