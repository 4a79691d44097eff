//! Website URL normalization for pipeline input.

use thiserror::Error;
use ::url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,
    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("URL host '{0}' is not a public domain")]
    InvalidHost(String),
    #[error("URL could not be parsed: {0}")]
    Unparsable(String),
}

/// Trims the input, assumes `https://` when no scheme is given and rejects
/// anything that is not an http(s) URL with a dotted host. A bare root path
/// is dropped so `example.se` and `https://example.se/` compare equal.
pub fn normalize_url(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|err| UrlError::Unparsable(err.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| UrlError::InvalidHost(String::new()))?;
    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return Err(UrlError::InvalidHost(host.to_string()));
    }

    let mut normalized = parsed.to_string();
    if parsed.path() == "/" && parsed.query().is_none() && parsed.fragment().is_none() {
        normalized.pop();
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_https_scheme() {
        assert_eq!(normalize_url("example.se").unwrap(), "https://example.se");
        assert_eq!(
            normalize_url("  www.frisor.se/om-oss ").unwrap(),
            "https://www.frisor.se/om-oss"
        );
    }

    #[test]
    fn keeps_http_and_lowercases_host() {
        assert_eq!(
            normalize_url("http://Example.SE/").unwrap(),
            "http://example.se"
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(normalize_url("   "), Err(UrlError::Empty));
        assert!(matches!(
            normalize_url("ftp://example.se"),
            Err(UrlError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            normalize_url("localhost"),
            Err(UrlError::InvalidHost(_))
        ));
        assert!(matches!(
            normalize_url("not a url"),
            Err(UrlError::Unparsable(_))
        ));
    }
}
