/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use url::Url;

use httpgo_types::UpstreamAddr;

use crate::error::ConfigError;

/// Expand the `:port`, `/path` and `host[:port]/path` shorthands.
pub(super) fn add_missing_scheme_and_host(url: &str) -> Cow<'_, str> {
    if url.starts_with(':') && !url.starts_with("://") {
        return Cow::Owned(format!("http://localhost{url}"));
    }
    let b = url.as_bytes();
    if !url.contains("://") && b.len() >= 2 {
        if b[0] == b'/' && b[1] != b'/' {
            return Cow::Owned(format!("http://localhost{url}"));
        }
        if b[0] != b'/' && b[1] != b'/' {
            return Cow::Owned(format!("http://{url}"));
        }
    }
    Cow::Borrowed(url)
}

/// Returns the normalised url and the address to dial.
pub(super) fn parse_target_url(s: &str) -> Result<(Url, UpstreamAddr), ConfigError> {
    let s = add_missing_scheme_and_host(s);
    let url = Url::parse(&s).map_err(|e| ConfigError::InvalidUrl(s.to_string(), e))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
    }
    let target =
        UpstreamAddr::from_url(&url).map_err(|e| ConfigError::InvalidTarget(s.to_string(), e))?;
    Ok((url, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand() {
        assert_eq!(add_missing_scheme_and_host(":3000"), "http://localhost:3000");
        assert_eq!(add_missing_scheme_and_host("/foo"), "http://localhost/foo");
        assert_eq!(add_missing_scheme_and_host("example.com"), "http://example.com");
        assert_eq!(
            add_missing_scheme_and_host("example.com:8080/a"),
            "http://example.com:8080/a"
        );
        assert_eq!(
            add_missing_scheme_and_host("https://example.com"),
            "https://example.com"
        );
        assert_eq!(add_missing_scheme_and_host("//x"), "//x");
    }

    #[test]
    fn target() {
        let (url, target) = parse_target_url(":3000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");
        assert_eq!(target.to_string(), "localhost:3000");

        let (_, target) = parse_target_url("https://example.com/a?b=c").unwrap();
        assert_eq!(target.to_string(), "example.com:443");

        let (_, target) = parse_target_url("example.com").unwrap();
        assert_eq!(target.port(), 80);
    }

    #[test]
    fn target_error() {
        let e = parse_target_url("ftp://example.com").unwrap_err();
        assert_eq!(
            e.to_string(),
            "unsupported protocol \"ftp\". http and https are supported"
        );

        assert!(matches!(
            parse_target_url("http://"),
            Err(ConfigError::InvalidUrl(..))
        ));
    }
}
