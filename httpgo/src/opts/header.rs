/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use http::{HeaderName, HeaderValue};

use crate::error::ConfigError;

fn split_header_line(s: &str) -> Option<(&str, &str)> {
    let (name, value) = s.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || HeaderName::from_bytes(name.as_bytes()).is_err() {
        return None;
    }
    Some((name, value.trim()))
}

fn parse_header_line(s: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let invalid = || ConfigError::InvalidHeader(s.to_string());
    let (name, value) = split_header_line(s).ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((name, value))
}

/// Parse the values of all `-H` options.
///
/// One value may hold several headers joined by `, `, which is only split if
/// every part is a header line itself.
pub(super) fn parse_headers<'a, I>(values: I) -> Result<Vec<(HeaderName, HeaderValue)>, ConfigError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut headers = Vec::new();
    for v in values {
        let parts: Vec<&str> = v.split(", ").collect();
        if parts.len() > 1 && parts.iter().all(|p| split_header_line(p).is_some()) {
            for p in parts {
                headers.push(parse_header_line(p)?);
            }
        } else {
            headers.push(parse_header_line(v)?);
        }
    }
    Ok(headers)
}
