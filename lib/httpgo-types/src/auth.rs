/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use base64::prelude::*;

use crate::AuthParseError;

#[derive(Debug, Clone, Default)]
pub enum HttpAuth {
    #[default]
    None,
    Basic(HttpBasicAuth),
}

impl HttpAuth {
    /// Parse the userinfo part of an address like `user:pass@host:port`
    pub fn from_userinfo(userinfo: &str) -> Result<Self, AuthParseError> {
        if userinfo.is_empty() {
            return Ok(HttpAuth::None);
        }
        let (username, password) = userinfo.split_once(':').unwrap_or((userinfo, ""));
        if username.is_empty() {
            return Err(AuthParseError::InvalidUsername);
        }
        Ok(HttpAuth::Basic(HttpBasicAuth::new(username, password)))
    }
}

#[derive(Debug, Clone)]
pub struct HttpBasicAuth {
    pub username: String,
    pub password: String,
    encoded_value: String,
}

impl HttpBasicAuth {
    pub fn new(username: &str, password: &str) -> Self {
        let mut buf = Vec::with_capacity(username.len() + 1 + password.len());
        buf.extend_from_slice(username.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(password.as_bytes());

        let encoded_value = BASE64_STANDARD.encode(buf);

        HttpBasicAuth {
            username: username.to_string(),
            password: password.to_string(),
            encoded_value,
        }
    }

    #[inline]
    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

impl FromStr for HttpBasicAuth {
    type Err = AuthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded_value = s.trim();

        let decoded = BASE64_STANDARD
            .decode(encoded_value)
            .map_err(|_| AuthParseError::InvalidBase64Encoding)?;
        let value =
            std::str::from_utf8(&decoded).map_err(|_| AuthParseError::InvalidUtf8Encoding)?;

        match memchr::memchr(b':', value.as_bytes()) {
            Some(i) => Ok(HttpBasicAuth {
                username: value[0..i].to_string(),
                password: value[i + 1..].to_string(),
                encoded_value: encoded_value.to_string(),
            }),
            None => Err(AuthParseError::NoDelimiterFound),
        }
    }
}
