/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use tokio::io::BufReader;
use tokio::net::TcpStream;

use httpgo_types::{AddrParseError, HttpAuth, UpstreamAddr};

use super::direct::connect_tcp;
use crate::error::{ConfigError, DialError};

const DEFAULT_HTTP_PROXY_PORT: u16 = 80;

/// Accepts `[http://][user:pass@]host[:port]`.
pub(super) fn parse_http_proxy(s: &str) -> Result<(UpstreamAddr, HttpAuth), ConfigError> {
    let v = s.strip_prefix("http://").unwrap_or(s);
    let v = v.trim_end_matches('/');
    let (userinfo, host_port) = v.rsplit_once('@').unwrap_or(("", v));

    let auth = HttpAuth::from_userinfo(userinfo)
        .map_err(|e| ConfigError::InvalidHttpProxyAuth(s.to_string(), e))?;
    let addr = match UpstreamAddr::from_str(host_port) {
        Ok(addr) => addr,
        Err(AddrParseError::NoPort) => {
            UpstreamAddr::from_host_str_and_port(host_port, DEFAULT_HTTP_PROXY_PORT)
                .map_err(|e| ConfigError::InvalidHttpProxy(s.to_string(), e))?
        }
        Err(e) => return Err(ConfigError::InvalidHttpProxy(s.to_string(), e)),
    };
    Ok((addr, auth))
}

pub(super) async fn connect_via_http_proxy(
    proxy: &UpstreamAddr,
    auth: &HttpAuth,
    target: &UpstreamAddr,
) -> Result<TcpStream, DialError> {
    let mut stream = connect_tcp(proxy)
        .await
        .map_err(|e| DialError::HttpProxyUnreachable(proxy.clone(), e.into()))?;

    let mut buf_stream = BufReader::new(&mut stream);
    httpgo_http::connect::http_connect_to(&mut buf_stream, auth, target)
        .await
        .map_err(|e| DialError::HttpProxyFailed(proxy.clone(), e))?;
    if !buf_stream.buffer().is_empty() {
        return Err(DialError::HttpProxyUnexpectedData(proxy.clone()));
    }

    Ok(stream)
}
