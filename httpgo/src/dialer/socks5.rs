/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use tokio::net::TcpStream;

use httpgo_socks::SocksAuth;
use httpgo_types::{AddrParseError, UpstreamAddr};

use super::direct::connect_tcp;
use crate::error::{ConfigError, DialError};

const DEFAULT_SOCKS_PORT: u16 = 1080;

/// Accepts `[socks5://|socks5h://][user:pass@]host[:port]`.
pub(super) fn parse_socks_proxy(s: &str) -> Result<(UpstreamAddr, SocksAuth), ConfigError> {
    let invalid = |e| ConfigError::InvalidSocksProxy(s.to_string(), e);

    let v = if let Some((scheme, left)) = s.split_once("://") {
        match scheme.to_ascii_lowercase().as_str() {
            "socks5" | "socks5h" => left,
            _ => return Err(invalid(AddrParseError::UnsupportedScheme(scheme.to_string()))),
        }
    } else {
        s
    };
    let v = v.trim_end_matches('/');

    let (auth, host_port) = match v.rsplit_once('@') {
        Some((userinfo, host_port)) => {
            let (username, password) = userinfo.split_once(':').unwrap_or((userinfo, ""));
            (
                SocksAuth::User(username.to_string(), password.to_string()),
                host_port,
            )
        }
        None => (SocksAuth::None, v),
    };

    let addr = match UpstreamAddr::from_str(host_port) {
        Ok(addr) => addr,
        Err(AddrParseError::NoPort) => {
            UpstreamAddr::from_host_str_and_port(host_port, DEFAULT_SOCKS_PORT).map_err(invalid)?
        }
        Err(e) => return Err(invalid(e)),
    };
    Ok((addr, auth))
}

pub(super) async fn connect_via_socks5_proxy(
    proxy: &UpstreamAddr,
    auth: &SocksAuth,
    target: &UpstreamAddr,
) -> Result<TcpStream, DialError> {
    let mut stream = connect_tcp(proxy)
        .await
        .map_err(|e| DialError::SocksProxyUnreachable(proxy.clone(), e.into()))?;

    httpgo_socks::v5::socks5_connect_to(&mut stream, auth, target)
        .await
        .map_err(|e| DialError::SocksProxyFailed(proxy.clone(), e))?;

    Ok(stream)
}
