/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;

use httpgo_socks::SocksAuth;
use httpgo_types::{HttpAuth, UpstreamAddr};

use crate::error::{ConfigError, DialError};
use crate::stats::ArcReaderStats;

mod counted;
pub use counted::CountedStream;

mod direct;
mod http_proxy;
mod socks5;

pub type DialedStream = CountedStream<TcpStream>;

#[derive(Debug, Clone, Default)]
pub enum ProxyTarget {
    #[default]
    None,
    Http {
        addr: UpstreamAddr,
        auth: HttpAuth,
    },
    Socks5 {
        addr: UpstreamAddr,
        auth: SocksAuth,
    },
}

impl ProxyTarget {
    /// The http proxy takes precedence if both are set.
    pub fn parse(http_proxy: Option<&str>, socks_proxy: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(s) = http_proxy.filter(|s| !s.is_empty()) {
            let (addr, auth) = http_proxy::parse_http_proxy(s)?;
            return Ok(ProxyTarget::Http { addr, auth });
        }
        if let Some(s) = socks_proxy.filter(|s| !s.is_empty()) {
            let (addr, auth) = socks5::parse_socks_proxy(s)?;
            return Ok(ProxyTarget::Socks5 { addr, auth });
        }
        Ok(ProxyTarget::None)
    }
}

pub(crate) async fn with_timeout<F: Future>(
    timeout: Option<Duration>,
    fut: F,
) -> Option<F::Output> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Opens byte streams to the target, maybe through a proxy tunnel.
///
/// Every byte read from a dialed stream is added to the shared reader stats.
#[derive(Clone)]
pub struct Dialer {
    proxy: ProxyTarget,
    timeout: Option<Duration>,
    stats: ArcReaderStats,
}

impl Dialer {
    pub fn new(proxy: ProxyTarget, timeout: Option<Duration>, stats: ArcReaderStats) -> Self {
        Dialer {
            proxy,
            timeout: timeout.filter(|t| !t.is_zero()),
            stats,
        }
    }

    pub fn proxy(&self) -> &ProxyTarget {
        &self.proxy
    }

    pub async fn dial(&self, target: &UpstreamAddr) -> Result<DialedStream, DialError> {
        let stream = match &self.proxy {
            ProxyTarget::None => with_timeout(self.timeout, direct::connect_tcp(target))
                .await
                .ok_or_else(|| DialError::ConnectTimedOut(target.clone()))?
                .map_err(|e| DialError::ConnectFailed(target.clone(), e.into()))?,
            ProxyTarget::Http { addr, auth } => with_timeout(
                self.timeout,
                http_proxy::connect_via_http_proxy(addr, auth, target),
            )
            .await
            .ok_or_else(|| DialError::HttpProxyTimedOut(addr.clone()))??,
            ProxyTarget::Socks5 { addr, auth } => with_timeout(
                self.timeout,
                socks5::connect_via_socks5_proxy(addr, auth, target),
            )
            .await
            .ok_or_else(|| DialError::SocksProxyTimedOut(addr.clone()))??,
        };
        Ok(CountedStream::new(stream, self.stats.clone()))
    }
}
