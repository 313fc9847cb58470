/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use url::Url;

use crate::{AddrParseError, Host};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    pub fn from_ip_and_port(ip: IpAddr, port: u16) -> Self {
        UpstreamAddr {
            host: Host::Ip(ip),
            port,
        }
    }

    pub fn from_host_str_and_port(host: &str, port: u16) -> Result<Self, AddrParseError> {
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }

    /// Build from an url, using the well known port of the scheme if no port is given
    pub fn from_url(url: &Url) -> Result<Self, AddrParseError> {
        let host = url.host().ok_or(AddrParseError::EmptyHost)?;
        let port = match url.port() {
            Some(port) => port,
            None => match url.scheme() {
                "http" => 80,
                "https" => 443,
                "socks5" | "socks5h" => 1080,
                s => return Err(AddrParseError::UnsupportedScheme(s.to_string())),
            },
        };
        let host = Host::from(host);
        if host.is_empty() {
            return Err(AddrParseError::EmptyHost);
        }
        Ok(UpstreamAddr { host, port })
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The host string without ipv6 brackets, suitable for tls server names
    pub fn host_str(&self) -> String {
        match &self.host {
            Host::Ip(ip) => ip.to_string(),
            Host::Domain(domain) => domain.clone(),
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for UpstreamAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(p) = memchr::memrchr(b':', s.as_bytes()) else {
            return Err(AddrParseError::NoPort);
        };
        let host = &s[..p];
        if host.contains(':') && !host.starts_with('[') {
            // bare ipv6 without port
            return Err(AddrParseError::NoPort);
        }
        let port = u16::from_str(&s[p + 1..]).map_err(|_| AddrParseError::InvalidPort)?;
        UpstreamAddr::from_host_str_and_port(host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn parse_str() {
        let addr = UpstreamAddr::from_str("127.0.0.1:8080").unwrap();
        assert_eq!(addr.host(), &Host::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(addr.port(), 8080);

        let addr = UpstreamAddr::from_str("[::1]:443").unwrap();
        assert_eq!(addr.host(), &Host::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(addr.to_string(), "[::1]:443");
        assert_eq!(addr.host_str(), "::1");

        let addr = UpstreamAddr::from_str("example.com:80").unwrap();
        assert_eq!(addr.to_string(), "example.com:80");
    }

    #[test]
    fn parse_str_error() {
        assert_eq!(
            UpstreamAddr::from_str("127.0.0.1"),
            Err(AddrParseError::NoPort)
        );
        assert_eq!(
            UpstreamAddr::from_str("127.0.0.1:88888"),
            Err(AddrParseError::InvalidPort)
        );
        assert_eq!(UpstreamAddr::from_str(":80"), Err(AddrParseError::EmptyHost));
        assert_eq!(UpstreamAddr::from_str("::1"), Err(AddrParseError::NoPort));
    }

    #[test]
    fn from_url() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let addr = UpstreamAddr::from_url(&url).unwrap();
        assert_eq!(addr.to_string(), "example.com:443");

        let url = Url::parse("http://localhost:3000").unwrap();
        let addr = UpstreamAddr::from_url(&url).unwrap();
        assert_eq!(addr.to_string(), "localhost:3000");

        let url = Url::parse("ftp://localhost/").unwrap();
        assert!(UpstreamAddr::from_url(&url).is_err());
    }
}
