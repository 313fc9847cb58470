/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use crate::AddrParseError;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Host {
    Ip(IpAddr),
    Domain(String),
}

impl Host {
    pub fn is_empty(&self) -> bool {
        match self {
            Host::Ip(ip) => ip.is_unspecified(),
            Host::Domain(domain) => domain.is_empty(),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]"),
            Host::Ip(ip) => write!(f, "{ip}"),
            Host::Domain(domain) => write!(f, "{domain}"),
        }
    }
}

impl From<url::Host<&str>> for Host {
    fn from(v: url::Host<&str>) -> Self {
        match v {
            url::Host::Ipv4(ip4) => Host::Ip(IpAddr::V4(ip4)),
            url::Host::Ipv6(ip6) => Host::Ip(IpAddr::V6(ip6)),
            url::Host::Domain(domain) => Host::Domain(domain.to_string()),
        }
    }
}

impl FromStr for Host {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddrParseError::EmptyHost);
        }
        if let Some(v6) = s.strip_prefix('[') {
            let Some(v6) = v6.strip_suffix(']') else {
                return Err(AddrParseError::InvalidIpv6Address);
            };
            let ip6 = Ipv6Addr::from_str(v6).map_err(|_| AddrParseError::InvalidIpv6Address)?;
            return Ok(Host::Ip(IpAddr::V6(ip6)));
        }
        if let Ok(ip) = IpAddr::from_str(s) {
            return Ok(Host::Ip(ip));
        }
        Ok(Host::Domain(s.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parse() {
        let h = Host::from_str("127.0.0.1").unwrap();
        assert_eq!(h, Host::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)));

        let h = Host::from_str("[::1]").unwrap();
        assert_eq!(h, Host::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(h.to_string(), "[::1]");

        let h = Host::from_str("Example.COM").unwrap();
        assert_eq!(h, Host::Domain("example.com".to_string()));

        assert!(Host::from_str("").is_err());
        assert!(Host::from_str("[::1").is_err());
    }
}
