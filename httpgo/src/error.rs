/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use httpgo_http::HttpResponseError;
use httpgo_http::connect::HttpConnectError;
use httpgo_socks::SocksConnectError;
use httpgo_types::{AddrParseError, AuthParseError, ConnectError, UpstreamAddr};

/// Fatal errors found while building the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing url argument")]
    MissingUrl,
    #[error("invalid url {0}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("unsupported protocol {0:?}. http and https are supported")]
    UnsupportedScheme(String),
    #[error("invalid target address in url {0}: {1}")]
    InvalidTarget(String, AddrParseError),
    #[error("invalid method {0:?}")]
    InvalidMethod(String),
    #[error("invalid header {0:?}")]
    InvalidHeader(String),
    #[error("invalid http proxy {0}: {1}")]
    InvalidHttpProxy(String, AddrParseError),
    #[error("invalid http proxy auth in {0}: {1}")]
    InvalidHttpProxyAuth(String, AuthParseError),
    #[error("invalid socks proxy {0}: {1}")]
    InvalidSocksProxy(String, AddrParseError),
    #[error("failed to read body file {p}: {e}", p = .0.display(), e = .1)]
    ReadBodyFile(PathBuf, io::Error),
    #[error("tls config error: {0}")]
    TlsConfig(String),
}

/// Failure to get a usable byte stream to the target.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("connect to {0} timed out")]
    ConnectTimedOut(UpstreamAddr),
    #[error("connect to {0} failed: {1}")]
    ConnectFailed(UpstreamAddr, ConnectError),
    #[error("http proxy {0} unreachable: {1}")]
    HttpProxyUnreachable(UpstreamAddr, ConnectError),
    #[error("http proxy {0}: {1}")]
    HttpProxyFailed(UpstreamAddr, HttpConnectError),
    #[error("http proxy {0} timed out")]
    HttpProxyTimedOut(UpstreamAddr),
    #[error("http proxy {0} sent unexpected data after tunnel established")]
    HttpProxyUnexpectedData(UpstreamAddr),
    #[error("socks proxy {0} unreachable: {1}")]
    SocksProxyUnreachable(UpstreamAddr, ConnectError),
    #[error("socks proxy {0}: {1}")]
    SocksProxyFailed(UpstreamAddr, SocksConnectError),
    #[error("socks proxy {0} timed out")]
    SocksProxyTimedOut(UpstreamAddr),
}

/// Failure while issuing one request over an established stream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Dial(#[from] DialError),
    #[error("tls handshake failed: {0}")]
    TlsHandshake(io::Error),
    #[error("tls handshake timed out")]
    TlsHandshakeTimedOut,
    #[error("failed to send request: {0}")]
    WriteFailed(io::Error),
    #[error("read response timed out")]
    ReadTimedOut,
    #[error("failed to read response: {0}")]
    Response(#[from] HttpResponseError),
    #[error("failed to read response body: {0}")]
    BodyReadFailed(io::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("invalid redirect location {0:?}")]
    InvalidRedirect(String),
    #[error("too many redirects")]
    TooManyRedirects,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dial_error_text() {
        let addr = UpstreamAddr::from_str("127.0.0.1:80").unwrap();
        let e = DialError::ConnectTimedOut(addr.clone());
        assert_eq!(e.to_string(), "connect to 127.0.0.1:80 timed out");

        let e = DialError::SocksProxyUnreachable(addr, ConnectError::ConnectionRefused);
        assert_eq!(
            e.to_string(),
            "socks proxy 127.0.0.1:80 unreachable: connection refused"
        );
    }

    #[test]
    fn config_error_text() {
        let e = ConfigError::ReadBodyFile(
            PathBuf::from("/tmp/body.json"),
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            e.to_string(),
            "failed to read body file /tmp/body.json: no such file"
        );
    }

    #[test]
    fn transport_error_wraps_dial() {
        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        let e = TransportError::from(DialError::HttpProxyTimedOut(addr));
        assert_eq!(e.to_string(), "http proxy example.com:443 timed out");
    }
}
