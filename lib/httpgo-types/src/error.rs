/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection reset")]
    ConnectionReset,
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("host unreachable")] // from ICMP or local route
    HostUnreachable,
    #[error("timed out")]
    TimedOut,
    #[error("{0}")]
    UnspecifiedError(io::Error),
}

impl From<io::Error> for ConnectError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => ConnectError::ConnectionRefused,
            io::ErrorKind::ConnectionReset => ConnectError::ConnectionReset,
            io::ErrorKind::HostUnreachable => ConnectError::HostUnreachable,
            io::ErrorKind::NetworkUnreachable => ConnectError::NetworkUnreachable,
            io::ErrorKind::TimedOut => ConnectError::TimedOut,
            _ => ConnectError::UnspecifiedError(e),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddrParseError {
    #[error("empty host")]
    EmptyHost,
    #[error("no port found")]
    NoPort,
    #[error("invalid port")]
    InvalidPort,
    #[error("invalid ipv6 address")]
    InvalidIpv6Address,
    #[error("unsupported url scheme {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthParseError {
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,
    #[error("invalid utf-8 encoding")]
    InvalidUtf8Encoding,
    #[error("invalid username")]
    InvalidUsername,
    #[error("invalid password")]
    InvalidPassword,
    #[error("no delimiter found")]
    NoDelimiterFound,
}
