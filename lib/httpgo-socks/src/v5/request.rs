/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use httpgo_types::{Host, UpstreamAddr};

const CMD_TCP_CONNECT: u8 = 0x01;

pub(super) struct Socks5Request;

impl Socks5Request {
    fn encode_connect(addr: &UpstreamAddr) -> io::Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_u8(0x05);
        buf.put_u8(CMD_TCP_CONNECT);
        buf.put_u8(0x00);
        match addr.host() {
            Host::Domain(domain) => {
                let Ok(len) = u8::try_from(domain.len()) else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "too long domain name",
                    ));
                };
                buf.put_u8(0x03);
                buf.put_u8(len);
                buf.put_slice(domain.as_bytes());
            }
            Host::Ip(IpAddr::V4(ip4)) => {
                buf.put_u8(0x01);
                buf.put_slice(&ip4.octets());
            }
            Host::Ip(IpAddr::V6(ip6)) => {
                buf.put_u8(0x04);
                buf.put_slice(&ip6.octets());
            }
        }
        buf.put_u16(addr.port());
        Ok(buf)
    }

    pub(super) async fn send_connect<W>(writer: &mut W, addr: &UpstreamAddr) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let buf = Self::encode_connect(addr)?;
        writer.write_all(buf.as_ref()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn encode_domain() {
        let addr = UpstreamAddr::from_str("example.com:80").unwrap();
        let buf = Socks5Request::encode_connect(&addr).unwrap();
        assert_eq!(buf.as_ref(), b"\x05\x01\x00\x03\x0bexample.com\x00\x50");
    }

    #[test]
    fn encode_ipv4() {
        let addr = UpstreamAddr::from_str("127.0.0.1:8080").unwrap();
        let buf = Socks5Request::encode_connect(&addr).unwrap();
        assert_eq!(buf.as_ref(), b"\x05\x01\x00\x01\x7f\x00\x00\x01\x1f\x90");
    }

    #[test]
    fn encode_ipv6() {
        let addr = UpstreamAddr::from_str("[::1]:443").unwrap();
        let buf = Socks5Request::encode_connect(&addr).unwrap();
        assert_eq!(buf.len(), 4 + 16 + 2);
        assert_eq!(buf[3], 0x04);
        assert_eq!(&buf[20..], b"\x01\xbb");
    }
}
