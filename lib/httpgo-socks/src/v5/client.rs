/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};

use httpgo_types::UpstreamAddr;

use super::{SocksAuth, SocksAuthMethod, SocksConnectError, Socks5Reply, Socks5Request, auth};

async fn socks5_login<S>(stream: &mut S, auth: &SocksAuth) -> Result<(), SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let auth_method = auth::send_and_recv_method(stream, auth).await?;
    match auth_method {
        SocksAuthMethod::None => Ok(()),
        SocksAuthMethod::User => {
            if let SocksAuth::User(username, password) = auth {
                auth::proceed_with_user(stream, username, password).await
            } else {
                Err(SocksConnectError::NoAuthMethodAvailable)
            }
        }
        _ => Err(SocksConnectError::NoAuthMethodAvailable),
    }
}

/// tcp connect to a socks5 proxy
///
/// Nothing is read past the reply, so the stream is ready for tunnelled data
/// on return. Returns the bind address at the server side.
pub async fn socks5_connect_to<S>(
    stream: &mut S,
    auth: &SocksAuth,
    addr: &UpstreamAddr,
) -> Result<SocketAddr, SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    socks5_login(stream, auth).await?;

    Socks5Request::send_connect(stream, addr)
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let rsp = Socks5Reply::recv(stream).await?;
    match rsp {
        Socks5Reply::Succeeded(addr) => Ok(addr),
        Socks5Reply::ConnectionTimedOut => Err(SocksConnectError::PeerTimeout),
        _ => Err(SocksConnectError::RequestFailed(
            rsp.error_message().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn connect_no_auth() {
        let mut stream = Builder::new()
            .write(b"\x05\x01\x00")
            .read(b"\x05\x00")
            .write(b"\x05\x01\x00\x03\x0bexample.com\x00\x50")
            .read(b"\x05\x00\x00\x01\x7f\x00\x00\x01\x30\x39")
            .build();
        let addr = UpstreamAddr::from_str("example.com:80").unwrap();
        let bind = socks5_connect_to(&mut stream, &SocksAuth::None, &addr)
            .await
            .unwrap();
        assert_eq!(bind, "127.0.0.1:12345".parse().unwrap());
    }

    #[tokio::test]
    async fn connect_with_user() {
        let mut stream = Builder::new()
            .write(b"\x05\x01\x02")
            .read(b"\x05\x02")
            .write(b"\x01\x01u\x01p")
            .read(b"\x01\x00")
            .write(b"\x05\x01\x00\x01\x7f\x00\x00\x01\x00\x50")
            .read(b"\x05\x00\x00\x01\x00\x00\x00\x00\x00\x00")
            .build();
        let addr = UpstreamAddr::from_str("127.0.0.1:80").unwrap();
        let auth = SocksAuth::User("u".to_string(), "p".to_string());
        socks5_connect_to(&mut stream, &auth, &addr).await.unwrap();
    }

    #[tokio::test]
    async fn connect_refused() {
        let mut stream = Builder::new()
            .write(b"\x05\x01\x00")
            .read(b"\x05\x00")
            .write(b"\x05\x01\x00\x01\x7f\x00\x00\x01\x00\x50")
            .read(b"\x05\x05\x00\x01\x00\x00\x00\x00\x00\x00")
            .build();
        let addr = UpstreamAddr::from_str("127.0.0.1:80").unwrap();
        let err = socks5_connect_to(&mut stream, &SocksAuth::None, &addr)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "request failed: Connection refused");
    }

    #[tokio::test]
    async fn proxy_closed() {
        let mut stream = Builder::new().write(b"\x05\x01\x00").build();
        let addr = UpstreamAddr::from_str("127.0.0.1:80").unwrap();
        let err = socks5_connect_to(&mut stream, &SocksAuth::None, &addr)
            .await
            .unwrap_err();
        assert!(matches!(err, SocksConnectError::RemoteClosed));
    }
}
