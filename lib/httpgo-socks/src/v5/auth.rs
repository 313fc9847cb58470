/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{SocksAuth, SocksAuthMethod, SocksConnectError, SocksNegotiationError};

const USER_AUTH_VERSION: u8 = 0x01;

/// Offer the single method matching `auth` and return the one the server picked.
pub(super) async fn send_and_recv_method<S>(
    stream: &mut S,
    auth: &SocksAuth,
) -> Result<SocksAuthMethod, SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let msg = [0x05, 0x01, auth.method().code()];
    stream
        .write_all(&msg)
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    stream.flush().await.map_err(SocksConnectError::WriteFailed)?;

    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await?;
    if buf[0] != 0x05 {
        return Err(SocksNegotiationError::InvalidVersion.into());
    }
    let method = SocksAuthMethod::from(buf[1]);
    if method == SocksAuthMethod::NoAcceptable {
        return Err(SocksConnectError::NoAuthMethodAvailable);
    }
    if method != auth.method() {
        return Err(SocksNegotiationError::InvalidAuthMethod.into());
    }
    Ok(method)
}

/// username/password sub-negotiation, rfc1929
pub(super) async fn proceed_with_user<S>(
    stream: &mut S,
    username: &str,
    password: &str,
) -> Result<(), SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Ok(ulen), Ok(plen)) = (u8::try_from(username.len()), u8::try_from(password.len())) else {
        return Err(SocksNegotiationError::InvalidUserAuthMsg.into());
    };

    let mut buf = BytesMut::with_capacity(3 + username.len() + password.len());
    buf.put_u8(USER_AUTH_VERSION);
    buf.put_u8(ulen);
    buf.put_slice(username.as_bytes());
    buf.put_u8(plen);
    buf.put_slice(password.as_bytes());
    stream
        .write_all(buf.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    stream.flush().await.map_err(SocksConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    stream.read_exact(&mut rsp).await?;
    if rsp[0] != USER_AUTH_VERSION {
        return Err(SocksConnectError::UnsupportedAuthVersion);
    }
    if rsp[1] != 0x00 {
        return Err(SocksConnectError::AuthFailed);
    }
    Ok(())
}
