/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use httpgo_types::UpstreamAddr;

use super::TlsClient;
use crate::dialer::{Dialer, with_timeout};
use crate::error::TransportError;

pub(crate) type BoxHttpReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxHttpWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub(crate) struct HttpConnection {
    pub(crate) reader: BufReader<BoxHttpReader>,
    pub(crate) writer: BoxHttpWriter,
    pub(crate) peer_addr: Option<SocketAddr>,
}

/// Opens HTTP connections to the one target of this run.
#[derive(Clone)]
pub struct HttpConnector {
    dialer: Dialer,
    target: UpstreamAddr,
    tls: Option<TlsClient>,
    timeout: Option<Duration>,
}

impl HttpConnector {
    pub fn new(
        dialer: Dialer,
        target: UpstreamAddr,
        tls: Option<TlsClient>,
        timeout: Option<Duration>,
    ) -> Self {
        HttpConnector {
            dialer,
            target,
            tls,
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    #[inline]
    pub fn target(&self) -> &UpstreamAddr {
        &self.target
    }

    /// The bound of both the dial and the wait for one response.
    #[inline]
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) async fn connect(&self) -> Result<HttpConnection, TransportError> {
        let stream = self.dialer.dial(&self.target).await?;
        let peer_addr = stream.get_ref().peer_addr().ok();

        if let Some(tls) = &self.tls {
            let tls_stream = with_timeout(self.timeout, tls.connect(stream))
                .await
                .ok_or(TransportError::TlsHandshakeTimedOut)?
                .map_err(TransportError::TlsHandshake)?;
            let (r, w) = tokio::io::split(tls_stream);
            Ok(HttpConnection {
                reader: BufReader::new(Box::new(r) as BoxHttpReader),
                writer: Box::new(w),
                peer_addr,
            })
        } else {
            let (r, w) = tokio::io::split(stream);
            Ok(HttpConnection {
                reader: BufReader::new(Box::new(r) as BoxHttpReader),
                writer: Box::new(w),
                peer_addr,
            })
        }
    }
}
