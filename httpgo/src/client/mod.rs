/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

use httpgo_http::{HttpResponseHead, drain_body};

use crate::error::TransportError;
use crate::stats::Outcome;

mod reuse;
pub use reuse::{PooledItem, ReusePool};

mod request;
pub use request::{RequestArgs, RequestPrototype};

mod tls;
pub use tls::{TlsClient, TlsClientArgs};

mod connection;
pub use connection::HttpConnector;
use connection::HttpConnection;

mod host;
pub use host::{HostTarget, HostTaskContext};

mod pipeline;
pub use pipeline::{PIPELINE_MAX_PENDING, PipelineTarget, PipelineTaskContext};

mod debug;
pub use debug::DebugClient;

const RESPONSE_MAX_HEADER_SIZE: usize = 16384;

/// Per worker state of one transport variant.
#[async_trait]
pub trait BenchTaskContext: Send {
    /// Send one request and wait for its response.
    async fn issue(&mut self) -> Outcome;
}

pub trait BenchTarget: Send + Sync {
    type Context: BenchTaskContext + 'static;

    fn new_context(&self) -> Self::Context;
}

/// Read one final response and drain its body. Interim 1xx heads are skipped.
///
/// Returns the status code and whether the connection can be reused.
async fn recv_response<R>(reader: &mut R, is_head: bool) -> Result<(u16, bool), TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut rsp = HttpResponseHead::parse(reader, RESPONSE_MAX_HEADER_SIZE).await?;
    while rsp.is_interim() {
        rsp = HttpResponseHead::parse(reader, RESPONSE_MAX_HEADER_SIZE).await?;
    }
    if let Some(body_type) = rsp.body_type(is_head) {
        drain_body(reader, body_type)
            .await
            .map_err(TransportError::BodyReadFailed)?;
    }
    Ok((rsp.code, rsp.reusable(is_head)))
}
