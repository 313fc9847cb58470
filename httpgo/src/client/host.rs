/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

use super::{
    BenchTarget, BenchTaskContext, HttpConnection, HttpConnector, RequestPrototype, recv_response,
};
use crate::dialer::with_timeout;
use crate::error::TransportError;
use crate::stats::Outcome;

/// The default transport, with one keep-alive connection per worker.
pub struct HostTarget {
    prototype: Arc<RequestPrototype>,
    connector: HttpConnector,
    keep_alive: bool,
}

impl HostTarget {
    pub fn new(prototype: Arc<RequestPrototype>, connector: HttpConnector, keep_alive: bool) -> Self {
        HostTarget {
            prototype,
            connector,
            keep_alive,
        }
    }
}

impl BenchTarget for HostTarget {
    type Context = HostTaskContext;

    fn new_context(&self) -> HostTaskContext {
        HostTaskContext {
            prototype: self.prototype.clone(),
            connector: self.connector.clone(),
            keep_alive: self.keep_alive,
            saved_connection: None,
            req_buf: Vec::with_capacity(1024),
        }
    }
}

pub struct HostTaskContext {
    prototype: Arc<RequestPrototype>,
    connector: HttpConnector,
    keep_alive: bool,
    saved_connection: Option<HttpConnection>,
    req_buf: Vec<u8>,
}

impl HostTaskContext {
    async fn fetch_connection(&mut self) -> Result<HttpConnection, TransportError> {
        if let Some(mut c) = self.saved_connection.take() {
            let mut buf = [0u8; 4];
            if c.reader.read(&mut buf).now_or_never().is_none() {
                // no eof, reuse the old connection
                return Ok(c);
            }
        }

        self.connector.connect().await
    }

    async fn run(&mut self) -> Result<u16, TransportError> {
        let mut connection = self.fetch_connection().await?;

        self.req_buf.clear();
        self.prototype.encode(&mut self.req_buf);
        connection
            .writer
            .write_all(&self.req_buf)
            .await
            .map_err(TransportError::WriteFailed)?;
        connection
            .writer
            .flush()
            .await
            .map_err(TransportError::WriteFailed)?;

        let (code, reusable) = with_timeout(
            self.connector.timeout(),
            recv_response(&mut connection.reader, self.prototype.is_head()),
        )
        .await
        .ok_or(TransportError::ReadTimedOut)??;

        if self.keep_alive && reusable {
            self.saved_connection = Some(connection);
        }
        Ok(code)
    }
}

#[async_trait]
impl BenchTaskContext for HostTaskContext {
    async fn issue(&mut self) -> Outcome {
        let time_started = Instant::now();
        match self.run().await {
            Ok(status) => Outcome::Completed {
                status,
                latency: time_started.elapsed(),
            },
            Err(e) => Outcome::failed(e),
        }
    }
}
