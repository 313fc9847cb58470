/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::connection::{BoxHttpReader, BoxHttpWriter};
use super::{BenchTarget, BenchTaskContext, HttpConnector, RequestPrototype, recv_response};
use crate::dialer::with_timeout;
use crate::error::TransportError;
use crate::stats::Outcome;

/// Max in-flight requests on one pipelined connection.
pub const PIPELINE_MAX_PENDING: usize = 1024;

type ResponseSender = oneshot::Sender<Result<u16, TransportError>>;

struct PendingResponse {
    is_head: bool,
    sender: ResponseSender,
}

struct PipelineConnection {
    req_sender: mpsc::Sender<(Vec<u8>, PendingResponse)>,
}

impl PipelineConnection {
    async fn new(connector: &HttpConnector) -> Result<Self, TransportError> {
        let c = connector.connect().await?;
        let (req_sender, req_receiver) = mpsc::channel(PIPELINE_MAX_PENDING);
        let (pending_sender, pending_receiver) = mpsc::channel(PIPELINE_MAX_PENDING);
        let broken = CancellationToken::new();

        tokio::spawn(run_writer(
            c.writer,
            req_receiver,
            pending_sender,
            broken.clone(),
        ));
        tokio::spawn(run_reader(c.reader, pending_receiver, broken));

        Ok(PipelineConnection { req_sender })
    }

    fn is_closed(&self) -> bool {
        self.req_sender.is_closed()
    }
}

async fn run_writer(
    mut writer: BoxHttpWriter,
    mut req_receiver: mpsc::Receiver<(Vec<u8>, PendingResponse)>,
    pending_sender: mpsc::Sender<PendingResponse>,
    broken: CancellationToken,
) {
    loop {
        let (buf, pending) = tokio::select! {
            biased;

            _ = broken.cancelled() => break,
            r = req_receiver.recv() => match r {
                Some(v) => v,
                None => break,
            },
        };

        // the reader should know about the request before its response could arrive
        if pending_sender.send(pending).await.is_err() {
            break;
        }
        if let Err(e) = writer.write_all(&buf).await {
            debug!("pipeline write failed: {e}");
            broken.cancel();
            break;
        }
        // batch the queued requests into one flush
        if req_receiver.is_empty() {
            if let Err(e) = writer.flush().await {
                debug!("pipeline flush failed: {e}");
                broken.cancel();
                break;
            }
        }
    }
    broken.cancel();
    let _ = writer.shutdown().await;
}

async fn run_reader(
    mut reader: BufReader<BoxHttpReader>,
    mut pending_receiver: mpsc::Receiver<PendingResponse>,
    broken: CancellationToken,
) {
    loop {
        let pending = tokio::select! {
            biased;

            r = pending_receiver.recv() => match r {
                Some(v) => v,
                None => break,
            },
            _ = broken.cancelled() => break,
        };

        let r = tokio::select! {
            biased;

            r = recv_response(&mut reader, pending.is_head) => r,
            _ = broken.cancelled() => Err(TransportError::ConnectionClosed),
        };
        match r {
            Ok((code, reusable)) => {
                let _ = pending.sender.send(Ok(code));
                if !reusable {
                    break;
                }
            }
            Err(e) => {
                let _ = pending.sender.send(Err(e));
                break;
            }
        }
    }

    broken.cancel();
    pending_receiver.close();
    while let Some(pending) = pending_receiver.recv().await {
        let _ = pending.sender.send(Err(TransportError::ConnectionClosed));
    }
}

struct PipelineClient {
    prototype: Arc<RequestPrototype>,
    connector: HttpConnector,
    slots: Vec<Mutex<Option<PipelineConnection>>>,
    next_slot: AtomicUsize,
}

impl PipelineClient {
    async fn request_sender(
        &self,
    ) -> Result<mpsc::Sender<(Vec<u8>, PendingResponse)>, TransportError> {
        let i = self.next_slot.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut slot = self.slots[i].lock().await;
        if let Some(c) = slot.as_ref() {
            if !c.is_closed() {
                return Ok(c.req_sender.clone());
            }
        }

        *slot = None;
        let c = PipelineConnection::new(&self.connector).await?;
        let sender = c.req_sender.clone();
        *slot = Some(c);
        Ok(sender)
    }

    async fn run(&self) -> Result<u16, TransportError> {
        let req_sender = self.request_sender().await?;

        let mut buf = Vec::with_capacity(1024);
        self.prototype.encode(&mut buf);
        let (sender, receiver) = oneshot::channel();
        let pending = PendingResponse {
            is_head: self.prototype.is_head(),
            sender,
        };
        req_sender
            .send((buf, pending))
            .await
            .map_err(|_| TransportError::ConnectionClosed)?;

        match with_timeout(self.connector.timeout(), receiver).await {
            Some(Ok(r)) => r,
            Some(Err(_)) => Err(TransportError::ConnectionClosed),
            None => Err(TransportError::ReadTimedOut),
        }
    }
}

/// Requests are written back to back on a few shared connections.
pub struct PipelineTarget {
    client: Arc<PipelineClient>,
}

impl PipelineTarget {
    pub fn new(prototype: Arc<RequestPrototype>, connector: HttpConnector, connections: usize) -> Self {
        let slot_count = connections.div_ceil(PIPELINE_MAX_PENDING).max(1);
        let slots = (0..slot_count).map(|_| Mutex::new(None)).collect();
        PipelineTarget {
            client: Arc::new(PipelineClient {
                prototype,
                connector,
                slots,
                next_slot: AtomicUsize::new(0),
            }),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.client.slots.len()
    }
}

impl BenchTarget for PipelineTarget {
    type Context = PipelineTaskContext;

    fn new_context(&self) -> PipelineTaskContext {
        PipelineTaskContext {
            client: self.client.clone(),
        }
    }
}

pub struct PipelineTaskContext {
    client: Arc<PipelineClient>,
}

#[async_trait]
impl BenchTaskContext for PipelineTaskContext {
    async fn issue(&mut self) -> Outcome {
        let time_started = Instant::now();
        match self.client.run().await {
            Ok(status) => Outcome::Completed {
                status,
                latency: time_started.elapsed(),
            },
            Err(e) => Outcome::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use http::Method;

    use crate::client::RequestArgs;
    use crate::client::testing::{direct_connector, local_server, read_request_head};

    fn new_target(url: &url::Url, connections: usize) -> PipelineTarget {
        let prototype = Arc::new(RequestPrototype::new(&RequestArgs::new(
            Method::GET,
            url.clone(),
        )));
        PipelineTarget::new(
            prototype,
            direct_connector(url, Duration::from_secs(3)),
            connections,
        )
    }

    #[test]
    fn slot_count() {
        let url = url::Url::parse("http://127.0.0.1:80/").unwrap();
        assert_eq!(new_target(&url, 1).slot_count(), 1);
        assert_eq!(new_target(&url, 1024).slot_count(), 1);
        assert_eq!(new_target(&url, 1025).slot_count(), 2);
        assert_eq!(new_target(&url, 0).slot_count(), 1);
    }

    #[tokio::test]
    async fn pipelined_responses() {
        let (listener, url) = local_server().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            // both requests arrive before any response is sent
            read_request_head(&mut stream).await.unwrap();
            read_request_head(&mut stream).await.unwrap();
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\na\
                      HTTP/1.1 201 Created\r\nContent-Length: 1\r\n\r\nb",
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let target = new_target(&url, 2);
        let mut ctx1 = target.new_context();
        let mut ctx2 = target.new_context();
        let (o1, o2) = tokio::join!(ctx1.issue(), ctx2.issue());

        let mut codes = Vec::new();
        for o in [o1, o2] {
            let Outcome::Completed { status, .. } = o else {
                panic!("request should succeed");
            };
            codes.push(status);
        }
        codes.sort();
        assert_eq!(codes, [200, 201]);
    }

    #[tokio::test]
    async fn replace_broken_connection() {
        let (listener, url) = local_server().await;
        tokio::spawn(async move {
            // the first connection is closed without response
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            read_request_head(&mut stream).await.unwrap();
            drop(stream);

            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            while read_request_head(&mut stream).await.is_some() {
                stream
                    .write_all(b"HTTP/1.1 204 No Content\r\n\r\n")
                    .await
                    .unwrap();
            }
        });

        let target = new_target(&url, 1);
        let mut ctx = target.new_context();
        let Outcome::Failed(msg) = ctx.issue().await else {
            panic!("request should fail");
        };
        assert!(msg.contains("remote closed") || msg.contains("connection closed"));

        // wait for the broken connection to be torn down
        let mut outcome = ctx.issue().await;
        for _ in 0..10 {
            if matches!(outcome, Outcome::Completed { .. }) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            outcome = ctx.issue().await;
        }
        assert!(matches!(outcome, Outcome::Completed { status: 204, .. }));
    }
}
