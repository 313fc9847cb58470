/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use http::HeaderMap;
use tokio::io::AsyncBufRead;

use super::HttpConnectError;
use crate::{HttpBodyType, HttpResponseHead, drain_body};

#[derive(Debug)]
pub struct HttpConnectResponse {
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
}

impl HttpConnectResponse {
    fn detect_error(&self) -> Result<(), HttpConnectError> {
        if (200..300).contains(&self.code) {
            Ok(())
        } else if self.code == 504 || self.code == 522 || self.code == 524 {
            // Peer tells us it timeout
            Err(HttpConnectError::PeerTimeout(self.code))
        } else {
            Err(HttpConnectError::UnexpectedStatusCode(
                self.code,
                self.reason.to_string(),
            ))
        }
    }

    pub async fn recv<R>(r: &mut R, max_header_size: usize) -> Result<Self, HttpConnectError>
    where
        R: AsyncBufRead + Unpin,
    {
        let head = HttpResponseHead::parse(r, max_header_size).await?;

        // a tunnel response only has a body if it is explicitly framed
        let body_type = if head.is_chunked() {
            Some(HttpBodyType::Chunked)
        } else {
            head.content_length()
                .filter(|size| *size > 0)
                .map(HttpBodyType::ContentLength)
        };
        if let Some(body_type) = body_type {
            drain_body(r, body_type)
                .await
                .map_err(HttpConnectError::ReadFailed)?;
        }

        let rsp = HttpConnectResponse {
            code: head.code,
            reason: head.reason,
            headers: head.headers,
        };
        rsp.detect_error()?;
        Ok(rsp)
    }
}
