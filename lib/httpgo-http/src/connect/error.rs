/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::HttpResponseError;

#[derive(Debug, Error)]
pub enum HttpConnectError {
    #[error("remote closed")]
    RemoteClosed,
    #[error("read failed: {0}")]
    ReadFailed(io::Error),
    #[error("write failed: {0}")]
    WriteFailed(io::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(HttpResponseError),
    #[error("unexpected status code {0} {1}")]
    UnexpectedStatusCode(u16, String),
    #[error("peer timeout with status code {0}")]
    PeerTimeout(u16),
}

impl From<HttpResponseError> for HttpConnectError {
    fn from(e: HttpResponseError) -> Self {
        match e {
            HttpResponseError::RemoteClosed => HttpConnectError::RemoteClosed,
            HttpResponseError::ReadFailed(e) => HttpConnectError::ReadFailed(e),
            e => HttpConnectError::InvalidResponse(e),
        }
    }
}
