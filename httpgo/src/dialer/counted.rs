/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, IoSlice};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::stats::ArcReaderStats;

pin_project! {
    /// Adds every byte read from the inner stream to the shared stats.
    pub struct CountedStream<S> {
        #[pin]
        inner: S,
        stats: ArcReaderStats,
    }
}

impl<S> CountedStream<S> {
    pub fn new(inner: S, stats: ArcReaderStats) -> Self {
        CountedStream { inner, stats }
    }

    #[inline]
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead> AsyncRead for CountedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let old_filled_len = buf.filled().len();
        ready!(this.inner.poll_read(cx, buf))?;
        let nr = buf.filled().len() - old_filled_len;
        this.stats.add_read_bytes(nr);
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite> AsyncWrite for CountedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().inner.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        self.project().inner.poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_test::io::Builder;

    use crate::stats::ThroughputCounter;

    #[tokio::test]
    async fn count_read_only() {
        let counter = Arc::new(ThroughputCounter::default());
        let mock = Builder::new()
            .write(b"GET")
            .read(b"HTTP/1.1")
            .read(b" 200")
            .build();
        let mut stream = CountedStream::new(mock, counter.clone());

        stream.write_all(b"GET").await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"HTTP/1.1 200");
        assert_eq!(counter.bytes(), 12);
    }
}
