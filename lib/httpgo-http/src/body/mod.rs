/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{HttpChunkedLine, read_line_limited};

const CHUNK_LINE_MAX_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpBodyType {
    ContentLength(u64),
    Chunked,
    ReadUntilEnd,
}

/// Copy the decoded body to `writer`, returning the body size.
pub async fn copy_body<R, W>(reader: &mut R, body_type: HttpBodyType, writer: &mut W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = match body_type {
        HttpBodyType::ContentLength(size) => copy_fixed(reader, size, writer).await?,
        HttpBodyType::Chunked => copy_chunked(reader, writer).await?,
        HttpBodyType::ReadUntilEnd => tokio::io::copy_buf(reader, writer).await?,
    };
    writer.flush().await?;
    Ok(copied)
}

/// Read out and discard the body.
pub async fn drain_body<R>(reader: &mut R, body_type: HttpBodyType) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut sink = tokio::io::sink();
    copy_body(reader, body_type, &mut sink).await
}

async fn copy_fixed<R, W>(reader: &mut R, size: u64, writer: &mut W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut limited = (&mut *reader).take(size);
    let nw = tokio::io::copy_buf(&mut limited, writer).await?;
    if nw < size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "reader closed while reading fixed length body",
        ));
    }
    Ok(nw)
}

async fn copy_chunked<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line_buf = Vec::with_capacity(64);
    let mut total = 0u64;

    loop {
        line_buf.clear();
        read_chunk_line(reader, &mut line_buf).await?;
        let chunk = HttpChunkedLine::parse(&line_buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if chunk.chunk_size == 0 {
            break;
        }

        total += copy_fixed(reader, chunk.chunk_size, writer).await?;

        line_buf.clear();
        read_chunk_line(reader, &mut line_buf).await?;
        if line_buf.as_slice() != b"\r\n" && line_buf.as_slice() != b"\n" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid chunk data end",
            ));
        }
    }

    // trailer
    loop {
        line_buf.clear();
        read_chunk_line(reader, &mut line_buf).await?;
        if line_buf.as_slice() == b"\r\n" || line_buf.as_slice() == b"\n" {
            return Ok(total);
        }
    }
}

async fn read_chunk_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (found, nr) = read_line_limited(reader, CHUNK_LINE_MAX_SIZE, buf).await?;
    if found {
        Ok(())
    } else if nr < CHUNK_LINE_MAX_SIZE {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "reader closed while reading chunk line",
        ))
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "too long chunk line",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn fixed_length() {
        let stream = Builder::new().read(b"Hello World!next").build();
        let mut reader = BufReader::new(stream);

        let mut out = Vec::new();
        let n = copy_body(&mut reader, HttpBodyType::ContentLength(12), &mut out)
            .await
            .unwrap();
        assert_eq!(n, 12);
        assert_eq!(out, b"Hello World!");
    }

    #[tokio::test]
    async fn fixed_length_short() {
        let stream = Builder::new().read(b"Short").build();
        let mut reader = BufReader::new(stream);

        let err = drain_body(&mut reader, HttpBodyType::ContentLength(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn chunked() {
        let stream = Builder::new()
            .read(b"5\r\nHello\r\n")
            .read(b"7; ext=1\r\n World!\r\n0\r\nX-Trailer: 1\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);

        let mut out = Vec::new();
        let n = copy_body(&mut reader, HttpBodyType::Chunked, &mut out)
            .await
            .unwrap();
        assert_eq!(n, 12);
        assert_eq!(out, b"Hello World!");
    }

    #[tokio::test]
    async fn chunked_invalid_end() {
        let stream = Builder::new().read(b"5\r\nHelloXX\r\n0\r\n\r\n").build();
        let mut reader = BufReader::new(stream);

        let err = drain_body(&mut reader, HttpBodyType::Chunked)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn read_until_end() {
        let stream = Builder::new().read(b"abc").read(b"def").build();
        let mut reader = BufReader::new(stream);

        let n = drain_body(&mut reader, HttpBodyType::ReadUntilEnd)
            .await
            .unwrap();
        assert_eq!(n, 6);
    }
}
