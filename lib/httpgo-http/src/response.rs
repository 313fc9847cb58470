/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue, Version};
use thiserror::Error;
use tokio::io::AsyncBufRead;

use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpStatusLine, read_line_limited};

#[derive(Debug, Error)]
pub enum HttpResponseError {
    #[error("remote closed")]
    RemoteClosed,
    #[error("read failed: {0}")]
    ReadFailed(io::Error),
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid status line: {0}")]
    InvalidStatusLine(HttpLineParseError),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("invalid chunked transfer-encoding")]
    InvalidChunkedTransferEncoding,
    #[error("invalid content length")]
    InvalidContentLength,
}

#[derive(Debug)]
pub struct HttpResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    content_length: Option<u64>,
    chunked_transfer: bool,
    keep_alive: bool,
}

impl HttpResponseHead {
    fn new(version: Version, code: u16, reason: String) -> Self {
        HttpResponseHead {
            version,
            code,
            reason,
            headers: HeaderMap::new(),
            content_length: None,
            chunked_transfer: false,
            keep_alive: version != Version::HTTP_10,
        }
    }

    pub async fn parse<R>(reader: &mut R, max_header_size: usize) -> Result<Self, HttpResponseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        HttpResponseHead::parse_lines(reader, max_header_size, &mut line_buf, false).await
    }

    /// Parse the response head and keep all the received header bytes in `raw`
    pub async fn parse_with_raw<R>(
        reader: &mut R,
        max_header_size: usize,
        raw: &mut Vec<u8>,
    ) -> Result<Self, HttpResponseError>
    where
        R: AsyncBufRead + Unpin,
    {
        HttpResponseHead::parse_lines(reader, max_header_size, raw, true).await
    }

    async fn parse_lines<R>(
        reader: &mut R,
        max_header_size: usize,
        buf: &mut Vec<u8>,
        keep_raw: bool,
    ) -> Result<Self, HttpResponseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut header_size: usize = 0;

        let mut line_start = buf.len();
        let (found, nr) = read_line_limited(reader, max_header_size, buf)
            .await
            .map_err(HttpResponseError::ReadFailed)?;
        if nr == 0 {
            return Err(HttpResponseError::RemoteClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpResponseError::RemoteClosed)
            } else {
                Err(HttpResponseError::TooLargeHeader(max_header_size))
            };
        }
        header_size += nr;

        let status =
            HttpStatusLine::parse(&buf[line_start..]).map_err(HttpResponseError::InvalidStatusLine)?;
        let mut rsp = HttpResponseHead::new(status.version, status.code, status.reason.to_string());

        loop {
            if header_size >= max_header_size {
                return Err(HttpResponseError::TooLargeHeader(max_header_size));
            }
            if !keep_raw {
                buf.clear();
            }
            line_start = buf.len();
            let max_len = max_header_size - header_size;
            let (found, nr) = read_line_limited(reader, max_len, buf)
                .await
                .map_err(HttpResponseError::ReadFailed)?;
            if nr == 0 {
                return Err(HttpResponseError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpResponseError::RemoteClosed)
                } else {
                    Err(HttpResponseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;

            let line = &buf[line_start..];
            if line == b"\n" || line == b"\r\n" {
                // header end line
                break;
            }

            let header =
                HttpHeaderLine::parse(line).map_err(HttpResponseError::InvalidHeaderLine)?;
            rsp.handle_header(header)?;
        }

        Ok(rsp)
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpResponseError> {
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpResponseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "connection" => {
                let v = header.value.to_ascii_lowercase();
                if v.contains("close") {
                    self.keep_alive = false;
                } else if v.contains("keep-alive") {
                    self.keep_alive = true;
                }
            }
            "transfer-encoding" => {
                // content-length is ignored if transfer-encoding is present
                self.content_length = None;

                let v = header.value.to_ascii_lowercase();
                if v.ends_with("chunked") {
                    self.chunked_transfer = true;
                } else if v.contains("chunked") {
                    return Err(HttpResponseError::InvalidChunkedTransferEncoding);
                }
            }
            "content-length" => {
                if self.chunked_transfer {
                    return Ok(());
                }

                let content_length = u64::from_str(header.value)
                    .map_err(|_| HttpResponseError::InvalidContentLength)?;
                if let Some(old) = self.content_length
                    && old != content_length
                {
                    return Err(HttpResponseError::InvalidContentLength);
                }
                self.content_length = Some(content_length);
            }
            _ => {}
        }

        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpResponseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.chunked_transfer
    }

    /// Whether the server allows the connection to be reused, regardless of the body framing
    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// An informational response that will be followed by the final one
    #[inline]
    pub fn is_interim(&self) -> bool {
        matches!(self.code, 100..=199) && self.code != 101
    }

    /// The body framing of this response, or None if it has no body
    pub fn body_type(&self, is_head_request: bool) -> Option<HttpBodyType> {
        if is_head_request {
            return None;
        }
        match self.code {
            100..=199 | 204 | 304 => return None,
            _ => {}
        }
        if self.chunked_transfer {
            Some(HttpBodyType::Chunked)
        } else if let Some(size) = self.content_length {
            if size > 0 {
                Some(HttpBodyType::ContentLength(size))
            } else {
                None
            }
        } else {
            Some(HttpBodyType::ReadUntilEnd)
        }
    }

    /// Whether the connection can be used for the next request after this body is read
    pub fn reusable(&self, is_head_request: bool) -> bool {
        self.keep_alive && self.body_type(is_head_request) != Some(HttpBodyType::ReadUntilEnd)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn parse_content_length() {
        let data = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\nHello World!";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert_eq!(rsp.code, 200);
        assert_eq!(rsp.reason, "OK");
        assert_eq!(rsp.content_length(), Some(12));
        assert_eq!(rsp.body_type(false), Some(HttpBodyType::ContentLength(12)));
        assert_eq!(rsp.body_type(true), None);
        assert!(rsp.reusable(false));
        assert_eq!(rsp.headers.get("content-type").unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn parse_chunked_overrides_length() {
        let data =
            b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\nTransfer-Encoding: chunked\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert!(rsp.is_chunked());
        assert_eq!(rsp.content_length(), None);
        assert_eq!(rsp.body_type(false), Some(HttpBodyType::Chunked));
    }

    #[tokio::test]
    async fn parse_connection_close() {
        let data = b"HTTP/1.1 404 Not Found\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert_eq!(rsp.code, 404);
        assert!(!rsp.keep_alive());
        assert_eq!(rsp.body_type(false), None);
    }

    #[tokio::test]
    async fn parse_http10() {
        let data = b"HTTP/1.0 200 OK\r\n\r\nbody";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert!(!rsp.keep_alive());
        assert_eq!(rsp.body_type(false), Some(HttpBodyType::ReadUntilEnd));
        assert!(!rsp.reusable(false));
    }

    #[tokio::test]
    async fn parse_no_body_codes() {
        let data = b"HTTP/1.1 304 Not Modified\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert_eq!(rsp.body_type(false), None);
        assert!(rsp.reusable(false));
    }

    #[tokio::test]
    async fn parse_interim() {
        let data = b"HTTP/1.1 103 Early Hints\r\nLink: </style.css>\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert!(rsp.is_interim());
        assert_eq!(rsp.body_type(false), None);

        let data = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let rsp = HttpResponseHead::parse(&mut reader, 4096).await.unwrap();
        assert!(!rsp.is_interim());
    }

    #[tokio::test]
    async fn parse_with_raw() {
        let data = b"HTTP/1.1 301 Moved\r\nLocation: /next\r\n\r\n";
        let stream = Builder::new().read(data).build();
        let mut reader = BufReader::new(stream);

        let mut raw = Vec::new();
        let rsp = HttpResponseHead::parse_with_raw(&mut reader, 4096, &mut raw)
            .await
            .unwrap();
        assert_eq!(rsp.location(), Some("/next"));
        assert_eq!(raw.as_slice(), data.as_slice());
    }

    #[tokio::test]
    async fn parse_remote_closed() {
        let stream = Builder::new().build();
        let mut reader = BufReader::new(stream);

        let err = HttpResponseHead::parse(&mut reader, 4096).await.unwrap_err();
        assert!(matches!(err, HttpResponseError::RemoteClosed));

        let stream = Builder::new().read(b"HTTP/1.1 200 OK\r\nServer: x").build();
        let mut reader = BufReader::new(stream);
        let err = HttpResponseHead::parse(&mut reader, 4096).await.unwrap_err();
        assert!(matches!(err, HttpResponseError::RemoteClosed));
    }

    #[tokio::test]
    async fn parse_too_large_header() {
        let mut data = b"HTTP/1.1 200 OK\r\nVery-Long-Header: ".to_vec();
        data.resize(2048, b'a');
        let stream = Builder::new().read(&data).build();
        let mut reader = BufReader::new(stream);

        let err = HttpResponseHead::parse(&mut reader, 100).await.unwrap_err();
        assert!(matches!(err, HttpResponseError::TooLargeHeader(100)));
    }

    #[tokio::test]
    async fn parse_invalid_lines() {
        let stream = Builder::new()
            .read(b"INVALID STATUS LINE\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let err = HttpResponseHead::parse(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpResponseError::InvalidStatusLine(_)));

        let stream = Builder::new()
            .read(b"HTTP/1.1 200 OK\r\nInvalid Header Without Colon\r\n\r\n")
            .build();
        let mut reader = BufReader::new(stream);
        let err = HttpResponseHead::parse(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpResponseError::InvalidHeaderLine(_)));
    }
}
