/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, header};
use url::Url;

use super::ReusePool;

const STREAM_CHUNK_SIZE: usize = 16 * 1024;

/// Settings used to render a [`RequestPrototype`].
#[derive(Clone, Debug)]
pub struct RequestArgs {
    pub method: Method,
    pub url: Url,
    /// Overrides the Host header only
    pub host: Option<String>,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub keep_alive: bool,
    pub content_type: Option<&'static str>,
    pub body: Bytes,
    pub stream: bool,
}

impl RequestArgs {
    pub fn new(method: Method, url: Url) -> Self {
        RequestArgs {
            method,
            url,
            host: None,
            headers: Vec::new(),
            keep_alive: true,
            content_type: None,
            body: Bytes::new(),
            stream: false,
        }
    }

    /// The request to send when following a redirect to `url`.
    pub(crate) fn redirect_to(&self, url: Url, switch_to_get: bool) -> Self {
        let mut args = self.clone();
        args.url = url;
        // the override only applies to the first request
        args.host = None;
        if switch_to_get {
            args.method = Method::GET;
            args.body = Bytes::new();
            args.stream = false;
            args.content_type = None;
            args.headers.retain(|(name, _)| name != header::CONTENT_TYPE);
        }
        args
    }

    pub(crate) fn host_header(&self) -> String {
        if let Some(host) = &self.host {
            return host.clone();
        }
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Immutable request template shared by all workers.
pub struct RequestPrototype {
    method: Method,
    url: Url,
    head: Vec<u8>,
    body: Bytes,
    stream_pool: Option<ReusePool<Cursor<Bytes>>>,
}

impl RequestPrototype {
    pub fn new(args: &RequestArgs) -> Self {
        let mut head = Vec::with_capacity(512);
        // writing to a Vec never fails
        let _ = Self::write_head(args, &mut head);

        let stream_pool = if args.stream {
            let body = args.body.clone();
            Some(ReusePool::new(
                move || Cursor::new(body.clone()),
                |c: &mut Cursor<Bytes>| c.set_position(0),
            ))
        } else {
            None
        };

        RequestPrototype {
            method: args.method.clone(),
            url: args.url.clone(),
            head,
            body: args.body.clone(),
            stream_pool,
        }
    }

    fn write_head<W: Write>(args: &RequestArgs, buf: &mut W) -> std::io::Result<()> {
        write!(buf, "{} {}", args.method, args.url.path())?;
        if let Some(q) = args.url.query() {
            write!(buf, "?{q}")?;
        }
        buf.write_all(b" HTTP/1.1\r\n")?;

        let user_host = args
            .headers
            .iter()
            .find(|(name, _)| name == header::HOST)
            .map(|(_, v)| v.as_bytes());
        match (&args.host, user_host) {
            (None, Some(v)) => {
                buf.write_all(b"Host: ")?;
                buf.write_all(v)?;
                buf.write_all(b"\r\n")?;
            }
            _ => write!(buf, "Host: {}\r\n", args.host_header())?,
        }

        if !args.headers.iter().any(|(name, _)| name == header::USER_AGENT) {
            write!(buf, "User-Agent: {}\r\n", crate::build::user_agent())?;
        }

        for (name, value) in &args.headers {
            let skip = name == header::HOST
                || name == header::CONTENT_LENGTH
                || name == header::TRANSFER_ENCODING
                || (name == header::CONNECTION && !args.keep_alive)
                || (name == header::CONTENT_TYPE && args.content_type.is_some());
            if skip {
                continue;
            }
            buf.write_all(name.as_str().as_bytes())?;
            buf.write_all(b": ")?;
            buf.write_all(value.as_bytes())?;
            buf.write_all(b"\r\n")?;
        }

        if !args.keep_alive {
            buf.write_all(b"Connection: close\r\n")?;
        }
        if let Some(content_type) = args.content_type {
            write!(buf, "Content-Type: {content_type}\r\n")?;
        }

        if args.stream {
            buf.write_all(b"Transfer-Encoding: chunked\r\n")?;
        } else if !args.body.is_empty()
            || matches!(args.method, Method::POST | Method::PUT | Method::PATCH)
        {
            write!(buf, "Content-Length: {}\r\n", args.body.len())?;
        }

        buf.write_all(b"\r\n")
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[inline]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Append the full request bytes to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.head);

        let Some(pool) = &self.stream_pool else {
            buf.extend_from_slice(&self.body);
            return;
        };

        let mut body = pool.acquire();
        let mut chunk = [0u8; STREAM_CHUNK_SIZE];
        loop {
            // reading from memory
            let nr = body.read(&mut chunk).unwrap_or(0);
            if nr == 0 {
                break;
            }
            buf.extend_from_slice(format!("{nr:x}\r\n").as_bytes());
            buf.extend_from_slice(&chunk[..nr]);
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"0\r\n\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(args: &RequestArgs) -> String {
        let mut buf = Vec::new();
        RequestPrototype::new(args).encode(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    fn ua_line() -> String {
        format!("User-Agent: {}\r\n", crate::build::user_agent())
    }

    #[test]
    fn simple_get() {
        let url = Url::parse("http://localhost:3000/foo?a=1").unwrap();
        let args = RequestArgs::new(Method::GET, url);
        assert_eq!(
            encoded(&args),
            format!(
                "GET /foo?a=1 HTTP/1.1\r\nHost: localhost:3000\r\n{}\r\n",
                ua_line()
            )
        );
    }

    #[test]
    fn host_override_and_headers() {
        let url = Url::parse("https://127.0.0.1/").unwrap();
        let mut args = RequestArgs::new(Method::POST, url);
        args.host = Some("example.com".to_string());
        args.keep_alive = false;
        args.content_type = Some("application/json");
        args.body = Bytes::from_static(b"{\"a\":1}");
        args.headers = vec![
            (
                HeaderName::from_static("x-id"),
                HeaderValue::from_static("1"),
            ),
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain")),
        ];
        assert_eq!(
            encoded(&args),
            format!(
                "POST / HTTP/1.1\r\nHost: example.com\r\n{}x-id: 1\r\n\
                 Connection: close\r\nContent-Type: application/json\r\n\
                 Content-Length: 7\r\n\r\n{{\"a\":1}}",
                ua_line()
            )
        );
    }

    #[test]
    fn empty_post() {
        let url = Url::parse("http://localhost/").unwrap();
        let args = RequestArgs::new(Method::POST, url);
        assert!(encoded(&args).ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn streaming_body() {
        let url = Url::parse("http://localhost/upload").unwrap();
        let mut args = RequestArgs::new(Method::PUT, url);
        args.stream = true;
        args.body = Bytes::from_static(b"hello");

        let prototype = RequestPrototype::new(&args);
        for _ in 0..2 {
            let mut buf = Vec::new();
            prototype.encode(&mut buf);
            let s = String::from_utf8(buf).unwrap();
            assert!(s.contains("Transfer-Encoding: chunked\r\n"));
            assert!(!s.contains("Content-Length"));
            assert!(s.ends_with("\r\n\r\n5\r\nhello\r\n0\r\n\r\n"));
        }
    }

    #[test]
    fn redirect_switch_to_get() {
        let url = Url::parse("http://localhost/form").unwrap();
        let mut args = RequestArgs::new(Method::POST, url);
        args.host = Some("example.com".to_string());
        args.content_type = Some("application/x-www-form-urlencoded");
        args.body = Bytes::from_static(b"a=1");

        let next = Url::parse("http://localhost/done").unwrap();
        let r = args.redirect_to(next, true);
        assert_eq!(r.method, Method::GET);
        assert!(r.body.is_empty());
        assert!(r.content_type.is_none());
        assert_eq!(r.host_header(), "localhost");
    }
}
