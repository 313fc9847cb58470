/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncBufRead, AsyncWrite};

use httpgo_types::{HttpAuth, UpstreamAddr};

use super::{HttpConnectError, HttpConnectRequest, HttpConnectResponse};

const CONNECT_RESPONSE_MAX_HEADER_SIZE: usize = 2048;

pub async fn http_connect_to<S>(
    buf_stream: &mut S,
    auth: &HttpAuth,
    addr: &UpstreamAddr,
) -> Result<(), HttpConnectError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    let mut req = HttpConnectRequest::new(addr);

    match auth {
        HttpAuth::None => {}
        HttpAuth::Basic(a) => {
            let line = crate::header::proxy_authorization_basic(a);
            req.append_dyn_header(line);
        }
    }

    req.send(buf_stream)
        .await
        .map_err(HttpConnectError::WriteFailed)?;

    let _ = HttpConnectResponse::recv(buf_stream, CONNECT_RESPONSE_MAX_HEADER_SIZE).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    use httpgo_types::HttpBasicAuth;

    #[tokio::test]
    async fn connect_with_auth() {
        let stream = Builder::new()
            .write(
                b"CONNECT 127.0.0.1:8080 HTTP/1.1\r\n\
                  Host: 127.0.0.1:8080\r\n\
                  Connection: keep-alive\r\n\
                  Proxy-Authorization: Basic YTpi\r\n\r\n",
            )
            .read(b"HTTP/1.1 200 Connection established\r\n\r\n")
            .build();
        let mut buf_stream = BufReader::new(stream);

        let addr = UpstreamAddr::from_str("127.0.0.1:8080").unwrap();
        let auth = HttpAuth::Basic(HttpBasicAuth::new("a", "b"));
        http_connect_to(&mut buf_stream, &auth, &addr).await.unwrap();
    }

    #[tokio::test]
    async fn connect_rejected() {
        let stream = Builder::new()
            .write(
                b"CONNECT example.com:443 HTTP/1.1\r\n\
                  Host: example.com:443\r\n\
                  Connection: keep-alive\r\n\r\n",
            )
            .read(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n")
            .build();
        let mut buf_stream = BufReader::new(stream);

        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        let err = http_connect_to(&mut buf_stream, &HttpAuth::None, &addr)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpConnectError::UnexpectedStatusCode(403, _)));
    }
}
