/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, anyhow};
use http::Method;
use log::info;
use tokio::io::AsyncWriteExt;
use url::Url;

use httpgo_http::{HttpResponseHead, copy_body};
use httpgo_types::UpstreamAddr;

use super::{HttpConnector, RESPONSE_MAX_HEADER_SIZE, RequestArgs, RequestPrototype, TlsClient, TlsClientArgs};
use crate::dialer::{Dialer, with_timeout};
use crate::error::TransportError;

struct Exchange {
    host: String,
    peer: String,
    request: Vec<u8>,
    response: Vec<u8>,
    code: u16,
    location: Option<String>,
}

/// Sends exactly one request on a fresh connection and dumps the exchange.
pub struct DebugClient {
    args: RequestArgs,
    dialer: Dialer,
    tls_args: TlsClientArgs,
    timeout: Option<Duration>,
    max_redirects: usize,
}

impl DebugClient {
    /// `max_redirects` of 0 disables redirect following.
    pub fn new(
        mut args: RequestArgs,
        dialer: Dialer,
        tls_args: TlsClientArgs,
        timeout: Option<Duration>,
        max_redirects: usize,
    ) -> Self {
        args.keep_alive = false;
        DebugClient {
            args,
            dialer,
            tls_args,
            timeout,
            max_redirects,
        }
    }

    fn new_connector(&self, url: &Url) -> anyhow::Result<HttpConnector> {
        let target = UpstreamAddr::from_url(url)
            .map_err(|e| anyhow!("invalid target address in url {url}: {e}"))?;
        let tls = if url.scheme() == "https" {
            let client = TlsClient::new(&self.tls_args, &target.host_str())?;
            Some(client)
        } else {
            None
        };
        Ok(HttpConnector::new(
            self.dialer.clone(),
            target,
            tls,
            self.timeout,
        ))
    }

    async fn exchange(&self, args: &RequestArgs) -> anyhow::Result<Exchange> {
        let connector = self.new_connector(&args.url)?;
        let prototype = RequestPrototype::new(args);
        let mut connection = connector.connect().await?;

        let mut request = Vec::with_capacity(1024);
        prototype.encode(&mut request);
        connection
            .writer
            .write_all(&request)
            .await
            .map_err(TransportError::WriteFailed)?;
        connection
            .writer
            .flush()
            .await
            .map_err(TransportError::WriteFailed)?;

        let mut response = Vec::with_capacity(4096);
        let recv = async {
            let mut rsp = HttpResponseHead::parse_with_raw(
                &mut connection.reader,
                RESPONSE_MAX_HEADER_SIZE,
                &mut response,
            )
            .await?;
            while rsp.is_interim() {
                rsp = HttpResponseHead::parse_with_raw(
                    &mut connection.reader,
                    RESPONSE_MAX_HEADER_SIZE,
                    &mut response,
                )
                .await?;
            }
            if let Some(body_type) = rsp.body_type(prototype.is_head()) {
                copy_body(&mut connection.reader, body_type, &mut response)
                    .await
                    .map_err(TransportError::BodyReadFailed)?;
            }
            Ok::<_, TransportError>(rsp)
        };
        let rsp = with_timeout(connector.timeout(), recv)
            .await
            .ok_or(TransportError::ReadTimedOut)??;

        Ok(Exchange {
            host: args.host_header(),
            peer: connection
                .peer_addr
                .map(|a| a.to_string())
                .unwrap_or_default(),
            request,
            response,
            code: rsp.code,
            location: rsp.location().map(|s| s.to_string()),
        })
    }

    fn redirect_args(&self, args: &RequestArgs, code: u16, location: &str) -> anyhow::Result<RequestArgs> {
        let url = args
            .url
            .join(location)
            .map_err(|_| TransportError::InvalidRedirect(location.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            _ => return Err(TransportError::InvalidRedirect(location.to_string()).into()),
        }
        let switch_to_get = code == 303
            || (matches!(code, 301 | 302) && !matches!(args.method, Method::GET | Method::HEAD));
        Ok(args.redirect_to(url, switch_to_get))
    }

    /// Run the request, following redirects if enabled, and write the final
    /// exchange to `out`.
    pub async fn run<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let mut args = self.args.clone();
        let mut redirects = 0;

        let exchange = loop {
            let exchange = self
                .exchange(&args)
                .await
                .with_context(|| format!("request to {} failed", args.url))?;
            if self.max_redirects == 0 || !is_redirect(exchange.code) {
                break exchange;
            }
            let Some(location) = &exchange.location else {
                break exchange;
            };
            if redirects >= self.max_redirects {
                return Err(TransportError::TooManyRedirects.into());
            }
            redirects += 1;
            info!("redirect #{redirects} to {location}");
            args = self.redirect_args(&args, exchange.code, location)?;
        };

        write!(out, "Connected to {}({})\r\n\r\n", exchange.host, exchange.peer)?;
        out.write_all(&exchange.request)?;
        out.write_all(b"\n\n")?;
        out.write_all(&exchange.response)?;
        out.flush()?;
        Ok(())
    }
}

fn is_redirect(code: u16) -> bool {
    matches!(code, 301 | 302 | 303 | 307 | 308)
}
