/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpStream;

use httpgo_types::{Host, UpstreamAddr};

pub(super) async fn connect_tcp(addr: &UpstreamAddr) -> io::Result<TcpStream> {
    let stream = match addr.host() {
        Host::Ip(ip) => TcpStream::connect(SocketAddr::new(*ip, addr.port())).await?,
        Host::Domain(domain) => TcpStream::connect((domain.as_str(), addr.port())).await?,
    };
    stream.set_nodelay(true)?;
    Ok(stream)
}
