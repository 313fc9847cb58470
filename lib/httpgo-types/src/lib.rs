/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::{AddrParseError, AuthParseError, ConnectError};

mod host;
pub use host::Host;

mod upstream;
pub use upstream::UpstreamAddr;

mod auth;
pub use auth::{HttpAuth, HttpBasicAuth};
