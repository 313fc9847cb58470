/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod io;
pub use io::read_line_limited;

mod parse;
pub use parse::{HttpChunkedLine, HttpHeaderLine, HttpLineParseError, HttpStatusLine};

mod body;
pub use body::{HttpBodyType, copy_body, drain_body};

mod response;
pub use response::{HttpResponseError, HttpResponseHead};

pub mod connect;
pub mod header;
