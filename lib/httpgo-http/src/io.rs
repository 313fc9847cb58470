/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read until `\n` or `max_len` bytes, whichever comes first.
///
/// Returns whether the delimiter was found and how many bytes were appended.
/// A zero length result means the reader reached EOF.
pub async fn read_line_limited<R>(
    reader: &mut R,
    max_len: usize,
    buf: &mut Vec<u8>,
) -> io::Result<(bool, usize)>
where
    R: AsyncBufRead + Unpin,
{
    let mut nr = 0usize;
    loop {
        if nr >= max_len {
            return Ok((false, nr));
        }
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok((false, nr));
        }

        let limit = available.len().min(max_len - nr);
        let chunk = &available[..limit];
        if let Some(i) = memchr::memchr(b'\n', chunk) {
            buf.extend_from_slice(&chunk[..=i]);
            reader.consume(i + 1);
            return Ok((true, nr + i + 1));
        }
        buf.extend_from_slice(chunk);
        reader.consume(limit);
        nr += limit;
    }
}
