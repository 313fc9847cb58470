/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use httpgo_types::HttpBasicAuth;

pub fn proxy_authorization_basic(auth: &HttpBasicAuth) -> String {
    format!("Proxy-Authorization: Basic {}\r\n", auth.encoded_value())
}
