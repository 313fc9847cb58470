/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

const RUSTLS_PROVIDER: &str = "ring";

pub fn user_agent() -> String {
    format!("{PKG_NAME}/{VERSION}")
}

pub fn print_version() {
    println!("{PKG_NAME} {VERSION}");
    println!("Rustls Provider: {RUSTLS_PROVIDER}");
}
