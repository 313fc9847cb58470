/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod progress;

pub mod build;
pub mod client;
pub mod dialer;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod log;
pub mod opts;
pub mod stats;
