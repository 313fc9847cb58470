/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::time::Duration;

mod throughput;
pub(crate) use throughput::display_throughput;
pub use throughput::{ArcReaderStats, ReaderStats, ThroughputCounter, format_throughput};

mod summary;
pub use summary::SampleStats;

mod snapshot;
pub use snapshot::{CodeCounts, Snapshot};

mod aggregator;
pub use aggregator::{ROUND_INTERVAL, StatAggregator, StopMode};

/// Result of one request attempt.
#[derive(Debug)]
pub enum Outcome {
    Completed { status: u16, latency: Duration },
    Failed(String),
}

impl Outcome {
    pub fn failed<E: fmt::Display>(e: E) -> Self {
        Outcome::Failed(e.to_string())
    }
}
