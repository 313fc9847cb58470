/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub trait ReaderStats {
    fn add_read_bytes(&self, size: usize);
}
pub type ArcReaderStats = Arc<dyn ReaderStats + Send + Sync>;

/// Received bytes over all connections of the run.
#[derive(Default)]
pub struct ThroughputCounter {
    bytes: AtomicU64,
}

impl ThroughputCounter {
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl ReaderStats for ThroughputCounter {
    fn add_read_bytes(&self, size: usize) {
        self.bytes.fetch_add(size as u64, Ordering::Relaxed);
    }
}

pub fn format_throughput(bytes_per_sec: f64) -> (f64, &'static str) {
    if bytes_per_sec < 1e3 {
        (bytes_per_sec, "B/s")
    } else if bytes_per_sec < 1e6 {
        (bytes_per_sec / 1e3, "KB/s")
    } else if bytes_per_sec < 1e9 {
        (bytes_per_sec / 1e6, "MB/s")
    } else {
        (bytes_per_sec / 1e9, "GB/s")
    }
}

pub(crate) fn display_throughput(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return "0 B/s".to_string();
    }
    let (v, unit) = format_throughput(bytes as f64 / secs);
    format!("{v:.2} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        let one_sec = Duration::from_secs(1);
        assert_eq!(display_throughput(500, one_sec), "500.00 B/s");
        assert_eq!(display_throughput(1500, one_sec), "1.50 KB/s");
        assert_eq!(display_throughput(2_500_000, one_sec), "2.50 MB/s");
        assert_eq!(display_throughput(3_000_000_000, one_sec), "3.00 GB/s");
    }

    #[test]
    fn zero_elapsed() {
        assert_eq!(display_throughput(12345, Duration::ZERO), "0 B/s");
    }

    #[test]
    fn counter() {
        let counter = Arc::new(ThroughputCounter::default());
        let stats: ArcReaderStats = counter.clone();
        stats.add_read_bytes(100);
        stats.add_read_bytes(65);
        assert_eq!(counter.bytes(), 165);
    }
}
