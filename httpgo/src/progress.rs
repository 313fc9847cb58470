/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;
use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::anyhow;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::stats::StatAggregator;

const REFRESH_HZ: u8 = 40;
const REFRESH_INTERVAL: Duration = Duration::from_millis(1000 / REFRESH_HZ as u64);
const BAR_LENGTH: u64 = 1000;
const BAR_TEMPLATE: &str = "{wide_bar:.cyan/blue} {percent:>3}%\n{msg}";

const PERCENTILES: &[u8] = &[50, 66, 75, 80, 90, 95, 98, 99, 100];

pub fn title(url: &str, connections: usize) -> String {
    format!("Benchmarking {url} with {connections} connections")
}

/// Live view of the run on stderr.
pub struct BenchProgress {
    aggregator: Arc<StatAggregator>,
    bar: ProgressBar,
}

impl BenchProgress {
    pub fn new(aggregator: Arc<StatAggregator>) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(BAR_LENGTH),
            ProgressDrawTarget::stderr_with_hz(REFRESH_HZ),
        );
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        BenchProgress { aggregator, bar }
    }

    fn refresh(&self) {
        let snapshot = self.aggregator.snapshot();
        self.bar
            .set_position((snapshot.progress * BAR_LENGTH as f64) as u64);
        let mut msg = String::with_capacity(512);
        snapshot.render(&mut msg, true);
        self.bar.set_message(msg);
    }

    /// Redraw until `quit` is set. The bar is cleared on return.
    pub fn spawn(self, quit: Arc<AtomicBool>) -> anyhow::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("progress-bar".to_string())
            .spawn(move || {
                loop {
                    self.refresh();
                    if quit.load(Ordering::Relaxed) {
                        break;
                    }
                    std::thread::sleep(REFRESH_INTERVAL);
                }
                self.bar.finish_and_clear();
            })
            .map_err(|e| anyhow!("failed to create progress bar thread: {e}"))
    }
}

/// Final statistics, the latency distribution and the end marker.
pub fn write_summary(aggregator: &StatAggregator, buf: &mut String, styled: bool) {
    let snapshot = aggregator.snapshot();
    snapshot.render(buf, styled);

    if let Some(values) = aggregator.latency_percentiles(PERCENTILES) {
        buf.push('\n');
        buf.push_str("Percentage of the requests served within a certain time\n");
        for (pct, v) in values {
            let _ = writeln!(buf, "{pct:4}% {v:8.3?}");
        }
    }

    if snapshot.hint().is_some() {
        buf.push('\n');
        snapshot.write_hint(buf, styled);
        buf.push('\n');
    }
}

pub fn print_summary(aggregator: &StatAggregator) {
    let mut buf = String::with_capacity(1024);
    write_summary(aggregator, &mut buf, std::io::stdout().is_terminal());
    print!("{buf}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use tokio_util::sync::CancellationToken;

    use crate::stats::{Outcome, StopMode, ThroughputCounter};

    fn new_aggregator(mode: StopMode) -> StatAggregator {
        StatAggregator::new(
            mode,
            CancellationToken::new(),
            Arc::new(ThroughputCounter::default()),
        )
    }

    #[test]
    fn title_line() {
        assert_eq!(
            title("http://localhost:3000/", 128),
            "Benchmarking http://localhost:3000/ with 128 connections"
        );
    }

    #[test]
    fn summary_done() {
        let aggregator = new_aggregator(StopMode::Count(2));
        let now = Instant::now();
        aggregator.start_at(now);
        for ms in [10, 20] {
            aggregator.record_at(
                Outcome::Completed {
                    status: 200,
                    latency: Duration::from_millis(ms),
                },
                now + Duration::from_millis(5),
            );
        }
        assert!(aggregator.is_done());

        let mut buf = String::new();
        write_summary(&aggregator, &mut buf, false);
        assert!(buf.contains("Percentage of the requests served within a certain time\n"));
        assert!(buf.contains("  50% "));
        assert!(buf.contains(" 100% "));
        assert!(buf.ends_with("\n Done! \n"));
    }

    #[test]
    fn summary_terminated_without_latency() {
        let aggregator = new_aggregator(StopMode::Duration(Duration::from_secs(10)));
        aggregator.record(Outcome::Failed("connection closed".to_string()));
        aggregator.terminate();

        let mut buf = String::new();
        write_summary(&aggregator, &mut buf, false);
        assert!(!buf.contains("Percentage"));
        assert!(buf.contains("connection closed: 1"));
        assert!(buf.ends_with("\n Terminated! \n"));
    }
}
