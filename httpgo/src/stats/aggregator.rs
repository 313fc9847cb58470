/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use log::debug;
use tokio_util::sync::CancellationToken;

use super::summary::RunningSummary;
use super::{CodeCounts, Outcome, Snapshot, ThroughputCounter, display_throughput};

/// Length of one rps sampling round.
pub const ROUND_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    Count(u64),
    Duration(Duration),
}

struct AggregatorInner {
    round_start: Instant,
    round_success: u64,
    done: bool,
    codes: CodeCounts,
    errors: BTreeMap<String, u64>,
    rps_summary: RunningSummary,
    latency_summary: RunningSummary,
    latency_histogram: Option<Histogram<u64>>,
}

impl AggregatorInner {
    fn new(now: Instant) -> Self {
        AggregatorInner {
            round_start: now,
            round_success: 0,
            done: false,
            codes: CodeCounts::default(),
            errors: BTreeMap::new(),
            rps_summary: RunningSummary::default(),
            latency_summary: RunningSummary::default(),
            latency_histogram: Histogram::new(3).ok(),
        }
    }

    fn add_latency(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_summary.add(micros as f64 / 1000.0);
        if let Some(h) = &mut self.latency_histogram {
            let _ = h.record(micros);
        }
    }

    fn add_rps(&mut self, round_elapsed: Duration) {
        let secs = round_elapsed.as_secs_f64();
        if secs > 0.0 {
            let rps = self.round_success as f64 / secs;
            self.rps_summary.add(rps);
        }
    }
}

/// Collects request outcomes from all workers and owns the stop decision.
pub struct StatAggregator {
    mode: StopMode,
    cancel: CancellationToken,
    throughput: Arc<ThroughputCounter>,
    success_count: AtomicU64,
    error_count: AtomicU64,
    elapsed_total_nanos: AtomicU64,
    terminated: AtomicBool,
    inner: Mutex<AggregatorInner>,
}

impl StatAggregator {
    pub fn new(
        mode: StopMode,
        cancel: CancellationToken,
        throughput: Arc<ThroughputCounter>,
    ) -> Self {
        StatAggregator {
            mode,
            cancel,
            throughput,
            success_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            elapsed_total_nanos: AtomicU64::new(0),
            terminated: AtomicBool::new(false),
            inner: Mutex::new(AggregatorInner::new(Instant::now())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[inline]
    pub fn mode(&self) -> StopMode {
        self.mode
    }

    #[inline]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Restart the current round, called when the workers are released.
    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    pub(crate) fn start_at(&self, now: Instant) {
        self.lock().round_start = now;
    }

    #[inline]
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn elapsed_total(&self) -> Duration {
        Duration::from_nanos(self.elapsed_total_nanos.load(Ordering::Relaxed))
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Relaxed)
    }

    /// Stop the run from outside, without reaching the stop condition.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Relaxed);
        self.cancel.cancel();
    }

    pub fn record(&self, outcome: Outcome) {
        self.record_at(outcome, Instant::now());
    }

    pub(crate) fn record_at(&self, outcome: Outcome, now: Instant) {
        let mut inner = self.lock();
        if inner.done {
            return;
        }

        match outcome {
            Outcome::Failed(msg) => {
                *inner.errors.entry(msg).or_default() += 1;
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Completed { status, latency } => {
                inner.round_success += 1;
                self.success_count.fetch_add(1, Ordering::Relaxed);
                inner.codes.add(status);
                inner.add_latency(latency);
            }
        }

        let round_elapsed = now.saturating_duration_since(inner.round_start);
        if let StopMode::Count(count) = self.mode
            && self.success_count() == count
        {
            inner.add_rps(round_elapsed);
            self.add_elapsed(round_elapsed);
            self.finish(&mut inner);
            return;
        }

        if round_elapsed >= ROUND_INTERVAL {
            inner.add_rps(round_elapsed);
            self.add_elapsed(round_elapsed);
            inner.round_start = now;
            inner.round_success = 0;
        }

        if let StopMode::Duration(duration) = self.mode
            && self.elapsed_total() >= duration
        {
            self.finish(&mut inner);
        }
    }

    fn add_elapsed(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn finish(&self, inner: &mut AggregatorInner) {
        inner.done = true;
        debug!(
            "stop condition reached after {} requests in {:?}",
            self.success_count(),
            self.elapsed_total()
        );
        self.cancel.cancel();
    }

    pub fn progress(&self) -> f64 {
        let p = match self.mode {
            StopMode::Count(count) if count > 0 => self.success_count() as f64 / count as f64,
            StopMode::Count(_) => 0.0,
            StopMode::Duration(d) if !d.is_zero() => {
                self.elapsed_total().as_secs_f64() / d.as_secs_f64()
            }
            StopMode::Duration(_) => 1.0,
        };
        p.min(1.0)
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        let elapsed = self.elapsed_total();
        let (count, duration) = match self.mode {
            StopMode::Count(c) => (Some(c), None),
            StopMode::Duration(d) => (None, Some(d)),
        };
        Snapshot {
            success: self.success_count(),
            failed: self.error_count(),
            count,
            duration,
            elapsed,
            throughput: display_throughput(self.throughput.bytes(), elapsed),
            rps: inner.rps_summary.stats(),
            latency: inner.latency_summary.stats(),
            codes: inner.codes,
            errors: inner
                .errors
                .iter()
                .map(|(msg, count)| (msg.clone(), *count))
                .collect(),
            progress: self.progress(),
            done: inner.done,
            terminated: self.is_terminated(),
        }
    }

    /// Latency values at the given percentiles.
    pub fn latency_percentiles(&self, percentiles: &[u8]) -> Option<Vec<(u8, Duration)>> {
        let inner = self.lock();
        let h = inner.latency_histogram.as_ref()?;
        if h.len() == 0 {
            return None;
        }
        Some(
            percentiles
                .iter()
                .map(|p| {
                    let v = h.value_at_percentile(f64::from(*p));
                    (*p, Duration::from_micros(v))
                })
                .collect(),
        )
    }
}
