/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub avg: f64,
    pub stdev: f64,
    pub max: f64,
}

/// Running mean and variance (Welford), so a snapshot does not rescan all samples.
#[derive(Default)]
pub(super) struct RunningSummary {
    count: u64,
    mean: f64,
    m2: f64,
    max: f64,
}

impl RunningSummary {
    pub(super) fn add(&mut self, v: f64) {
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
        if v > self.max {
            self.max = v;
        }
    }

    /// sample standard deviation, 0 for less than 2 samples
    pub(super) fn stats(&self) -> SampleStats {
        if self.count == 0 {
            return SampleStats::default();
        }
        let stdev = if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        };
        SampleStats {
            avg: self.mean,
            stdev,
            max: self.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let s = RunningSummary::default();
        assert_eq!(s.stats(), SampleStats::default());
    }

    #[test]
    fn single() {
        let mut s = RunningSummary::default();
        s.add(7.5);
        let stats = s.stats();
        assert_eq!(stats.avg, 7.5);
        assert_eq!(stats.stdev, 0.0);
        assert_eq!(stats.max, 7.5);
    }

    #[test]
    fn sample_stdev() {
        let mut s = RunningSummary::default();
        for v in [10.0, 20.0, 30.0] {
            s.add(v);
        }
        let stats = s.stats();
        assert!((stats.avg - 20.0).abs() < 1e-9);
        assert!((stats.stdev - 10.0).abs() < 1e-9);
        assert_eq!(stats.max, 30.0);
    }
}
