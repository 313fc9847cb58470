/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;
use std::time::Duration;

use anstyle::{Color, RgbColor, Style};

use super::SampleStats;

const FIELD_WIDTH: usize = 18;
const LABEL_WIDTH: usize = 12;

const fn fg(r: u8, g: u8, b: u8) -> Style {
    Style::new().fg_color(Some(Color::Rgb(RgbColor(r, g, b))))
}

const fn bg(r: u8, g: u8, b: u8) -> Style {
    Style::new().bg_color(Some(Color::Rgb(RgbColor(r, g, b))))
}

const STYLE_1XX: Style = fg(0xff, 0xaf, 0x00);
const STYLE_2XX: Style = fg(0x00, 0xff, 0x00);
const STYLE_3XX: Style = fg(0xff, 0xff, 0x00);
const STYLE_4XX: Style = fg(0xff, 0x87, 0x00);
const STYLE_5XX: Style = fg(0x87, 0x00, 0x00);
const STYLE_OTHERS: Style = fg(0x44, 0x44, 0x44);
const STYLE_DONE: Style = bg(0x00, 0x87, 0x00);
const STYLE_TERMINATED: Style = bg(0x87, 0x00, 0x00);

/// Non-zero counts are coloured when `styled` is set.
fn write_count(buf: &mut String, v: u64, style: Style, styled: bool) {
    if styled && v > 0 {
        let _ = write!(buf, "{}{v}{}", style.render(), style.render_reset());
    } else {
        let _ = write!(buf, "{v}");
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CodeCounts {
    pub code_1xx: u64,
    pub code_2xx: u64,
    pub code_3xx: u64,
    pub code_4xx: u64,
    pub code_5xx: u64,
    pub others: u64,
}

impl CodeCounts {
    pub(super) fn add(&mut self, code: u16) {
        match code / 100 {
            1 => self.code_1xx += 1,
            2 => self.code_2xx += 1,
            3 => self.code_3xx += 1,
            4 => self.code_4xx += 1,
            5 => self.code_5xx += 1,
            _ => self.others += 1,
        }
    }
}

/// Point-in-time view of the aggregated statistics.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub success: u64,
    pub failed: u64,
    pub count: Option<u64>,
    pub duration: Option<Duration>,
    pub elapsed: Duration,
    pub throughput: String,
    pub rps: SampleStats,
    /// in milliseconds
    pub latency: SampleStats,
    pub codes: CodeCounts,
    pub errors: Vec<(String, u64)>,
    pub progress: f64,
    pub done: bool,
    pub terminated: bool,
}

impl Snapshot {
    /// Write the statistics as text, with ANSI colours if `styled`.
    pub fn render(&self, buf: &mut String, styled: bool) {
        self.write_requests(buf);
        self.write_elapsed(buf);
        let _ = writeln!(buf, "Throughput:  {}", self.throughput);
        self.write_statistics(buf);
        self.write_codes(buf, styled);
        self.write_errors(buf);
    }

    pub fn hint(&self) -> Option<&'static str> {
        if self.done {
            Some(" Done! ")
        } else if self.terminated {
            Some(" Terminated! ")
        } else {
            None
        }
    }

    pub fn write_hint(&self, buf: &mut String, styled: bool) {
        let Some(hint) = self.hint() else {
            return;
        };
        if styled {
            let style = if self.done {
                STYLE_DONE
            } else {
                STYLE_TERMINATED
            };
            let _ = write!(buf, "{}{hint}{}", style.render(), style.render_reset());
        } else {
            buf.push_str(hint);
        }
    }

    fn write_requests(&self, buf: &mut String) {
        let _ = write!(buf, "Requests:  {}", self.success);
        if let Some(count) = self.count {
            let _ = write!(buf, "/{count}");
        }
        buf.push_str("  ");
    }

    fn write_elapsed(&self, buf: &mut String) {
        let mut elapsed = self.elapsed;
        if let Some(duration) = self.duration {
            elapsed = elapsed.min(duration);
        }
        let _ = write!(buf, "Elapsed:  {:.2}", elapsed.as_secs_f64());
        if let Some(duration) = self.duration {
            let _ = write!(buf, "/{:.2}", duration.as_secs_f64());
        }
        buf.push_str("s  ");
    }

    fn write_statistics(&self, buf: &mut String) {
        let _ = writeln!(
            buf,
            "{:^LABEL_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}",
            "Statistics", "Avg", "Stdev", "Max"
        );
        let _ = writeln!(
            buf,
            "{:^LABEL_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}",
            "Reqs/sec",
            format!("{:.2}", self.rps.avg),
            format!("{:.2}", self.rps.stdev),
            format!("{:.2}", self.rps.max),
        );
        let _ = writeln!(
            buf,
            "{:^LABEL_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}{:^FIELD_WIDTH$}",
            "Latency",
            format!("{:.2}ms", self.latency.avg),
            format!("{:.2}ms", self.latency.stdev),
            format!("{:.2}ms", self.latency.max),
        );
    }

    fn write_codes(&self, buf: &mut String, styled: bool) {
        let c = &self.codes;
        buf.push_str("HTTP codes:\n  1xx - ");
        write_count(buf, c.code_1xx, STYLE_1XX, styled);
        buf.push_str(", 2xx - ");
        write_count(buf, c.code_2xx, STYLE_2XX, styled);
        buf.push_str(", 3xx - ");
        write_count(buf, c.code_3xx, STYLE_3XX, styled);
        buf.push_str(", 4xx - ");
        write_count(buf, c.code_4xx, STYLE_4XX, styled);
        buf.push_str(", 5xx - ");
        write_count(buf, c.code_5xx, STYLE_5XX, styled);
        buf.push_str("\n  Others - ");
        write_count(buf, c.others, STYLE_OTHERS, styled);
        buf.push('\n');
    }

    fn write_errors(&self, buf: &mut String) {
        if self.errors.is_empty() {
            return;
        }
        buf.push_str("Errors:\n");
        for (msg, count) in &self.errors {
            let _ = writeln!(buf, "  {msg}: {count}");
        }
    }
}
