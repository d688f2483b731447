//! Sample instants and the timestamp formats used in reports.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::fmt::Write;
use tracing::warn;

/// Heading date used by the table and org renderers, e.g. `2024-Mar-05 14:07`.
pub const REPORT_DATE_FORMAT: &str = "%Y-%b-%d %H:%M";

/// Spacing between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUnit {
    Day,
    Hour,
}

impl StepUnit {
    pub fn duration(&self) -> Duration {
        match self {
            StepUnit::Day => Duration::days(1),
            StepUnit::Hour => Duration::hours(1),
        }
    }
}

/// A finite run of evenly spaced instants starting at `start`.
///
/// Cheap to copy; every call to [`TimeSeries::iter`] starts over from the
/// first instant. Construction fails when the last instant falls outside the
/// range chrono can represent, so iteration itself never overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeries {
    start: DateTime<Utc>,
    unit: StepUnit,
    count: usize,
}

impl TimeSeries {
    pub fn new(start: DateTime<Utc>, unit: StepUnit, count: usize) -> Option<Self> {
        let series = Self { start, unit, count };
        match count.checked_sub(1) {
            Some(last) => series.instant(last).map(|_| series),
            None => Some(series),
        }
    }

    /// Series of `count` samples whose last instant is `end`.
    pub fn ending_at(end: DateTime<Utc>, unit: StepUnit, count: usize) -> Option<Self> {
        let back = step_offset(unit, count.saturating_sub(1))?;
        let start = end.checked_sub_signed(back)?;
        Self::new(start, unit, count)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> TimeSeriesIter {
        TimeSeriesIter {
            series: *self,
            index: 0,
        }
    }

    fn instant(&self, index: usize) -> Option<DateTime<Utc>> {
        let offset = step_offset(self.unit, index)?;
        self.start.checked_add_signed(offset)
    }
}

fn step_offset(unit: StepUnit, steps: usize) -> Option<Duration> {
    let steps = i32::try_from(steps).ok()?;
    unit.duration().checked_mul(steps)
}

impl IntoIterator for TimeSeries {
    type Item = DateTime<Utc>;
    type IntoIter = TimeSeriesIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeriesIter {
    series: TimeSeries,
    index: usize,
}

impl Iterator for TimeSeriesIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.series.count {
            return None;
        }
        let current = self.series.instant(self.index)?;
        self.index += 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TimeSeriesIter {}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Human heading date. A formatting failure logs and falls back to the raw
/// ISO value instead of aborting the report.
pub fn format_report_date(at: DateTime<Utc>) -> String {
    let mut out = String::new();
    match write!(out, "{}", at.format(REPORT_DATE_FORMAT)) {
        Ok(()) => out,
        Err(e) => {
            warn!("Failed to format report date {}: {}", at, e);
            iso_timestamp(at)
        }
    }
}
