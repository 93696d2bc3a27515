//! Sampling granularity.
//!
//! The granularity of a dataset is the smallest common time step at
//! which its maps align, e.g. "1 month". Relative-time datasets use a
//! plain numeric step.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::extent::TemporalExtent;
use crate::time::TimeStamp;

/// Calendar unit of an absolute granularity, coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Month => "month",
            TimeUnit::Week => "week",
            TimeUnit::Day => "day",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
        }
    }
}

/// Smallest common time step of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Absolute { step: i64, unit: TimeUnit },
    Relative { step: i64 },
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a.max(1)
}

impl Granularity {
    /// Common granularity of two datasets: the coarsest step at which
    /// both align. Same calendar unit reduces to the gcd of the steps;
    /// differing units fall back to one of the finer unit.
    ///
    /// Returns `None` when absolute and relative granularities meet,
    /// which is a planning error upstream.
    pub fn common(&self, other: &Granularity) -> Option<Granularity> {
        match (self, other) {
            (
                Granularity::Absolute { step: a, unit: ua },
                Granularity::Absolute { step: b, unit: ub },
            ) => {
                if ua == ub {
                    Some(Granularity::Absolute {
                        step: gcd(*a, *b),
                        unit: *ua,
                    })
                } else {
                    Some(Granularity::Absolute {
                        step: 1,
                        unit: (*ua).max(*ub),
                    })
                }
            }
            (Granularity::Relative { step: a }, Granularity::Relative { step: b }) => {
                Some(Granularity::Relative { step: gcd(*a, *b) })
            }
            _ => None,
        }
    }

    /// Granularity observed in a chronologically sorted series of
    /// extents: the gcd of map durations and of the gaps between
    /// consecutive starts.
    ///
    /// Absolute series whose boundaries all fall on month starts
    /// reduce in months, collapsing to years when every delta spans
    /// whole years; anything else reduces in seconds and is expressed
    /// in the largest unit dividing the gcd. Returns `None` when the
    /// series has no measurable delta, e.g. a single instant.
    pub fn from_extents(extents: &[TemporalExtent]) -> Option<Granularity> {
        match extents.first().map(|e| e.start) {
            Some(TimeStamp::Relative(_)) => relative_granularity(extents),
            Some(TimeStamp::Absolute(_)) => absolute_granularity(extents),
            None => None,
        }
    }

    /// Snap a timestamp down to the previous granularity boundary.
    ///
    /// Calendar granularities align to unit boundaries; relative
    /// granularities floor to a multiple of the step.
    pub fn snap_down(&self, ts: TimeStamp) -> TimeStamp {
        match (self, ts) {
            (Granularity::Relative { step }, TimeStamp::Relative(t)) => {
                TimeStamp::Relative(t.div_euclid(*step) * step)
            }
            (Granularity::Absolute { unit, .. }, TimeStamp::Absolute(dt)) => {
                TimeStamp::Absolute(truncate(dt, *unit))
            }
            // Mismatched kinds are rejected during planning; pass through.
            _ => ts,
        }
    }

    /// Snap a timestamp up to the next granularity boundary (identity
    /// when already on a boundary).
    pub fn snap_up(&self, ts: TimeStamp) -> TimeStamp {
        match (self, ts) {
            (Granularity::Relative { step }, TimeStamp::Relative(t)) => {
                TimeStamp::Relative(t.div_euclid(*step) * step + if t % step == 0 { 0 } else { *step })
            }
            (Granularity::Absolute { unit, .. }, TimeStamp::Absolute(dt)) => {
                let floored = truncate(dt, *unit);
                if floored == dt {
                    ts
                } else {
                    TimeStamp::Absolute(advance(floored, *unit))
                }
            }
            _ => ts,
        }
    }
}

fn relative_granularity(extents: &[TemporalExtent]) -> Option<Granularity> {
    let mut step = 0i64;
    let mut fold = |delta: i64| {
        if delta != 0 {
            step = if step == 0 { delta.abs() } else { gcd(step, delta) };
        }
    };
    for window in extents.windows(2) {
        if let (TimeStamp::Relative(a), TimeStamp::Relative(b)) =
            (window[0].start, window[1].start)
        {
            fold(b - a);
        }
    }
    for extent in extents {
        if let (TimeStamp::Relative(s), Some(TimeStamp::Relative(e))) = (extent.start, extent.end)
        {
            fold(e - s);
        }
    }
    (step > 0).then_some(Granularity::Relative { step })
}

fn absolute_granularity(extents: &[TemporalExtent]) -> Option<Granularity> {
    let mut points = Vec::with_capacity(extents.len());
    for extent in extents {
        match (extent.start, extent.end) {
            (TimeStamp::Absolute(s), Some(TimeStamp::Absolute(e))) => points.push((s, Some(e))),
            (TimeStamp::Absolute(s), None) => points.push((s, None)),
            _ => return None,
        }
    }

    let mut deltas = Vec::new();
    for window in points.windows(2) {
        deltas.push((window[0].0, window[1].0));
    }
    for (s, e) in &points {
        if let Some(e) = e {
            deltas.push((*s, *e));
        }
    }
    deltas.retain(|(a, b)| a != b);
    if deltas.is_empty() {
        return None;
    }

    let month_aligned = points
        .iter()
        .all(|(s, e)| is_month_start(*s) && e.map_or(true, is_month_start));
    if month_aligned {
        let mut months = 0i64;
        for (a, b) in &deltas {
            let delta =
                i64::from(b.year() - a.year()) * 12 + i64::from(b.month()) - i64::from(a.month());
            months = if months == 0 { delta } else { gcd(months, delta) };
        }
        return Some(if months % 12 == 0 {
            Granularity::Absolute {
                step: months / 12,
                unit: TimeUnit::Year,
            }
        } else {
            Granularity::Absolute {
                step: months,
                unit: TimeUnit::Month,
            }
        });
    }

    let mut step = 0i64;
    for (a, b) in &deltas {
        let secs = (*b - *a).num_seconds();
        step = if step == 0 { secs } else { gcd(step, secs) };
    }
    let (step, unit) = if step % 86_400 == 0 {
        (step / 86_400, TimeUnit::Day)
    } else if step % 3_600 == 0 {
        (step / 3_600, TimeUnit::Hour)
    } else if step % 60 == 0 {
        (step / 60, TimeUnit::Minute)
    } else {
        (step, TimeUnit::Second)
    };
    Some(Granularity::Absolute { step, unit })
}

fn is_month_start(dt: NaiveDateTime) -> bool {
    dt.day() == 1 && dt.num_seconds_from_midnight() == 0
}

/// Truncate a datetime to the start of its unit.
fn truncate(dt: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    let date = dt.date();
    let day_start = |d: NaiveDate| d.and_hms_opt(0, 0, 0).unwrap_or(dt);
    match unit {
        TimeUnit::Year => day_start(
            NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        ),
        TimeUnit::Month => day_start(
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
        ),
        TimeUnit::Week => {
            let back = date.weekday().num_days_from_monday() as i64;
            day_start(date - chrono::Duration::days(back))
        }
        TimeUnit::Day => day_start(date),
        TimeUnit::Hour => date.and_hms_opt(dt.hour(), 0, 0).unwrap_or(dt),
        TimeUnit::Minute => date.and_hms_opt(dt.hour(), dt.minute(), 0).unwrap_or(dt),
        TimeUnit::Second => dt,
    }
}

/// Advance a boundary-aligned datetime by one unit.
fn advance(dt: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    match unit {
        TimeUnit::Year => {
            let date = dt.date();
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(dt)
        }
        TimeUnit::Month => {
            let date = dt.date();
            let (y, m) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(y, m, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(dt)
        }
        TimeUnit::Week => dt + chrono::Duration::weeks(1),
        TimeUnit::Day => dt + chrono::Duration::days(1),
        TimeUnit::Hour => dt + chrono::Duration::hours(1),
        TimeUnit::Minute => dt + chrono::Duration::minutes(1),
        TimeUnit::Second => dt + chrono::Duration::seconds(1),
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Absolute { step, unit } => {
                if *step == 1 {
                    write!(f, "{} {}", step, unit.as_str())
                } else {
                    write!(f, "{} {}s", step, unit.as_str())
                }
            }
            Granularity::Relative { step } => write!(f, "{step}"),
        }
    }
}

/// Error for a malformed granularity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid granularity '{0}'")]
pub struct InvalidGranularity(pub String);

impl FromStr for Granularity {
    type Err = InvalidGranularity;

    /// Accepts `"<n> <unit>[s]"` for absolute time and a bare integer
    /// for relative time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(step) = s.parse::<i64>() {
            if step < 1 {
                return Err(InvalidGranularity(s.to_string()));
            }
            return Ok(Granularity::Relative { step });
        }
        let mut parts = s.split_whitespace();
        let step = parts
            .next()
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|step| *step >= 1)
            .ok_or_else(|| InvalidGranularity(s.to_string()))?;
        let unit = match parts.next().map(|u| u.trim_end_matches('s')) {
            Some("year") => TimeUnit::Year,
            Some("month") => TimeUnit::Month,
            Some("week") => TimeUnit::Week,
            Some("day") => TimeUnit::Day,
            Some("hour") => TimeUnit::Hour,
            Some("minute") => TimeUnit::Minute,
            Some("second") => TimeUnit::Second,
            _ => return Err(InvalidGranularity(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(InvalidGranularity(s.to_string()));
        }
        Ok(Granularity::Absolute { step, unit })
    }
}
