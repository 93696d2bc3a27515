//! Output map naming.
//!
//! Every output map is named `<basename>_<suffix>`. The suffix is
//! either a zero-padded running number over the chronologically sorted
//! plan list, the map's start time, or the start time truncated to the
//! sampling granularity.

use std::str::FromStr;

use chronal_core::granularity::TimeUnit;
use chronal_core::{Granularity, TemporalExtent, TimeStamp};

/// How output map names are suffixed onto the basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixMode {
    /// Zero-padded running number: `basename_00001`.
    Num { width: usize },
    /// Start time of the map: `basename_2001_01_01T00_00_00`.
    Time,
    /// Start time truncated to the granularity unit: `basename_2001_01`
    /// for monthly data.
    Gran,
}

impl Default for SuffixMode {
    fn default() -> Self {
        SuffixMode::Num { width: 5 }
    }
}

/// Error for a malformed suffix option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid suffix '{0}'; expected 'num', 'num%N', 'time' or 'gran'")]
pub struct InvalidSuffix(pub String);

impl FromStr for SuffixMode {
    type Err = InvalidSuffix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(SuffixMode::Time),
            "gran" => Ok(SuffixMode::Gran),
            "num" => Ok(SuffixMode::Num { width: 5 }),
            _ => {
                let width = s
                    .strip_prefix("num%")
                    .and_then(|w| w.parse::<usize>().ok())
                    .filter(|w| (1..=9).contains(w))
                    .ok_or_else(|| InvalidSuffix(s.to_string()))?;
                Ok(SuffixMode::Num { width })
            }
        }
    }
}

impl SuffixMode {
    /// Suffix for the map at 1-based chronological position `index`.
    ///
    /// Time-based modes fall back to the raw start number for relative
    /// time, and `Gran` falls back to the full time suffix when the
    /// granularity carries no calendar unit.
    pub fn format(
        &self,
        index: usize,
        extent: &TemporalExtent,
        granularity: Option<&Granularity>,
    ) -> String {
        match self {
            SuffixMode::Num { width } => {
                let width = *width;
                format!("{index:0width$}")
            }
            SuffixMode::Time => time_suffix(extent.start),
            SuffixMode::Gran => match (granularity, extent.start) {
                (Some(Granularity::Absolute { unit, .. }), TimeStamp::Absolute(dt)) => {
                    dt.format(unit_pattern(*unit)).to_string()
                }
                _ => time_suffix(extent.start),
            },
        }
    }
}

/// Map names cannot carry `:` or `-`, so timestamps are flattened to
/// underscores and negative relative times get an `m` prefix.
fn time_suffix(ts: TimeStamp) -> String {
    match ts {
        TimeStamp::Absolute(dt) => dt.format("%Y_%m_%dT%H_%M_%S").to_string(),
        TimeStamp::Relative(t) if t < 0 => format!("m{}", -t),
        TimeStamp::Relative(t) => t.to_string(),
    }
}

fn unit_pattern(unit: TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Year => "%Y",
        TimeUnit::Month => "%Y_%m",
        TimeUnit::Week | TimeUnit::Day => "%Y_%m_%d",
        TimeUnit::Hour => "%Y_%m_%d_%H",
        TimeUnit::Minute => "%Y_%m_%d_%H_%M",
        TimeUnit::Second => "%Y_%m_%d_%H_%M_%S",
    }
}

/// Join basename and suffix into a map name.
pub fn output_name(basename: &str, suffix: &str) -> String {
    format!("{basename}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn march() -> TemporalExtent {
        let start = NaiveDate::from_ymd_opt(2001, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2001, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TemporalExtent::interval(TimeStamp::Absolute(start), TimeStamp::Absolute(end))
    }

    #[test]
    fn parse_suffix_modes() {
        assert_eq!("num".parse(), Ok(SuffixMode::Num { width: 5 }));
        assert_eq!("num%05".parse(), Ok(SuffixMode::Num { width: 5 }));
        assert_eq!("num%3".parse(), Ok(SuffixMode::Num { width: 3 }));
        assert_eq!("time".parse(), Ok(SuffixMode::Time));
        assert_eq!("gran".parse(), Ok(SuffixMode::Gran));
        assert!("num%".parse::<SuffixMode>().is_err());
        assert!("count".parse::<SuffixMode>().is_err());
    }

    #[test]
    fn numeric_suffix_is_zero_padded() {
        let mode = SuffixMode::Num { width: 5 };
        assert_eq!(mode.format(3, &march(), None), "00003");
    }

    #[test]
    fn time_suffix_flattens_separators() {
        assert_eq!(
            SuffixMode::Time.format(1, &march(), None),
            "2001_03_01T00_00_00"
        );
        let relative = TemporalExtent::interval(TimeStamp::Relative(-2), TimeStamp::Relative(3));
        assert_eq!(SuffixMode::Time.format(1, &relative, None), "m2");
    }

    #[test]
    fn gran_suffix_truncates_to_unit() {
        let gran: Granularity = "1 month".parse().unwrap();
        assert_eq!(SuffixMode::Gran.format(1, &march(), Some(&gran)), "2001_03");
        let daily: Granularity = "1 day".parse().unwrap();
        assert_eq!(
            SuffixMode::Gran.format(1, &march(), Some(&daily)),
            "2001_03_01"
        );
    }
}
