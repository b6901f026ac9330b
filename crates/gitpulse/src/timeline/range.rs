//! Time ranges and their period configuration.

use serde::{Deserialize, Serialize};

/// Whether buckets are daily or weekly, selected per requested time range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
}

/// The closed set of time windows the dashboard offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "6m")]
    Months6,
    #[serde(rename = "12m")]
    Months12,
}

/// Window length and bucketing for one time range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodConfig {
    /// Window length in days, today inclusive.
    pub days: i64,
    /// Bucket width for this window.
    pub granularity: Granularity,
    /// Minimum number of buckets a chart for this range expects.
    pub min_data_points: usize,
}

impl TimeRange {
    /// All ranges, shortest first.
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Days7,
        TimeRange::Days30,
        TimeRange::Months6,
        TimeRange::Months12,
    ];

    /// Parse the external range parameter.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "7d" => Some(TimeRange::Days7),
            "30d" => Some(TimeRange::Days30),
            "6m" => Some(TimeRange::Months6),
            "12m" => Some(TimeRange::Months12),
            _ => None,
        }
    }

    /// The external string form of this range.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Days7 => "7d",
            TimeRange::Days30 => "30d",
            TimeRange::Months6 => "6m",
            TimeRange::Months12 => "12m",
        }
    }

    /// Window and bucketing configuration.
    pub fn config(self) -> PeriodConfig {
        match self {
            TimeRange::Days7 => PeriodConfig {
                days: 7,
                granularity: Granularity::Daily,
                min_data_points: 7,
            },
            TimeRange::Days30 => PeriodConfig {
                days: 30,
                granularity: Granularity::Daily,
                min_data_points: 30,
            },
            TimeRange::Months6 => PeriodConfig {
                days: 183,
                granularity: Granularity::Weekly,
                min_data_points: 26,
            },
            TimeRange::Months12 => PeriodConfig {
                days: 365,
                granularity: Granularity::Weekly,
                min_data_points: 52,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_with_as_str() {
        for range in TimeRange::ALL {
            assert_eq!(TimeRange::parse(range.as_str()), Some(range));
        }
        assert_eq!(TimeRange::parse("90d"), None);
        assert_eq!(TimeRange::parse(""), None);
    }

    #[test]
    fn short_ranges_are_daily_and_long_ranges_weekly() {
        assert_eq!(TimeRange::Days7.config().granularity, Granularity::Daily);
        assert_eq!(TimeRange::Days30.config().granularity, Granularity::Daily);
        assert_eq!(TimeRange::Months6.config().granularity, Granularity::Weekly);
        assert_eq!(TimeRange::Months12.config().granularity, Granularity::Weekly);
    }

    #[test]
    fn serde_uses_external_names() {
        let json = serde_json::to_string(&TimeRange::Days7).expect("serialize");
        assert_eq!(json, "\"7d\"");
        let back: TimeRange = serde_json::from_str("\"6m\"").expect("deserialize");
        assert_eq!(back, TimeRange::Months6);
    }
}
