use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Number of leading forecast points that participate in windowed
/// statistics (min/max, best windows, best-hours ranking).
pub const DAY_WINDOW: usize = 24;

/// One hour in epoch milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// One hourly forecast point: the green power index at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Index value, conventionally 0-100.
    pub value: i64,
}

/// Chronologically ordered forecast series; index 0 is the point closest
/// to "now". Immutable for the duration of a publication cycle.
///
/// Ordering (non-decreasing timestamps) is owned by the provider; the
/// engine never re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The current point, if the series has one.
    pub fn head(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }

    /// The first 24 points, or the whole series when it is shorter.
    pub fn day_window(&self) -> &[ForecastPoint] {
        &self.points[..self.points.len().min(DAY_WINDOW)]
    }
}

/// Epoch milliseconds rendered as ISO-8601 in UTC with millisecond
/// precision, e.g. `2024-03-01T14:00:00.000Z`.
pub fn isostring(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly(values: &[i64]) -> ForecastSeries {
        let t0 = 1_700_000_000_000;
        ForecastSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| ForecastPoint {
                    timestamp: t0 + i as i64 * HOUR_MS,
                    value,
                })
                .collect(),
        )
    }

    #[test]
    fn test_day_window_truncates_to_24() {
        let series = hourly(&[50; 48]);
        assert_eq!(series.len(), 48);
        assert_eq!(series.day_window().len(), 24);
    }

    #[test]
    fn test_day_window_short_series() {
        let series = hourly(&[10, 20, 30]);
        assert_eq!(series.day_window().len(), 3);

        let empty = ForecastSeries::default();
        assert!(empty.is_empty());
        assert!(empty.day_window().is_empty());
        assert!(empty.head().is_none());
    }

    #[test]
    fn test_isostring_format() {
        assert_eq!(isostring(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(isostring(1_700_000_000_000), "2023-11-14T22:13:20.000Z");
    }
}
