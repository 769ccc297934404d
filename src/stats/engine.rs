use crate::domain::{isostring, ForecastPoint, ForecastSeries, DAY_WINDOW, HOUR_MS};

use super::RollingAverageTable;

/// One retained message for the publish collaborator. Write-once per
/// cycle; the transport overwrites any previously retained value for the
/// same topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFact {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

impl PublishFact {
    fn retained(topic: String, payload: impl ToString) -> Self {
        Self {
            topic,
            payload: payload.to_string(),
            qos: 0,
            retain: true,
        }
    }
}

/// Computes the complete fact set for one cycle.
///
/// Pure and deterministic: identical `(series, now_ms)` inputs yield a
/// byte-identical fact sequence, and the emission order is fixed. The
/// mapper publishes facts strictly in this order, so consumers that
/// snapshot retained state mid-cycle see a deterministic prefix.
///
/// An empty series yields an empty fact set; a series of any other length
/// yields the full set, with windowed facts degrading to their defaults
/// when fewer than 24 points are available.
pub fn compute(series: &ForecastSeries, now_ms: i64) -> Vec<PublishFact> {
    let mut facts = Vec::new();
    let Some(head) = series.head() else {
        return facts;
    };

    facts.push(PublishFact::retained("/now".into(), head.value));
    facts.push(PublishFact::retained(
        "/now/isostring".into(),
        isostring(head.timestamp),
    ));

    // Full-series echo. Several points can land on the same relative-hour
    // key; they are emitted in series order and the retained publish makes
    // the last write win.
    for point in series.points() {
        facts.push(PublishFact::retained(
            format!("/timestamp/{}", point.timestamp),
            point.value,
        ));
        if point.timestamp > now_ms {
            let hours = (point.timestamp - now_ms) / HOUR_MS;
            facts.push(PublishFact::retained(
                format!("/relativeHours/{hours}"),
                point.value,
            ));
        }
    }

    let window = series.day_window();
    let (min, max) = extremes(window, *head);
    for (label, point) in [("min", min), ("max", max)] {
        facts.push(PublishFact::retained(format!("/{label}"), point.value));
        facts.push(PublishFact::retained(
            format!("/{label}/timestamp"),
            point.timestamp,
        ));
        facts.push(PublishFact::retained(
            format!("/{label}/isostring"),
            isostring(point.timestamp),
        ));
    }

    let table = RollingAverageTable::build(window);
    for duration in 1..DAY_WINDOW {
        let end_ts = best_window_end(&table, duration);
        facts.push(PublishFact::retained(
            format!("/forHoursIn24/{duration}"),
            end_ts,
        ));
        facts.push(PublishFact::retained(
            format!("/forHoursIn24/{duration}/timestamp"),
            end_ts,
        ));
        facts.push(PublishFact::retained(
            format!("/forHoursIn24/{duration}/isostring"),
            isostring(end_ts),
        ));
    }

    for (rank, point) in ranked_hours(window).iter().enumerate() {
        let on = point.value < head.value;
        facts.push(PublishFact::retained(format!("/bestHours/{rank}"), on as u8));
        facts.push(PublishFact::retained(
            format!("/bestHours/{rank}/string"),
            if on { "on" } else { "off" },
        ));
    }

    facts
}

/// Day-window extremes with strict comparison: the first point achieving
/// an extremum is retained when a later point ties it. The sentinels make
/// any real value replace them on the first iteration.
fn extremes(window: &[ForecastPoint], head: ForecastPoint) -> (ForecastPoint, ForecastPoint) {
    let mut min = ForecastPoint {
        value: i64::MAX,
        ..head
    };
    let mut max = ForecastPoint {
        value: i64::MIN,
        ..head
    };
    for point in window {
        if point.value < min.value {
            min = *point;
        }
        if point.value > max.value {
            max = *point;
        }
    }
    (min, max)
}

/// End timestamp of the best window of `duration` hours: the window
/// starting at index `duration` whose rounded average is strictly
/// greatest (first seen wins rounded ties). Defaults to 0 when no entry
/// beats the zero threshold, e.g. for a series shorter than required.
fn best_window_end(table: &RollingAverageTable, duration: usize) -> i64 {
    let mut best_avg = 0i64;
    let mut best_ts = 0i64;
    for end in duration - 1..table.len() {
        if let Some(avg) = table.average(end, duration) {
            if avg > best_avg {
                best_avg = avg;
                best_ts = table.timestamp(end).unwrap_or(0);
            }
        }
    }
    best_ts
}

/// Day window ordered best-first: stable ascending sort, then reverse.
/// Equal values therefore end up in reversed series order; downstream
/// consumers depend on this exact rank assignment.
fn ranked_hours(window: &[ForecastPoint]) -> Vec<ForecastPoint> {
    let mut ranked = window.to_vec();
    ranked.sort_by_key(|p| p.value);
    ranked.reverse();
    ranked
}
