//! Trend comparison between the current report and the most recent
//! earlier one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregate::round1;
use crate::report::Report;

/// Float deltas within ±0.1 are rounding noise. The bound itself is flat.
pub const DIRECTION_DEAD_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSummary {
    Worsened,
    Improved,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    pub cpu_avg: f64,
    pub mem_avg: f64,
    pub stress_score: f64,
    pub alerts_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDirection {
    pub cpu_avg: Direction,
    pub mem_avg: Direction,
    pub stress_score: Direction,
    pub alerts_count: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Identity (file name) of the report compared against.
    pub previous_report: String,
    #[serde(default)]
    pub previous_time: Option<NaiveDateTime>,
    pub delta: TrendDelta,
    pub direction: TrendDirection,
    pub summary: TrendSummary,
}

pub fn direction(delta: f64) -> Direction {
    if delta > DIRECTION_DEAD_BAND {
        Direction::Up
    } else if delta < -DIRECTION_DEAD_BAND {
        Direction::Down
    } else {
        Direction::Flat
    }
}

/// Integer deltas are exact, so any change is a direction.
pub fn count_direction(delta: i64) -> Direction {
    match delta {
        d if d > 0 => Direction::Up,
        d if d < 0 => Direction::Down,
        _ => Direction::Flat,
    }
}

/// Either signal alone marks a regression; an improvement needs both.
pub fn summarize(score_delta: f64, alerts_delta: i64) -> TrendSummary {
    if score_delta > DIRECTION_DEAD_BAND || alerts_delta > 0 {
        TrendSummary::Worsened
    } else if score_delta < -DIRECTION_DEAD_BAND && alerts_delta <= 0 {
        TrendSummary::Improved
    } else {
        TrendSummary::Unchanged
    }
}

/// Diff `current` against `previous`. Neither input is modified.
pub fn compare(previous: &Report, current: &Report, previous_report: &str) -> TrendResult {
    let delta = TrendDelta {
        cpu_avg: round1(current.system.cpu_avg - previous.system.cpu_avg),
        mem_avg: round1(current.system.mem_avg - previous.system.mem_avg),
        stress_score: round1(current.system.stress_score - previous.system.stress_score),
        alerts_count: current.alerts.len() as i64 - previous.alerts.len() as i64,
    };

    let direction = TrendDirection {
        cpu_avg: direction(delta.cpu_avg),
        mem_avg: direction(delta.mem_avg),
        stress_score: direction(delta.stress_score),
        alerts_count: count_direction(delta.alerts_count),
    };

    TrendResult {
        previous_report: previous_report.to_string(),
        previous_time: Some(previous.time),
        summary: summarize(delta.stress_score, delta.alerts_count),
        delta,
        direction,
    }
}

/// The candidate with the greatest timestamp strictly before `current`.
pub fn most_recent_before<T>(
    candidates: impl IntoIterator<Item = (NaiveDateTime, T)>,
    current: NaiveDateTime,
) -> Option<(NaiveDateTime, T)> {
    candidates
        .into_iter()
        .filter(|(ts, _)| *ts < current)
        .max_by_key(|(ts, _)| *ts)
}
