//! Descriptive statistics over rate series.
use crate::core::error::{EngineError, Result};
use crate::core::history::HistoricalRatePoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Percentage change from `from` to `to`; `None` unless `from` is positive.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from > 0.0 {
        Some(((to - from) / from) * 100.0)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub change_pct: Option<f64>,
}

pub fn summarize(points: &[HistoricalRatePoint]) -> Option<SeriesSummary> {
    let first = points.first()?.rate;
    let last = points.last()?.rate;
    let (min, max, sum) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), p| (min.min(p.rate), max.max(p.rate), sum + p.rate),
    );

    Some(SeriesSummary {
        first,
        last,
        min,
        max,
        mean: sum / points.len() as f64,
        change_pct: percent_change(first, last),
    })
}

/// Trailing simple moving average; the first point is emitted once `window` points
/// are available.
pub fn moving_average(
    points: &[HistoricalRatePoint],
    window: usize,
) -> Result<Vec<(NaiveDate, f64)>> {
    if window == 0 {
        return Err(EngineError::invalid_input("Window must be at least one point"));
    }
    Ok(points
        .windows(window)
        .map(|w| {
            let mean = w.iter().map(|p| p.rate).sum::<f64>() / window as f64;
            (w[window - 1].date, mean)
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairChange {
    pub pair: String,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movers {
    pub top_mover: PairChange,
    pub biggest_drop: PairChange,
    pub most_stable: PairChange,
}

/// Picks the largest gain, the largest loss and the smallest absolute move.
pub fn rank_movers(changes: &[PairChange]) -> Option<Movers> {
    let by = |f: fn(&PairChange, &PairChange) -> std::cmp::Ordering| {
        changes.iter().max_by(|a, b| f(a, b)).cloned()
    };
    Some(Movers {
        top_mover: by(|a, b| a.change_pct.total_cmp(&b.change_pct))?,
        biggest_drop: by(|a, b| b.change_pct.total_cmp(&a.change_pct))?,
        most_stable: by(|a, b| b.change_pct.abs().total_cmp(&a.change_pct.abs()))?,
    })
}
