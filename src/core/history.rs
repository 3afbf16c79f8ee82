//! Synthetic daily rate history.
//!
//! No authoritative historical source is wired in. Every series produced here is
//! simulated by a [`RateSeriesGenerator`] and each point carries `synthetic: true`;
//! it must not be presented as market data.
use crate::core::currency::{is_usable_rate, normalize_pair};
use crate::core::error::{EngineError, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRatePoint {
    pub date: NaiveDate,
    pub rate: f64,
    pub synthetic: bool,
}

/// Strategy producing the rate for one day of a series.
///
/// Days for which the generator returns a rate that is not positive and finite are
/// left out of the series.
pub trait RateSeriesGenerator: Send + Sync {
    /// `day_index` is 0 for the first date of the series.
    fn rate_on(&self, date: NaiveDate, day_index: u32) -> f64;
}

impl<F> RateSeriesGenerator for F
where
    F: Fn(NaiveDate, u32) -> f64 + Send + Sync,
{
    fn rate_on(&self, date: NaiveDate, day_index: u32) -> f64 {
        self(date, day_index)
    }
}

fn check_band(floor: f64, width: f64) -> Result<()> {
    if !floor.is_finite() || floor <= 0.0 || !width.is_finite() || width < 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Rate band must have a positive floor and non-negative width, got {floor} + {width}"
        )));
    }
    Ok(())
}

fn anchored_band(rate: f64, band_pct: f64) -> Result<(f64, f64)> {
    if !(0.0..100.0).contains(&band_pct) {
        return Err(EngineError::invalid_input(format!(
            "Band must be within [0, 100) percent, got {band_pct}"
        )));
    }
    let floor = rate * (1.0 - band_pct / 100.0);
    let width = rate * 2.0 * band_pct / 100.0;
    check_band(floor, width)?;
    Ok((floor, width))
}

/// Draws each day independently from `[floor, floor + width)` using thread-local
/// randomness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBandGenerator {
    floor: f64,
    width: f64,
}

impl UniformBandGenerator {
    pub fn new(floor: f64, width: f64) -> Result<Self> {
        check_band(floor, width)?;
        Ok(Self { floor, width })
    }

    /// Band of `±band_pct` around `rate`.
    pub fn anchored(rate: f64, band_pct: f64) -> Result<Self> {
        let (floor, width) = anchored_band(rate, band_pct)?;
        Ok(Self { floor, width })
    }
}

impl Default for UniformBandGenerator {
    fn default() -> Self {
        Self {
            floor: 1.0,
            width: 0.2,
        }
    }
}

impl RateSeriesGenerator for UniformBandGenerator {
    fn rate_on(&self, _date: NaiveDate, _day_index: u32) -> f64 {
        self.floor + rand::rng().random::<f64>() * self.width
    }
}

/// Like [`UniformBandGenerator`] but every day is derived from `seed` and the day
/// index, so the same series comes back on every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeededBandGenerator {
    seed: u64,
    floor: f64,
    width: f64,
}

impl SeededBandGenerator {
    pub fn new(seed: u64, floor: f64, width: f64) -> Result<Self> {
        check_band(floor, width)?;
        Ok(Self { seed, floor, width })
    }

    pub fn anchored(seed: u64, rate: f64, band_pct: f64) -> Result<Self> {
        let (floor, width) = anchored_band(rate, band_pct)?;
        Ok(Self { seed, floor, width })
    }
}

impl RateSeriesGenerator for SeededBandGenerator {
    fn rate_on(&self, _date: NaiveDate, day_index: u32) -> f64 {
        let day_seed = self
            .seed
            .wrapping_add(u64::from(day_index).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut rng = StdRng::seed_from_u64(day_seed);
        self.floor + rng.random::<f64>() * self.width
    }
}

/// A finite, lazy series of daily points between two dates inclusive.
///
/// Nothing is generated until iterated, and it can be iterated any number of times.
pub struct SyntheticHistory<G> {
    base: String,
    target: String,
    start: NaiveDate,
    end: NaiveDate,
    generator: G,
}

impl<G: RateSeriesGenerator> SyntheticHistory<G> {
    pub fn new(
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
        generator: G,
    ) -> Result<Self> {
        let (base, target) = normalize_pair(base, target)?;
        if start > end {
            return Err(EngineError::invalid_input(format!(
                "Start date {start} is after end date {end}"
            )));
        }
        Ok(Self {
            base,
            target,
            start,
            end,
            generator,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of days covered, an upper bound on the points yielded.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Always `false`: a series covers at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> HistoryIter<'_, G> {
        HistoryIter {
            history: self,
            next: Some(self.start),
            index: 0,
        }
    }
}

impl<'a, G: RateSeriesGenerator> IntoIterator for &'a SyntheticHistory<G> {
    type Item = HistoricalRatePoint;
    type IntoIter = HistoryIter<'a, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct HistoryIter<'a, G> {
    history: &'a SyntheticHistory<G>,
    next: Option<NaiveDate>,
    index: u32,
}

impl<G: RateSeriesGenerator> Iterator for HistoryIter<'_, G> {
    type Item = HistoricalRatePoint;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.next.filter(|d| *d <= self.history.end)?;
            let rate = self.history.generator.rate_on(date, self.index);
            self.next = date.succ_opt();
            self.index += 1;
            if is_usable_rate(rate) {
                return Some(HistoricalRatePoint {
                    date,
                    rate,
                    synthetic: true,
                });
            }
            warn!(%date, rate, "Skipping unusable generated rate");
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .filter(|d| *d <= self.history.end)
            .map_or(0, |d| (self.history.end - d).num_days() as usize + 1);
        (0, Some(remaining))
    }
}

/// Daily history for a pair from the default random band.
pub fn get_historical_rates(
    base: &str,
    target: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<SyntheticHistory<UniformBandGenerator>> {
    SyntheticHistory::new(base, target, start, end, UniformBandGenerator::default())
}
