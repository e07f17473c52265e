use anyhow::ensure;
use serde::{Deserialize, Serialize};

use crate::analytics::{mean, round2};

/// Fewer observations than this cannot be loaded as a series.
pub const MIN_OBSERVATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub year: i32,
    pub month: u32,
    pub price_index: f64,
    pub rainfall: f64,
}

impl Observation {
    pub fn new(year: i32, month: u32, price_index: f64, rainfall: f64) -> Self {
        Self {
            year,
            month,
            price_index,
            rainfall,
        }
    }
}

/// Monthly history of one commodity, sorted ascending by (year, month).
///
/// Construction validates every invariant, so downstream code can rely on a non-empty series
/// of strictly positive prices with months in 1..=12.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn try_new(mut observations: Vec<Observation>) -> anyhow::Result<Self> {
        ensure!(
            observations.len() >= MIN_OBSERVATIONS,
            "insufficient data: {} observations (need at least {MIN_OBSERVATIONS})",
            observations.len()
        );

        for obs in &observations {
            ensure!(
                (1..=12).contains(&obs.month),
                "invalid month {} in {}",
                obs.month,
                obs.year
            );
            ensure!(
                obs.price_index.is_finite() && obs.price_index > 0.0,
                "invalid price index {} for {}-{:02}",
                obs.price_index,
                obs.year,
                obs.month
            );
            ensure!(
                obs.rainfall.is_finite() && obs.rainfall >= 0.0,
                "invalid rainfall {} for {}-{:02}",
                obs.rainfall,
                obs.year,
                obs.month
            );
        }

        observations.sort_by_key(|obs| (obs.year, obs.month));
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn latest(&self) -> &Observation {
        // Non-empty by construction.
        &self.observations[self.observations.len() - 1]
    }

    pub fn latest_price(&self) -> f64 {
        self.latest().price_index
    }

    pub fn summary(&self, display_name: &str) -> SeriesSummary {
        // Sorted by (year, month).
        let first_year = self.observations[0].year;
        let last_year = self.latest().year;
        let min_price = self
            .observations
            .iter()
            .map(|o| o.price_index)
            .fold(f64::INFINITY, f64::min);
        let max_price = self
            .observations
            .iter()
            .map(|o| o.price_index)
            .fold(f64::NEG_INFINITY, f64::max);
        let rainfall: Vec<f64> = self.observations.iter().map(|o| o.rainfall).collect();

        SeriesSummary {
            name: display_name.to_string(),
            latest_price: self.latest_price(),
            observation_count: self.len(),
            year_range: [first_year, last_year],
            price_range: [round2(min_price), round2(max_price)],
            avg_rainfall: mean(&rainfall).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub name: String,
    pub latest_price: f64,
    pub observation_count: usize,
    pub year_range: [i32; 2],
    pub price_range: [f64; 2],
    pub avg_rainfall: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Consecutive monthly observations starting January 2020.
    pub fn monthly(prices: &[f64]) -> Vec<Observation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                Observation::new(2020 + (i / 12) as i32, (i % 12) as u32 + 1, price, 50.0)
            })
            .collect()
    }

    pub fn series(prices: &[f64]) -> TimeSeries {
        TimeSeries::try_new(monthly(prices)).unwrap()
    }

    pub fn flat_series(price: f64, len: usize) -> TimeSeries {
        series(&vec![price; len])
    }
}
