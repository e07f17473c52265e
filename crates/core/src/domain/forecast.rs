use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::domain::series::SeriesSummary;
use crate::error::ForecastError;

pub const START_MONTH_RANGE: RangeInclusive<i64> = 1..=12;
pub const HORIZON_RANGE: RangeInclusive<i64> = 6..=12;
pub const RANK_LIMIT_RANGE: RangeInclusive<i64> = 1..=10;

pub const DEFAULT_HORIZON: usize = 6;
pub const DEFAULT_RANK_LIMIT: usize = 5;

/// Validated (start month, horizon) pair shared by every forecasting operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastParams {
    start_month: u32,
    horizon: usize,
}

impl ForecastParams {
    pub fn new(start_month: i64, horizon: i64) -> Result<Self, ForecastError> {
        if !START_MONTH_RANGE.contains(&start_month) {
            return Err(ForecastError::InvalidInput(format!(
                "current month must be between 1 and 12 (got {start_month})"
            )));
        }
        if !HORIZON_RANGE.contains(&horizon) {
            return Err(ForecastError::InvalidInput(format!(
                "forecast months must be between 6 and 12 (got {horizon})"
            )));
        }
        Ok(Self {
            start_month: start_month as u32,
            horizon: horizon as usize,
        })
    }

    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLimit(usize);

impl RankLimit {
    pub fn new(n: i64) -> Result<Self, ForecastError> {
        if !RANK_LIMIT_RANGE.contains(&n) {
            return Err(ForecastError::InvalidInput(format!(
                "n must be between 1 and 10 (got {n})"
            )));
        }
        Ok(Self(n as usize))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for RankLimit {
    fn default() -> Self {
        Self(DEFAULT_RANK_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub name: String,
    pub start_month: u32,
    pub horizon: usize,
    pub predicted_prices: Vec<f64>,
    pub summary: SeriesSummary,
}

/// One commodity's line in a top/bottom ranking, rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub current_price: f64,
    pub predicted_final_price: f64,
    pub horizon: usize,
    pub predicted_prices: Vec<f64>,
    pub total_growth_percent: f64,
    pub avg_monthly_growth_percent: f64,
    pub price_volatility: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub average_growth: f64,
    pub market_volatility: f64,
    pub positive_growth_commodities: usize,
    pub negative_growth_commodities: usize,
    pub total_commodities_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start_month: u32,
    pub horizon: usize,
    pub analysis_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_overview: MarketSnapshot,
    pub top_performers: Vec<RankedEntry>,
    pub bottom_performers: Vec<RankedEntry>,
    pub analysis_period: AnalysisPeriod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCommodity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCommodity {
    pub name: String,
    pub reason: String,
}

/// Result of an aggregate operation: the commodities that succeeded, in store order, plus the
/// ones that were left out and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedCommodity>,
}

impl<T> Batch<T> {
    pub fn attempted(&self) -> usize {
        self.items.len() + self.skipped.len()
    }
}

impl<T> FromIterator<Result<T, SkippedCommodity>> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, SkippedCommodity>>>(iter: I) -> Self {
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for outcome in iter {
            match outcome {
                Ok(item) => items.push(item),
                Err(skip) => skipped.push(skip),
            }
        }
        Self { items, skipped }
    }
}
