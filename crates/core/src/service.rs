//! Transport-independent forecasting operations over an injected [`SeriesStore`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::analytics::projector::{PriceProjector, RngNoise};
use crate::analytics::ranking::{CommodityPerformance, MarketRanker};
use crate::analytics::round2;
use crate::domain::forecast::{
    AnalysisPeriod, Batch, ForecastParams, ForecastResult, MarketAnalysis, RankLimit, RankedEntry,
    SkippedCommodity,
};
use crate::domain::series::{SeriesSummary, TimeSeries};
use crate::error::ForecastError;
use crate::storage::{canonical_key, display_name, SeriesStore};

const MARKET_RANK_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSeed {
    /// Reproducible: each commodity gets a generator derived from this seed and its request.
    Fixed(u64),
    Entropy,
}

#[derive(Debug, Clone)]
pub struct ForecastService {
    store: Arc<SeriesStore>,
    projector: PriceProjector,
    seed: NoiseSeed,
}

impl ForecastService {
    pub fn new(store: Arc<SeriesStore>, seed: NoiseSeed) -> Self {
        Self {
            store,
            projector: PriceProjector::default(),
            seed,
        }
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn list_commodities(&self) -> Vec<String> {
        self.store.list_names()
    }

    pub fn summary(&self, name: &str) -> Result<SeriesSummary, ForecastError> {
        self.store.get_summary(name)
    }

    pub fn forecast(
        &self,
        name: &str,
        params: ForecastParams,
    ) -> Result<ForecastResult, ForecastError> {
        let key = canonical_key(name);
        let series = self.store.get_series(&key)?;
        self.forecast_series(&key, series, params)
    }

    /// Forecasts every commodity; failures are skipped and reported, never fatal unless nothing
    /// succeeds.
    pub fn forecast_all(
        &self,
        params: ForecastParams,
    ) -> Result<Batch<ForecastResult>, ForecastError> {
        let batch: Batch<ForecastResult> = self
            .store
            .iter()
            .map(|(key, series)| {
                self.forecast_series(key, series, params)
                    .map_err(|e| skip(key, e))
            })
            .collect();
        non_empty(batch)
    }

    pub fn top_performers(
        &self,
        params: ForecastParams,
        limit: RankLimit,
    ) -> Result<Vec<RankedEntry>, ForecastError> {
        let batch = self.evaluate_all(params)?;
        Ok(MarketRanker::top_performers(&batch.items, limit.get()))
    }

    pub fn bottom_performers(
        &self,
        params: ForecastParams,
        limit: RankLimit,
    ) -> Result<Vec<RankedEntry>, ForecastError> {
        let batch = self.evaluate_all(params)?;
        Ok(MarketRanker::bottom_performers(&batch.items, limit.get()))
    }

    /// Overview plus top/bottom lists, all derived from one set of projections.
    pub fn market_analysis(
        &self,
        params: ForecastParams,
        analysis_date: DateTime<Utc>,
    ) -> Result<MarketAnalysis, ForecastError> {
        let batch = self.evaluate_all(params)?;

        Ok(MarketAnalysis {
            market_overview: MarketRanker::market_snapshot(&batch.items),
            top_performers: MarketRanker::top_performers(&batch.items, MARKET_RANK_LIMIT),
            bottom_performers: MarketRanker::bottom_performers(&batch.items, MARKET_RANK_LIMIT),
            analysis_period: AnalysisPeriod {
                start_month: params.start_month(),
                horizon: params.horizon(),
                analysis_date,
            },
            skipped: batch.skipped,
        })
    }

    pub fn evaluate_all(
        &self,
        params: ForecastParams,
    ) -> Result<Batch<CommodityPerformance>, ForecastError> {
        let batch: Batch<CommodityPerformance> = self
            .store
            .iter()
            .map(|(key, series)| self.evaluate(key, series, params).map_err(|e| skip(key, e)))
            .collect();
        non_empty(batch)
    }

    fn evaluate(
        &self,
        key: &str,
        series: &TimeSeries,
        params: ForecastParams,
    ) -> Result<CommodityPerformance, ForecastError> {
        let projection = self.project(key, series, params)?;
        CommodityPerformance::evaluate(
            display_name(key),
            series.latest_price(),
            projection,
            params.horizon(),
        )
        .ok_or_else(|| ForecastError::Unavailable {
            name: display_name(key),
        })
    }

    fn forecast_series(
        &self,
        key: &str,
        series: &TimeSeries,
        params: ForecastParams,
    ) -> Result<ForecastResult, ForecastError> {
        let projection = self.project(key, series, params)?;
        let name = display_name(key);

        Ok(ForecastResult {
            start_month: params.start_month(),
            horizon: params.horizon(),
            predicted_prices: projection.into_iter().map(round2).collect(),
            summary: series.summary(&name),
            name,
        })
    }

    fn project(
        &self,
        key: &str,
        series: &TimeSeries,
        params: ForecastParams,
    ) -> Result<Vec<f64>, ForecastError> {
        let mut noise = RngNoise::new(self.rng_for(key, params));
        let projection = self.projector.project(
            series.observations(),
            params.start_month(),
            params.horizon(),
            &mut noise,
        );
        if projection.is_empty() {
            return Err(ForecastError::Unavailable {
                name: display_name(key),
            });
        }
        Ok(projection)
    }

    fn rng_for(&self, key: &str, params: ForecastParams) -> StdRng {
        match self.seed {
            NoiseSeed::Fixed(seed) => {
                let mixed = seed
                    ^ fnv1a(key.as_bytes())
                    ^ (u64::from(params.start_month()) << 56)
                    ^ ((params.horizon() as u64) << 48);
                StdRng::seed_from_u64(mixed)
            }
            NoiseSeed::Entropy => StdRng::from_entropy(),
        }
    }
}

fn skip(key: &str, err: ForecastError) -> SkippedCommodity {
    let name = display_name(key);
    tracing::warn!(commodity = %name, error = %err, "skipping commodity");
    SkippedCommodity {
        name,
        reason: err.to_string(),
    }
}

fn non_empty<T>(batch: Batch<T>) -> Result<Batch<T>, ForecastError> {
    if batch.items.is_empty() {
        return Err(ForecastError::NoForecasts {
            attempted: batch.attempted(),
        });
    }
    Ok(batch)
}

/// Stable across runs and platforms, unlike `std`'s default hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
