use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use cropcast_core::analytics::features::monthly_rainfall_average;
use cropcast_core::domain::forecast::{ForecastParams, RankLimit, DEFAULT_HORIZON};
use cropcast_core::ingest::source::SkippedSource;
use cropcast_core::service::ForecastService;
use cropcast_core::storage::display_name;
use cropcast_core::time::calendar::resolve_start_month;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportKind {
    /// Forecast one commodity (requires --commodity).
    Forecast,
    /// Forecast every commodity.
    All,
    Top,
    Bottom,
    Market,
    /// Historical summary of one commodity (requires --commodity).
    Summary,
    /// Load report: what was loaded, what was skipped and why.
    Validate,
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub commodity: Option<String>,
    pub start_month: Option<i64>,
    pub horizon: Option<i64>,
    pub limit: Option<i64>,
}

impl ReportRequest {
    fn params(&self, now: DateTime<Utc>) -> anyhow::Result<ForecastParams> {
        Ok(ForecastParams::new(
            resolve_start_month(self.start_month, now),
            self.horizon.unwrap_or(DEFAULT_HORIZON as i64),
        )?)
    }

    fn limit(&self) -> anyhow::Result<RankLimit> {
        Ok(match self.limit {
            Some(n) => RankLimit::new(n)?,
            None => RankLimit::default(),
        })
    }

    fn commodity(&self) -> anyhow::Result<&str> {
        self.commodity
            .as_deref()
            .context("--commodity is required for this report")
    }
}

#[derive(Debug, Serialize)]
struct LoadedSeries {
    name: String,
    observation_count: usize,
    year_range: [i32; 2],
    latest_price: f64,
    rainfall_by_month: Vec<Option<f64>>,
}

pub fn build(
    service: &ForecastService,
    skipped: &[SkippedSource],
    request: &ReportRequest,
    now: DateTime<Utc>,
) -> anyhow::Result<Value> {
    let value = match request.kind {
        ReportKind::Forecast => {
            let params = request.params(now)?;
            serde_json::to_value(service.forecast(request.commodity()?, params)?)?
        }
        ReportKind::All => {
            let params = request.params(now)?;
            serde_json::to_value(service.forecast_all(params)?)?
        }
        ReportKind::Top => {
            let params = request.params(now)?;
            serde_json::to_value(service.top_performers(params, request.limit()?)?)?
        }
        ReportKind::Bottom => {
            let params = request.params(now)?;
            serde_json::to_value(service.bottom_performers(params, request.limit()?)?)?
        }
        ReportKind::Market => {
            let params = request.params(now)?;
            serde_json::to_value(service.market_analysis(params, now)?)?
        }
        ReportKind::Summary => serde_json::to_value(service.summary(request.commodity()?)?)?,
        ReportKind::Validate => validation_report(service, skipped)?,
    };
    Ok(value)
}

fn validation_report(
    service: &ForecastService,
    skipped: &[SkippedSource],
) -> anyhow::Result<Value> {
    let loaded: Vec<LoadedSeries> = service
        .store()
        .iter()
        .map(|(key, series)| {
            let summary = series.summary(&display_name(key));
            LoadedSeries {
                name: summary.name,
                observation_count: summary.observation_count,
                year_range: summary.year_range,
                latest_price: summary.latest_price,
                rainfall_by_month: (1..=12)
                    .map(|m| monthly_rainfall_average(series.observations(), m))
                    .collect(),
            }
        })
        .collect();

    Ok(json!({
        "loaded": loaded,
        "skipped": skipped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cropcast_core::domain::series::{Observation, TimeSeries};
    use cropcast_core::service::NoiseSeed;
    use cropcast_core::storage::SeriesStore;
    use std::sync::Arc;

    fn service() -> ForecastService {
        let series = |base: f64, slope: f64| {
            let obs = (0..24)
                .map(|i| {
                    Observation::new(
                        2021 + i / 12,
                        (i % 12) as u32 + 1,
                        base + slope * i as f64,
                        20.0 + i as f64,
                    )
                })
                .collect();
            TimeSeries::try_new(obs).unwrap()
        };
        let store: SeriesStore = vec![
            ("wheat".to_string(), series(100.0, 1.0)),
            ("onion".to_string(), series(200.0, -2.0)),
        ]
        .into_iter()
        .collect();
        ForecastService::new(Arc::new(store), NoiseSeed::Fixed(1))
    }

    fn request(kind: ReportKind) -> ReportRequest {
        ReportRequest {
            kind,
            commodity: None,
            start_month: Some(1),
            horizon: None,
            limit: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
    }

    #[test]
    fn forecast_report_requires_commodity() {
        let err = build(&service(), &[], &request(ReportKind::Forecast), now()).unwrap_err();
        assert!(err.to_string().contains("--commodity"));

        let mut req = request(ReportKind::Forecast);
        req.commodity = Some("Wheat".to_string());
        let value = build(&service(), &[], &req, now()).unwrap();
        assert_eq!(value["name"], "Wheat");
        assert_eq!(value["predicted_prices"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn invalid_month_surfaces_as_error() {
        let mut req = request(ReportKind::Market);
        req.start_month = Some(13);
        let err = build(&service(), &[], &req, now()).unwrap_err();
        assert!(err.to_string().contains("invalid input"));
    }

    #[test]
    fn market_report_has_overview() {
        let value = build(&service(), &[], &request(ReportKind::Market), now()).unwrap();
        assert_eq!(value["market_overview"]["total_commodities_analyzed"], 2);
        assert_eq!(value["top_performers"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn validate_report_lists_loaded_and_skipped() {
        let skipped = vec![SkippedSource {
            name: "garlic".to_string(),
            reason: "insufficient data".to_string(),
        }];
        let value = build(&service(), &skipped, &request(ReportKind::Validate), now()).unwrap();
        let loaded = value["loaded"].as_array().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0]["name"], "Onion");
        assert_eq!(loaded[0]["rainfall_by_month"].as_array().unwrap().len(), 12);
        // January appears in 2021 (i = 0) and 2022 (i = 12): (20 + 32) / 2
        assert_eq!(loaded[0]["rainfall_by_month"][0], 26.0);
        assert_eq!(value["skipped"][0]["name"], "garlic");
    }
}
