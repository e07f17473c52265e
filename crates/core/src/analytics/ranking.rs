//! Cross-commodity aggregation: top/bottom rankings and the market snapshot.

use crate::analytics::growth::GrowthMetrics;
use crate::analytics::{mean, round2, std_dev};
use crate::domain::forecast::{MarketSnapshot, RankedEntry};

/// One commodity's projection and the metrics derived from it, unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityPerformance {
    pub name: String,
    pub current_price: f64,
    pub projection: Vec<f64>,
    pub horizon: usize,
    pub metrics: GrowthMetrics,
}

impl CommodityPerformance {
    /// `None` when the projection is empty: there is nothing to rank.
    pub fn evaluate(
        name: impl Into<String>,
        current_price: f64,
        projection: Vec<f64>,
        horizon: usize,
    ) -> Option<Self> {
        if projection.is_empty() {
            return None;
        }
        let metrics = GrowthMetrics::compute(current_price, &projection, horizon);
        Some(Self {
            name: name.into(),
            current_price,
            projection,
            horizon,
            metrics,
        })
    }

    pub fn final_price(&self) -> f64 {
        self.projection
            .last()
            .copied()
            .unwrap_or(self.current_price)
    }

    fn to_entry(&self, with_risk: bool) -> RankedEntry {
        let metrics = self.metrics.rounded();
        RankedEntry {
            name: self.name.clone(),
            current_price: round2(self.current_price),
            predicted_final_price: round2(self.final_price()),
            horizon: self.horizon,
            predicted_prices: self.projection.iter().copied().map(round2).collect(),
            total_growth_percent: metrics.total_growth_percent,
            avg_monthly_growth_percent: metrics.avg_monthly_growth_percent,
            price_volatility: metrics.price_volatility,
            risk_score: with_risk.then(|| round2(self.metrics.risk_score(self.current_price))),
        }
    }
}

pub struct MarketRanker;

impl MarketRanker {
    /// Highest total growth first; ties keep input order.
    pub fn top_performers(all: &[CommodityPerformance], n: usize) -> Vec<RankedEntry> {
        let mut sorted: Vec<&CommodityPerformance> = all.iter().collect();
        sorted.sort_by(|a, b| {
            b.metrics
                .total_growth_percent
                .total_cmp(&a.metrics.total_growth_percent)
        });
        sorted
            .into_iter()
            .take(n)
            .map(|p| p.to_entry(false))
            .collect()
    }

    /// Lowest total growth first, each entry carrying its risk score; ties keep input order.
    pub fn bottom_performers(all: &[CommodityPerformance], n: usize) -> Vec<RankedEntry> {
        let mut sorted: Vec<&CommodityPerformance> = all.iter().collect();
        sorted.sort_by(|a, b| {
            a.metrics
                .total_growth_percent
                .total_cmp(&b.metrics.total_growth_percent)
        });
        sorted
            .into_iter()
            .take(n)
            .map(|p| p.to_entry(true))
            .collect()
    }

    /// Market-wide growth statistics, recomputed from each (current, final) price pair rather
    /// than from the per-commodity metrics.
    pub fn market_snapshot(all: &[CommodityPerformance]) -> MarketSnapshot {
        let growth: Vec<f64> = all
            .iter()
            .filter(|p| p.current_price > 0.0)
            .map(|p| (p.final_price() - p.current_price) / p.current_price * 100.0)
            .filter(|g| g.is_finite())
            .collect();

        MarketSnapshot {
            average_growth: mean(&growth).map(round2).unwrap_or(0.0),
            market_volatility: std_dev(&growth).map(round2).unwrap_or(0.0),
            positive_growth_commodities: growth.iter().filter(|g| **g > 0.0).count(),
            negative_growth_commodities: growth.iter().filter(|g| **g < 0.0).count(),
            total_commodities_analyzed: growth.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(name: &str, current: f64, last: f64) -> CommodityPerformance {
        let projection = vec![current, (current + last) / 2.0, last];
        CommodityPerformance::evaluate(name, current, projection, 6).unwrap()
    }

    fn names(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn top_and_bottom_are_inverse_orders() {
        let all = vec![
            perf("Wheat", 100.0, 110.0),
            perf("Rice", 100.0, 95.0),
            perf("Maize", 50.0, 60.0),
            perf("Jowar", 80.0, 80.8),
        ];

        let top = MarketRanker::top_performers(&all, all.len());
        let bottom = MarketRanker::bottom_performers(&all, all.len());
        assert_eq!(names(&top), vec!["Maize", "Wheat", "Jowar", "Rice"]);

        let mut reversed = names(&top);
        reversed.reverse();
        assert_eq!(names(&bottom), reversed);
    }

    #[test]
    fn ties_keep_input_order() {
        let all = vec![
            perf("Alpha", 100.0, 110.0),
            perf("Beta", 200.0, 220.0),
            perf("Gamma", 100.0, 90.0),
        ];
        let top = MarketRanker::top_performers(&all, 3);
        let bottom = MarketRanker::bottom_performers(&all, 3);
        assert_eq!(names(&top), vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(names(&bottom), vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn truncates_to_n_and_marks_risk_only_for_bottom() {
        let all = vec![
            perf("Wheat", 100.0, 110.0),
            perf("Rice", 100.0, 95.0),
            perf("Maize", 50.0, 60.0),
        ];
        let top = MarketRanker::top_performers(&all, 2);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|e| e.risk_score.is_none()));

        let bottom = MarketRanker::bottom_performers(&all, 1);
        assert_eq!(names(&bottom), vec!["Rice"]);
        assert!(bottom[0].risk_score.is_some());
        assert_eq!(bottom[0].total_growth_percent, -5.0);

        assert!(MarketRanker::top_performers(&all, 10).len() == 3);
    }

    #[test]
    fn snapshot_recomputes_from_price_pairs() {
        let mut stale = perf("Wheat", 100.0, 110.0);
        // Metrics handed in by the caller are ignored by the snapshot.
        stale.metrics.total_growth_percent = 999.0;
        let all = vec![
            stale,
            perf("Rice", 100.0, 90.0),
            perf("Maize", 100.0, 100.0),
        ];

        let snapshot = MarketRanker::market_snapshot(&all);
        assert_eq!(snapshot.average_growth, 0.0);
        assert_eq!(snapshot.market_volatility, round2((200.0f64 / 3.0).sqrt()));
        assert_eq!(snapshot.positive_growth_commodities, 1);
        assert_eq!(snapshot.negative_growth_commodities, 1);
        assert_eq!(snapshot.total_commodities_analyzed, 3);
        assert!(
            snapshot.positive_growth_commodities + snapshot.negative_growth_commodities
                <= snapshot.total_commodities_analyzed
        );
    }

    #[test]
    fn empty_market_is_all_zero() {
        let snapshot = MarketRanker::market_snapshot(&[]);
        assert_eq!(snapshot, MarketSnapshot::default());
        assert!(MarketRanker::top_performers(&[], 5).is_empty());
    }

    #[test]
    fn evaluate_rejects_empty_projection() {
        let evaluated = CommodityPerformance::evaluate("Wheat", 100.0, vec![], 6);
        assert!(evaluated.is_none());
    }
}
