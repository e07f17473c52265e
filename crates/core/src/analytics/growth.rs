use serde::{Deserialize, Serialize};

use crate::analytics::{round2, std_dev};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub total_growth_percent: f64,
    pub avg_monthly_growth_percent: f64,
    pub price_volatility: f64,
}

impl GrowthMetrics {
    /// Growth of the projection's final value over `current_price`.
    ///
    /// Degenerate input (non-positive price, empty projection, zero horizon) yields all-zero
    /// metrics so ranking never fails on partial data.
    pub fn compute(current_price: f64, projection: &[f64], horizon: usize) -> Self {
        let Some(&final_price) = projection.last() else {
            return Self::default();
        };
        if !(current_price.is_finite() && current_price > 0.0) || horizon == 0 {
            return Self::default();
        }

        let total = (final_price - current_price) / current_price * 100.0;
        let volatility = if projection.len() > 1 {
            std_dev(projection).unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            total_growth_percent: total,
            avg_monthly_growth_percent: total / horizon as f64,
            price_volatility: volatility,
        }
    }

    /// Projection volatility relative to the current price, in percent.
    pub fn risk_score(&self, current_price: f64) -> f64 {
        if current_price > 0.0 {
            self.price_volatility / current_price * 100.0
        } else {
            0.0
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            total_growth_percent: round2(self.total_growth_percent),
            avg_monthly_growth_percent: round2(self.avg_monthly_growth_percent),
            price_volatility: round2(self.price_volatility),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_growth_and_volatility() {
        let m = GrowthMetrics::compute(100.0, &[102.0, 104.0, 106.0, 108.0, 110.0, 112.0], 6);
        assert!((m.total_growth_percent - 12.0).abs() < 1e-12);
        assert!((m.avg_monthly_growth_percent - 2.0).abs() < 1e-12);
        let expected_sd = (35.0f64 / 3.0).sqrt();
        assert!((m.price_volatility - expected_sd).abs() < 1e-12);
        assert!((m.risk_score(100.0) - expected_sd).abs() < 1e-12);
    }

    #[test]
    fn zero_price_yields_neutral_metrics() {
        let m = GrowthMetrics::compute(0.0, &[1.0, 2.0], 6);
        assert_eq!(m, GrowthMetrics::default());
        assert_eq!(m.risk_score(0.0), 0.0);
    }

    #[test]
    fn empty_projection_yields_neutral_metrics() {
        let neutral = GrowthMetrics::default();
        assert_eq!(GrowthMetrics::compute(100.0, &[], 6), neutral);
        assert_eq!(GrowthMetrics::compute(100.0, &[110.0], 0), neutral);
    }

    #[test]
    fn single_point_has_no_volatility() {
        let m = GrowthMetrics::compute(100.0, &[90.0], 6);
        assert!((m.total_growth_percent + 10.0).abs() < 1e-12);
        assert_eq!(m.price_volatility, 0.0);
    }

    #[test]
    fn rounding_applies_to_every_field() {
        let m = GrowthMetrics {
            total_growth_percent: 1.23456,
            avg_monthly_growth_percent: 0.20576,
            price_volatility: 4.56789,
        }
        .rounded();
        assert_eq!(m.total_growth_percent, 1.23);
        assert_eq!(m.avg_monthly_growth_percent, 0.21);
        assert_eq!(m.price_volatility, 4.57);
    }
}
