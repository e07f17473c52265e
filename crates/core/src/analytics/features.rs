//! Statistics derived from a commodity's history: seasonal factors, recent trend and the noise
//! amplitude used by the projector.

use crate::analytics::{mean, std_dev};
use crate::domain::series::Observation;

pub const TREND_WINDOW: usize = 6;
/// Trend and volatility only look at this many trailing observations.
pub const RECENT_WINDOW: usize = 12;
pub const VOLATILITY_FACTOR: f64 = 0.1;

/// Month (1..=12) to seasonal factor, relative to the series' overall mean price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalProfile {
    factors: [f64; 12],
}

impl SeasonalProfile {
    pub fn factor(&self, month: u32) -> f64 {
        (month as usize)
            .checked_sub(1)
            .and_then(|i| self.factors.get(i))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn factors(&self) -> &[f64; 12] {
        &self.factors
    }

    pub fn is_finite(&self) -> bool {
        self.factors.iter().all(|f| f.is_finite())
    }
}

pub fn seasonal_profile(observations: &[Observation]) -> SeasonalProfile {
    let prices: Vec<f64> = observations.iter().map(|o| o.price_index).collect();
    let overall = mean(&prices);

    let mut sums = [0.0f64; 12];
    let mut counts = [0usize; 12];
    for obs in observations {
        if let Some(i) = (obs.month as usize).checked_sub(1).filter(|i| *i < 12) {
            sums[i] += obs.price_index;
            counts[i] += 1;
        }
    }

    let mut factors = [1.0f64; 12];
    if let Some(overall) = overall {
        for i in 0..12 {
            if counts[i] > 0 {
                factors[i] = (sums[i] / counts[i] as f64) / overall;
            }
        }
    }

    SeasonalProfile { factors }
}

fn recent(observations: &[Observation]) -> &[Observation] {
    &observations[observations.len().saturating_sub(RECENT_WINDOW)..]
}

/// Average monthly price change over the trailing `window` observations, or over the whole
/// recent span when it is shorter than `window`.
pub fn trend(observations: &[Observation], window: usize) -> Option<f64> {
    let recent = recent(observations);
    let last = recent.last()?.price_index;
    let window = window.max(1);

    if recent.len() >= window {
        let first = recent[recent.len() - window].price_index;
        Some((last - first) / window as f64)
    } else {
        Some((last - recent[0].price_index) / recent.len() as f64)
    }
}

/// Scaled standard deviation of recent prices; the projector's noise amplitude.
pub fn volatility(observations: &[Observation], factor: f64) -> Option<f64> {
    let prices: Vec<f64> = recent(observations).iter().map(|o| o.price_index).collect();
    std_dev(&prices).map(|sd| sd * factor)
}

/// Mean rainfall for `month`, falling back to the overall mean when the month never appears.
pub fn monthly_rainfall_average(observations: &[Observation], month: u32) -> Option<f64> {
    let in_month: Vec<f64> = observations
        .iter()
        .filter(|o| o.month == month)
        .map(|o| o.rainfall)
        .collect();
    mean(&in_month).or_else(|| {
        let all: Vec<f64> = observations.iter().map(|o| o.rainfall).collect();
        mean(&all)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::fixtures::monthly;

    #[test]
    fn flat_series_has_unit_profile_and_zero_trend() {
        let obs = monthly(&[100.0; 24]);
        let profile = seasonal_profile(&obs);
        assert!(profile.factors().iter().all(|f| (*f - 1.0).abs() < 1e-12));
        assert_eq!(trend(&obs, TREND_WINDOW), Some(0.0));
        assert_eq!(volatility(&obs, VOLATILITY_FACTOR), Some(0.0));
    }

    #[test]
    fn balanced_profile_averages_to_one() {
        let prices: Vec<f64> = (0..36)
            .map(|i| 100.0 + ((i % 12) as f64 * 7.0) + (i / 12) as f64)
            .collect();
        let profile = seasonal_profile(&monthly(&prices));
        let avg = profile.factors().iter().sum::<f64>() / 12.0;
        assert!((avg - 1.0).abs() < 1e-12);
        assert!(profile.factor(12) > profile.factor(1));
    }

    #[test]
    fn missing_months_default_to_one() {
        let obs = monthly(&[80.0, 120.0, 100.0]);
        let profile = seasonal_profile(&obs);
        assert!((profile.factor(1) - 0.8).abs() < 1e-12);
        assert!((profile.factor(2) - 1.2).abs() < 1e-12);
        assert_eq!(profile.factor(7), 1.0);
        assert_eq!(profile.factor(0), 1.0);
        assert_eq!(profile.factor(13), 1.0);
    }

    #[test]
    fn trend_uses_trailing_window() {
        // Old history is ignored; only the last 12 points matter.
        let mut prices = vec![1000.0; 12];
        prices.extend((0..12).map(|i| 100.0 + 2.0 * i as f64));
        let obs = monthly(&prices);
        // (122 - 112) / 6
        let t = trend(&obs, TREND_WINDOW).unwrap();
        assert!((t - 10.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn trend_falls_back_to_available_span() {
        let obs = monthly(&[100.0, 104.0, 108.0, 112.0]);
        // (112 - 100) / 4
        assert_eq!(trend(&obs, TREND_WINDOW), Some(3.0));
        assert_eq!(trend(&[], TREND_WINDOW), None);
    }

    #[test]
    fn volatility_scales_recent_population_std_dev() {
        let mut prices = vec![5000.0; 6];
        prices.extend([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, 5.0, 5.0, 5.0, 5.0]);
        let obs = monthly(&prices);
        let recent: Vec<f64> = prices[prices.len() - 12..].to_vec();
        let expected = std_dev(&recent).unwrap() * 0.1;
        let actual = volatility(&obs, VOLATILITY_FACTOR).unwrap();
        assert!((actual - expected).abs() < 1e-12);
        assert_eq!(volatility(&[], VOLATILITY_FACTOR), None);
    }

    #[test]
    fn rainfall_average_falls_back_to_overall_mean() {
        let mut obs = monthly(&[100.0; 3]);
        obs[0].rainfall = 10.0;
        obs[1].rainfall = 20.0;
        obs[2].rainfall = 60.0;
        assert_eq!(monthly_rainfall_average(&obs, 2), Some(20.0));
        assert_eq!(monthly_rainfall_average(&obs, 9), Some(30.0));
        assert_eq!(monthly_rainfall_average(&[], 9), None);
    }
}
