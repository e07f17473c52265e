//! Iterative trend + seasonality projector.
//!
//! Each projected month compounds on the previous projected value and is bounded to a band
//! around it, so the output is a bounded random walk rather than a single-shot extrapolation.
//! Randomness comes from an injected [`NoiseSource`]; seed it for reproducible output.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::analytics::features::{self, TREND_WINDOW, VOLATILITY_FACTOR};
use crate::domain::series::Observation;
use crate::time::calendar::target_month;

const LOWER_BOUND: f64 = 0.8;
const UPPER_BOUND: f64 = 1.3;
const FALLBACK_NOISE: f64 = 0.02;
const FALLBACK_FLOOR: f64 = 0.9;

pub trait NoiseSource {
    /// Draws from a zero-mean normal distribution. `None` when `std_dev` is not usable.
    fn gaussian(&mut self, std_dev: f64) -> Option<f64>;
}

/// Gaussian noise backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngNoise<R> {
    rng: R,
}

impl<R: Rng> RngNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> NoiseSource for RngNoise<R> {
    fn gaussian(&mut self, std_dev: f64) -> Option<f64> {
        if std_dev == 0.0 {
            return Some(0.0);
        }
        let normal = Normal::new(0.0, std_dev).ok()?;
        Some(normal.sample(&mut self.rng))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceProjector {
    pub trend_window: usize,
    pub volatility_factor: f64,
}

impl Default for PriceProjector {
    fn default() -> Self {
        Self {
            trend_window: TREND_WINDOW,
            volatility_factor: VOLATILITY_FACTOR,
        }
    }
}

impl PriceProjector {
    /// Projects `horizon` monthly prices following `start_month`.
    ///
    /// Falls back to a non-compounding linear rule when the seasonal path cannot be computed.
    /// An empty result means no forecast is available; it is never zero-filled.
    pub fn project(
        &self,
        observations: &[Observation],
        start_month: u32,
        horizon: usize,
        noise: &mut impl NoiseSource,
    ) -> Vec<f64> {
        if let Some(projection) = self.project_seasonal(observations, start_month, horizon, noise) {
            return projection;
        }

        tracing::debug!(
            observations = observations.len(),
            "seasonal projection not computable; using linear fallback"
        );
        self.project_linear(observations, horizon, noise)
            .unwrap_or_default()
    }

    fn project_seasonal(
        &self,
        observations: &[Observation],
        start_month: u32,
        horizon: usize,
        noise: &mut impl NoiseSource,
    ) -> Option<Vec<f64>> {
        let mut last_price = observations.last()?.price_index;
        let trend = features::trend(observations, self.trend_window)?;
        let volatility = features::volatility(observations, self.volatility_factor)?;
        let profile = features::seasonal_profile(observations);

        if !(last_price.is_finite() && last_price >= 0.0 && trend.is_finite()) {
            return None;
        }
        if !(volatility.is_finite() && profile.is_finite()) {
            return None;
        }

        let mut out = Vec::with_capacity(horizon);
        for step in 1..=horizon {
            let month = target_month(start_month, step);
            let base = last_price + trend * step as f64;
            let seasonal = base * profile.factor(month);
            let raw = seasonal + noise.gaussian(volatility)?;
            if !raw.is_finite() {
                return None;
            }

            let bounded = raw
                .clamp(last_price * LOWER_BOUND, last_price * UPPER_BOUND)
                .max(0.0);
            out.push(bounded);
            last_price = bounded;
        }
        Some(out)
    }

    fn project_linear(
        &self,
        observations: &[Observation],
        horizon: usize,
        noise: &mut impl NoiseSource,
    ) -> Option<Vec<f64>> {
        let latest = observations.last()?.price_index;
        let trend = features::trend(observations, self.trend_window)?;

        (1..=horizon)
            .map(|step| {
                let jitter = noise.gaussian(latest * FALLBACK_NOISE)?;
                let predicted = latest + trend * step as f64 + jitter;
                predicted
                    .is_finite()
                    .then(|| predicted.max(latest * FALLBACK_FLOOR))
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedNoise;
    use super::*;
    use crate::domain::series::fixtures::monthly;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> RngNoise<StdRng> {
        RngNoise::new(StdRng::seed_from_u64(seed))
    }

    fn wavy(len: usize) -> Vec<Observation> {
        let prices: Vec<f64> = (0..len)
            .map(|i| 100.0 + 15.0 * ((i % 12) as f64 - 5.5).abs() + i as f64)
            .collect();
        monthly(&prices)
    }

    #[test]
    fn returns_horizon_non_negative_values() {
        let obs = wavy(30);
        let projector = PriceProjector::default();
        for horizon in 6..=12 {
            for start in 1..=12 {
                let out = projector.project(&obs, start, horizon, &mut seeded(start as u64));
                assert_eq!(out.len(), horizon);
                assert!(out.iter().all(|p| *p >= 0.0));
            }
        }
    }

    #[test]
    fn each_step_stays_within_band_of_previous() {
        let obs = wavy(24);
        let projector = PriceProjector::default();
        let out = projector.project(&obs, 3, 12, &mut seeded(7));

        let mut prev = obs.last().unwrap().price_index;
        for p in out {
            assert!(
                p >= prev * 0.8 - 1e-9 && p <= prev * 1.3 + 1e-9,
                "{p} vs {prev}"
            );
            prev = p;
        }
    }

    #[test]
    fn extreme_noise_is_clamped() {
        let obs = wavy(24);
        let projector = PriceProjector::default();
        let latest = obs.last().unwrap().price_index;

        let up = projector.project(&obs, 1, 6, &mut FixedNoise(1e9));
        let mut expected = latest;
        for p in &up {
            expected *= 1.3;
            assert!((p - expected).abs() < 1e-6);
        }

        let down = projector.project(&obs, 1, 6, &mut FixedNoise(-1e9));
        let mut expected = latest;
        for p in &down {
            expected *= 0.8;
            assert!((p - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn flat_series_without_noise_is_flat() {
        let obs = monthly(&[100.0; 24]);
        let projector = PriceProjector::default();
        for horizon in 6..=12 {
            let out = projector.project(&obs, 5, horizon, &mut FixedNoise(0.0));
            assert_eq!(out, vec![100.0; horizon]);
        }

        // Zero volatility means the seeded generator contributes nothing either.
        let out = projector.project(&obs, 5, 6, &mut seeded(3));
        assert_eq!(out, vec![100.0; 6]);
    }

    #[test]
    fn same_seed_reproduces_projection() {
        let obs = wavy(24);
        let projector = PriceProjector::default();
        let a = projector.project(&obs, 4, 9, &mut seeded(11));
        let b = projector.project(&obs, 4, 9, &mut seeded(11));
        assert_eq!(a, b);
    }

    #[test]
    fn projections_compound_on_previous_step() {
        // Seasonality neutral (single month), no noise: step k adds k * trend to the previous
        // projected value, not to the last observed price.
        let prices: Vec<f64> = (0..12).map(|i| 100.0 + 10.0 * i as f64).collect();
        let mut obs = monthly(&prices);
        for o in obs.iter_mut() {
            o.month = 1;
        }
        let trend = (210.0 - 160.0) / 6.0;
        let projector = PriceProjector::default();
        let out = projector.project(&obs, 12, 3, &mut FixedNoise(0.0));

        let expected = [210.0 + trend, 210.0 + 3.0 * trend, 210.0 + 6.0 * trend];
        assert_eq!(out.len(), 3);
        for (p, e) in out.iter().zip(expected) {
            assert!((p - e).abs() < 1e-9, "{p} vs {e}");
        }
    }

    #[test]
    fn falls_back_when_statistics_overflow() {
        let obs = monthly(&[f64::MAX; 12]);
        let projector = PriceProjector::default();
        let out = projector.project(&obs, 1, 6, &mut FixedNoise(0.0));
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|p| *p >= f64::MAX * 0.9));
    }

    #[test]
    fn empty_history_yields_no_forecast() {
        let projector = PriceProjector::default();
        let projection = projector.project(&[], 1, 6, &mut FixedNoise(0.0));
        assert!(projection.is_empty());
    }
}
