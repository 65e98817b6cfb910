//! Injectable randomness for simulated market variance.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::domain::carrier::VarianceSpec;

/// Ranges above this are treated as configuration mistakes and capped.
pub const MAX_VARIANCE_RANGE: f64 = 0.5;

pub trait VarianceSource: Send + Sync {
    /// A uniform draw from `[-range, range]`. `range` is always positive and finite.
    fn draw(&self, range: f64) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngVariance;

impl VarianceSource for ThreadRngVariance {
    fn draw(&self, range: f64) -> f64 {
        rand::thread_rng().gen_range(-range..=range)
    }
}

#[derive(Debug)]
pub struct SeededVariance {
    rng: Mutex<StdRng>,
}

impl SeededVariance {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl VarianceSource for SeededVariance {
    fn draw(&self, range: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(-range..=range)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoVariance;

impl VarianceSource for NoVariance {
    fn draw(&self, _range: f64) -> f64 {
        0.0
    }
}

impl VarianceSource for Box<dyn VarianceSource> {
    fn draw(&self, range: f64) -> f64 {
        self.as_ref().draw(range)
    }
}

/// Multiplier `1 + U(-range, range)` for a carrier, or exactly 1 when variance is off.
pub fn variance_factor(source: &dyn VarianceSource, spec: &VarianceSpec) -> Decimal {
    if !spec.enabled || !spec.range.is_finite() || spec.range <= 0.0 {
        return Decimal::ONE;
    }

    let range = spec.range.min(MAX_VARIANCE_RANGE);
    let noise = source.draw(range).clamp(-range, range);
    Decimal::from_f64(1.0 + noise).map_or(Decimal::ONE, |factor| factor.round_dp(6))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{variance_factor, NoVariance, SeededVariance, ThreadRngVariance, VarianceSource};
    use crate::domain::carrier::VarianceSpec;

    #[test]
    fn disabled_or_empty_spec_is_neutral() {
        let source = ThreadRngVariance;
        assert_eq!(
            variance_factor(&source, &VarianceSpec { enabled: false, range: 0.2 }),
            Decimal::ONE
        );
        assert_eq!(variance_factor(&source, &VarianceSpec { enabled: true, range: 0.0 }), Decimal::ONE);
        assert_eq!(
            variance_factor(&source, &VarianceSpec { enabled: true, range: f64::NAN }),
            Decimal::ONE
        );
    }

    #[test]
    fn factor_stays_within_configured_range() {
        let source = ThreadRngVariance;
        let spec = VarianceSpec { enabled: true, range: 0.05 };
        let low = Decimal::new(95, 2);
        let high = Decimal::new(105, 2);

        for _ in 0..500 {
            let factor = variance_factor(&source, &spec);
            assert!(factor >= low && factor <= high, "factor {factor} escaped range");
        }
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let first = SeededVariance::new(42);
        let second = SeededVariance::new(42);

        let left: Vec<f64> = (0..5).map(|_| first.draw(0.1)).collect();
        let right: Vec<f64> = (0..5).map(|_| second.draw(0.1)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn no_variance_always_returns_one() {
        let spec = VarianceSpec { enabled: true, range: 0.3 };
        assert_eq!(variance_factor(&NoVariance, &spec), Decimal::ONE);
    }
}
