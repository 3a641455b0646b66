//! Scenario generation helpers for continuous uncertainty: discretize a
//! normal distribution into equal-width bins, draw one representative value
//! per bin, and weight each bin by its probability mass.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::BuildError;

/// Rejection attempts per bin before falling back to the bin midpoint.
const MAX_DRAW_ATTEMPTS: usize = 1000;

/// One discretized outcome: a representative value drawn inside the bin and
/// the bin's share of the (truncated) probability mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinDraw {
    pub value: f64,
    pub probability: f64,
}

/// Abramowitz & Stegun 7.1.26, max absolute error 1.5e-7. Plenty for
/// probability weights that get normalized afterwards anyway.
fn erf(x: f64) -> f64 {
    const P: f64 = 0.327_591_1;
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF.
fn phi(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Split `[mean - z*std_dev, mean + z*std_dev]` into `n` equal bins, sample
/// one value inside each bin (rejection from the parent normal, midpoint
/// fallback for far-tail bins) and weight the bins by their normal mass,
/// normalized so the weights sum to 1 over the truncated range.
pub fn binned_normal_draws<R: Rng>(
    rng: &mut R,
    n: usize,
    mean: f64,
    std_dev: f64,
    z: f64,
) -> Result<Vec<BinDraw>, BuildError> {
    if n == 0 {
        return Err(BuildError::EmptyScenarioSet);
    }
    if !(std_dev > 0.0 && std_dev.is_finite()) || !(z > 0.0 && z.is_finite()) || !mean.is_finite() {
        return Err(BuildError::InvalidScenario {
            id: "binned_normal".to_string(),
            reason: format!(
                "need finite mean and positive finite std_dev/z, got mean={} std_dev={} z={}",
                mean, std_dev, z
            ),
        });
    }

    let normal = Normal::new(mean, std_dev).map_err(|e| BuildError::InvalidScenario {
        id: "binned_normal".to_string(),
        reason: e.to_string(),
    })?;

    let lo = mean - z * std_dev;
    let width = 2.0 * z * std_dev / n as f64;
    let truncated_mass = phi(z) - phi(-z);

    let mut draws = Vec::with_capacity(n);
    for i in 0..n {
        let a = lo + i as f64 * width;
        let b = a + width;

        let mut value = 0.5 * (a + b);
        for _ in 0..MAX_DRAW_ATTEMPTS {
            let candidate = normal.sample(rng);
            if candidate >= a && candidate < b {
                value = candidate;
                break;
            }
        }

        let mass = phi((b - mean) / std_dev) - phi((a - mean) / std_dev);
        draws.push(BinDraw {
            value,
            probability: mass / truncated_mass,
        });
    }
    Ok(draws)
}
