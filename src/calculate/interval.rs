//! Prediction intervals for small samples.

use super::student_t::StudentT;
use crate::models::ScoreInterval;

/// Lower quantile of a one-standard-deviation band under normality.
pub const ONE_DEVIATION_LOWER_BOUND: f64 = 0.16;

/// Upper quantile of a one-standard-deviation band under normality.
pub const ONE_DEVIATION_UPPER_BOUND: f64 = 0.84;

/// Band expected to contain the next single observation.
///
/// With n > 1 samples: `center` is the sample mean, and the bounds are
/// `center + q * s * sqrt(1 + 1/n)` where `s` is the sample standard
/// deviation (n - 1 denominator) and `q` the t(n - 1) quantile at 0.16 and
/// 0.84. One sample yields only a center; none yields nothing.
pub fn prediction_interval(samples: &[f64]) -> ScoreInterval {
    let n = samples.len();

    match n {
        0 => ScoreInterval::empty(),
        1 => ScoreInterval::point(samples[0]),
        _ => {
            let n_f = n as f64;
            let mean = samples.iter().sum::<f64>() / n_f;
            let deviation = sample_std_dev(samples, mean);

            let (q_low, q_high) = match StudentT::new(n_f - 1.0) {
                Some(t) => (
                    t.inverse_cdf(ONE_DEVIATION_LOWER_BOUND),
                    t.inverse_cdf(ONE_DEVIATION_UPPER_BOUND),
                ),
                None => (0.0, 0.0),
            };
            let spread = deviation * (1.0 + 1.0 / n_f).sqrt();

            ScoreInterval {
                low: Some(mean + q_low * spread),
                center: Some(mean),
                high: Some(mean + q_high * spread),
            }
        }
    }
}

/// Sample standard deviation with Bessel's correction. Needs two samples.
fn sample_std_dev(samples: &[f64], mean: f64) -> f64 {
    let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
    (sum_sq / (samples.len() as f64 - 1.0)).sqrt()
}
