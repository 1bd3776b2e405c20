//! Scalar Kalman filter for a slowly varying soil quantity
//!
//! The state is the true channel value under a random-walk model, so the
//! transition and measurement matrices collapse to 1:
//!
//! ```text
//! predict:  P⁻ = P + Q
//! update:   K  = P⁻ / (P⁻ + R)
//!           x  = x + K·(z − x)
//!           P  = (1 − K)·P⁻
//! ```
//!
//! The first measurement seeds the estimate directly.

use crate::constants::filters::{KALMAN_INITIAL_UNCERTAINTY, KALMAN_MEASUREMENT_NOISE, KALMAN_PROCESS_NOISE};

/// One-dimensional Kalman estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalman {
    estimate: Option<f32>,
    covariance: f32,
    process_noise: f32,
    measurement_noise: f32,
}

impl Default for ScalarKalman {
    fn default() -> Self {
        Self::new(KALMAN_PROCESS_NOISE, KALMAN_MEASUREMENT_NOISE)
    }
}

impl ScalarKalman {
    /// Filter with the given noise parameters
    pub const fn new(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            estimate: None,
            covariance: KALMAN_INITIAL_UNCERTAINTY,
            process_noise,
            measurement_noise,
        }
    }

    /// Fold a measurement into the estimate and return it
    pub fn update(&mut self, measurement: f32) -> f32 {
        let x = match self.estimate {
            Some(x) => x,
            None => {
                self.estimate = Some(measurement);
                self.covariance = KALMAN_INITIAL_UNCERTAINTY;
                return measurement;
            }
        };

        let predicted = self.covariance + self.process_noise;
        let gain = predicted / (predicted + self.measurement_noise);
        let next = x + gain * (measurement - x);

        self.estimate = Some(next);
        self.covariance = (1.0 - gain) * predicted;
        next
    }

    /// Current estimate
    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }

    /// Current error covariance
    pub fn covariance(&self) -> f32 {
        self.covariance
    }

    /// Measurement noise R
    pub fn measurement_noise(&self) -> f32 {
        self.measurement_noise
    }

    /// Replace R, used by adaptive tuning
    pub fn set_measurement_noise(&mut self, r: f32) {
        self.measurement_noise = r;
    }

    /// Forget the estimate and restore P₀; noise parameters are kept
    pub fn reset(&mut self) {
        self.estimate = None;
        self.covariance = KALMAN_INITIAL_UNCERTAINTY;
    }

    /// Restart from `value` with P₀
    pub fn seed(&mut self, value: f32) {
        self.estimate = Some(value);
        self.covariance = KALMAN_INITIAL_UNCERTAINTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_measurement_seeds() {
        let mut k = ScalarKalman::default();
        assert_eq!(k.update(12.5), 12.5);
        assert_eq!(k.estimate(), Some(12.5));
    }

    #[test]
    fn single_step_matches_equations() {
        let mut k = ScalarKalman::default();
        k.update(10.0);
        let out = k.update(11.0);
        // P⁻ = 1.01, K = 1.01 / 1.11
        let gain = 1.01f32 / 1.11;
        assert!((out - (10.0 + gain)).abs() < 1e-5);
        assert!((k.covariance() - (1.0 - gain) * 1.01).abs() < 1e-6);
    }

    #[test]
    fn converges_on_constant_input() {
        let mut k = ScalarKalman::default();
        k.update(0.0);
        let mut out = 0.0;
        for _ in 0..200 {
            out = k.update(5.0);
        }
        assert!((out - 5.0).abs() < 0.01);
        assert!(k.covariance() < 0.1);
    }

    #[test]
    fn reset_keeps_noise() {
        let mut k = ScalarKalman::default();
        k.set_measurement_noise(3.0);
        k.update(1.0);
        k.reset();
        assert_eq!(k.estimate(), None);
        assert_eq!(k.measurement_noise(), 3.0);
        assert_eq!(k.covariance(), KALMAN_INITIAL_UNCERTAINTY);
    }
}
