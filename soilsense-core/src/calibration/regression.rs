//! Least-squares line fit for reference-solution calibration
//!
//! Operators dip the probe in reference solutions and record
//! `(expected, measured)` pairs. The fit maps measured values onto the
//! expected scale: `expected ≈ slope · measured + offset`.
//!
//! Sums are accumulated in `f64`. EC points reach 10⁴ µS/cm, so `Σx²`
//! reaches 10⁸ and the `(Σx)² − nΣx²` denominator loses most of its
//! significant digits in `f32`.

use crate::constants::calibration::{REGRESSION_MIN_DENOMINATOR, REGRESSION_MIN_SS_TOT};
use crate::errors::{CalibrationError, CalibrationResult};

/// Result of a line fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    /// Gain applied to measured values
    pub slope: f32,
    /// Offset added after the gain
    pub offset: f32,
    /// Coefficient of determination
    pub r_squared: f32,
}

/// Fit a line through `(expected, measured)` pairs
///
/// Two points give the exact line through them (R² = 1). Three or more
/// use ordinary least squares.
pub fn fit_linear(pairs: &[(f32, f32)]) -> CalibrationResult<RegressionFit> {
    if pairs.len() < 2 {
        return Err(CalibrationError::InsufficientPoints { required: 2, available: pairs.len() });
    }
    if pairs.iter().any(|&(e, m)| !e.is_finite() || !m.is_finite()) {
        return Err(CalibrationError::InvalidValue);
    }

    if let [(y1, x1), (y2, x2)] = *pairs {
        let dx = f64::from(x2) - f64::from(x1);
        if libm::fabs(dx) < f64::from(REGRESSION_MIN_DENOMINATOR) {
            return Err(CalibrationError::DegenerateRegression);
        }
        let slope = (f64::from(y2) - f64::from(y1)) / dx;
        let offset = f64::from(y1) - slope * f64::from(x1);
        return Ok(RegressionFit { slope: slope as f32, offset: offset as f32, r_squared: 1.0 });
    }

    let n = pairs.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for &(e, m) in pairs {
        let (x, y) = (f64::from(m), f64::from(e));
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let denominator = sx * sx - n * sxx;
    if libm::fabs(denominator) < f64::from(REGRESSION_MIN_DENOMINATOR) {
        return Err(CalibrationError::DegenerateRegression);
    }

    let slope = (sy * sx - n * sxy) / denominator;
    let offset = (sy - slope * sx) / n;

    let mean_y = sy / n;
    let (mut ss_res, mut ss_tot) = (0.0f64, 0.0f64);
    for &(e, m) in pairs {
        let (x, y) = (f64::from(m), f64::from(e));
        let predicted = slope * x + offset;
        ss_res += (y - predicted) * (y - predicted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }

    let r_squared = if ss_tot < f64::from(REGRESSION_MIN_SS_TOT) {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(RegressionFit {
        slope: slope as f32,
        offset: offset as f32,
        r_squared: r_squared as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_points_are_exact() {
        let fit = fit_linear(&[(1413.0, 1300.0), (12880.0, 12000.0)]).unwrap();
        assert_eq!(fit.r_squared, 1.0);
        assert!((fit.slope * 1300.0 + fit.offset - 1413.0).abs() < 0.05);
        assert!((fit.slope * 12000.0 + fit.offset - 12880.0).abs() < 0.05);
    }

    #[test]
    fn collinear_three_points() {
        // measured reads 0.2 high with a 2% gain error
        let pairs = [(4.0, 4.28), (7.0, 7.34), (9.0, 9.38)];
        let fit = fit_linear(&pairs).unwrap();
        assert!(fit.r_squared > 0.9999);
        for (e, m) in pairs {
            assert!((fit.slope * m + fit.offset - e).abs() < 1e-3);
        }
    }

    #[test]
    fn noisy_points_lower_r_squared() {
        let fit = fit_linear(&[(4.0, 4.0), (7.0, 8.5), (9.0, 8.0)]).unwrap();
        assert!(fit.r_squared < 0.95);
    }

    #[test]
    fn identical_measurements_are_degenerate() {
        assert_eq!(
            fit_linear(&[(4.0, 7.0), (7.0, 7.0), (9.0, 7.0)]),
            Err(CalibrationError::DegenerateRegression)
        );
        assert_eq!(
            fit_linear(&[(1413.0, 500.0), (12880.0, 500.0)]),
            Err(CalibrationError::DegenerateRegression)
        );
    }

    #[test]
    fn needs_two_points() {
        assert_eq!(
            fit_linear(&[(7.0, 7.1)]),
            Err(CalibrationError::InsufficientPoints { required: 2, available: 1 })
        );
    }

    #[test]
    fn non_finite_rejected() {
        assert_eq!(fit_linear(&[(7.0, f32::NAN), (4.0, 4.1)]), Err(CalibrationError::InvalidValue));
    }
}
