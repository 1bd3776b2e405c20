//! Regression-derived correction factors and the routines that produce them
//!
//! Every routine validates its inputs against the probe envelope, fits,
//! and commits the new factors only when the fit passes the R² gate. On
//! any failure the previously active factors stay in place.

use crate::calibration::regression::{fit_linear, RegressionFit};
use crate::constants::calibration::{EC_CALIBRATION_POINTS, MIN_R_SQUARED, PH_CALIBRATION_POINTS};
use crate::errors::{CalibrationError, CalibrationResult};
use crate::reading::{Channel, SensorReading};

/// Linear correction for one channel: `slope · x + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrectionFactors {
    /// Gain
    pub slope: f32,
    /// Additive offset
    pub offset: f32,
    /// R² of the fit that produced these factors
    pub r_squared: f32,
    /// Only calibrated factors are applied
    pub calibrated: bool,
}

impl CorrectionFactors {
    /// Factory defaults: identity, not calibrated
    pub const IDENTITY: Self = Self { slope: 1.0, offset: 0.0, r_squared: 0.0, calibrated: false };

    fn from_fit(fit: RegressionFit) -> Self {
        Self { slope: fit.slope, offset: fit.offset, r_squared: fit.r_squared, calibrated: true }
    }

    /// Correct `value`; uncalibrated factors pass it through
    pub fn apply(&self, value: f32) -> f32 {
        if self.calibrated {
            self.slope * value + self.offset
        } else {
            value
        }
    }
}

impl Default for CorrectionFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Correction factors for all seven channels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelCorrections {
    factors: [CorrectionFactors; Channel::COUNT],
}

impl Default for ChannelCorrections {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCorrections {
    /// All channels at factory defaults
    pub const fn new() -> Self {
        Self { factors: [CorrectionFactors::IDENTITY; Channel::COUNT] }
    }

    /// Factors of one channel
    pub fn get(&self, channel: Channel) -> CorrectionFactors {
        self.factors[channel.index()]
    }

    /// Replace the factors of one channel
    pub fn set(&mut self, channel: Channel, factors: CorrectionFactors) {
        self.factors[channel.index()] = factors;
    }

    /// True when any channel carries calibrated factors
    pub fn any_calibrated(&self) -> bool {
        self.factors.iter().any(|f| f.calibrated)
    }

    /// Restore factory defaults
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Correct one value; nutrient channels never go below zero
    pub fn apply_value(&self, channel: Channel, value: f32) -> f32 {
        let corrected = self.get(channel).apply(value);
        if channel.is_nutrient() {
            corrected.max(0.0)
        } else {
            corrected
        }
    }

    /// Correct every channel of a reading
    pub fn apply(&self, reading: &SensorReading) -> SensorReading {
        reading.map_channels(|c, v| self.apply_value(c, v))
    }

    /// Two-point EC calibration from `(expected, measured)` pairs in µS/cm
    pub fn calibrate_ec(
        &mut self,
        points: [(f32, f32); EC_CALIBRATION_POINTS],
    ) -> CalibrationResult<RegressionFit> {
        self.calibrate_regression(Channel::Ec, &points)
    }

    /// Three-point pH calibration from `(expected, measured)` buffer pairs
    pub fn calibrate_ph(
        &mut self,
        points: [(f32, f32); PH_CALIBRATION_POINTS],
    ) -> CalibrationResult<RegressionFit> {
        self.calibrate_regression(Channel::Ph, &points)
    }

    /// Fit, gate and commit factors for `channel`
    pub fn calibrate_regression(
        &mut self,
        channel: Channel,
        points: &[(f32, f32)],
    ) -> CalibrationResult<RegressionFit> {
        for &(expected, measured) in points {
            check_envelope(channel, expected)?;
            check_envelope(channel, measured)?;
        }

        let fit = fit_linear(points).map_err(|e| {
            log_warn!("{} calibration rejected: {}", channel.name(), e);
            e
        })?;

        if !fit.slope.is_finite() || !fit.offset.is_finite() {
            return Err(CalibrationError::InvalidValue);
        }
        if !(fit.r_squared >= MIN_R_SQUARED) {
            log_warn!(
                "{} calibration rejected: R² {} below {}",
                channel.name(),
                fit.r_squared,
                MIN_R_SQUARED
            );
            return Err(CalibrationError::QualityGate {
                r_squared: fit.r_squared,
                required: MIN_R_SQUARED,
            });
        }

        self.set(channel, CorrectionFactors::from_fit(fit));
        log_info!(
            "{} calibrated: slope={} offset={} R²={}",
            channel.name(),
            fit.slope,
            fit.offset,
            fit.r_squared
        );
        Ok(fit)
    }

    /// Single-reference offset for temperature or humidity
    pub fn calibrate_reference_offset(
        &mut self,
        channel: Channel,
        reference: f32,
        measured: f32,
    ) -> CalibrationResult<CorrectionFactors> {
        if !matches!(channel, Channel::Temperature | Channel::Humidity) {
            return Err(CalibrationError::InvalidValue);
        }
        check_envelope(channel, reference)?;
        check_envelope(channel, measured)?;

        let factors = CorrectionFactors {
            slope: 1.0,
            offset: reference - measured,
            r_squared: 1.0,
            calibrated: true,
        };
        self.set(channel, factors);
        log_info!("{} offset calibrated: {}", channel.name(), factors.offset);
        Ok(factors)
    }

    /// Zero-point offsets for N, P and K measured in a zero reference
    ///
    /// All three values are validated before any channel is updated.
    pub fn calibrate_npk_zero(&mut self, nitrogen: f32, phosphorus: f32, potassium: f32) -> CalibrationResult<()> {
        let zeros = [
            (Channel::Nitrogen, nitrogen),
            (Channel::Phosphorus, phosphorus),
            (Channel::Potassium, potassium),
        ];
        for &(channel, measured) in zeros.iter() {
            check_envelope(channel, measured)?;
        }

        for &(channel, measured) in zeros.iter() {
            self.set(
                channel,
                CorrectionFactors { slope: 1.0, offset: -measured, r_squared: 1.0, calibrated: true },
            );
        }
        log_info!("NPK zero offsets: N={} P={} K={}", nitrogen, phosphorus, potassium);
        Ok(())
    }
}

fn check_envelope(channel: Channel, value: f32) -> CalibrationResult<()> {
    if !value.is_finite() {
        return Err(CalibrationError::InvalidValue);
    }
    let (min, max) = channel.envelope();
    if value < min || value > max {
        log_warn!("{} calibration input {} outside [{}, {}]", channel.name(), value, min, max);
        return Err(CalibrationError::OutOfEnvelope { channel: channel.name(), value, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncalibrated_is_identity() {
        let c = ChannelCorrections::new();
        assert!(!c.any_calibrated());
        assert_eq!(c.apply_value(Channel::Ec, 1234.5), 1234.5);
    }

    #[test]
    fn ec_two_point_commits() {
        let mut c = ChannelCorrections::new();
        let fit = c.calibrate_ec([(1413.0, 1350.0), (5000.0, 4800.0)]).unwrap();
        assert_eq!(fit.r_squared, 1.0);
        let f = c.get(Channel::Ec);
        assert!(f.calibrated);
        assert!((c.apply_value(Channel::Ec, 1350.0) - 1413.0).abs() < 0.05);
    }

    #[test]
    fn ph_out_of_envelope_rejected() {
        let mut c = ChannelCorrections::new();
        let err = c.calibrate_ph([(2.0, 2.1), (7.0, 7.1), (9.0, 9.1)]).unwrap_err();
        assert!(matches!(err, CalibrationError::OutOfEnvelope { channel: "ph", .. }));
        assert!(!c.get(Channel::Ph).calibrated);
    }

    #[test]
    fn quality_gate_keeps_prior_factors() {
        let mut c = ChannelCorrections::new();
        c.calibrate_ph([(4.0, 4.1), (7.0, 7.1), (8.5, 8.6)]).unwrap();
        let before = c.get(Channel::Ph);

        let err = c.calibrate_ph([(4.0, 4.0), (7.0, 8.5), (9.0, 8.0)]).unwrap_err();
        assert!(matches!(err, CalibrationError::QualityGate { .. }));
        assert_eq!(c.get(Channel::Ph), before);
    }

    #[test]
    fn degenerate_keeps_prior_factors() {
        let mut c = ChannelCorrections::new();
        assert_eq!(
            c.calibrate_ec([(1413.0, 900.0), (5000.0, 900.0)]),
            Err(CalibrationError::DegenerateRegression)
        );
        assert_eq!(c.get(Channel::Ec), CorrectionFactors::IDENTITY);
    }

    #[test]
    fn reference_offset_only_for_temperature_and_humidity() {
        let mut c = ChannelCorrections::new();
        let f = c.calibrate_reference_offset(Channel::Temperature, 25.0, 24.2).unwrap();
        assert!((f.offset - 0.8).abs() < 1e-5);
        assert!((c.apply_value(Channel::Temperature, 24.2) - 25.0).abs() < 1e-5);
        assert_eq!(
            c.calibrate_reference_offset(Channel::Ec, 100.0, 90.0),
            Err(CalibrationError::InvalidValue)
        );
    }

    #[test]
    fn npk_zero_clamps_at_zero() {
        let mut c = ChannelCorrections::new();
        c.calibrate_npk_zero(5.0, 3.0, 8.0).unwrap();
        assert_eq!(c.apply_value(Channel::Nitrogen, 45.0), 40.0);
        assert_eq!(c.apply_value(Channel::Phosphorus, 1.0), 0.0);
        assert_eq!(c.apply_value(Channel::Potassium, 8.0), 0.0);
    }

    #[test]
    fn npk_zero_is_all_or_nothing() {
        let mut c = ChannelCorrections::new();
        assert!(c.calibrate_npk_zero(5.0, 3.0, 2500.0).is_err());
        assert!(!c.any_calibrated());
    }
}
