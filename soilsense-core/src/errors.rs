//! Error and Degradation Types
//!
//! ## Design Philosophy
//!
//! The per-sample path never fails hard. A stage that cannot do its job
//! hands back the best value it has together with the reason it could not
//! do better. Two families of types express that:
//!
//! 1. **`CalibrationError`**: returned by operator-driven routines
//!    (regression calibration, table loading, persistence). These run at
//!    boot or on explicit command, so a hard error is appropriate and the
//!    previous state is always kept.
//!
//! 2. **`Degraded<T>`**: returned by per-sample stages. It carries a usable
//!    fallback value plus a `DegradeReason`, so callers can tell
//!    "best-effort value" apart from "fully valid" without losing data.
//!
//! Both are small, `Copy`, and hold only inline data (`&'static str` and
//! numbers), matching the constraints of the acquisition task.
//!
//! ## Handling a degraded stage
//!
//! ```rust
//! use soilsense_core::{BestEffort, DegradeReason, Degraded, Processed};
//!
//! fn smooth(x: f32) -> Processed<f32> {
//!     if x.is_finite() {
//!         Ok(x)
//!     } else {
//!         Err(Degraded::new(0.0, DegradeReason::NonFiniteSample))
//!     }
//! }
//!
//! // Either arm yields a value that is safe to forward.
//! assert_eq!(smooth(1.5).best_effort(), 1.5);
//! assert_eq!(smooth(f32::NAN).best_effort(), 0.0);
//! ```

use thiserror_no_std::Error;

/// Result type for calibration routines
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Errors raised by calibration, table loading and persistence
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Reference or measured value outside the probe's datasheet envelope
    #[error("Value {value} outside envelope [{min}, {max}] for {channel}")]
    OutOfEnvelope {
        /// Channel the value belongs to
        channel: &'static str,
        /// Offending value
        value: f32,
        /// Lower envelope bound
        min: f32,
        /// Upper envelope bound
        max: f32,
    },

    /// Measured values coincide so the least-squares system is singular
    #[error("Degenerate regression: measured values do not span a range")]
    DegenerateRegression,

    /// Fit quality below the acceptance threshold
    #[error("Regression R² {r_squared} below required {required}")]
    QualityGate {
        /// Achieved coefficient of determination
        r_squared: f32,
        /// Minimum accepted coefficient
        required: f32,
    },

    /// NaN, infinity, or otherwise unusable number
    #[error("Invalid value: not a valid number")]
    InvalidValue,

    /// Table already holds its maximum number of points
    #[error("Calibration table full ({capacity} points)")]
    TableFull {
        /// Table capacity
        capacity: usize,
    },

    /// A table source contained no usable point
    #[error("Calibration table has no valid points")]
    EmptyTable,

    /// Not enough points for the requested regression
    #[error("Need {required} calibration points, have {available}")]
    InsufficientPoints {
        /// Points needed
        required: usize,
        /// Points supplied
        available: usize,
    },

    /// Backing storage could not be read or written
    #[error("Calibration storage failure: {reason}")]
    Storage {
        /// Short description of the failure
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OutOfEnvelope { channel, value, min, max } =>
                defmt::write!(fmt, "{} value {} outside [{}, {}]", channel, value, min, max),
            Self::DegenerateRegression =>
                defmt::write!(fmt, "Degenerate regression"),
            Self::QualityGate { r_squared, required } =>
                defmt::write!(fmt, "R² {} below {}", r_squared, required),
            Self::InvalidValue =>
                defmt::write!(fmt, "Invalid value"),
            Self::TableFull { capacity } =>
                defmt::write!(fmt, "Table full ({})", capacity),
            Self::EmptyTable =>
                defmt::write!(fmt, "Empty table"),
            Self::InsufficientPoints { required, available } =>
                defmt::write!(fmt, "Need {} points, have {}", required, available),
            Self::Storage { reason } =>
                defmt::write!(fmt, "Storage: {}", reason),
        }
    }
}

/// Why a per-sample stage fell back to a best-effort value
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegradeReason {
    /// Physically impossible input; the stage was skipped
    #[error("input outside the physical envelope")]
    InvalidInput,

    /// Calibration requested but no table or factors were usable
    #[error("calibration data unavailable")]
    CalibrationUnavailable,

    /// Incoming sample was NaN or infinite; last good output returned
    #[error("non-finite sample")]
    NonFiniteSample,

    /// Filter state went non-finite and was reseeded from the raw value
    #[error("filter state reset")]
    FilterStateReset,
}

#[cfg(feature = "defmt")]
impl defmt::Format for DegradeReason {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInput => defmt::write!(fmt, "InvalidInput"),
            Self::CalibrationUnavailable => defmt::write!(fmt, "CalibrationUnavailable"),
            Self::NonFiniteSample => defmt::write!(fmt, "NonFiniteSample"),
            Self::FilterStateReset => defmt::write!(fmt, "FilterStateReset"),
        }
    }
}

/// A fallback value together with the reason it is not fully valid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Degraded<T> {
    /// Value safe to forward downstream
    pub value: T,
    /// Why the value is only best-effort
    pub reason: DegradeReason,
}

impl<T> Degraded<T> {
    /// Wrap a fallback value
    pub const fn new(value: T, reason: DegradeReason) -> Self {
        Self { value, reason }
    }

    /// Transform the carried value, keeping the reason
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Degraded<U> {
        Degraded { value: f(self.value), reason: self.reason }
    }
}

/// Outcome of a per-sample stage: fully valid or best-effort
pub type Processed<T> = Result<T, Degraded<T>>;

/// Extract the usable value from a [`Processed`] outcome
pub trait BestEffort<T> {
    /// The value regardless of which arm it came from
    fn best_effort(self) -> T;

    /// The degrade reason, if any
    fn degrade_reason(&self) -> Option<DegradeReason>;
}

impl<T> BestEffort<T> for Processed<T> {
    fn best_effort(self) -> T {
        match self {
            Ok(value) => value,
            Err(degraded) => degraded.value,
        }
    }

    fn degrade_reason(&self) -> Option<DegradeReason> {
        match self {
            Ok(_) => None,
            Err(degraded) => Some(degraded.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<CalibrationError>() <= 32);
        assert_eq!(core::mem::size_of::<DegradeReason>(), 1);
    }

    #[test]
    fn best_effort_takes_either_arm() {
        let ok: Processed<f32> = Ok(2.0);
        let degraded: Processed<f32> = Err(Degraded::new(1.0, DegradeReason::InvalidInput));

        assert_eq!(ok.degrade_reason(), None);
        assert_eq!(degraded.degrade_reason(), Some(DegradeReason::InvalidInput));
        assert_eq!(ok.best_effort(), 2.0);
        assert_eq!(degraded.best_effort(), 1.0);
    }

    #[test]
    fn degraded_map_keeps_reason() {
        let d = Degraded::new(3, DegradeReason::FilterStateReset).map(|v| v * 2);
        assert_eq!(d.value, 6);
        assert_eq!(d.reason, DegradeReason::FilterStateReset);
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_messages() {
        let e = CalibrationError::QualityGate { r_squared: 0.5, required: 0.95 };
        assert_eq!(e.to_string(), "Regression R² 0.5 below required 0.95");
        assert_eq!(DegradeReason::NonFiniteSample.to_string(), "non-finite sample");
    }
}
