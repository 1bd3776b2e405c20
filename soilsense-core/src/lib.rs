//! Signal-processing core for SoilSense 7-in-1 soil probes
//!
//! Turns raw probe readings (temperature, moisture, EC, pH, N, P, K) into
//! calibrated, compensated and filtered values, then decides whether the
//! result is worth publishing.
//!
//! Key constraints:
//! - Runs on the probe MCU next to the Modbus and radio tasks
//! - No heap allocation; all state is fixed-capacity
//! - A cycle never fails: stages degrade and report why
//!
//! ```no_run
//! use soilsense_core::{PipelineConfig, PipelineContext, RawSample, SensorReading};
//!
//! let mut pipeline = PipelineContext::new(PipelineConfig::default());
//! pipeline.boot();
//!
//! let raw = SensorReading { temperature: 21.5, humidity: 32.0, ec: 840.0, ph: 6.6, ..Default::default() };
//! let cycle = pipeline.run_cycle(RawSample::new(raw));
//! if cycle.should_publish() {
//!     // hand cycle.reading to the radio task
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Logging shims. Modules log through these so that builds without the
// `log` feature compile the calls away.
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod calibration;
pub mod compensation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod handoff;
pub mod pipeline;
pub mod publish;
pub mod reading;
pub mod soil;
pub mod storage;
pub mod traits;

// Public API
pub use calibration::{CalibrationPoint, CalibrationStore, CalibrationTable, ChannelCorrections, CorrectionFactors};
pub use compensation::{apply_compensation, CompensationOptions};
pub use config::PipelineConfig;
pub use errors::{BestEffort, CalibrationError, CalibrationResult, DegradeReason, Degraded, Processed};
pub use filter::{FilterAlgorithm, FilterBank, FilterSettings, FilterStats};
pub use handoff::SnapshotQueue;
#[cfg(feature = "std")]
pub use handoff::SnapshotSlot;
pub use pipeline::{process, CycleOutput, PipelineContext, StageOutcome, StageReport};
pub use publish::{DeltaThresholds, PublishDecision, PublishGate};
pub use reading::{Channel, RawSample, SensorReading};
pub use soil::{SoilProfile, SoilType};
#[cfg(feature = "std")]
pub use storage::FileCalibrationStorage;
pub use storage::{MemoryCalibrationStorage, TableFileLayout};
pub use traits::{CalibrationStorage, ReadingSink, ReadingSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
