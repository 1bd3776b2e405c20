//! Boundary traits
//!
//! The core never talks to hardware, radios or flash directly. These
//! traits are the seams the firmware plugs its collaborators into:
//!
//! - [`ReadingSource`]: the Modbus register transport
//! - [`ReadingSink`]: the MQTT / ThingSpeak transport
//! - [`CalibrationStorage`]: wherever tables and factors persist
//!
//! Keep implementations thin; all signal processing stays in the core.

use crate::calibration::{CalibrationTable, ChannelCorrections};
use crate::errors::CalibrationResult;
use crate::pipeline::CycleOutput;
use crate::reading::{Channel, RawSample};
use crate::soil::SoilProfile;

/// Produces raw samples, one per acquisition cycle
pub trait ReadingSource {
    /// Transport error
    type Error;

    /// Read the next raw sample
    fn read(&mut self) -> Result<RawSample, Self::Error>;
}

/// Consumes processed cycles that passed the publish gate
pub trait ReadingSink {
    /// Transport error
    type Error;

    /// Deliver a snapshot of one cycle
    fn deliver(&mut self, output: &CycleOutput) -> Result<(), Self::Error>;
}

/// Persistence for calibration tables and correction factors
///
/// Loads return `Ok(None)` when nothing is stored. Saves must be atomic:
/// a reader never observes a half-written table.
pub trait CalibrationStorage {
    /// Load the table for `(profile, channel)`
    fn load_table(&self, profile: SoilProfile, channel: Channel) -> CalibrationResult<Option<CalibrationTable>>;

    /// Persist the table for `(profile, channel)`
    fn save_table(&mut self, profile: SoilProfile, channel: Channel, table: &CalibrationTable) -> CalibrationResult<()>;

    /// Delete the table for `(profile, channel)`; returns whether one existed
    fn remove_table(&mut self, profile: SoilProfile, channel: Channel) -> CalibrationResult<bool>;

    /// Load regression correction factors
    fn load_corrections(&self) -> CalibrationResult<Option<ChannelCorrections>>;

    /// Persist regression correction factors
    fn save_corrections(&mut self, corrections: &ChannelCorrections) -> CalibrationResult<()>;
}
