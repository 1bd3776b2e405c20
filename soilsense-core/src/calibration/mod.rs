//! Calibration Store
//!
//! ## Overview
//!
//! Cheap capacitive probes drift from unit to unit and with the soil they
//! sit in. Two independent corrections are kept:
//!
//! 1. **Interpolation tables** per (soil profile, channel): piecewise-linear
//!    multiplicative factors measured against lab references.
//! 2. **Correction factors** per channel: slope/offset from 2- or 3-point
//!    regression against reference solutions, or single offsets.
//!
//! Both may be active at once; the table is applied first, the factors
//! second.
//!
//! ```text
//! raw ──► table(profile, channel) ──► slope·x + offset ──► clamp(NPK ≥ 0) ──► calibrated
//!          (skipped if absent)        (skipped if uncalibrated)
//! ```
//!
//! ## Loading
//!
//! A table is parsed completely before it replaces the stored one, so a
//! failed load leaves the previous table (or raw passthrough) in place.
//! Loading happens at boot or on reconfiguration, never per sample.

pub mod factors;
pub mod regression;
pub mod table;

pub use factors::{ChannelCorrections, CorrectionFactors};
pub use regression::{fit_linear, RegressionFit};
pub use table::{CalibrationPoint, CalibrationTable, CsvStats};

use heapless::Vec;

use crate::constants::calibration::MAX_TABLES;
use crate::errors::{CalibrationError, CalibrationResult, DegradeReason, Degraded, Processed};
use crate::reading::{Channel, SensorReading};
use crate::soil::SoilProfile;

#[derive(Debug, Clone)]
struct TableSlot {
    profile: SoilProfile,
    channel: Channel,
    table: CalibrationTable,
}

/// Calibration tables and correction factors for one probe
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    tables: Vec<TableSlot, MAX_TABLES>,
    corrections: ChannelCorrections,
}

impl CalibrationStore {
    /// Store with no tables and factory-default factors
    pub const fn new() -> Self {
        Self { tables: Vec::new(), corrections: ChannelCorrections::new() }
    }

    fn slot(&self, profile: SoilProfile, channel: Channel) -> Option<&TableSlot> {
        self.tables.iter().find(|s| s.profile == profile && s.channel == channel)
    }

    /// Install a complete table, replacing any existing one for the key
    pub fn insert_table(
        &mut self,
        profile: SoilProfile,
        channel: Channel,
        table: CalibrationTable,
    ) -> CalibrationResult<()> {
        if table.is_empty() {
            return Err(CalibrationError::EmptyTable);
        }
        if let Some(slot) = self
            .tables
            .iter_mut()
            .find(|s| s.profile == profile && s.channel == channel)
        {
            slot.table = table;
            return Ok(());
        }
        self.tables
            .push(TableSlot { profile, channel, table })
            .map_err(|_| CalibrationError::TableFull { capacity: MAX_TABLES })
    }

    /// Parse CSV text and install it as the table for `(profile, channel)`
    ///
    /// On error the previous table is untouched.
    pub fn load_table_csv(
        &mut self,
        profile: SoilProfile,
        channel: Channel,
        text: &str,
    ) -> CalibrationResult<CsvStats> {
        let (table, stats) = CalibrationTable::parse_csv(text).map_err(|e| {
            log_warn!("{}/{} table load failed: {}", profile.name(), channel.name(), e);
            e
        })?;
        if stats.malformed > 0 {
            log_debug!(
                "{}/{} table: skipped {} malformed rows",
                profile.name(),
                channel.name(),
                stats.malformed
            );
        }
        self.insert_table(profile, channel, table)?;
        log_info!("{}/{} table loaded: {} points", profile.name(), channel.name(), stats.points);
        Ok(stats)
    }

    /// Table for `(profile, channel)`
    pub fn table(&self, profile: SoilProfile, channel: Channel) -> Option<&CalibrationTable> {
        self.slot(profile, channel).map(|s| &s.table)
    }

    /// True when a table is loaded for `(profile, channel)`
    pub fn has_table(&self, profile: SoilProfile, channel: Channel) -> bool {
        self.slot(profile, channel).is_some()
    }

    /// Number of knots in the `(profile, channel)` table, 0 if absent
    pub fn point_count(&self, profile: SoilProfile, channel: Channel) -> usize {
        self.table(profile, channel).map_or(0, CalibrationTable::len)
    }

    /// Remove one table; returns whether one was present
    pub fn clear_table(&mut self, profile: SoilProfile, channel: Channel) -> bool {
        match self
            .tables
            .iter()
            .position(|s| s.profile == profile && s.channel == channel)
        {
            Some(idx) => {
                self.tables.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every table and restore factory correction factors
    pub fn reset(&mut self) {
        self.tables.clear();
        self.corrections.reset();
        log_info!("calibration reset to factory defaults");
    }

    /// Iterate over loaded tables
    pub fn tables(&self) -> impl Iterator<Item = (SoilProfile, Channel, &CalibrationTable)> {
        self.tables.iter().map(|s| (s.profile, s.channel, &s.table))
    }

    /// Active correction factors
    pub fn corrections(&self) -> &ChannelCorrections {
        &self.corrections
    }

    /// Mutable access for the calibration routines
    pub fn corrections_mut(&mut self) -> &mut ChannelCorrections {
        &mut self.corrections
    }

    /// Replace all correction factors, e.g. after reloading them at boot
    pub fn set_corrections(&mut self, corrections: ChannelCorrections) {
        self.corrections = corrections;
    }

    /// Two-point EC calibration, see [`ChannelCorrections::calibrate_ec`]
    pub fn calibrate_ec(&mut self, points: [(f32, f32); 2]) -> CalibrationResult<RegressionFit> {
        self.corrections.calibrate_ec(points)
    }

    /// Three-point pH calibration, see [`ChannelCorrections::calibrate_ph`]
    pub fn calibrate_ph(&mut self, points: [(f32, f32); 3]) -> CalibrationResult<RegressionFit> {
        self.corrections.calibrate_ph(points)
    }

    /// Reference offset for temperature or humidity
    pub fn calibrate_reference_offset(
        &mut self,
        channel: Channel,
        reference: f32,
        measured: f32,
    ) -> CalibrationResult<CorrectionFactors> {
        self.corrections.calibrate_reference_offset(channel, reference, measured)
    }

    /// NPK zero offsets
    pub fn calibrate_npk_zero(&mut self, nitrogen: f32, phosphorus: f32, potassium: f32) -> CalibrationResult<()> {
        self.corrections.calibrate_npk_zero(nitrogen, phosphorus, potassium)
    }

    /// True when `profile` has any table or the store has calibrated factors
    pub fn is_available(&self, profile: SoilProfile) -> bool {
        self.corrections.any_calibrated() || self.tables.iter().any(|s| s.profile == profile)
    }

    /// Apply table and factor correction to every channel
    ///
    /// A reading with a non-finite channel, or a profile with nothing to
    /// apply, comes back unchanged as a degraded value.
    pub fn apply_calibration(&self, reading: &SensorReading, profile: SoilProfile) -> Processed<SensorReading> {
        if !reading.is_finite() {
            log_warn!("calibration skipped: non-finite input");
            return Err(Degraded::new(*reading, DegradeReason::InvalidInput));
        }
        if !self.is_available(profile) {
            log_debug!("calibration unavailable for {}", profile.name());
            return Err(Degraded::new(*reading, DegradeReason::CalibrationUnavailable));
        }

        let calibrated = reading.map_channels(|channel, raw| {
            let tabled = self
                .table(profile, channel)
                .and_then(|t| t.apply(raw))
                .unwrap_or(raw);
            self.corrections.apply_value(channel, tabled)
        });

        if !calibrated.is_finite() {
            log_warn!("calibration produced non-finite output, passing raw through");
            return Err(Degraded::new(*reading, DegradeReason::InvalidInput));
        }
        Ok(calibrated)
    }
}
