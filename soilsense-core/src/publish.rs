//! Publish Gate
//!
//! Decides whether a processed reading is worth a radio transmission. A
//! reading goes out when it is the first since boot, when the gate has
//! held back `force_publish_cycles` readings in a row, or when any channel
//! moved by at least its delta since the last published reading.
//!
//! Moisture has two deltas: one on the raw volumetric content and one on
//! available soil moisture for the configured soil. A narrow wilting point
//! to field capacity band turns a small VWC step into a large change in
//! plant-available water.
//!
//! ```text
//!               previous?
//!          none ──┴── some
//!           │          │
//!         First   skipped ≥ force? ── yes ──► Forced
//!                      │ no
//!               any |Δ| ≥ delta? ── yes ──► Changed(channel)
//!                      │ no
//!                 Suppressed (skipped += 1)
//! ```
//!
//! The gate cannot fail. Non-finite channels never satisfy a delta, so a
//! broken channel at worst delays a publish until the forced refresh.

use crate::compensation::vwc_to_asm;
use crate::constants::publish::{
    DEFAULT_DELTA_EC_US_CM, DEFAULT_DELTA_HUMIDITY_ASM_PCT, DEFAULT_DELTA_HUMIDITY_PCT, DEFAULT_DELTA_NPK_MG_KG,
    DEFAULT_DELTA_PH, DEFAULT_DELTA_TEMPERATURE_C, DEFAULT_FORCE_PUBLISH_CYCLES,
};
use crate::reading::{Channel, SensorReading};
use crate::soil::SoilType;

/// Minimum change per channel that triggers a publish
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeltaThresholds {
    /// Temperature (°C)
    pub temperature: f32,
    /// Moisture (% VWC)
    pub humidity: f32,
    /// Moisture as available soil moisture (%)
    pub humidity_asm: f32,
    /// pH
    pub ph: f32,
    /// EC (µS/cm)
    pub ec: f32,
    /// Shared by N, P and K (mg/kg)
    pub npk: f32,
}

impl Default for DeltaThresholds {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_DELTA_TEMPERATURE_C,
            humidity: DEFAULT_DELTA_HUMIDITY_PCT,
            humidity_asm: DEFAULT_DELTA_HUMIDITY_ASM_PCT,
            ph: DEFAULT_DELTA_PH,
            ec: DEFAULT_DELTA_EC_US_CM,
            npk: DEFAULT_DELTA_NPK_MG_KG,
        }
    }
}

impl DeltaThresholds {
    /// Threshold for one channel
    pub const fn for_channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Ph => self.ph,
            Channel::Ec => self.ec,
            Channel::Nitrogen | Channel::Phosphorus | Channel::Potassium => self.npk,
        }
    }
}

/// Outcome of one gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    /// Nothing published since boot
    First,
    /// Forced refresh after too many skipped cycles
    Forced,
    /// This channel crossed its delta
    Changed(Channel),
    /// Held back
    Suppressed,
}

impl PublishDecision {
    /// True when the reading should be transmitted
    pub const fn should_publish(self) -> bool {
        !matches!(self, PublishDecision::Suppressed)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PublishDecision {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::First => defmt::write!(fmt, "First"),
            Self::Forced => defmt::write!(fmt, "Forced"),
            Self::Changed(c) => defmt::write!(fmt, "Changed({})", c),
            Self::Suppressed => defmt::write!(fmt, "Suppressed"),
        }
    }
}

/// Delta / forced-refresh publish decision
#[derive(Debug, Clone)]
pub struct PublishGate {
    thresholds: DeltaThresholds,
    force_publish_cycles: u8,
    soil: SoilType,
    previous: Option<SensorReading>,
    skip_counter: u32,
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new(DeltaThresholds::default(), DEFAULT_FORCE_PUBLISH_CYCLES)
    }
}

impl PublishGate {
    /// Gate in the never-published state, converting moisture for loam
    pub const fn new(thresholds: DeltaThresholds, force_publish_cycles: u8) -> Self {
        Self { thresholds, force_publish_cycles, soil: SoilType::Loam, previous: None, skip_counter: 0 }
    }

    /// Use `soil` for the available-moisture delta
    pub fn with_soil(mut self, soil: SoilType) -> Self {
        self.soil = soil;
        self
    }

    /// Soil used for the available-moisture delta
    pub fn soil(&self) -> SoilType {
        self.soil
    }

    /// Switch soil; publish history is kept
    pub fn set_soil(&mut self, soil: SoilType) {
        self.soil = soil;
    }

    fn crossed(&self, channel: Channel, current: &SensorReading, previous: &SensorReading) -> bool {
        let (now, then) = (current.get(channel), previous.get(channel));
        if libm::fabsf(now - then) >= self.thresholds.for_channel(channel) {
            return true;
        }
        channel == Channel::Humidity
            && libm::fabsf(vwc_to_asm(now, self.soil) - vwc_to_asm(then, self.soil)) >= self.thresholds.humidity_asm
    }

    /// Decide for `current` and update the gate state
    pub fn evaluate(&mut self, current: &SensorReading) -> PublishDecision {
        let decision = match self.previous {
            None => PublishDecision::First,
            Some(_) if self.skip_counter >= u32::from(self.force_publish_cycles) => PublishDecision::Forced,
            Some(previous) => Channel::ALL
                .iter()
                .copied()
                .find(|&c| self.crossed(c, current, &previous))
                .map_or(PublishDecision::Suppressed, PublishDecision::Changed),
        };

        if decision.should_publish() {
            self.previous = Some(*current);
            self.skip_counter = 0;
            log_debug!("publish: {:?}", decision);
        } else {
            self.skip_counter = self.skip_counter.saturating_add(1);
            log_debug!("publish suppressed ({} skipped)", self.skip_counter);
        }
        decision
    }

    /// Boolean form of [`PublishGate::evaluate`]
    pub fn should_publish(&mut self, current: &SensorReading) -> bool {
        self.evaluate(current).should_publish()
    }

    /// Back to the never-published state
    pub fn reset(&mut self) {
        self.previous = None;
        self.skip_counter = 0;
    }

    /// Consecutive suppressed cycles
    pub fn skip_counter(&self) -> u32 {
        self.skip_counter
    }

    /// Last published reading
    pub fn previous(&self) -> Option<&SensorReading> {
        self.previous.as_ref()
    }

    /// Active thresholds
    pub fn thresholds(&self) -> &DeltaThresholds {
        &self.thresholds
    }

    /// Replace thresholds and cadence; publish history is kept
    pub fn reconfigure(&mut self, thresholds: DeltaThresholds, force_publish_cycles: u8) {
        self.thresholds = thresholds;
        self.force_publish_cycles = force_publish_cycles;
    }
}
