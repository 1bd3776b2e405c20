//! Processing Pipeline
//!
//! ## Overview
//!
//! Sequences the stages of one acquisition cycle. Data flows one way and
//! every stage produces a new snapshot:
//!
//! ```text
//! RawSample ─► calibrate ─► compensate ─► [filter] ─► PublishGate ─► CycleOutput
//!              (toggle)      (toggle)     (adaptive ∥ kalman)
//! ```
//!
//! [`process`] is the stateless part (calibration and compensation) and
//! can be called on its own. [`PipelineContext`] owns everything that
//! survives between cycles: configuration, calibration store, filter bank
//! and publish gate. It is owned by the acquisition task; consumers get
//! copies of [`CycleOutput`] through [`crate::handoff`].
//!
//! ## Degradation
//!
//! No stage aborts the cycle. A stage that cannot do its job forwards its
//! input and records why in [`StageReport`]; the cycle still produces a
//! reading and a publish decision.

use crate::calibration::CalibrationStore;
use crate::compensation::apply_compensation;
use crate::config::PipelineConfig;
use crate::errors::{CalibrationResult, DegradeReason, Degraded, Processed};
use crate::filter::FilterBank;
use crate::publish::{PublishDecision, PublishGate};
use crate::reading::{Channel, RawSample, SensorReading};
use crate::traits::{CalibrationStorage, ReadingSink, ReadingSource};

/// What happened in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage ran and its output is fully valid
    Applied,
    /// Stage disabled by configuration, or nothing to apply
    Skipped,
    /// Stage fell back to a best-effort value
    Degraded(DegradeReason),
}

impl StageOutcome {
    fn from_processed<T>(result: &Processed<T>) -> Self {
        match result {
            Ok(_) => StageOutcome::Applied,
            Err(d) => StageOutcome::Degraded(d.reason),
        }
    }

    /// Degrade reason, if any
    pub fn degrade_reason(self) -> Option<DegradeReason> {
        match self {
            StageOutcome::Degraded(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Per-stage outcomes of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Calibration
    pub calibration: StageOutcome,
    /// Compensation
    pub compensation: StageOutcome,
    /// Filtering
    pub filtering: StageOutcome,
}

impl Default for StageReport {
    fn default() -> Self {
        Self {
            calibration: StageOutcome::Skipped,
            compensation: StageOutcome::Skipped,
            filtering: StageOutcome::Skipped,
        }
    }
}

impl StageReport {
    /// First degrade reason in stage order
    pub fn first_degrade_reason(&self) -> Option<DegradeReason> {
        self.calibration
            .degrade_reason()
            .or(self.compensation.degrade_reason())
            .or(self.filtering.degrade_reason())
    }
}

/// Result of one acquisition cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutput {
    /// Fully processed reading
    pub reading: SensorReading,
    /// Publish gate decision
    pub publish: PublishDecision,
    /// Stage outcomes
    pub stages: StageReport,
}

impl CycleOutput {
    /// True when the reading should be transmitted
    pub fn should_publish(&self) -> bool {
        self.publish.should_publish()
    }
}

fn run_stages(sample: &RawSample, config: &PipelineConfig, store: &CalibrationStore) -> (SensorReading, StageReport) {
    let soil = config.soil_type();
    let mut report = StageReport::default();
    let mut reading = sample.reading;

    if config.calibration_enabled {
        let result = store.apply_calibration(&reading, soil);
        report.calibration = match &result {
            // an uncalibrated probe is a plain passthrough, not a fault
            Err(d) if d.reason == DegradeReason::CalibrationUnavailable => StageOutcome::Skipped,
            _ => StageOutcome::from_processed(&result),
        };
        reading = result.unwrap_or_else(|d| d.value);
    } else {
        log_debug!("calibration disabled, skipped");
    }

    if config.compensation_enabled {
        let ph_temperature = match sample.probe_temperature {
            Some(t) if t.is_finite() => t,
            _ => reading.temperature,
        };
        let result = apply_compensation(&reading, soil, ph_temperature, config.compensation_options());
        report.compensation = StageOutcome::from_processed(&result);
        reading = result.unwrap_or_else(|d| d.value);
    } else {
        log_debug!("compensation disabled, skipped");
    }

    (reading, report)
}

/// Calibrate and compensate one reading according to `config`
///
/// Filtering is not part of this function; see [`PipelineContext::run_cycle`].
pub fn process(reading: &SensorReading, config: &PipelineConfig, store: &CalibrationStore) -> Processed<SensorReading> {
    let (out, report) = run_stages(&RawSample::new(*reading), config, store);
    match report.first_degrade_reason() {
        None => Ok(out),
        Some(reason) => Err(Degraded::new(out, reason)),
    }
}

/// Error of [`PipelineContext::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepError<S, K> {
    /// The reading source failed; no cycle ran
    Source(S),
    /// The cycle ran but delivery failed
    Sink(K),
}

/// Cross-cycle state of the pipeline, owned by the acquisition task
#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: PipelineConfig,
    calibration: CalibrationStore,
    filters: FilterBank,
    gate: PublishGate,
    cycles: u32,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl PipelineContext {
    /// Context with a sanitised copy of `config` and empty state
    pub fn new(config: PipelineConfig) -> Self {
        let config = config.sanitized();
        Self {
            filters: FilterBank::new(config.filter_settings()),
            gate: PublishGate::new(config.deltas, config.force_publish_cycles).with_soil(config.soil_type()),
            calibration: CalibrationStore::new(),
            config,
            cycles: 0,
        }
    }

    /// Context that starts with an already loaded calibration store
    pub fn with_calibration(config: PipelineConfig, calibration: CalibrationStore) -> Self {
        Self { calibration, ..Self::new(config) }
    }

    /// Boot-time reset: clear filter state and publish history
    pub fn boot(&mut self) {
        self.filters.reset_all_filters();
        self.gate.reset();
        self.cycles = 0;
        log_info!(
            "pipeline boot: soil={} calibration={} compensation={} filtering={}",
            self.config.soil_type().name(),
            self.config.calibration_enabled,
            self.config.compensation_enabled,
            self.config.filtering_enabled()
        );
    }

    /// Run one full cycle on a raw sample
    pub fn run_cycle(&mut self, sample: RawSample) -> CycleOutput {
        let (mut reading, mut stages) = run_stages(&sample, &self.config, &self.calibration);

        if self.config.filtering_enabled() {
            let result = self.filters.filter_reading(&reading);
            stages.filtering = StageOutcome::from_processed(&result);
            reading = result.unwrap_or_else(|d| d.value);
        }

        let publish = self.gate.evaluate(&reading);
        self.cycles = self.cycles.wrapping_add(1);

        if let Some(reason) = stages.first_degrade_reason() {
            log_debug!("cycle {} degraded: {:?}", self.cycles, reason);
        }

        CycleOutput { reading, publish, stages }
    }

    /// Read from `source`, run a cycle and deliver it to `sink` if published
    pub fn step<S: ReadingSource, K: ReadingSink>(
        &mut self,
        source: &mut S,
        sink: &mut K,
    ) -> Result<CycleOutput, StepError<S::Error, K::Error>> {
        let sample = source.read().map_err(StepError::Source)?;
        let output = self.run_cycle(sample);
        if output.should_publish() {
            sink.deliver(&output).map_err(StepError::Sink)?;
        }
        Ok(output)
    }

    /// Apply a new configuration
    ///
    /// Filter state is cleared only when the window or algorithm changed;
    /// the publish history is kept.
    pub fn reconfigure(&mut self, config: PipelineConfig) {
        let config = config.sanitized();
        self.filters.reconfigure(config.filter_settings());
        self.gate.reconfigure(config.deltas, config.force_publish_cycles);
        self.gate.set_soil(config.soil_type());
        if config.soil_profile != self.config.soil_profile {
            log_info!("soil profile changed to {}", config.soil_type().name());
        }
        self.config = config;
    }

    /// Load tables for the active profile and the correction factors
    ///
    /// Entries that fail to load are logged and skipped, keeping whatever
    /// was loaded before. Returns the number of tables installed.
    pub fn load_calibration<S: CalibrationStorage>(&mut self, storage: &S) -> usize {
        let profile = self.config.soil_type();
        let mut loaded = 0;

        for &channel in Channel::ALL.iter() {
            match storage.load_table(profile, channel) {
                Ok(Some(table)) => match self.calibration.insert_table(profile, channel, table) {
                    Ok(()) => loaded += 1,
                    Err(e) => log_warn!("{} table not installed: {}", channel.name(), e),
                },
                Ok(None) => {}
                Err(e) => log_warn!("{} table load failed: {}", channel.name(), e),
            }
        }

        match storage.load_corrections() {
            Ok(Some(corrections)) => self.calibration.set_corrections(corrections),
            Ok(None) => {}
            Err(e) => log_warn!("correction factors not loaded: {}", e),
        }

        log_info!("calibration loaded for {}: {} tables", profile.name(), loaded);
        loaded
    }

    /// Persist every loaded table and the correction factors
    pub fn save_calibration<S: CalibrationStorage>(&self, storage: &mut S) -> CalibrationResult<()> {
        for (profile, channel, table) in self.calibration.tables() {
            storage.save_table(profile, channel, table)?;
        }
        storage.save_corrections(self.calibration.corrections())
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Calibration store
    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    /// Calibration store, for calibration routines and table loading
    pub fn calibration_mut(&mut self) -> &mut CalibrationStore {
        &mut self.calibration
    }

    /// Filter bank
    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    /// Explicit filter reset command
    pub fn reset_filters(&mut self) {
        self.filters.reset_all_filters();
    }

    /// Publish gate
    pub fn gate(&self) -> &PublishGate {
        &self.gate
    }

    /// Cycles run since boot
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}
