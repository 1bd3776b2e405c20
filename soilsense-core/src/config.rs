//! Pipeline configuration
//!
//! Mirrors what the configuration portal persists. Values loaded from
//! storage are untrusted: [`PipelineConfig::sanitized`] replaces anything
//! out of range with its default before the pipeline uses it.

use crate::compensation::CompensationOptions;
use crate::constants::filters::{
    EXPONENTIAL_ALPHA_DEFAULT, EXPONENTIAL_ALPHA_MAX, EXPONENTIAL_ALPHA_MIN, MOVING_AVERAGE_WINDOW_DEFAULT,
    MOVING_AVERAGE_WINDOW_MAX, MOVING_AVERAGE_WINDOW_MIN, OUTLIER_THRESHOLD_DEFAULT, OUTLIER_THRESHOLD_MAX,
    OUTLIER_THRESHOLD_MIN,
};
use crate::constants::publish::{
    DEFAULT_FORCE_PUBLISH_CYCLES, DELTA_EC_RANGE_US_CM, DELTA_HUMIDITY_ASM_RANGE_PCT, DELTA_HUMIDITY_RANGE_PCT,
    DELTA_NPK_RANGE_MG_KG, DELTA_PH_RANGE, DELTA_TEMPERATURE_RANGE_C, FORCE_PUBLISH_CYCLES_MAX, FORCE_PUBLISH_CYCLES_MIN,
};
use crate::filter::{FilterAlgorithm, FilterSettings};
use crate::publish::DeltaThresholds;
use crate::soil::SoilType;

/// Configuration of the whole signal-processing pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Apply calibration tables and factors
    pub calibration_enabled: bool,
    /// Apply temperature/moisture compensation
    pub compensation_enabled: bool,
    /// Adaptive filter tuning
    pub adaptive_filtering: bool,
    /// Kalman filtering
    pub kalman_enabled: bool,
    /// Outlier rejection
    pub outlier_filter_enabled: bool,
    /// Soil profile index (0..=12)
    pub soil_profile: i32,
    /// Publish deltas
    pub deltas: DeltaThresholds,
    /// Filter window (5..=15)
    pub moving_average_window: usize,
    /// Skipped cycles before a forced publish (5..=50)
    pub force_publish_cycles: u8,
    /// Filter algorithm index (0..=3)
    pub filter_algorithm: u8,
    /// Exponential smoothing factor (0.01..=0.99)
    pub exponential_alpha: f32,
    /// Outlier threshold in σ (1.0..=5.0)
    pub outlier_threshold: f32,
    /// Scale EC by the Archie moisture term
    pub archie_moisture: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            calibration_enabled: true,
            compensation_enabled: true,
            adaptive_filtering: false,
            kalman_enabled: false,
            outlier_filter_enabled: false,
            soil_profile: SoilType::Loam.index() as i32,
            deltas: DeltaThresholds::default(),
            moving_average_window: MOVING_AVERAGE_WINDOW_DEFAULT,
            force_publish_cycles: DEFAULT_FORCE_PUBLISH_CYCLES,
            filter_algorithm: FilterAlgorithm::Mean.index(),
            exponential_alpha: EXPONENTIAL_ALPHA_DEFAULT,
            outlier_threshold: OUTLIER_THRESHOLD_DEFAULT,
            archie_moisture: false,
        }
    }
}

fn in_range(value: f32, (min, max): (f32, f32)) -> bool {
    value >= min && value <= max
}

impl PipelineConfig {
    /// Copy with every out-of-range field replaced by its default
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut out = *self;

        if SoilType::try_from_index(out.soil_profile).is_none() {
            log_warn!("config: soil_profile {} invalid, using {}", out.soil_profile, defaults.soil_profile);
            out.soil_profile = defaults.soil_profile;
        }
        if !(MOVING_AVERAGE_WINDOW_MIN..=MOVING_AVERAGE_WINDOW_MAX).contains(&out.moving_average_window) {
            log_warn!("config: moving_average_window {} invalid", out.moving_average_window);
            out.moving_average_window = defaults.moving_average_window;
        }
        if !(FORCE_PUBLISH_CYCLES_MIN..=FORCE_PUBLISH_CYCLES_MAX).contains(&out.force_publish_cycles) {
            log_warn!("config: force_publish_cycles {} invalid", out.force_publish_cycles);
            out.force_publish_cycles = defaults.force_publish_cycles;
        }
        if out.filter_algorithm > FilterAlgorithm::Kalman.index() {
            log_warn!("config: filter_algorithm {} invalid", out.filter_algorithm);
            out.filter_algorithm = defaults.filter_algorithm;
        }
        if !in_range(out.exponential_alpha, (EXPONENTIAL_ALPHA_MIN, EXPONENTIAL_ALPHA_MAX)) {
            log_warn!("config: exponential_alpha {} invalid", out.exponential_alpha);
            out.exponential_alpha = defaults.exponential_alpha;
        }
        if !in_range(out.outlier_threshold, (OUTLIER_THRESHOLD_MIN, OUTLIER_THRESHOLD_MAX)) {
            log_warn!("config: outlier_threshold {} invalid", out.outlier_threshold);
            out.outlier_threshold = defaults.outlier_threshold;
        }

        let d = &mut out.deltas;
        let dd = defaults.deltas;
        for (value, range, default, name) in [
            (&mut d.temperature, DELTA_TEMPERATURE_RANGE_C, dd.temperature, "temperature"),
            (&mut d.humidity, DELTA_HUMIDITY_RANGE_PCT, dd.humidity, "humidity"),
            (&mut d.humidity_asm, DELTA_HUMIDITY_ASM_RANGE_PCT, dd.humidity_asm, "humidity_asm"),
            (&mut d.ph, DELTA_PH_RANGE, dd.ph, "ph"),
            (&mut d.ec, DELTA_EC_RANGE_US_CM, dd.ec, "ec"),
            (&mut d.npk, DELTA_NPK_RANGE_MG_KG, dd.npk, "npk"),
        ] {
            if !in_range(*value, range) {
                log_warn!("config: delta {} {} invalid", name, *value);
                *value = default;
            }
        }

        out
    }

    /// True when no field needs replacing
    pub fn is_valid(&self) -> bool {
        self.sanitized() == *self
    }

    /// Resolved soil type
    pub fn soil_type(&self) -> SoilType {
        SoilType::from_index(self.soil_profile)
    }

    /// Filter parameters derived from this configuration
    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            algorithm: FilterAlgorithm::from_index(self.filter_algorithm),
            window: self.moving_average_window,
            alpha: self.exponential_alpha,
            outlier_rejection: self.outlier_filter_enabled,
            outlier_threshold: self.outlier_threshold,
            kalman_enabled: self.kalman_enabled,
            adaptive: self.adaptive_filtering,
        }
    }

    /// Compensation model options
    pub fn compensation_options(&self) -> CompensationOptions {
        CompensationOptions { archie_moisture: self.archie_moisture }
    }

    /// True when the filter stage runs in the cycle
    pub fn filtering_enabled(&self) -> bool {
        self.adaptive_filtering || self.kalman_enabled
    }

    /// Parse a persisted configuration; missing fields take defaults
    #[cfg(feature = "std")]
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialise for persistence
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = PipelineConfig::default();
        assert!(c.is_valid());
        assert_eq!(c.soil_type(), SoilType::Loam);
        assert!(!c.filtering_enabled());
        assert_eq!(c.deltas.temperature, 0.5);
        assert_eq!(c.force_publish_cycles, 10);
    }

    #[test]
    fn sanitize_replaces_each_bad_field() {
        let bad = PipelineConfig {
            soil_profile: 42,
            moving_average_window: 3,
            force_publish_cycles: 200,
            filter_algorithm: 7,
            exponential_alpha: 1.5,
            outlier_threshold: f32::NAN,
            deltas: DeltaThresholds { ec: 5000.0, humidity_asm: 0.0, ..DeltaThresholds::default() },
            kalman_enabled: true,
            ..PipelineConfig::default()
        };
        let fixed = bad.sanitized();
        assert!(!bad.is_valid());
        assert!(fixed.is_valid());
        assert_eq!(fixed.soil_profile, 1);
        assert_eq!(fixed.moving_average_window, 5);
        assert_eq!(fixed.force_publish_cycles, 10);
        assert_eq!(fixed.filter_algorithm, 0);
        assert_eq!(fixed.exponential_alpha, 0.3);
        assert_eq!(fixed.outlier_threshold, 2.5);
        assert_eq!(fixed.deltas.ec, 50.0);
        assert_eq!(fixed.deltas.humidity_asm, 5.0);
        assert!(fixed.kalman_enabled);
    }

    #[test]
    fn settings_follow_config() {
        let c = PipelineConfig {
            filter_algorithm: 1,
            moving_average_window: 9,
            outlier_filter_enabled: true,
            adaptive_filtering: true,
            ..PipelineConfig::default()
        };
        let s = c.filter_settings();
        assert_eq!(s.algorithm, FilterAlgorithm::Median);
        assert_eq!(s.window, 9);
        assert!(s.outlier_rejection);
        assert!(c.filtering_enabled());
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_round_trip_and_partial_documents() {
        let c = PipelineConfig { soil_profile: 3, kalman_enabled: true, ..PipelineConfig::default() };
        let text = c.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&text).unwrap(), c);

        let partial = PipelineConfig::from_json(r#"{"soil_profile": 0, "deltas": {"temperature": 1.0}}"#).unwrap();
        assert_eq!(partial.soil_type(), SoilType::Sand);
        assert_eq!(partial.deltas.temperature, 1.0);
        assert_eq!(partial.deltas.ec, 50.0);
        assert!(partial.calibration_enabled);
    }
}
