//! Constants for the SoilSense core
//!
//! Every numeric value the pipeline depends on lives here, grouped by the
//! stage that consumes it. Names carry their units.
//!
//! ## Organization
//!
//! - **Sensors**: probe datasheet envelope and compensation input limits
//! - **Calibration**: table capacity, regression quality gate
//! - **Filters**: window limits, smoothing and Kalman parameters
//! - **Publish**: delta-filter defaults and forced refresh cadence
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Reference the probe datasheet or the agronomic source where applicable
//! 3. Use descriptive names that include units

/// Probe datasheet envelope and physical input limits.
pub mod sensors;

/// Calibration table sizes and regression acceptance thresholds.
pub mod calibration;

/// Filter window limits, smoothing factors and Kalman noise parameters.
pub mod filters;

/// Delta-filter thresholds and forced publish cadence.
pub mod publish;

pub use sensors::{
    TEMP_SENSOR_MIN_C, TEMP_SENSOR_MAX_C,
    HUMIDITY_SENSOR_MIN_PCT, HUMIDITY_SENSOR_MAX_PCT,
    PH_SENSOR_MIN, PH_SENSOR_MAX,
    EC_SENSOR_MIN_US_CM, EC_SENSOR_MAX_US_CM,
    NPK_SENSOR_MIN_MG_KG, NPK_SENSOR_MAX_MG_KG,
};

pub use calibration::{MAX_TABLE_POINTS, MIN_R_SQUARED};

pub use filters::{
    MOVING_AVERAGE_WINDOW_MIN, MOVING_AVERAGE_WINDOW_MAX, MOVING_AVERAGE_WINDOW_DEFAULT,
    MAX_FILTER_WINDOW,
};

pub use publish::{DEFAULT_FORCE_PUBLISH_CYCLES, FORCE_PUBLISH_CYCLES_MIN, FORCE_PUBLISH_CYCLES_MAX};
