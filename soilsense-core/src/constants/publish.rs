//! Delta-Filter Defaults
//!
//! A reading is published when any channel moved by at least its delta
//! since the last publish, or when `force_publish_cycles` cycles were
//! skipped in a row.

/// Default temperature delta (°C).
pub const DEFAULT_DELTA_TEMPERATURE_C: f32 = 0.5;

/// Default moisture delta (%).
pub const DEFAULT_DELTA_HUMIDITY_PCT: f32 = 2.0;

/// Default moisture delta in available soil moisture points (%).
///
/// Compared after converting both readings with the active soil's
/// wilting point and field capacity.
pub const DEFAULT_DELTA_HUMIDITY_ASM_PCT: f32 = 5.0;

/// Default pH delta.
pub const DEFAULT_DELTA_PH: f32 = 0.1;

/// Default EC delta (µS/cm).
pub const DEFAULT_DELTA_EC_US_CM: f32 = 50.0;

/// Default N/P/K delta (mg/kg).
pub const DEFAULT_DELTA_NPK_MG_KG: f32 = 10.0;

/// Default number of skipped cycles before a forced publish.
pub const DEFAULT_FORCE_PUBLISH_CYCLES: u8 = 10;

/// Smallest accepted forced publish cadence.
pub const FORCE_PUBLISH_CYCLES_MIN: u8 = 5;

/// Largest accepted forced publish cadence.
pub const FORCE_PUBLISH_CYCLES_MAX: u8 = 50;

// ===== ACCEPTED DELTA RANGES =====

/// Accepted moisture delta range (%).
pub const DELTA_HUMIDITY_RANGE_PCT: (f32, f32) = (0.5, 10.0);

/// Accepted available-moisture delta range (%).
pub const DELTA_HUMIDITY_ASM_RANGE_PCT: (f32, f32) = (1.0, 25.0);

/// Accepted pH delta range.
pub const DELTA_PH_RANGE: (f32, f32) = (0.01, 1.0);

/// Accepted EC delta range (µS/cm).
pub const DELTA_EC_RANGE_US_CM: (f32, f32) = (10.0, 500.0);

/// Accepted N/P/K delta range (mg/kg).
pub const DELTA_NPK_RANGE_MG_KG: (f32, f32) = (1.0, 50.0);

/// Accepted temperature delta range (°C).
pub const DELTA_TEMPERATURE_RANGE_C: (f32, f32) = (0.1, 5.0);
