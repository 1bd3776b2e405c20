//! Probe Specifications and Physical Limits
//!
//! Operating envelope of the capacitive 7-in-1 soil probe (RS485 Modbus
//! variant) and the limits outside which compensation models are not
//! applied.

// ===== DATASHEET ENVELOPE =====

/// Minimum soil temperature the probe reports (°C).
///
/// Source: probe datasheet, -45 °C storage/operation limit
pub const TEMP_SENSOR_MIN_C: f32 = -45.0;

/// Maximum soil temperature the probe reports (°C).
///
/// Source: probe datasheet
pub const TEMP_SENSOR_MAX_C: f32 = 115.0;

/// Minimum volumetric water content (%).
pub const HUMIDITY_SENSOR_MIN_PCT: f32 = 0.0;

/// Maximum volumetric water content (%).
pub const HUMIDITY_SENSOR_MAX_PCT: f32 = 100.0;

/// Lower end of the pH electrode working range.
///
/// Readings below this are outside the electrode's linear region, so
/// calibration buffers below it are refused.
pub const PH_SENSOR_MIN: f32 = 3.0;

/// Upper end of the pH electrode working range.
pub const PH_SENSOR_MAX: f32 = 9.0;

/// Minimum bulk electrical conductivity (µS/cm).
pub const EC_SENSOR_MIN_US_CM: f32 = 0.0;

/// Maximum bulk electrical conductivity (µS/cm).
///
/// Source: probe datasheet, 0-10000 µS/cm range
pub const EC_SENSOR_MAX_US_CM: f32 = 10_000.0;

/// Minimum N/P/K reading (mg/kg).
pub const NPK_SENSOR_MIN_MG_KG: f32 = 0.0;

/// Maximum N/P/K reading (mg/kg).
///
/// Source: probe datasheet, 0-1999 mg/kg range
pub const NPK_SENSOR_MAX_MG_KG: f32 = 1999.0;

// ===== COMPENSATION INPUT LIMITS =====

/// Lowest temperature at which compensation models are evaluated (°C).
pub const COMPENSATION_TEMP_MIN_C: f32 = -50.0;

/// Highest temperature at which compensation models are evaluated (°C).
pub const COMPENSATION_TEMP_MAX_C: f32 = 100.0;

/// Lowest moisture at which compensation models are evaluated (%).
pub const COMPENSATION_HUMIDITY_MIN_PCT: f32 = 0.0;

/// Highest moisture at which compensation models are evaluated (%).
pub const COMPENSATION_HUMIDITY_MAX_PCT: f32 = 100.0;

// ===== COMPENSATION MODEL REFERENCES =====

/// Reference temperature for EC and pH compensation (°C).
pub const EC_PH_REFERENCE_TEMP_C: f32 = 25.0;

/// Linear EC temperature coefficient (1/°C).
///
/// Source: Rhoades et al., 1989, Soil Sci. Soc. Am. J.
pub const EC_TEMP_COEFFICIENT_PER_C: f32 = 0.021;

/// pH shift per degree from the reference temperature (pH/°C).
///
/// Source: Ross, Bartlett & Magdoff, 2008 (Nernst-derived approximation)
pub const PH_TEMP_COEFFICIENT_PER_C: f32 = 0.003;

/// Reference temperature for the NPK model (°C).
///
/// Source: Delgado et al., 2020, DOI:10.1007/s42729-020-00215-4
pub const NPK_REFERENCE_TEMP_C: f32 = 20.0;

/// Reference moisture for the NPK model (%).
pub const NPK_REFERENCE_HUMIDITY_PCT: f32 = 30.0;
