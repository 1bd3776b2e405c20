//! Calibration Table and Regression Limits

/// Maximum points held by one calibration table.
///
/// Field tables are built from a handful of reference solutions; 32 points
/// covers a dense lab sweep while keeping each table under 300 bytes.
pub const MAX_TABLE_POINTS: usize = 32;

/// Minimum coefficient of determination for a regression to be accepted.
pub const MIN_R_SQUARED: f32 = 0.95;

/// Denominators smaller than this make a regression degenerate.
///
/// Happens when all measured values coincide (e.g. the same buffer used
/// twice).
pub const REGRESSION_MIN_DENOMINATOR: f32 = 1e-6;

/// Total sum of squares below which the fit is treated as exact (R² = 1).
pub const REGRESSION_MIN_SS_TOT: f32 = 1e-6;

/// Number of points for EC two-point calibration.
pub const EC_CALIBRATION_POINTS: usize = 2;

/// Number of points for pH three-point calibration (pH 4 / 7 / 9 buffers).
pub const PH_CALIBRATION_POINTS: usize = 3;

/// Longest CSV line the parser accepts before treating it as malformed.
pub const MAX_CSV_LINE_LEN: usize = 96;

/// Number of (profile, channel) tables the store can hold at once.
pub const MAX_TABLES: usize = 16;
