//! Filter Window and Smoothing Parameters
//!
//! Values match the probe firmware's field-tuned defaults; ranges are the
//! ones the configuration portal accepts.

// ===== WINDOW =====

/// Smallest moving-average window the configuration accepts.
pub const MOVING_AVERAGE_WINDOW_MIN: usize = 5;

/// Largest moving-average window the configuration accepts.
pub const MOVING_AVERAGE_WINDOW_MAX: usize = 15;

/// Default moving-average window (minimal filtering).
pub const MOVING_AVERAGE_WINDOW_DEFAULT: usize = 5;

/// Storage capacity of every channel's ring buffer.
///
/// Equal to the largest accepted window so reconfiguration never needs to
/// reallocate.
pub const MAX_FILTER_WINDOW: usize = MOVING_AVERAGE_WINDOW_MAX;

// ===== EXPONENTIAL SMOOTHING =====

/// Smallest accepted smoothing factor (heaviest smoothing).
pub const EXPONENTIAL_ALPHA_MIN: f32 = 0.01;

/// Largest accepted smoothing factor (lightest smoothing).
pub const EXPONENTIAL_ALPHA_MAX: f32 = 0.99;

/// Default smoothing factor.
pub const EXPONENTIAL_ALPHA_DEFAULT: f32 = 0.3;

/// EC smoothing damping. EC is the noisiest channel on capacitive probes.
pub const EC_ALPHA_DAMPING: f32 = 0.7;

/// N/P/K smoothing damping.
pub const NPK_ALPHA_DAMPING: f32 = 0.8;

// ===== OUTLIER REJECTION =====

/// Smallest accepted outlier threshold (σ).
pub const OUTLIER_THRESHOLD_MIN: f32 = 1.0;

/// Largest accepted outlier threshold (σ).
pub const OUTLIER_THRESHOLD_MAX: f32 = 5.0;

/// Default outlier threshold (σ).
pub const OUTLIER_THRESHOLD_DEFAULT: f32 = 2.5;

/// Floor for the rolling standard deviation.
///
/// A perfectly flat history would otherwise reject every later sample.
pub const MIN_STANDARD_DEVIATION: f32 = 0.01;

/// Samples required in the window before outlier rejection engages.
pub const OUTLIER_MIN_SAMPLES: usize = 5;

// ===== EC SPIKE GUARD =====

/// Weight of a new sample in the slow EC baseline.
pub const EC_BASELINE_ALPHA: f32 = 0.1;

/// Rise above the baseline, as a fraction of it, that counts as a spike.
pub const EC_SPIKE_RATIO: f32 = 0.15;

/// Spikes tolerated before a run of them is treated as a pattern.
pub const EC_SPIKE_PATTERN_COUNT: u8 = 3;

/// Largest gap in cycles between two spikes of the same pattern.
pub const EC_SPIKE_PATTERN_GAP: u32 = 5;

/// Change against the last accepted sample, as a fraction of it, that
/// holds the previous output.
pub const EC_JUMP_RATIO: f32 = 0.25;

/// Samples seen before the jump check engages.
pub const EC_JUMP_MIN_SAMPLES: u32 = 3;

/// Reference magnitude below which the relative jump check is skipped.
pub const EC_JUMP_MIN_REFERENCE: f32 = 1e-3;

/// Consecutive held jumps after which the new level is accepted.
pub const EC_JUMP_MAX_HOLDS: u8 = 3;

/// EC outlier threshold as a fraction of the configured one.
pub const EC_OUTLIER_THRESHOLD_FACTOR: f32 = 0.7;

/// Change against the newest windowed EC sample that is an outlier.
pub const EC_OUTLIER_JUMP_RATIO: f32 = 0.20;

// ===== KALMAN =====

/// Process noise Q.
pub const KALMAN_PROCESS_NOISE: f32 = 0.01;

/// Measurement noise R.
pub const KALMAN_MEASUREMENT_NOISE: f32 = 0.1;

/// Initial error covariance P₀.
pub const KALMAN_INITIAL_UNCERTAINTY: f32 = 1.0;

// ===== ADAPTIVE MODE =====

/// Accepted samples between two adaptive re-tunings of a channel.
pub const ADAPTIVE_RETUNE_INTERVAL: u32 = 10;

/// Gain applied to the coefficient of variation when scaling α down.
pub const ADAPTIVE_VARIATION_GAIN: f32 = 4.0;

/// Lowest α scale adaptive mode may apply.
pub const ADAPTIVE_MIN_ALPHA_SCALE: f32 = 0.25;

/// Lowest outlier threshold scale adaptive mode may apply.
pub const ADAPTIVE_MIN_THRESHOLD_SCALE: f32 = 0.6;

/// Upper bound for the adaptively raised Kalman measurement noise.
pub const ADAPTIVE_MAX_MEASUREMENT_NOISE: f32 = 100.0;
