//! Per-channel filter state machine

use crate::constants::filters::{
    ADAPTIVE_MAX_MEASUREMENT_NOISE, ADAPTIVE_MIN_ALPHA_SCALE, ADAPTIVE_MIN_THRESHOLD_SCALE,
    ADAPTIVE_RETUNE_INTERVAL, ADAPTIVE_VARIATION_GAIN, EC_ALPHA_DAMPING, EC_JUMP_MIN_REFERENCE,
    EC_OUTLIER_JUMP_RATIO, EC_OUTLIER_THRESHOLD_FACTOR, EXPONENTIAL_ALPHA_MAX, EXPONENTIAL_ALPHA_MIN,
    KALMAN_MEASUREMENT_NOISE, MAX_FILTER_WINDOW, MIN_STANDARD_DEVIATION, NPK_ALPHA_DAMPING,
    OUTLIER_MIN_SAMPLES, OUTLIER_THRESHOLD_MIN,
};
use crate::errors::{DegradeReason, Degraded, Processed};
use crate::filter::ec::{EcSpikeGuard, EcVerdict};
use crate::filter::kalman::ScalarKalman;
use crate::filter::ring::SampleRing;
use crate::filter::{FilterAlgorithm, FilterSettings};
use crate::reading::Channel;

/// Snapshot of one channel's filter state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterStats {
    /// Mean of the accepted samples in the window
    pub mean: f32,
    /// Standard deviation of the accepted samples in the window
    pub std_dev: f32,
    /// Samples currently in the window
    pub samples: usize,
    /// Samples accepted since the last reset
    pub accepted: u32,
    /// Samples rejected as outliers since the last reset
    pub rejected: u32,
    /// State resets caused by non-finite filter output
    pub resets: u32,
    /// Last value returned
    pub last_output: Option<f32>,
    /// Smoothing factor currently in effect
    pub effective_alpha: f32,
    /// Outlier threshold (σ) currently in effect
    pub effective_threshold: f32,
}

/// Exponential smoothing damping for a channel
pub const fn alpha_damping(channel: Channel) -> f32 {
    match channel {
        Channel::Ec => EC_ALPHA_DAMPING,
        Channel::Nitrogen | Channel::Phosphorus | Channel::Potassium => NPK_ALPHA_DAMPING,
        _ => 1.0,
    }
}

/// Filter state of a single channel
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    channel: Channel,
    ring: SampleRing<MAX_FILTER_WINDOW>,
    smoothed: Option<f32>,
    kalman: ScalarKalman,
    last_output: Option<f32>,
    ec_guard: EcSpikeGuard,
    alpha_scale: f32,
    threshold_scale: f32,
    since_retune: u32,
    accepted: u32,
    rejected: u32,
    resets: u32,
}

impl ChannelFilter {
    /// Fresh state for `channel`
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            ring: SampleRing::new(),
            smoothed: None,
            kalman: ScalarKalman::default(),
            last_output: None,
            ec_guard: EcSpikeGuard::new(),
            alpha_scale: 1.0,
            threshold_scale: 1.0,
            since_retune: 0,
            accepted: 0,
            rejected: 0,
            resets: 0,
        }
    }

    /// Channel this state belongs to
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Clear all state and size the window
    pub fn reset(&mut self, window: usize) {
        *self = Self::new(self.channel);
        self.ring.set_window(window);
    }

    /// Smoothing factor after damping and adaptive scaling
    pub fn effective_alpha(&self, settings: &FilterSettings) -> f32 {
        (settings.alpha * alpha_damping(self.channel) * self.alpha_scale)
            .clamp(EXPONENTIAL_ALPHA_MIN, EXPONENTIAL_ALPHA_MAX)
    }

    /// Outlier threshold (σ) after adaptive scaling and the EC factor
    pub fn effective_outlier_threshold(&self, settings: &FilterSettings) -> f32 {
        let threshold = (settings.outlier_threshold * self.threshold_scale).max(OUTLIER_THRESHOLD_MIN);
        if self.channel == Channel::Ec {
            threshold * EC_OUTLIER_THRESHOLD_FACTOR
        } else {
            threshold
        }
    }

    /// Rolling-window view of the accepted samples
    pub fn window(&self) -> &SampleRing<MAX_FILTER_WINDOW> {
        &self.ring
    }

    /// Filter one sample
    pub fn filter(&mut self, raw: f32, settings: &FilterSettings) -> Processed<f32> {
        if self.ring.window() != settings.window {
            self.ring.set_window(settings.window);
        }

        if !raw.is_finite() {
            let fallback = self.last_output.unwrap_or(raw);
            log_warn!("{} filter: non-finite sample ignored", self.channel.name());
            return Err(Degraded::new(fallback, DegradeReason::NonFiniteSample));
        }

        if self.channel == Channel::Ec {
            match self.ec_guard.check(raw) {
                EcVerdict::Pass => {}
                EcVerdict::Hold => {
                    self.rejected += 1;
                    let held = self.held_output(raw);
                    log_debug!("EC filter: jump to {} held at {}", raw, held);
                    return Ok(held);
                }
                EcVerdict::Baseline(baseline) => {
                    self.rejected += 1;
                    log_warn!("EC filter: spike pattern at {}, reporting baseline {}", raw, baseline);
                    return Ok(baseline);
                }
            }
        }

        if settings.outlier_rejection && self.is_outlier(raw, settings) {
            self.rejected += 1;
            let held = self.held_output(raw);
            log_debug!("{} filter: outlier {} rejected, holding {}", self.channel.name(), raw, held);
            return Ok(held);
        }

        self.ring.push(raw);
        self.accepted += 1;

        let aggregate = match settings.algorithm {
            FilterAlgorithm::Mean => self.ring.mean().unwrap_or(raw),
            FilterAlgorithm::Median => self.ring.median().unwrap_or(raw),
            FilterAlgorithm::Exponential => {
                let alpha = self.effective_alpha(settings);
                let next = match self.smoothed {
                    Some(previous) => alpha * raw + (1.0 - alpha) * previous,
                    None => raw,
                };
                self.smoothed = Some(next);
                next
            }
            FilterAlgorithm::Kalman => self.kalman.update(raw),
        };

        let output = if settings.kalman_enabled && settings.algorithm != FilterAlgorithm::Kalman {
            self.kalman.update(aggregate)
        } else {
            aggregate
        };

        if settings.adaptive {
            self.since_retune += 1;
            if self.since_retune >= ADAPTIVE_RETUNE_INTERVAL {
                self.since_retune = 0;
                self.retune();
            }
        }

        if !output.is_finite() {
            return Err(self.reseed(raw));
        }

        self.last_output = Some(output);
        Ok(output)
    }

    fn held_output(&self, raw: f32) -> f32 {
        self.last_output.or_else(|| self.ring.mean()).unwrap_or(raw)
    }

    fn is_outlier(&self, raw: f32, settings: &FilterSettings) -> bool {
        if self.ring.len() < OUTLIER_MIN_SAMPLES {
            return false;
        }
        if self.channel == Channel::Ec {
            if let Some(newest) = self.ring.last() {
                let magnitude = libm::fabsf(newest);
                if magnitude >= EC_JUMP_MIN_REFERENCE && libm::fabsf(raw - newest) / magnitude > EC_OUTLIER_JUMP_RATIO {
                    return true;
                }
            }
        }
        let threshold = self.effective_outlier_threshold(settings);
        match (self.ring.mean(), self.ring.std_dev()) {
            (Some(mean), Some(std_dev)) => {
                let sigma = if std_dev > MIN_STANDARD_DEVIATION { std_dev } else { MIN_STANDARD_DEVIATION };
                libm::fabsf(raw - mean) > threshold * sigma
            }
            _ => false,
        }
    }

    /// Scale smoothing and the outlier threshold with the recent
    /// coefficient of variation
    fn retune(&mut self) {
        let (Some(mean), Some(variance)) = (self.ring.mean(), self.ring.variance()) else {
            return;
        };
        let scale = libm::fabsf(mean);
        let cv = libm::sqrtf(variance) / if scale > 1.0 { scale } else { 1.0 };

        let damping = 1.0 / (1.0 + ADAPTIVE_VARIATION_GAIN * cv);
        self.alpha_scale = damping.clamp(ADAPTIVE_MIN_ALPHA_SCALE, 1.0);
        self.threshold_scale = damping.clamp(ADAPTIVE_MIN_THRESHOLD_SCALE, 1.0);
        self.kalman
            .set_measurement_noise(variance.clamp(KALMAN_MEASUREMENT_NOISE, ADAPTIVE_MAX_MEASUREMENT_NOISE));

        log_debug!(
            "{} filter retuned: cv={} alpha_scale={} threshold_scale={} R={}",
            self.channel.name(),
            cv,
            self.alpha_scale,
            self.threshold_scale,
            self.kalman.measurement_noise()
        );
    }

    fn reseed(&mut self, raw: f32) -> Degraded<f32> {
        log_warn!("{} filter state corrupted, reseeding from {}", self.channel.name(), raw);
        let window = self.ring.window();
        self.ring.set_window(window);
        self.ring.push(raw);
        self.smoothed = Some(raw);
        self.kalman.seed(raw);
        self.ec_guard = EcSpikeGuard::new();
        self.alpha_scale = 1.0;
        self.threshold_scale = 1.0;
        self.since_retune = 0;
        self.last_output = Some(raw);
        self.resets += 1;
        Degraded::new(raw, DegradeReason::FilterStateReset)
    }

    /// Current statistics
    pub fn stats(&self, settings: &FilterSettings) -> FilterStats {
        FilterStats {
            mean: self.ring.mean().unwrap_or(0.0),
            std_dev: self.ring.std_dev().unwrap_or(0.0),
            samples: self.ring.len(),
            accepted: self.accepted,
            rejected: self.rejected,
            resets: self.resets,
            last_output: self.last_output,
            effective_alpha: self.effective_alpha(settings),
            effective_threshold: self.effective_outlier_threshold(settings),
        }
    }
}
