//! Filter Bank
//!
//! ## Overview
//!
//! One independent state machine per channel smooths the processed
//! readings before they reach the publish gate.
//!
//! ```text
//!            ┌──────────────┐  rejected: hold previous output
//! raw ──────►│ outlier gate │───────────────────────────────┐
//!            └──────┬───────┘                               │
//!                   ▼ accepted                              │
//!            ┌──────────────┐   ┌─────────────────────┐     │
//!            │  SampleRing  │──►│ mean │ median │ EMA │──┐  │
//!            └──────────────┘   └─────────────────────┘  │  │
//!                   │                 or Kalman          ▼  ▼
//!                   │                             [Kalman] ──► output
//!                   └── every 10 accepted: adaptive retune
//! ```
//!
//! EC runs an [`EcSpikeGuard`] in front of the outlier gate; a held jump
//! or a spike pattern is answered the same way as a rejected outlier.
//!
//! ## Failure handling
//!
//! - Non-finite input: sample ignored, previous output returned as
//!   `Degraded(NonFiniteSample)`.
//! - Non-finite output: only the affected channel is reseeded from the
//!   raw sample and reports `Degraded(FilterStateReset)`.

pub mod channel;
pub mod ec;
pub mod kalman;
pub mod ring;

pub use channel::{alpha_damping, ChannelFilter, FilterStats};
pub use ec::{EcSpikeGuard, EcVerdict};
pub use kalman::ScalarKalman;
pub use ring::SampleRing;

use crate::constants::filters::{
    EXPONENTIAL_ALPHA_DEFAULT, MOVING_AVERAGE_WINDOW_DEFAULT, OUTLIER_THRESHOLD_DEFAULT,
};
use crate::errors::{DegradeReason, Degraded, Processed};
use crate::reading::{Channel, SensorReading};

/// Aggregation applied to each channel's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterAlgorithm {
    /// Arithmetic mean of the window
    Mean,
    /// Median of the window
    Median,
    /// Exponential smoothing
    Exponential,
    /// Scalar Kalman filter
    Kalman,
}

impl FilterAlgorithm {
    /// Resolve a stored index (0..=3); anything else is `Mean`
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Mean,
            1 => Self::Median,
            2 => Self::Exponential,
            3 => Self::Kalman,
            other => {
                log_warn!("filter algorithm {} unknown, using mean", other);
                Self::Mean
            }
        }
    }

    /// Index as stored in configuration
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl Default for FilterAlgorithm {
    fn default() -> Self {
        Self::Mean
    }
}

/// Parameters shared by every channel filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    /// Aggregation algorithm
    pub algorithm: FilterAlgorithm,
    /// Window length (clamped to the ring capacity)
    pub window: usize,
    /// Base exponential smoothing factor
    pub alpha: f32,
    /// Reject samples far from the rolling mean
    pub outlier_rejection: bool,
    /// Rejection distance in standard deviations
    pub outlier_threshold: f32,
    /// Chain a Kalman stage after a non-Kalman aggregate
    pub kalman_enabled: bool,
    /// Periodically retune smoothing from recent variance
    pub adaptive: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            algorithm: FilterAlgorithm::Mean,
            window: MOVING_AVERAGE_WINDOW_DEFAULT,
            alpha: EXPONENTIAL_ALPHA_DEFAULT,
            outlier_rejection: false,
            outlier_threshold: OUTLIER_THRESHOLD_DEFAULT,
            kalman_enabled: false,
            adaptive: false,
        }
    }
}

/// Filters for all seven channels
#[derive(Debug, Clone)]
pub struct FilterBank {
    channels: [ChannelFilter; Channel::COUNT],
    settings: FilterSettings,
}

impl Default for FilterBank {
    fn default() -> Self {
        Self::new(FilterSettings::default())
    }
}

impl FilterBank {
    /// Bank with empty state
    pub fn new(settings: FilterSettings) -> Self {
        let mut bank = Self { channels: Channel::ALL.map(ChannelFilter::new), settings };
        bank.reset_all_filters();
        bank
    }

    /// Active settings
    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Apply new settings; state is cleared when the window or algorithm changes
    pub fn reconfigure(&mut self, settings: FilterSettings) {
        let structural = settings.window != self.settings.window || settings.algorithm != self.settings.algorithm;
        self.settings = settings;
        if structural {
            log_info!("filter window/algorithm changed, clearing state");
            self.reset_all_filters();
        }
    }

    /// Filter one sample of one channel
    pub fn filter(&mut self, channel: Channel, raw: f32) -> Processed<f32> {
        self.channels[channel.index()].filter(raw, &self.settings)
    }

    /// Filter every channel of a reading
    ///
    /// The first degrade reason encountered (in channel order) is reported;
    /// every channel still carries its best-effort value.
    pub fn filter_reading(&mut self, reading: &SensorReading) -> Processed<SensorReading> {
        let mut out = *reading;
        let mut reason: Option<DegradeReason> = None;

        for &channel in Channel::ALL.iter() {
            let value = match self.filter(channel, reading.get(channel)) {
                Ok(v) => v,
                Err(d) => {
                    reason.get_or_insert(d.reason);
                    d.value
                }
            };
            out = out.with(channel, value);
        }

        match reason {
            None => Ok(out),
            Some(reason) => Err(Degraded::new(out, reason)),
        }
    }

    /// Clear one channel's state
    pub fn reset_channel(&mut self, channel: Channel) {
        let window = self.settings.window;
        self.channels[channel.index()].reset(window);
    }

    /// Clear every channel's state
    pub fn reset_all_filters(&mut self) {
        let window = self.settings.window;
        for f in self.channels.iter_mut() {
            f.reset(window);
        }
    }

    /// Statistics of one channel
    pub fn stats(&self, channel: Channel) -> FilterStats {
        self.channels[channel.index()].stats(&self.settings)
    }

    /// Log per-channel statistics at info level
    pub fn log_statistics(&self) {
        log_info!(
            "filter: algorithm={:?} window={} outliers={} kalman={} adaptive={}",
            self.settings.algorithm,
            self.settings.window,
            self.settings.outlier_rejection,
            self.settings.kalman_enabled,
            self.settings.adaptive
        );
        for &channel in Channel::ALL.iter() {
            let s = self.stats(channel);
            log_info!(
                "  {}: mean={} sd={} n={} accepted={} rejected={} resets={}",
                channel.name(),
                s.mean,
                s.std_dev,
                s.samples,
                s.accepted,
                s.rejected,
                s.resets
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(t: f32) -> SensorReading {
        SensorReading {
            temperature: t,
            humidity: 30.0,
            ec: 900.0,
            ph: 6.5,
            nitrogen: 40.0,
            phosphorus: 20.0,
            potassium: 110.0,
        }
    }

    #[test]
    fn algorithm_index_fallback() {
        assert_eq!(FilterAlgorithm::from_index(2), FilterAlgorithm::Exponential);
        assert_eq!(FilterAlgorithm::from_index(9), FilterAlgorithm::Mean);
        for i in 0..4 {
            assert_eq!(FilterAlgorithm::from_index(i).index(), i);
        }
    }

    #[test]
    fn channels_are_independent() {
        let mut bank = FilterBank::default();
        bank.filter(Channel::Temperature, 20.0).unwrap();
        bank.filter(Channel::Temperature, 22.0).unwrap();
        assert_eq!(bank.filter(Channel::Ec, 500.0).unwrap(), 500.0);
        assert_eq!(bank.stats(Channel::Temperature).accepted, 2);
        assert_eq!(bank.stats(Channel::Ec).accepted, 1);
    }

    #[test]
    fn degraded_channel_does_not_touch_others() {
        let mut bank = FilterBank::default();
        bank.filter_reading(&reading(20.0)).unwrap();
        let bad = reading(22.0).with(Channel::Ph, f32::NAN);
        let out = bank.filter_reading(&bad).unwrap_err();
        assert_eq!(out.reason, DegradeReason::NonFiniteSample);
        assert_eq!(out.value.ph, 6.5);
        assert_eq!(out.value.temperature, 21.0);
    }

    #[test]
    fn reset_all_clears_state() {
        let mut bank = FilterBank::default();
        for t in [20.0, 21.0, 22.0] {
            bank.filter_reading(&reading(t)).unwrap();
        }
        bank.reset_all_filters();
        assert_eq!(bank.stats(Channel::Temperature).samples, 0);
        assert_eq!(bank.filter(Channel::Temperature, 30.0).unwrap(), 30.0);
    }

    #[test]
    fn reconfigure_only_resets_on_structural_change() {
        let mut bank = FilterBank::default();
        bank.filter(Channel::Ec, 100.0).unwrap();

        let tweak = FilterSettings { outlier_threshold: 3.0, ..*bank.settings() };
        bank.reconfigure(tweak);
        assert_eq!(bank.stats(Channel::Ec).samples, 1);

        let wider = FilterSettings { window: 9, ..*bank.settings() };
        bank.reconfigure(wider);
        assert_eq!(bank.stats(Channel::Ec).samples, 0);
    }
}
