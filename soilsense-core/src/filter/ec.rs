//! EC spike and jump guard
//!
//! Capacitive EC electrodes pick up pump and valve switching as short
//! upward spikes and occasional single-sample jumps. The guard sits in
//! front of the EC channel's window:
//!
//! ```text
//! raw ──► baseline (slow EMA)
//!          │
//!          ├─ repeated rising spikes         ──► Baseline(b)
//!          ├─ jump vs last accepted sample   ──► Hold
//!          └─ otherwise                      ──► Pass
//! ```
//!
//! A spike counts once, on its rising edge, so a sustained step is not a
//! pattern. A jump is held at most [`EC_JUMP_MAX_HOLDS`] times in a row,
//! so a real step in conductivity gets through after a few cycles.

use crate::constants::filters::{
    EC_BASELINE_ALPHA, EC_JUMP_MAX_HOLDS, EC_JUMP_MIN_REFERENCE, EC_JUMP_MIN_SAMPLES, EC_JUMP_RATIO,
    EC_SPIKE_PATTERN_COUNT, EC_SPIKE_PATTERN_GAP, EC_SPIKE_RATIO,
};

/// What the guard decided for one EC sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EcVerdict {
    /// Sample goes on to the window
    Pass,
    /// Isolated jump; keep the previous output
    Hold,
    /// Recurring spikes; report the baseline instead
    Baseline(f32),
}

/// Spike and jump state of the EC channel
#[derive(Debug, Clone)]
pub struct EcSpikeGuard {
    baseline: Option<f32>,
    reference: Option<f32>,
    seen: u32,
    holds: u8,
    spikes: u8,
    since_spike: u32,
    above: bool,
}

impl Default for EcSpikeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl EcSpikeGuard {
    /// Guard with no history
    pub const fn new() -> Self {
        Self { baseline: None, reference: None, seen: 0, holds: 0, spikes: 0, since_spike: u32::MAX, above: false }
    }

    /// Slow baseline, once a sample has been seen
    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    /// Judge one finite sample
    pub fn check(&mut self, raw: f32) -> EcVerdict {
        self.seen = self.seen.saturating_add(1);
        self.since_spike = self.since_spike.saturating_add(1);

        let baseline = match self.baseline {
            Some(b) if b.is_finite() => b + EC_BASELINE_ALPHA * (raw - b),
            _ => raw,
        };
        self.baseline = Some(baseline);

        let spiking = baseline > 0.0 && raw - baseline >= EC_SPIKE_RATIO * baseline;
        let rising = spiking && !self.above;
        self.above = spiking;
        if rising {
            self.spikes = if self.since_spike <= EC_SPIKE_PATTERN_GAP { self.spikes.saturating_add(1) } else { 1 };
            self.since_spike = 0;
            if self.spikes > EC_SPIKE_PATTERN_COUNT {
                return EcVerdict::Baseline(baseline);
            }
        }

        if let Some(reference) = self.reference {
            let magnitude = libm::fabsf(reference);
            if self.seen >= EC_JUMP_MIN_SAMPLES
                && magnitude >= EC_JUMP_MIN_REFERENCE
                && libm::fabsf(raw - reference) / magnitude > EC_JUMP_RATIO
                && self.holds < EC_JUMP_MAX_HOLDS
            {
                self.holds += 1;
                return EcVerdict::Hold;
            }
        }

        self.reference = Some(raw);
        self.holds = 0;
        EcVerdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(value: f32) -> EcSpikeGuard {
        let mut g = EcSpikeGuard::new();
        for _ in 0..5 {
            assert_eq!(g.check(value), EcVerdict::Pass);
        }
        g
    }

    #[test]
    fn first_samples_always_pass() {
        let mut g = EcSpikeGuard::new();
        assert_eq!(g.check(1000.0), EcVerdict::Pass);
        assert_eq!(g.check(3000.0), EcVerdict::Pass);
        let b = g.baseline().unwrap();
        assert!((b - 1200.0).abs() < 1e-2);
    }

    #[test]
    fn single_jump_is_held() {
        let mut g = settled(1000.0);
        assert_eq!(g.check(1300.0), EcVerdict::Hold);
        assert_eq!(g.check(700.0), EcVerdict::Hold);
        // compared against the last accepted sample, not the held one
        assert_eq!(g.check(1010.0), EcVerdict::Pass);
    }

    #[test]
    fn step_is_accepted_after_max_holds() {
        let mut g = settled(1000.0);
        for _ in 0..EC_JUMP_MAX_HOLDS {
            assert_eq!(g.check(2000.0), EcVerdict::Hold);
        }
        assert_eq!(g.check(2000.0), EcVerdict::Pass);
        assert_eq!(g.check(2000.0), EcVerdict::Pass);
    }

    #[test]
    fn near_zero_reference_skips_jump_check() {
        let mut g = settled(0.0);
        assert_eq!(g.check(5.0), EcVerdict::Pass);
    }

    #[test]
    fn recurring_spikes_report_baseline() {
        let mut g = settled(1000.0);
        // each spike stays under the jump ratio, but they keep coming
        let mut verdicts = std::vec::Vec::new();
        for _ in 0..4 {
            verdicts.push(g.check(1240.0));
            assert_eq!(g.check(1000.0), EcVerdict::Pass);
        }
        assert_eq!(&verdicts[..3], &[EcVerdict::Pass; 3]);
        match verdicts[3] {
            EcVerdict::Baseline(b) => assert!(b > 1000.0 && b < 1100.0),
            other => panic!("expected baseline, got {:?}", other),
        }
    }

    #[test]
    fn spaced_out_spikes_are_not_a_pattern() {
        let mut g = settled(1000.0);
        for _ in 0..6 {
            assert_eq!(g.check(1240.0), EcVerdict::Pass);
            for _ in 0..EC_SPIKE_PATTERN_GAP {
                g.check(1000.0);
            }
        }
    }
}
