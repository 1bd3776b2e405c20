//! Common test utilities for integration tests
//!
//! - Seeded generators for noisy probe series
//! - Known-answer field scenarios
//! - In-memory source/sink doubles for the boundary traits

#![allow(dead_code)]

use soilsense_core::{CycleOutput, RawSample, ReadingSink, ReadingSource};

pub mod generators;
pub mod scenarios;

/// Source that replays a fixed list of samples, then reports exhaustion
pub struct ReplaySource {
    samples: Vec<RawSample>,
    next: usize,
}

impl ReplaySource {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples, next: 0 }
    }
}

#[derive(Debug, PartialEq)]
pub struct Exhausted;

impl ReadingSource for ReplaySource {
    type Error = Exhausted;

    fn read(&mut self) -> Result<RawSample, Exhausted> {
        let sample = self.samples.get(self.next).copied().ok_or(Exhausted)?;
        self.next += 1;
        Ok(sample)
    }
}

/// Sink that records every delivered cycle
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Vec<CycleOutput>,
    pub fail_next: bool,
}

#[derive(Debug, PartialEq)]
pub struct LinkDown;

impl ReadingSink for RecordingSink {
    type Error = LinkDown;

    fn deliver(&mut self, output: &CycleOutput) -> Result<(), LinkDown> {
        if std::mem::take(&mut self.fail_next) {
            return Err(LinkDown);
        }
        self.delivered.push(*output);
        Ok(())
    }
}

/// Absolute-tolerance comparison with a readable failure message
pub fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
