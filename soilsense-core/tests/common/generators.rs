//! Deterministic data generators
//!
//! Everything is driven by a small LCG so failures reproduce exactly.

use soilsense_core::{Channel, RawSample, SensorReading};

/// Linear congruential generator (Numerical Recipes constants)
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform in [-1, 1)
    pub fn next_signed(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 23) as f32 - 1.0
    }
}

/// Typical mid-season loam reading
pub fn baseline() -> SensorReading {
    SensorReading {
        temperature: 22.0,
        humidity: 32.0,
        ec: 1000.0,
        ph: 6.5,
        nitrogen: 60.0,
        phosphorus: 25.0,
        potassium: 180.0,
    }
}

/// Per-channel peak noise amplitude, roughly the probe datasheet accuracy
pub fn noise_amplitude(channel: Channel) -> f32 {
    match channel {
        Channel::Temperature => 0.2,
        Channel::Humidity => 0.5,
        Channel::Ec => 5.0,
        Channel::Ph => 0.02,
        Channel::Nitrogen | Channel::Phosphorus | Channel::Potassium => 1.0,
    }
}

/// Series of `len` samples scattered uniformly around `base`
pub fn noisy_series(base: SensorReading, len: usize, seed: u32) -> Vec<RawSample> {
    let mut rng = Lcg::new(seed);
    (0..len)
        .map(|_| RawSample::new(base.map_channels(|c, v| v + noise_amplitude(c) * rng.next_signed())))
        .collect()
}

/// Series whose temperature ramps linearly by `step` per sample
pub fn temperature_ramp(base: SensorReading, len: usize, step: f32) -> Vec<RawSample> {
    (0..len)
        .map(|i| RawSample::new(base.with(Channel::Temperature, base.temperature + step * i as f32)))
        .collect()
}
