//! Sensor channels and the 7-in-1 reading snapshot

use crate::constants::sensors::{
    EC_SENSOR_MAX_US_CM, EC_SENSOR_MIN_US_CM, HUMIDITY_SENSOR_MAX_PCT, HUMIDITY_SENSOR_MIN_PCT,
    NPK_SENSOR_MAX_MG_KG, NPK_SENSOR_MIN_MG_KG, PH_SENSOR_MAX, PH_SENSOR_MIN, TEMP_SENSOR_MAX_C,
    TEMP_SENSOR_MIN_C,
};

/// One measurement channel of the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Soil temperature (°C)
    Temperature,
    /// Volumetric water content (%)
    Humidity,
    /// Bulk electrical conductivity (µS/cm)
    Ec,
    /// Soil pH
    Ph,
    /// Nitrogen (mg/kg)
    Nitrogen,
    /// Phosphorus (mg/kg)
    Phosphorus,
    /// Potassium (mg/kg)
    Potassium,
}

impl Channel {
    /// Number of channels
    pub const COUNT: usize = 7;

    /// All channels in register order
    pub const ALL: [Channel; Self::COUNT] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Ec,
        Channel::Ph,
        Channel::Nitrogen,
        Channel::Phosphorus,
        Channel::Potassium,
    ];

    /// Dense index into per-channel arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase name, also used in calibration file names
    pub const fn name(self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Ec => "ec",
            Channel::Ph => "ph",
            Channel::Nitrogen => "nitrogen",
            Channel::Phosphorus => "phosphorus",
            Channel::Potassium => "potassium",
        }
    }

    /// Inverse of [`Channel::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// True for the three nutrient channels
    pub const fn is_nutrient(self) -> bool {
        matches!(self, Channel::Nitrogen | Channel::Phosphorus | Channel::Potassium)
    }

    /// Datasheet measurement envelope `(min, max)`
    pub const fn envelope(self) -> (f32, f32) {
        match self {
            Channel::Temperature => (TEMP_SENSOR_MIN_C, TEMP_SENSOR_MAX_C),
            Channel::Humidity => (HUMIDITY_SENSOR_MIN_PCT, HUMIDITY_SENSOR_MAX_PCT),
            Channel::Ec => (EC_SENSOR_MIN_US_CM, EC_SENSOR_MAX_US_CM),
            Channel::Ph => (PH_SENSOR_MIN, PH_SENSOR_MAX),
            Channel::Nitrogen | Channel::Phosphorus | Channel::Potassium => {
                (NPK_SENSOR_MIN_MG_KG, NPK_SENSOR_MAX_MG_KG)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

/// One snapshot of all seven channels
///
/// Raw, calibrated, compensated and filtered readings share this type;
/// every stage produces a new value instead of mutating its input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Soil temperature (°C)
    pub temperature: f32,
    /// Volumetric water content (%)
    pub humidity: f32,
    /// Electrical conductivity (µS/cm)
    pub ec: f32,
    /// pH
    pub ph: f32,
    /// Nitrogen (mg/kg)
    pub nitrogen: f32,
    /// Phosphorus (mg/kg)
    pub phosphorus: f32,
    /// Potassium (mg/kg)
    pub potassium: f32,
}

impl SensorReading {
    /// Value of one channel
    pub const fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Ec => self.ec,
            Channel::Ph => self.ph,
            Channel::Nitrogen => self.nitrogen,
            Channel::Phosphorus => self.phosphorus,
            Channel::Potassium => self.potassium,
        }
    }

    /// Copy of this reading with one channel replaced
    pub fn with(mut self, channel: Channel, value: f32) -> Self {
        match channel {
            Channel::Temperature => self.temperature = value,
            Channel::Humidity => self.humidity = value,
            Channel::Ec => self.ec = value,
            Channel::Ph => self.ph = value,
            Channel::Nitrogen => self.nitrogen = value,
            Channel::Phosphorus => self.phosphorus = value,
            Channel::Potassium => self.potassium = value,
        }
        self
    }

    /// Apply `f` to every channel
    pub fn map_channels<F: FnMut(Channel, f32) -> f32>(self, mut f: F) -> Self {
        Channel::ALL
            .iter()
            .fold(self, |acc, &c| acc.with(c, f(c, self.get(c))))
    }

    /// True when no channel is NaN or infinite
    pub fn is_finite(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.get(c).is_finite())
    }

    /// Channel with the largest absolute change from `other`, and that change
    pub fn max_abs_delta(&self, other: &SensorReading) -> (Channel, f32) {
        let mut best = (Channel::Temperature, 0.0f32);
        for &c in Channel::ALL.iter() {
            let d = libm::fabsf(self.get(c) - other.get(c));
            if d > best.1 {
                best = (c, d);
            }
        }
        best
    }
}

/// A raw reading as delivered by the Modbus layer
///
/// `probe_temperature` is the register-derived temperature before any
/// calibration; when present it is used for pH compensation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    /// Raw seven-channel reading
    pub reading: SensorReading,
    /// Raw probe temperature (°C)
    pub probe_temperature: Option<f32>,
}

impl RawSample {
    /// Sample without a separate probe temperature
    pub const fn new(reading: SensorReading) -> Self {
        Self { reading, probe_temperature: None }
    }

    /// Sample carrying the raw register temperature
    pub const fn with_probe_temperature(reading: SensorReading, temperature: f32) -> Self {
        Self { reading, probe_temperature: Some(temperature) }
    }
}

impl From<SensorReading> for RawSample {
    fn from(reading: SensorReading) -> Self {
        Self::new(reading)
    }
}
