//! Soil Types and Per-Soil Parameter Tables
//!
//! ## Overview
//!
//! The soil type selects both the calibration table set and the
//! coefficients of every compensation model. Thirteen types are known;
//! their numeric indices are the ones the configuration portal stores.
//!
//! ```text
//!  0 sand        4 sandpeat     8 sandy_loam   12 alkaline
//!  1 loam        5 silt         9 silty_loam
//!  2 peat        6 clay_loam   10 loamy_clay
//!  3 clay        7 organic     11 saline
//! ```
//!
//! Any index outside 0..=12 resolves to `Loam`, the agronomic middle
//! ground, so a corrupted configuration never disables compensation.
//!
//! ## Tables
//!
//! | soil       | porosity | bulk g/cm³ | FC   | PWP  |
//! |------------|----------|------------|------|------|
//! | sand       | 0.35     | 1.60       | 0.10 | 0.05 |
//! | loam       | 0.45     | 1.40       | 0.20 | 0.10 |
//! | peat       | 0.80     | 0.30       | 0.45 | 0.20 |
//! | clay       | 0.50     | 1.20       | 0.35 | 0.20 |
//! | sandpeat   | 0.60     | 0.80       | 0.30 | 0.12 |
//!
//! FC and PWP are volumetric fractions. PWP is a documented per-soil
//! constant chosen from the porosity/bulk-density class of each soil
//! (Saxton & Rawls, 2006), so `0 < PWP < FC <= porosity` always holds.
//!
//! NPK coefficients follow Delgado et al. (2020); the first five rows are
//! the published values, the remaining soils are interpolated from their
//! nearest texture class. Every coefficient is positive.

/// Soil classification used to select calibration and compensation data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SoilType {
    /// Coarse sand
    Sand,
    /// Loam (default)
    Loam,
    /// Peat
    Peat,
    /// Clay
    Clay,
    /// Sand/peat mix (potting substrate)
    Sandpeat,
    /// Silt
    Silt,
    /// Clay loam
    ClayLoam,
    /// High organic matter
    Organic,
    /// Sandy loam
    SandyLoam,
    /// Silty loam
    SiltyLoam,
    /// Loamy clay
    LoamyClay,
    /// Saline soil
    Saline,
    /// Alkaline soil
    Alkaline,
}

/// Calibration profiles share the soil index space
pub type SoilProfile = SoilType;

impl SoilType {
    /// Number of soil types
    pub const COUNT: usize = 13;

    /// All soil types in index order
    pub const ALL: [SoilType; Self::COUNT] = [
        SoilType::Sand,
        SoilType::Loam,
        SoilType::Peat,
        SoilType::Clay,
        SoilType::Sandpeat,
        SoilType::Silt,
        SoilType::ClayLoam,
        SoilType::Organic,
        SoilType::SandyLoam,
        SoilType::SiltyLoam,
        SoilType::LoamyClay,
        SoilType::Saline,
        SoilType::Alkaline,
    ];

    /// Resolve a stored index, mapping anything out of range to `Loam`
    pub fn from_index(index: i32) -> Self {
        match Self::try_from_index(index) {
            Some(soil) => soil,
            None => {
                log_warn!("soil profile index {} out of range, using loam", index);
                SoilType::Loam
            }
        }
    }

    /// Resolve a stored index without fallback
    pub fn try_from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Index as stored in configuration
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, also used in per-profile file names
    pub const fn name(self) -> &'static str {
        match self {
            SoilType::Sand => "sand",
            SoilType::Loam => "loam",
            SoilType::Peat => "peat",
            SoilType::Clay => "clay",
            SoilType::Sandpeat => "sandpeat",
            SoilType::Silt => "silt",
            SoilType::ClayLoam => "clay_loam",
            SoilType::Organic => "organic",
            SoilType::SandyLoam => "sandy_loam",
            SoilType::SiltyLoam => "silty_loam",
            SoilType::LoamyClay => "loamy_clay",
            SoilType::Saline => "saline",
            SoilType::Alkaline => "alkaline",
        }
    }

    /// Hydraulic parameters of this soil
    pub const fn parameters(self) -> SoilParameters {
        SOIL_PARAMETERS[self as usize]
    }

    /// Delgado NPK coefficients of this soil
    pub const fn npk_coefficients(self) -> NpkCoefficients {
        NPK_COEFFICIENTS[self as usize]
    }

    /// Archie moisture exponent `m` for EC compensation
    pub const fn archie_exponent(self) -> f32 {
        ARCHIE_EXPONENTS[self as usize]
    }
}

impl Default for SoilType {
    fn default() -> Self {
        SoilType::Loam
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SoilType {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

/// Water-retention parameters of a soil (volumetric fractions)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilParameters {
    /// Total pore fraction
    pub porosity: f32,
    /// Bulk density (g/cm³)
    pub bulk_density: f32,
    /// Field capacity
    pub field_capacity: f32,
    /// Permanent wilting point
    pub wilting_point: f32,
}

/// Delgado model coefficients
///
/// `delta_*` are temperature exponents (1/°C), `epsilon_*` linear moisture
/// terms (1/%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpkCoefficients {
    /// Nitrogen temperature exponent
    pub delta_n: f32,
    /// Phosphorus temperature exponent
    pub delta_p: f32,
    /// Potassium temperature exponent
    pub delta_k: f32,
    /// Nitrogen moisture term
    pub epsilon_n: f32,
    /// Phosphorus moisture term
    pub epsilon_p: f32,
    /// Potassium moisture term
    pub epsilon_k: f32,
}

const fn params(porosity: f32, bulk_density: f32, field_capacity: f32, wilting_point: f32) -> SoilParameters {
    SoilParameters { porosity, bulk_density, field_capacity, wilting_point }
}

const fn npk(dn: f32, dp: f32, dk: f32, en: f32, ep: f32, ek: f32) -> NpkCoefficients {
    NpkCoefficients {
        delta_n: dn,
        delta_p: dp,
        delta_k: dk,
        epsilon_n: en,
        epsilon_p: ep,
        epsilon_k: ek,
    }
}

const SOIL_PARAMETERS: [SoilParameters; SoilType::COUNT] = [
    params(0.35, 1.60, 0.10, 0.05), // sand
    params(0.45, 1.40, 0.20, 0.10), // loam
    params(0.80, 0.30, 0.45, 0.20), // peat
    params(0.50, 1.20, 0.35, 0.20), // clay
    params(0.60, 0.80, 0.30, 0.12), // sandpeat
    params(0.48, 1.30, 0.32, 0.12), // silt
    params(0.47, 1.25, 0.32, 0.17), // clay_loam
    params(0.85, 0.25, 0.50, 0.22), // organic
    params(0.41, 1.50, 0.18, 0.08), // sandy_loam
    params(0.46, 1.35, 0.30, 0.13), // silty_loam
    params(0.49, 1.15, 0.36, 0.20), // loamy_clay
    params(0.44, 1.45, 0.25, 0.14), // saline
    params(0.45, 1.30, 0.28, 0.14), // alkaline
];

const NPK_COEFFICIENTS: [NpkCoefficients; SoilType::COUNT] = [
    npk(0.0041, 0.0053, 0.0032, 0.010, 0.008, 0.012),    // sand
    npk(0.0038, 0.0049, 0.0029, 0.009, 0.007, 0.011),    // loam
    npk(0.0028, 0.0035, 0.0018, 0.012, 0.009, 0.015),    // peat
    npk(0.0032, 0.0042, 0.0024, 0.008, 0.006, 0.010),    // clay
    npk(0.0040, 0.0051, 0.0031, 0.010, 0.008, 0.012),    // sandpeat
    npk(0.0036, 0.0046, 0.0027, 0.009, 0.007, 0.011),    // silt
    npk(0.0034, 0.0044, 0.0026, 0.0085, 0.0065, 0.0105), // clay_loam
    npk(0.0026, 0.0033, 0.0017, 0.013, 0.010, 0.016),    // organic
    npk(0.0040, 0.0051, 0.0031, 0.0095, 0.0075, 0.0115), // sandy_loam
    npk(0.0037, 0.0047, 0.0028, 0.009, 0.007, 0.011),    // silty_loam
    npk(0.0033, 0.0043, 0.0025, 0.0082, 0.0062, 0.0102), // loamy_clay
    npk(0.0030, 0.0040, 0.0022, 0.007, 0.005, 0.009),    // saline
    npk(0.0035, 0.0045, 0.0027, 0.008, 0.006, 0.010),    // alkaline
];

const ARCHIE_EXPONENTS: [f32; SoilType::COUNT] = [
    0.15, 0.30, 0.10, 0.45, 0.18, 0.32, 0.40, 0.12, 0.22, 0.34, 0.42, 0.35, 0.30,
];
