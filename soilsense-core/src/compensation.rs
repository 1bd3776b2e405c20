//! Physics-Based Compensation Models
//!
//! ## Overview
//!
//! Probe readings depend on soil temperature and moisture as much as on the
//! quantity being measured. These models refer every reading back to
//! standard conditions. All functions are pure; the only state is the
//! per-soil coefficient tables in [`crate::soil`].
//!
//! | channel | model                                   | reference      |
//! |---------|-----------------------------------------|----------------|
//! | EC      | `EC · (1 + 0.021·(T − 25))`             | Rhoades, 1989  |
//! | pH      | `pH − 0.003·(T − 25)`                   | Nernst, linear |
//! | N, P, K | `X · e^{δX·(T − 20)} · (1 + εX·(H − 30))` | Delgado, 2020  |
//! | VWC     | `clamp01((VWC − PWP)/(FC − PWP)) · 100` | FAO-56         |
//!
//! Optionally EC is also scaled by an Archie-style moisture term
//! `(H/100)^m` with a per-soil exponent `m`. It is off by default.
//!
//! ## Validation
//!
//! Models are evaluated only for temperature in [−50, 100] °C and moisture
//! in [0, 100] %. Outside that range the reading is returned unchanged as
//! a degraded value.

use crate::constants::sensors::{
    COMPENSATION_HUMIDITY_MAX_PCT, COMPENSATION_HUMIDITY_MIN_PCT, COMPENSATION_TEMP_MAX_C,
    COMPENSATION_TEMP_MIN_C, EC_PH_REFERENCE_TEMP_C, EC_TEMP_COEFFICIENT_PER_C,
    NPK_REFERENCE_HUMIDITY_PCT, NPK_REFERENCE_TEMP_C, PH_TEMP_COEFFICIENT_PER_C,
};
use crate::errors::{DegradeReason, Degraded, Processed};
use crate::reading::SensorReading;
use crate::soil::SoilType;

/// Compensated N, P and K
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpkValues {
    /// Nitrogen (mg/kg)
    pub nitrogen: f32,
    /// Phosphorus (mg/kg)
    pub phosphorus: f32,
    /// Potassium (mg/kg)
    pub potassium: f32,
}

/// Optional model extensions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompensationOptions {
    /// Scale EC by the Archie moisture term
    pub archie_moisture: bool,
}

/// True when the models may be evaluated at these conditions
pub fn inputs_valid(temperature: f32, humidity: f32) -> bool {
    (COMPENSATION_TEMP_MIN_C..=COMPENSATION_TEMP_MAX_C).contains(&temperature)
        && (COMPENSATION_HUMIDITY_MIN_PCT..=COMPENSATION_HUMIDITY_MAX_PCT).contains(&humidity)
}

/// Linear temperature compensation of EC (µS/cm)
pub fn compensate_ec(ec: f32, temperature: f32) -> f32 {
    ec * (1.0 + EC_TEMP_COEFFICIENT_PER_C * (temperature - EC_PH_REFERENCE_TEMP_C))
}

/// Archie moisture term `(H/100)^m` for a soil
pub fn archie_moisture_factor(humidity: f32, soil: SoilType) -> f32 {
    libm::powf(humidity / 100.0, soil.archie_exponent())
}

/// Temperature compensation of pH
pub fn compensate_ph(ph: f32, temperature: f32) -> f32 {
    ph - PH_TEMP_COEFFICIENT_PER_C * (temperature - EC_PH_REFERENCE_TEMP_C)
}

/// Delgado temperature/moisture compensation of N, P and K
pub fn compensate_npk(npk: NpkValues, temperature: f32, humidity: f32, soil: SoilType) -> NpkValues {
    let c = soil.npk_coefficients();
    let dt = temperature - NPK_REFERENCE_TEMP_C;
    let dh = humidity - NPK_REFERENCE_HUMIDITY_PCT;

    let correct = |x: f32, delta: f32, epsilon: f32| x * libm::expf(delta * dt) * (1.0 + epsilon * dh);

    NpkValues {
        nitrogen: correct(npk.nitrogen, c.delta_n, c.epsilon_n),
        phosphorus: correct(npk.phosphorus, c.delta_p, c.epsilon_p),
        potassium: correct(npk.potassium, c.delta_k, c.epsilon_k),
    }
}

/// Volumetric water content (%) to available soil moisture (%)
pub fn vwc_to_asm(vwc: f32, soil: SoilType) -> f32 {
    let p = soil.parameters();
    let fraction = vwc / 100.0;
    let available = (fraction - p.wilting_point) / (p.field_capacity - p.wilting_point);
    available.clamp(0.0, 1.0) * 100.0
}

/// Available soil moisture (%) back to volumetric water content (%)
///
/// Exact inverse of [`vwc_to_asm`] inside the wilting point to field
/// capacity band.
pub fn asm_to_vwc(asm: f32, soil: SoilType) -> f32 {
    let p = soil.parameters();
    let fraction = (asm / 100.0).clamp(0.0, 1.0);
    (p.wilting_point + fraction * (p.field_capacity - p.wilting_point)) * 100.0
}

/// Compensate EC, pH and N/P/K of a calibrated reading
///
/// `ph_temperature` is the temperature used for pH; pass the raw probe
/// temperature when it is available, otherwise the reading's own.
pub fn apply_compensation(
    reading: &SensorReading,
    soil: SoilType,
    ph_temperature: f32,
    options: CompensationOptions,
) -> Processed<SensorReading> {
    let t = reading.temperature;
    let h = reading.humidity;

    if !inputs_valid(t, h) || !(COMPENSATION_TEMP_MIN_C..=COMPENSATION_TEMP_MAX_C).contains(&ph_temperature) {
        log_warn!("compensation skipped: T={} H={} pH T={}", t, h, ph_temperature);
        return Err(Degraded::new(*reading, DegradeReason::InvalidInput));
    }

    let mut ec = compensate_ec(reading.ec, t);
    if options.archie_moisture {
        ec *= archie_moisture_factor(h, soil);
    }

    let npk = compensate_npk(
        NpkValues {
            nitrogen: reading.nitrogen,
            phosphorus: reading.phosphorus,
            potassium: reading.potassium,
        },
        t,
        h,
        soil,
    );

    let out = SensorReading {
        ec,
        ph: compensate_ph(reading.ph, ph_temperature),
        nitrogen: npk.nitrogen,
        phosphorus: npk.phosphorus,
        potassium: npk.potassium,
        ..*reading
    };

    if !out.is_finite() {
        log_warn!("compensation produced non-finite output, passing input through");
        return Err(Degraded::new(*reading, DegradeReason::InvalidInput));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BestEffort;

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn ec_at_thirty_degrees() {
        assert!(approx(compensate_ec(1200.0, 30.0), 1326.0, 1e-3));
        assert_eq!(compensate_ec(1200.0, 25.0), 1200.0);
    }

    #[test]
    fn ph_at_thirty_degrees() {
        assert!(approx(compensate_ph(7.0, 30.0), 6.985, 1e-5));
    }

    #[test]
    fn npk_sand_scenario() {
        let out = compensate_npk(
            NpkValues { nitrogen: 150.0, phosphorus: 0.0, potassium: 0.0 },
            30.0,
            40.0,
            SoilType::Sand,
        );
        assert!(approx(out.nitrogen, 171.9, 0.05), "{}", out.nitrogen);
    }

    #[test]
    fn npk_neutral_at_reference() {
        let npk = NpkValues { nitrogen: 80.0, phosphorus: 20.0, potassium: 150.0 };
        assert_eq!(compensate_npk(npk, 20.0, 30.0, SoilType::Clay), npk);
    }

    #[test]
    fn asm_conversion() {
        // loam: PWP 0.10, FC 0.20
        assert!(approx(vwc_to_asm(15.0, SoilType::Loam), 50.0, 1e-3));
        assert_eq!(vwc_to_asm(5.0, SoilType::Loam), 0.0);
        assert_eq!(vwc_to_asm(40.0, SoilType::Loam), 100.0);
        assert!(approx(asm_to_vwc(50.0, SoilType::Loam), 15.0, 1e-4));
    }

    #[test]
    fn asm_round_trips_inside_band() {
        for &soil in SoilType::ALL.iter() {
            let p = soil.parameters();
            let mid = (p.wilting_point + p.field_capacity) * 50.0;
            assert!(approx(asm_to_vwc(vwc_to_asm(mid, soil), soil), mid, 1e-3));
        }
    }

    #[test]
    fn invalid_conditions_pass_through() {
        let r = SensorReading { temperature: 120.0, humidity: 30.0, ec: 900.0, ..Default::default() };
        let out = apply_compensation(&r, SoilType::Loam, r.temperature, CompensationOptions::default());
        assert_eq!(out.degrade_reason(), Some(DegradeReason::InvalidInput));
        assert_eq!(out.best_effort(), r);

        let wet = SensorReading { humidity: 101.0, ..r.with(crate::reading::Channel::Temperature, 20.0) };
        let out = apply_compensation(&wet, SoilType::Loam, 20.0, CompensationOptions::default());
        assert_eq!(out.degrade_reason(), Some(DegradeReason::InvalidInput));
    }

    #[test]
    fn full_reading_leaves_temperature_and_humidity() {
        let r = SensorReading {
            temperature: 30.0,
            humidity: 40.0,
            ec: 1200.0,
            ph: 7.0,
            nitrogen: 150.0,
            phosphorus: 40.0,
            potassium: 200.0,
        };
        let out = apply_compensation(&r, SoilType::Loam, 30.0, CompensationOptions::default()).unwrap();
        assert_eq!(out.temperature, 30.0);
        assert_eq!(out.humidity, 40.0);
        assert!(approx(out.ec, 1326.0, 1e-3));
        assert!(approx(out.ph, 6.985, 1e-5));
        assert!(out.nitrogen > 150.0);
    }

    #[test]
    fn probe_temperature_drives_ph() {
        let r = SensorReading { temperature: 25.0, humidity: 30.0, ph: 7.0, ..Default::default() };
        let out = apply_compensation(&r, SoilType::Loam, 35.0, CompensationOptions::default()).unwrap();
        assert!(approx(out.ph, 6.97, 1e-5));
    }

    #[test]
    fn archie_scales_ec_down_in_dry_soil() {
        let r = SensorReading { temperature: 25.0, humidity: 25.0, ec: 1000.0, ..Default::default() };
        let plain = apply_compensation(&r, SoilType::Clay, 25.0, CompensationOptions::default()).unwrap();
        let archie = apply_compensation(&r, SoilType::Clay, 25.0, CompensationOptions { archie_moisture: true }).unwrap();
        assert_eq!(plain.ec, 1000.0);
        assert!(archie.ec < plain.ec);
        assert!(approx(archie.ec, 1000.0 * libm::powf(0.25, 0.45), 1e-2));
    }
}
