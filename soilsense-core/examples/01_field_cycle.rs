//! Field Cycle Example
//!
//! Runs a short acquisition session the way the probe firmware does:
//! load calibration, then calibrate, compensate, filter and gate every
//! raw sample, handing published cycles to a consumer thread.
//!
//! ## What You'll Learn
//!
//! - Building a `PipelineContext` from persisted configuration
//! - Loading calibration tables from a directory
//! - Reading stage outcomes and publish decisions
//! - Sharing snapshots with another task through `SnapshotSlot`
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_field_cycle
//! ```

use std::sync::Arc;
use std::thread;

use soilsense_core::{
    CalibrationStorage, CalibrationTable, Channel, FileCalibrationStorage, PipelineConfig, PipelineContext,
    RawSample, SensorReading, SnapshotSlot, SoilType, TableFileLayout,
};

const CONFIG_JSON: &str = r#"{
    "soil_profile": 1,
    "adaptive_filtering": true,
    "outlier_filter_enabled": true,
    "deltas": { "ec": 25.0 }
}"#;

const EC_TABLE: &str = "# loam EC\nraw,corrected\n0,1.00\n1000,0.95\n2000,0.91\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("SoilSense Field Cycle Example");
    println!("=============================\n");

    let config = PipelineConfig::from_json(CONFIG_JSON)?;
    println!("Soil profile: {}", config.soil_type().name());

    // Seed a calibration directory as the configuration portal would
    let dir = std::env::temp_dir().join("soilsense-example");
    let mut storage = FileCalibrationStorage::new(&dir, TableFileLayout::Shared);
    let (table, _) = CalibrationTable::parse_csv(EC_TABLE)?;
    storage.save_table(SoilType::Loam, Channel::Ec, &table)?;

    let mut pipeline = PipelineContext::new(config);
    let loaded = pipeline.load_calibration(&storage);
    println!("Loaded {} calibration table(s) from {}\n", loaded, dir.display());
    pipeline.boot();

    let base = SensorReading {
        temperature: 24.0,
        humidity: 35.0,
        ec: 1450.0,
        ph: 6.7,
        nitrogen: 48.0,
        phosphorus: 22.0,
        potassium: 160.0,
    };

    // The acquisition task owns the pipeline; the radio side only sees snapshots
    let slot = Arc::new(SnapshotSlot::new());
    let acquisition = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            // a drifting EC channel with one glitch at cycle 7
            for cycle in 0..12 {
                let ec = if cycle == 7 { 9500.0 } else { base.ec + 12.0 * cycle as f32 };
                let out = pipeline.run_cycle(RawSample::new(base.with(Channel::Ec, ec)));

                println!("cycle {:2}: raw EC {:7.1} -> {:7.1} µS/cm  {:?}", cycle, ec, out.reading.ec, out.publish);
                if let Some(reason) = out.stages.first_degrade_reason() {
                    println!("          degraded: {}", reason);
                }
                if out.should_publish() {
                    slot.publish(out);
                }
            }
            pipeline
        })
    };

    let pipeline = acquisition.join().map_err(|_| "acquisition task panicked")?;
    if let Some(latest) = slot.latest() {
        println!("\nLatest published: EC {:.1} µS/cm, pH {:.3}", latest.reading.ec, latest.reading.ph);
    }
    pipeline.filters().log_statistics();

    Ok(())
}
