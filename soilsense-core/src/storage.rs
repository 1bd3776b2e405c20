//! Calibration persistence backends
//!
//! ## Table file layout
//!
//! The probe firmware historically kept one table file per channel, shared
//! by every soil profile. Whether per-profile tables are wanted is a
//! product decision, so both layouts are supported and the shared one is
//! the default:
//!
//! ```text
//! Shared      calibration_ec.csv
//! PerProfile  calibration_clay_ec.csv, calibration_loam_ec.csv, ...
//! ```
//!
//! With the shared layout, saving a table for one profile replaces the
//! table every other profile loads for that channel.

use heapless::Vec;

use crate::calibration::{CalibrationTable, ChannelCorrections};
use crate::constants::calibration::MAX_TABLES;
use crate::errors::{CalibrationError, CalibrationResult};
use crate::reading::Channel;
use crate::soil::SoilProfile;
use crate::traits::CalibrationStorage;

/// How table keys map onto storage entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableFileLayout {
    /// One table per channel, shared by all profiles
    #[default]
    Shared,
    /// One table per (profile, channel)
    PerProfile,
}

impl TableFileLayout {
    /// Profile component of the storage key
    pub fn scope(self, profile: SoilProfile) -> Option<SoilProfile> {
        match self {
            TableFileLayout::Shared => None,
            TableFileLayout::PerProfile => Some(profile),
        }
    }
}

/// In-memory backend, used on targets without a filesystem and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStorage {
    layout: TableFileLayout,
    tables: Vec<(Option<SoilProfile>, Channel, CalibrationTable), MAX_TABLES>,
    corrections: Option<ChannelCorrections>,
}

impl MemoryCalibrationStorage {
    /// Empty storage with the given layout
    pub fn new(layout: TableFileLayout) -> Self {
        Self { layout, tables: Vec::new(), corrections: None }
    }

    /// Active layout
    pub fn layout(&self) -> TableFileLayout {
        self.layout
    }

    /// Number of stored tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn position(&self, profile: SoilProfile, channel: Channel) -> Option<usize> {
        let scope = self.layout.scope(profile);
        self.tables.iter().position(|(p, c, _)| *p == scope && *c == channel)
    }
}

impl CalibrationStorage for MemoryCalibrationStorage {
    fn load_table(&self, profile: SoilProfile, channel: Channel) -> CalibrationResult<Option<CalibrationTable>> {
        Ok(self.position(profile, channel).map(|i| self.tables[i].2.clone()))
    }

    fn save_table(&mut self, profile: SoilProfile, channel: Channel, table: &CalibrationTable) -> CalibrationResult<()> {
        if table.is_empty() {
            return Err(CalibrationError::EmptyTable);
        }
        match self.position(profile, channel) {
            Some(i) => self.tables[i].2 = table.clone(),
            None => self
                .tables
                .push((self.layout.scope(profile), channel, table.clone()))
                .map_err(|_| CalibrationError::Storage { reason: "no free table slot" })?,
        }
        Ok(())
    }

    fn remove_table(&mut self, profile: SoilProfile, channel: Channel) -> CalibrationResult<bool> {
        Ok(match self.position(profile, channel) {
            Some(i) => {
                self.tables.swap_remove(i);
                true
            }
            None => false,
        })
    }

    fn load_corrections(&self) -> CalibrationResult<Option<ChannelCorrections>> {
        Ok(self.corrections)
    }

    fn save_corrections(&mut self, corrections: &ChannelCorrections) -> CalibrationResult<()> {
        self.corrections = Some(*corrections);
        Ok(())
    }
}

#[cfg(feature = "std")]
pub use file::FileCalibrationStorage;

#[cfg(feature = "std")]
mod file {
    use std::fs;
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};

    use super::TableFileLayout;
    use crate::calibration::{CalibrationTable, ChannelCorrections};
    use crate::errors::{CalibrationError, CalibrationResult};
    use crate::reading::Channel;
    use crate::soil::SoilProfile;
    use crate::traits::CalibrationStorage;

    const CORRECTIONS_FILE: &str = "corrections.json";

    /// Directory-backed storage: CSV tables and a JSON factor file
    ///
    /// Every write goes to a temporary file that is renamed over the
    /// target, so a power loss leaves either the old or the new file.
    #[derive(Debug, Clone)]
    pub struct FileCalibrationStorage {
        root: PathBuf,
        layout: TableFileLayout,
    }

    impl FileCalibrationStorage {
        /// Storage rooted at `root`; the directory is created on first save
        pub fn new(root: impl Into<PathBuf>, layout: TableFileLayout) -> Self {
            Self { root: root.into(), layout }
        }

        /// Root directory
        pub fn root(&self) -> &Path {
            &self.root
        }

        /// Active layout
        pub fn layout(&self) -> TableFileLayout {
            self.layout
        }

        /// Path of the table file for `(profile, channel)`
        pub fn table_path(&self, profile: SoilProfile, channel: Channel) -> PathBuf {
            let name = match self.layout.scope(profile) {
                None => format!("calibration_{}.csv", channel.name()),
                Some(p) => format!("calibration_{}_{}.csv", p.name(), channel.name()),
            };
            self.root.join(name)
        }

        fn read_optional(path: &Path) -> CalibrationResult<Option<String>> {
            match fs::read_to_string(path) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => {
                    log_warn!("reading {} failed: {}", path.display(), e);
                    Err(CalibrationError::Storage { reason: "read failed" })
                }
            }
        }

        fn write_atomic(&self, path: &Path, contents: &str) -> CalibrationResult<()> {
            fs::create_dir_all(&self.root).map_err(|_| CalibrationError::Storage { reason: "cannot create directory" })?;

            let tmp = path.with_extension("tmp");
            let result = fs::File::create(&tmp)
                .and_then(|mut f| {
                    f.write_all(contents.as_bytes())?;
                    f.sync_all()
                })
                .and_then(|_| fs::rename(&tmp, path));

            result.map_err(|e| {
                log_warn!("writing {} failed: {}", path.display(), e);
                let _ = fs::remove_file(&tmp);
                CalibrationError::Storage { reason: "write failed" }
            })
        }
    }

    impl CalibrationStorage for FileCalibrationStorage {
        fn load_table(&self, profile: SoilProfile, channel: Channel) -> CalibrationResult<Option<CalibrationTable>> {
            let path = self.table_path(profile, channel);
            match Self::read_optional(&path)? {
                None => Ok(None),
                Some(text) => {
                    let (table, stats) = CalibrationTable::parse_csv(&text)?;
                    log_debug!("{}: {} points, {} malformed rows", path.display(), stats.points, stats.malformed);
                    Ok(Some(table))
                }
            }
        }

        fn save_table(&mut self, profile: SoilProfile, channel: Channel, table: &CalibrationTable) -> CalibrationResult<()> {
            if table.is_empty() {
                return Err(CalibrationError::EmptyTable);
            }
            let mut text = String::new();
            table
                .write_csv(&mut text)
                .map_err(|_| CalibrationError::Storage { reason: "format failed" })?;
            self.write_atomic(&self.table_path(profile, channel), &text)
        }

        fn remove_table(&mut self, profile: SoilProfile, channel: Channel) -> CalibrationResult<bool> {
            match fs::remove_file(self.table_path(profile, channel)) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(_) => Err(CalibrationError::Storage { reason: "remove failed" }),
            }
        }

        fn load_corrections(&self) -> CalibrationResult<Option<ChannelCorrections>> {
            match Self::read_optional(&self.root.join(CORRECTIONS_FILE))? {
                None => Ok(None),
                Some(text) => serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|_| CalibrationError::Storage { reason: "corrupt corrections file" }),
            }
        }

        fn save_corrections(&mut self, corrections: &ChannelCorrections) -> CalibrationResult<()> {
            let text = serde_json::to_string_pretty(corrections)
                .map_err(|_| CalibrationError::Storage { reason: "serialize failed" })?;
            self.write_atomic(&self.root.join(CORRECTIONS_FILE), &text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationPoint;
    use crate::soil::SoilType;

    fn table(factor: f32) -> CalibrationTable {
        CalibrationTable::from_points(&[CalibrationPoint::new(0.0, factor), CalibrationPoint::new(1000.0, factor)])
            .unwrap()
    }

    #[test]
    fn shared_layout_ignores_profile() {
        let mut s = MemoryCalibrationStorage::new(TableFileLayout::Shared);
        s.save_table(SoilType::Clay, Channel::Ec, &table(0.9)).unwrap();
        assert_eq!(s.load_table(SoilType::Sand, Channel::Ec).unwrap(), Some(table(0.9)));
        s.save_table(SoilType::Sand, Channel::Ec, &table(0.8)).unwrap();
        assert_eq!(s.table_count(), 1);
        assert_eq!(s.load_table(SoilType::Clay, Channel::Ec).unwrap(), Some(table(0.8)));
    }

    #[test]
    fn per_profile_layout_separates_profiles() {
        let mut s = MemoryCalibrationStorage::new(TableFileLayout::PerProfile);
        s.save_table(SoilType::Clay, Channel::Ec, &table(0.9)).unwrap();
        assert_eq!(s.load_table(SoilType::Sand, Channel::Ec).unwrap(), None);
        assert!(s.remove_table(SoilType::Clay, Channel::Ec).unwrap());
        assert!(!s.remove_table(SoilType::Clay, Channel::Ec).unwrap());
    }

    #[test]
    fn corrections_round_trip() {
        let mut s = MemoryCalibrationStorage::default();
        assert_eq!(s.load_corrections().unwrap(), None);
        let mut c = ChannelCorrections::new();
        c.calibrate_npk_zero(1.0, 2.0, 3.0).unwrap();
        s.save_corrections(&c).unwrap();
        assert_eq!(s.load_corrections().unwrap(), Some(c));
    }

    #[cfg(feature = "std")]
    #[test]
    fn file_names_follow_layout() {
        let shared = FileCalibrationStorage::new("/data", TableFileLayout::Shared);
        assert!(shared.table_path(SoilType::Peat, Channel::Ph).ends_with("calibration_ph.csv"));
        let per = FileCalibrationStorage::new("/data", TableFileLayout::PerProfile);
        assert!(per
            .table_path(SoilType::ClayLoam, Channel::Nitrogen)
            .ends_with("calibration_clay_loam_nitrogen.csv"));
    }
}
