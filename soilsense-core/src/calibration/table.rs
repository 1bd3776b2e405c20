//! Interpolation tables of multiplicative correction factors
//!
//! Each point maps a raw reading to the factor the raw value must be
//! multiplied by. Between points the *factor* is interpolated linearly,
//! outside the table the nearest edge factor is used.
//!
//! ```text
//! factor
//!  1.00 ●
//!        ╲
//!  0.95   ──●          raw = 1500 → factor 0.93 → 1395.0
//!              ╲
//!  0.91          ──●───────── (clamped beyond last point)
//!       0     1000   2000   raw
//! ```

use core::fmt;

use heapless::Vec;

use crate::constants::calibration::{MAX_CSV_LINE_LEN, MAX_TABLE_POINTS};
use crate::errors::{CalibrationError, CalibrationResult};

/// One table knot: raw reading and its correction factor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationPoint {
    /// Raw reading at this knot
    pub raw: f32,
    /// Multiplicative correction at this knot
    pub corrected: f32,
}

impl CalibrationPoint {
    /// Create a knot
    pub const fn new(raw: f32, corrected: f32) -> Self {
        Self { raw, corrected }
    }
}

/// Counters collected while parsing a CSV table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CsvStats {
    /// Rows turned into points
    pub points: usize,
    /// `#` comment lines
    pub comments: usize,
    /// Header rows skipped
    pub headers: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
}

/// Fixed-capacity table, always sorted by raw value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint, MAX_TABLE_POINTS>,
}

impl CalibrationTable {
    /// Empty table
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a table from points in any order
    pub fn from_points(points: &[CalibrationPoint]) -> CalibrationResult<Self> {
        let mut table = Self::new();
        for &p in points {
            table.insert(p)?;
        }
        Ok(table)
    }

    /// Insert a knot, keeping raw order; an existing knot at the same raw
    /// value is replaced
    pub fn insert(&mut self, point: CalibrationPoint) -> CalibrationResult<()> {
        if !point.raw.is_finite() || !point.corrected.is_finite() {
            return Err(CalibrationError::InvalidValue);
        }

        let idx = self.points.partition_point(|p| p.raw < point.raw);
        if let Some(existing) = self.points.get_mut(idx) {
            if existing.raw == point.raw {
                *existing = point;
                return Ok(());
            }
        }

        self.points
            .insert(idx, point)
            .map_err(|_| CalibrationError::TableFull { capacity: MAX_TABLE_POINTS })
    }

    /// Knots in raw order
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Number of knots
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the table has no knots
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Correction factor for `raw`, `None` for an empty table or a NaN `raw`
    pub fn factor_at(&self, raw: f32) -> Option<f32> {
        if raw.is_nan() {
            return None;
        }
        let first = self.points.first()?;
        let last = self.points.last()?;

        if raw <= first.raw {
            return Some(first.corrected);
        }
        if raw >= last.raw {
            return Some(last.corrected);
        }

        let hi = self.points.partition_point(|p| p.raw < raw);
        let upper = self.points[hi];
        if upper.raw == raw {
            return Some(upper.corrected);
        }

        // raw is not NaN and first.raw < raw < last.raw, so 0 < hi < len
        let lower = self.points[hi - 1];
        let t = (raw - lower.raw) / (upper.raw - lower.raw);
        let factor = lower.corrected + t * (upper.corrected - lower.corrected);

        let (lo_c, hi_c) = if lower.corrected <= upper.corrected {
            (lower.corrected, upper.corrected)
        } else {
            (upper.corrected, lower.corrected)
        };
        Some(factor.clamp(lo_c, hi_c))
    }

    /// Corrected value for `raw`, `None` for an empty table or a NaN `raw`
    pub fn apply(&self, raw: f32) -> Option<f32> {
        self.factor_at(raw).map(|f| raw * f)
    }

    /// Parse a two-column `raw,corrected` table
    ///
    /// Lines starting with `#` are comments. A row whose first character
    /// is not a digit, sign or decimal point is a header and skipped.
    /// Rows that fail to parse are skipped and counted.
    pub fn parse_csv(text: &str) -> CalibrationResult<(Self, CsvStats)> {
        let mut table = Self::new();
        let mut stats = CsvStats::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                stats.comments += 1;
                continue;
            }
            if !line.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
                stats.headers += 1;
                continue;
            }

            match parse_row(line) {
                Some(point) => {
                    table.insert(point)?;
                    stats.points += 1;
                }
                None => stats.malformed += 1,
            }
        }

        if table.is_empty() {
            return Err(CalibrationError::EmptyTable);
        }
        Ok((table, stats))
    }

    /// Write the table in the format [`CalibrationTable::parse_csv`] reads
    pub fn write_csv<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str("# soilsense calibration table\n")?;
        out.write_str("raw,corrected\n")?;
        for p in self.points.iter() {
            writeln!(out, "{},{}", p.raw, p.corrected)?;
        }
        Ok(())
    }
}

fn parse_row(line: &str) -> Option<CalibrationPoint> {
    if line.len() > MAX_CSV_LINE_LEN {
        return None;
    }
    let mut fields = line.split(',').map(str::trim);
    let raw = fields.next()?.parse::<f32>().ok()?;
    let corrected = fields.next()?.parse::<f32>().ok()?;
    if fields.next().is_some() || !raw.is_finite() || !corrected.is_finite() {
        return None;
    }
    Some(CalibrationPoint::new(raw, corrected))
}
