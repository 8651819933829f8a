// THEORY:
// Pixel records are the structured twin of the rendered surface: one entry per
// cell, row-major, holding the cell's column/row and its opaque color. They are
// the export format. A caller drops a drawing into a numbered square of a
// larger shared canvas by shifting every location by that square's origin, and
// the shifted records are appended onto a persisted list that only ever grows.

use crate::core_modules::grid::PIXELS_PER_GRID;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{PixelatorError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: u32,
    pub y: u32,
}

/// Opaque RGB color. Alpha is always 255 by construction and is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl From<Pixel> for RecordColor {
    fn from(pixel: Pixel) -> Self {
        Self {
            red: pixel.red,
            green: pixel.green,
            blue: pixel.blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRecord {
    pub location: Location,
    pub color: RecordColor,
}

impl PixelRecord {
    pub fn new(x: u32, y: u32, color: impl Into<RecordColor>) -> Self {
        Self {
            location: Location { x, y },
            color: color.into(),
        }
    }
}

/// Origin, in cells, of the 1-based square `index` on a canvas that is
/// `squares_per_row` squares wide.
pub fn square_origin(index: u32, squares_per_row: u32, pixels_per_grid: u32) -> Result<Location> {
    if index == 0 || squares_per_row == 0 {
        return Err(PixelatorError::InvalidSquareIndex {
            index,
            squares_per_row,
        });
    }
    let column = (index - 1) % squares_per_row;
    let row = (index - 1) / squares_per_row;
    match (
        column.checked_mul(pixels_per_grid),
        row.checked_mul(pixels_per_grid),
    ) {
        (Some(x), Some(y)) => Ok(Location { x, y }),
        _ => Err(PixelatorError::InvalidSquareIndex {
            index,
            squares_per_row,
        }),
    }
}

/// Shifts every record into the square `index` (see `square_origin`).
pub fn offset_records(
    records: &[PixelRecord],
    index: u32,
    squares_per_row: u32,
) -> Result<Vec<PixelRecord>> {
    offset_records_with(records, index, squares_per_row, PIXELS_PER_GRID)
}

pub fn offset_records_with(
    records: &[PixelRecord],
    index: u32,
    squares_per_row: u32,
    pixels_per_grid: u32,
) -> Result<Vec<PixelRecord>> {
    let origin = square_origin(index, squares_per_row, pixels_per_grid)?;
    records
        .iter()
        .map(|record| {
            match (
                record.location.x.checked_add(origin.x),
                record.location.y.checked_add(origin.y),
            ) {
                (Some(x), Some(y)) => Ok(PixelRecord {
                    location: Location { x, y },
                    color: record.color,
                }),
                _ => Err(PixelatorError::InvalidSquareIndex {
                    index,
                    squares_per_row,
                }),
            }
        })
        .collect()
}

pub fn to_json(records: &[PixelRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Concatenates `new` onto the JSON list in `existing`. Empty input counts as `[]`.
pub fn merge_json(existing: &str, new: &[PixelRecord]) -> Result<String> {
    let mut merged: Vec<PixelRecord> = if existing.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(existing)?
    };
    merged.extend_from_slice(new);
    to_json(&merged)
}

/// A JSON file holding an append-only list of pixel records.
pub struct ExportStore {
    path: PathBuf,
}

impl ExportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored records; a missing file is an empty store.
    pub fn load(&self) -> Result<Vec<PixelRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                PixelatorError::Store(format!("{} is not a record list: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Appends `records` and returns the new total.
    pub fn append(&self, records: &[PixelRecord]) -> Result<usize> {
        let mut stored = self.load()?;
        stored.extend_from_slice(records);

        // Write beside the store, then swap it in.
        let staging = self.staging_path();
        fs::write(&staging, to_json(&stored)?)?;
        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        debug!(
            "Appended {} records to {} ({} total)",
            records.len(),
            self.path.display(),
            stored.len()
        );
        Ok(stored.len())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
