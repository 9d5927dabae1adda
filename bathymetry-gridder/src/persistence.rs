//! Whole-grid snapshots.
//!
//! Format:
//! - Header (8 bytes):
//!   - Magic: "BATHGRD" (7 bytes)
//!   - Version: u8 (1 byte)
//! - Body: postcard-encoded [`GridSnapshot`], cells row-major with `None`
//!   marking cells that never received a sample
//!
//! The translator cache is not part of the snapshot.

use crate::bounds::GridBounds;
use crate::error::{Error, Result};
use crate::grid::{BathymetryGrid, DataPoint};
use constants::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

const HEADER_SIZE: usize = SNAPSHOT_MAGIC.len() + 1;

#[derive(Serialize, Deserialize)]
struct GridSnapshot {
    native_crs: String,
    bounds: GridBounds,
    ncols: u32,
    nrows: u32,
    cells: Vec<Option<DataPoint>>,
}

impl BathymetryGrid {
    /// Save the grid to `path`, replacing any existing file.
    pub fn store(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::write(path, e))?;
        let mut writer = BufWriter::new(file);
        write_snapshot(self, &mut writer).map_err(|e| retarget_write(e, path))?;
        writer.flush().map_err(|e| Error::write(path, e))?;

        info!(
            path = %path.display(),
            cells = self.populated_cells(),
            "stored bathymetry grid"
        );
        Ok(())
    }

    /// Restore a grid saved with [`BathymetryGrid::store`].
    /// The restored grid starts with an empty translator cache backed by the
    /// built-in projections; re-attach a custom factory with
    /// [`BathymetryGrid::with_translator_factory`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::read(path, e))?;
        let mut reader = BufReader::new(file);
        let grid = read_snapshot(&mut reader).map_err(|e| retarget_read(e, path))?;

        info!(
            path = %path.display(),
            ncols = grid.ncols(),
            nrows = grid.nrows(),
            "loaded bathymetry grid"
        );
        Ok(grid)
    }
}

/// Write a snapshot of `grid` to any writer
pub fn write_snapshot<W: Write>(grid: &BathymetryGrid, writer: &mut W) -> Result<()> {
    let snapshot = GridSnapshot {
        native_crs: grid.native_crs().to_string(),
        bounds: *grid.bounds(),
        ncols: grid.ncols() as u32,
        nrows: grid.nrows() as u32,
        cells: grid.cells_row_major(),
    };

    let mut header = [0u8; HEADER_SIZE];
    header[..SNAPSHOT_MAGIC.len()].copy_from_slice(SNAPSHOT_MAGIC);
    header[SNAPSHOT_MAGIC.len()] = SNAPSHOT_VERSION;

    let body = postcard::to_allocvec(&snapshot)?;

    writer
        .write_all(&header)
        .and_then(|_| writer.write_all(&body))
        .map_err(|e| Error::write("<snapshot>", e))
}

/// Read a snapshot from any reader
pub fn read_snapshot<R: Read>(reader: &mut R) -> Result<BathymetryGrid> {
    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|e| Error::Serialization(format!("truncated snapshot header: {}", e)))?;

    if &header[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(Error::Serialization("invalid magic bytes".to_string()));
    }

    let version = header[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(Error::Serialization(format!(
            "version mismatch: expected {}, found {}",
            SNAPSHOT_VERSION, version
        )));
    }

    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .map_err(|e| Error::read("<snapshot>", e))?;
    let snapshot: GridSnapshot = postcard::from_bytes(&body)?;

    let bounds = GridBounds::new(
        snapshot.bounds.min_x,
        snapshot.bounds.max_x,
        snapshot.bounds.step_x,
        snapshot.bounds.min_y,
        snapshot.bounds.max_y,
        snapshot.bounds.step_y,
    )
    .map_err(|e| Error::Serialization(e.to_string()))?;

    if bounds.ncols() != snapshot.ncols as usize || bounds.nrows() != snapshot.nrows as usize {
        return Err(Error::Serialization(format!(
            "stored dimensions {}x{} do not match bounds {}x{}",
            snapshot.ncols,
            snapshot.nrows,
            bounds.ncols(),
            bounds.nrows()
        )));
    }

    BathymetryGrid::from_cells(&snapshot.native_crs, bounds, snapshot.cells)
}

fn retarget_write(err: Error, path: &Path) -> Error {
    match err {
        Error::Write { source, .. } => Error::write(path, source),
        other => other,
    }
}

fn retarget_read(err: Error, path: &Path) -> Error {
    match err {
        Error::Read { source, .. } => Error::read(path, source),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::{CoordTranslator, TranslatorFactory};
    use constants::{WEB_MERCATOR, WGS84};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_grid() -> BathymetryGrid {
        let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 4.0, 1.0, 0.0, 3.0, 1.0).unwrap();
        grid.add_sample(WEB_MERCATOR, 0.5, 0.5, 10.0).unwrap();
        grid.add_sample(WEB_MERCATOR, 0.5, 0.5, 14.0).unwrap();
        grid.add_sample(WEB_MERCATOR, 3.5, 2.5, 7.25).unwrap();
        grid.add_sample(WGS84, 0.0, 0.0, 1.0).unwrap();
        grid
    }

    #[test]
    fn test_round_trip() {
        let grid = sample_grid();
        assert_eq!(grid.translator_cache().len(), 2);

        let mut buffer = Vec::new();
        write_snapshot(&grid, &mut buffer).unwrap();
        let loaded = read_snapshot(&mut Cursor::new(buffer)).unwrap();

        assert_eq!(loaded.native_crs(), WEB_MERCATOR);
        assert_eq!(loaded.bounds(), grid.bounds());
        assert_eq!((loaded.ncols(), loaded.nrows()), (4, 3));
        assert!(loaded.translator_cache().is_empty());

        for row in 0..grid.nrows() {
            for col in 0..grid.ncols() {
                assert_eq!(loaded.cell(col, row), grid.cell(col, row));
            }
        }
        assert_eq!(loaded.cell(0, 0).unwrap().count, 3);
        assert_eq!(loaded.bathymetry_at(WEB_MERCATOR, 3.5, 2.5), 7.25);
    }

    #[test]
    fn test_store_and_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("survey.grid");

        let grid = sample_grid();
        grid.store(&path).unwrap();
        let loaded = BathymetryGrid::load(&path).unwrap();

        assert_eq!(loaded.populated_cells(), grid.populated_cells());
        assert_eq!(loaded.depth_range(), grid.depth_range());
    }

    #[test]
    fn test_load_falls_back_to_builtin_projections() {
        struct Shifted;

        impl CoordTranslator for Shifted {
            fn translate(&self, x: f64, y: f64) -> (f64, f64) {
                (x + 2.0, y)
            }
        }

        struct ShiftFactory;

        impl TranslatorFactory for ShiftFactory {
            fn create(&self, _from: &str, _to: &str) -> Result<Arc<dyn CoordTranslator>> {
                Ok(Arc::new(Shifted))
            }
        }

        let grid = sample_grid().with_translator_factory(Arc::new(ShiftFactory));
        grid.add_sample("LOCAL:PIER", 1.5, 1.5, 4.0).unwrap();

        let mut buffer = Vec::new();
        write_snapshot(&grid, &mut buffer).unwrap();
        let loaded = read_snapshot(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(loaded.cell(3, 1).unwrap().average, 4.0);

        // The stored cells survive, the custom factory does not.
        assert!(matches!(
            loaded.add_sample("LOCAL:PIER", 1.5, 1.5, 4.0),
            Err(Error::UnsupportedCrs { .. })
        ));

        let loaded = loaded.with_translator_factory(Arc::new(ShiftFactory));
        loaded.add_sample("LOCAL:PIER", 1.5, 1.5, 6.0).unwrap();
        assert_eq!(loaded.cell(3, 1).unwrap().average, 5.0);
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = b"NOTGRID".to_vec();
        data.push(SNAPSHOT_VERSION);
        data.extend([0u8; 16]);

        let result = read_snapshot(&mut Cursor::new(data));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_version_mismatch() {
        let mut data = SNAPSHOT_MAGIC.to_vec();
        data.push(99);

        let result = read_snapshot(&mut Cursor::new(data));
        assert!(matches!(result, Err(Error::Serialization(msg)) if msg.contains("version")));
    }

    #[test]
    fn test_truncated_body() {
        let mut buffer = Vec::new();
        write_snapshot(&sample_grid(), &mut buffer).unwrap();
        buffer.truncate(buffer.len() / 2);

        assert!(matches!(
            read_snapshot(&mut Cursor::new(buffer)),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = BathymetryGrid::load(&temp_dir.path().join("absent.grid"));
        assert!(matches!(result, Err(Error::Read { .. })));
    }
}
