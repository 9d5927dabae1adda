/// Regular raster of running-average depths fed by scattered soundings
use crate::bounds::GridBounds;
use crate::coordinates::{ProjectionFactory, TranslatorCache, TranslatorFactory};
use crate::error::{Error, Result};
use constants::WGS84;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Sample count and running mean of one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub count: u32,
    pub average: f64,
}

impl DataPoint {
    /// Fold one depth into the running mean.
    /// Returns the previous mean minus `z`, or 0 for the first sample.
    pub fn accumulate(&mut self, z: f64) -> f64 {
        let delta = if self.count > 0 { self.average - z } else { 0.0 };
        let n = self.count as f64;
        self.average = (self.average * n + z) / (n + 1.0);
        self.count += 1;
        delta
    }
}

/// Depth grid over a fixed rectangle of its native CRS.
/// Rows are locked independently so producers on different threads can add
/// samples concurrently without losing updates.
pub struct BathymetryGrid {
    native_crs: String,
    bounds: GridBounds,
    ncols: usize,
    nrows: usize,
    rows: Vec<Mutex<Vec<Option<DataPoint>>>>,
    translators: TranslatorCache,
}

impl BathymetryGrid {
    /// Create an empty grid using the built-in projections.
    pub fn new(
        native_crs: &str,
        min_x: f64,
        max_x: f64,
        step_x: f64,
        min_y: f64,
        max_y: f64,
        step_y: f64,
    ) -> Result<Self> {
        let bounds = GridBounds::new(min_x, max_x, step_x, min_y, max_y, step_y)?;
        Ok(Self::with_bounds(native_crs, bounds))
    }

    /// Create an empty grid over already validated bounds
    pub fn with_bounds(native_crs: &str, bounds: GridBounds) -> Self {
        let ncols = bounds.ncols();
        let nrows = bounds.nrows();
        let rows = (0..nrows).map(|_| Mutex::new(vec![None; ncols])).collect();

        Self {
            native_crs: native_crs.to_string(),
            bounds,
            ncols,
            nrows,
            rows,
            translators: TranslatorCache::new(native_crs, Arc::new(ProjectionFactory)),
        }
    }

    /// Rebuild a grid from stored cells (row-major), with an empty translator cache.
    pub(crate) fn from_cells(
        native_crs: &str,
        bounds: GridBounds,
        cells: Vec<Option<DataPoint>>,
    ) -> Result<Self> {
        let ncols = bounds.ncols();
        let nrows = bounds.nrows();
        if cells.len() != ncols * nrows {
            return Err(Error::Serialization(format!(
                "expected {} cells for a {}x{} grid, found {}",
                ncols * nrows,
                ncols,
                nrows,
                cells.len()
            )));
        }

        let rows = cells
            .chunks(ncols)
            .map(|row| Mutex::new(row.to_vec()))
            .collect();

        Ok(Self {
            native_crs: native_crs.to_string(),
            bounds,
            ncols,
            nrows,
            rows,
            translators: TranslatorCache::new(native_crs, Arc::new(ProjectionFactory)),
        })
    }

    /// Swap the translator source; drops any cached translators.
    /// Snapshots do not record the factory, so a loaded grid needs it re-attached.
    pub fn with_translator_factory(mut self, factory: Arc<dyn TranslatorFactory>) -> Self {
        self.translators = TranslatorCache::new(&self.native_crs, factory);
        self
    }

    /// Add one sounding given in `source_crs`.
    ///
    /// Returns the difference between the cell's previous mean and `z` (0 for
    /// a fresh cell). Samples landing past the last column or row by more than
    /// one cell are dropped and yield 0. Negative indices and indices exactly
    /// one past the end are not caught by that check and fail with
    /// [`Error::CellOutOfRange`].
    pub fn add_sample(&self, source_crs: &str, x: f64, y: f64, z: f64) -> Result<f64> {
        let (nx, ny) = self.translators.translate(source_crs, x, y)?;
        let (col, row) = self.bounds.cell_index(nx, ny);

        let Some((col, row)) = self.locate(col, row)? else {
            debug!(x, y, z, col, row, "sample outside grid, ignored");
            return Ok(0.0);
        };

        let mut cells = self.rows[row].lock();
        let cell = cells[col].get_or_insert(DataPoint {
            count: 0,
            average: 0.0,
        });
        Ok(cell.accumulate(z))
    }

    /// Mean depth of the cell holding `(x, y)` given in `crs`.
    /// Empty cells, positions off the grid and translation failures read as 0.
    pub fn bathymetry_at(&self, crs: &str, x: f64, y: f64) -> f64 {
        let lookup = || -> Result<f64> {
            let (nx, ny) = self.translators.translate(crs, x, y)?;
            let (col, row) = self.bounds.cell_index(nx, ny);
            let Some((col, row)) = self.locate(col, row)? else {
                return Ok(0.0);
            };
            Ok(self.rows[row].lock()[col].map_or(0.0, |cell| cell.average))
        };

        lookup().unwrap_or_else(|e| {
            debug!(crs, x, y, "bathymetry lookup failed: {}", e);
            0.0
        })
    }

    /// Mean depth at a WGS84 position
    pub fn bathymetry_at_wgs84(&self, lat: f64, lon: f64) -> f64 {
        self.bathymetry_at(WGS84, lon, lat)
    }

    /// Classify a raw cell index: `Ok(None)` is a soft rejection, `Err` a fault.
    fn locate(&self, col: i64, row: i64) -> Result<Option<(usize, usize)>> {
        if col > self.ncols as i64 || row > self.nrows as i64 {
            return Ok(None);
        }
        if col < 0 || row < 0 || col == self.ncols as i64 || row == self.nrows as i64 {
            return Err(Error::CellOutOfRange { col, row });
        }
        Ok(Some((col as usize, row as usize)))
    }

    /// Contents of one cell, `None` if it was never touched or is off the grid
    pub fn cell(&self, col: usize, row: usize) -> Option<DataPoint> {
        if col >= self.ncols {
            return None;
        }
        self.rows.get(row).and_then(|cells| cells.lock()[col])
    }

    /// Populated cells as `(col, row, point)`, row by row
    pub fn populated(&self) -> Vec<(usize, usize, DataPoint)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .lock()
                    .iter()
                    .enumerate()
                    .filter_map(|(col, cell)| cell.map(|point| (col, row, point)))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Every cell in row-major order
    pub(crate) fn cells_row_major(&self) -> Vec<Option<DataPoint>> {
        let mut cells = Vec::with_capacity(self.ncols * self.nrows);
        for row in &self.rows {
            cells.extend_from_slice(&row.lock());
        }
        cells
    }

    /// Number of cells holding at least one sample
    pub fn populated_cells(&self) -> usize {
        self.rows
            .par_iter()
            .map(|cells| cells.lock().iter().filter(|cell| cell.is_some()).count())
            .sum()
    }

    /// Smallest and largest cell mean, `None` for an empty grid
    pub fn depth_range(&self) -> Option<(f64, f64)> {
        self.rows
            .par_iter()
            .filter_map(|cells| {
                cells.lock().iter().flatten().fold(None, |range, point| {
                    let (lo, hi) = range.unwrap_or((point.average, point.average));
                    Some((lo.min(point.average), hi.max(point.average)))
                })
            })
            .reduce_with(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    }

    pub fn native_crs(&self) -> &str {
        &self.native_crs
    }

    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn translator_cache(&self) -> &TranslatorCache {
        &self.translators
    }
}

impl std::fmt::Debug for BathymetryGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BathymetryGrid")
            .field("native_crs", &self.native_crs)
            .field("bounds", &self.bounds)
            .field("ncols", &self.ncols)
            .field("nrows", &self.nrows)
            .field("translators", &self.translators)
            .finish()
    }
}
