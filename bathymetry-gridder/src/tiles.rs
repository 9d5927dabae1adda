//! Slippy-map tile bucketing of soundings.
//!
//! Instead of one dense raster, every sample is appended as a text line to the
//! file of the Web Mercator tile that contains it. Writers are opened lazily,
//! one per tile, and stay open until [`TileSink::close`].

use crate::error::{Error, Result};
use crate::xyz::{IngestStats, XyzRecord, ingest, ingest_with_progress};
use constants::{DEFAULT_ZOOM_LEVEL, MAX_ZOOM_LEVEL};
use indicatif::ProgressBar;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Address of one tile at a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    /// Tile holding a WGS84 position, clamped into the valid tile range.
    pub fn from_wgs84(lat: f64, lon: f64, zoom: u8) -> Self {
        let n = 2f64.powi(zoom as i32);
        let lat_rad = lat.to_radians();

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

        Self {
            zoom,
            x: clamp_tile(x, n),
            y: clamp_tile(y, n),
        }
    }

    /// `z<zoom>_<x>_<y>.xyz`
    pub fn file_name(&self) -> String {
        format!("z{}_{}_{}.xyz", self.zoom, self.x, self.y)
    }
}

fn clamp_tile(value: f64, n: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, n - 1.0) as u32
}

type SharedWriter = Arc<Mutex<BufWriter<File>>>;

struct WriterTable {
    writers: HashMap<String, SharedWriter>,
    closed: bool,
}

/// Directory of per-tile XYZ files fed one sample at a time
pub struct TileSink {
    root: PathBuf,
    zoom_level: u8,
    append: bool,
    table: Mutex<WriterTable>,
}

impl TileSink {
    /// Bind a sink to `root`, creating the directory if needed.
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| Error::write(root, e))?;

        Ok(Self {
            root: root.to_path_buf(),
            zoom_level: DEFAULT_ZOOM_LEVEL,
            append: false,
            table: Mutex::new(WriterTable {
                writers: HashMap::new(),
                closed: false,
            }),
        })
    }

    /// Use a different zoom level (capped at the highest supported one)
    pub fn with_zoom_level(mut self, zoom_level: u8) -> Self {
        self.zoom_level = zoom_level.min(MAX_ZOOM_LEVEL);
        self
    }

    /// Append to tile files that already exist instead of truncating them
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Append `"<lat>, <lon>, <z>[, <extra>...]"` to the owning tile's file.
    /// Returns the tile the sample went to.
    pub fn add_sample(
        &self,
        lat: f64,
        lon: f64,
        z: f64,
        extra: &[&dyn Display],
    ) -> Result<TileIndex> {
        let tile = TileIndex::from_wgs84(lat, lon, self.zoom_level);
        let writer = self.writer_for(&tile)?;

        let mut line = format!("{}, {}, {}", lat, lon, z);
        for field in extra {
            line.push_str(&format!(", {}", field));
        }

        let mut writer = writer.lock();
        writeln!(writer, "{}", line)
            .map_err(|e| Error::write(self.root.join(tile.file_name()), e))?;
        Ok(tile)
    }

    /// Writer of `tile`, opened on first use. The table lock makes the first
    /// caller for a tile the only one that opens its file.
    fn writer_for(&self, tile: &TileIndex) -> Result<SharedWriter> {
        let mut table = self.table.lock();
        if table.closed {
            return Err(Error::SinkClosed);
        }

        let name = tile.file_name();
        if let Some(writer) = table.writers.get(&name) {
            return Ok(Arc::clone(writer));
        }

        let path = self.root.join(&name);
        let file = if self.append {
            OpenOptions::new().create(true).append(true).open(&path)
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
        }
        .map_err(|e| Error::write(&path, e))?;

        debug!(tile = %name, append = self.append, "opened tile writer");
        let writer = Arc::new(Mutex::new(BufWriter::new(file)));
        table.writers.insert(name, Arc::clone(&writer));
        Ok(writer)
    }

    /// Stream `.xyz` files of `lat, lon, depth[, extra...]` lines into tiles.
    /// With `inverted` the files hold `lon, lat, depth`.
    /// Write failures and a closed sink abort the run.
    pub fn process(&self, path: &Path, separator: &str, inverted: bool) -> Result<IngestStats> {
        ingest(path, separator, inverted, |record| self.add_record(record))
    }

    /// [`TileSink::process`] reporting on a shared progress bar
    pub fn process_with_progress(
        &self,
        path: &Path,
        separator: &str,
        inverted: bool,
        pb: &ProgressBar,
    ) -> Result<IngestStats> {
        ingest_with_progress(path, separator, inverted, pb, |record| {
            self.add_record(record)
        })
    }

    fn add_record(&self, record: &XyzRecord) -> Result<()> {
        let extra: Vec<&dyn Display> = record.extra.iter().map(|f| f as &dyn Display).collect();
        self.add_sample(record.x, record.y, record.z, &extra).map(|_| ())
    }

    /// Flush and close every tile file. Calling it again is a no-op.
    /// All writers are attempted; the first failure is returned.
    pub fn close(&self) -> Result<()> {
        let writers: Vec<(String, SharedWriter)> = {
            let mut table = self.table.lock();
            table.closed = true;
            table.writers.drain().collect()
        };

        if writers.is_empty() {
            return Ok(());
        }

        let mut first_error = None;
        let count = writers.len();
        for (name, writer) in writers {
            if let Err(e) = writer.lock().flush() {
                warn!(tile = %name, "failed to flush tile: {}", e);
                first_error.get_or_insert(Error::write(self.root.join(&name), e));
            }
        }

        info!(root = %self.root.display(), tiles = count, "closed tile writers");
        first_error.map_or(Ok(()), Err)
    }

    /// Number of tiles with an open writer
    pub fn open_tiles(&self) -> usize {
        self.table.lock().writers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.table.lock().closed
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for TileSink {
    /// Best-effort close for sinks the owner forgot to close
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(root = %self.root.display(), "closing tiles on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for TileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileSink")
            .field("root", &self.root)
            .field("zoom_level", &self.zoom_level)
            .field("append", &self.append)
            .field("open_tiles", &self.open_tiles())
            .finish()
    }
}
