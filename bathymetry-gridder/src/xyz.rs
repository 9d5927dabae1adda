/// XYZ sounding files: parsing, discovery, batch ingestion and export
use crate::error::{Error, Result};
use crate::grid::BathymetryGrid;
use crate::progress::progress_bar;
use indicatif::ProgressBar;
use constants::XYZ_EXTENSION;
use constants::grid::XYZ_DEPTH_PRECISION;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One parsed line: three coordinates plus any trailing fields
#[derive(Debug, Clone, PartialEq)]
pub struct XyzRecord<'a> {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub extra: Vec<&'a str>,
}

/// Why a line was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error("expected at least 3 fields, found {0}")]
    TooFewFields(usize),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

/// Counters from a batch ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub files: usize,
    pub lines: usize,
    pub samples: usize,
    pub skipped: usize,
}

impl AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.lines += other.lines;
        self.samples += other.samples;
        self.skipped += other.skipped;
    }
}

/// Split a line on `separator` and read the first three fields as numbers.
/// With `inverted` the first two fields are swapped.
pub fn parse_line<'a>(
    line: &'a str,
    separator: &str,
    inverted: bool,
) -> std::result::Result<XyzRecord<'a>, LineError> {
    let separator = if separator.trim().is_empty() {
        separator
    } else {
        separator.trim()
    };
    let fields: Vec<&str> = line
        .trim()
        .split(separator)
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();

    if fields.len() < 3 {
        return Err(LineError::TooFewFields(fields.len()));
    }

    let number = |field: &str| {
        field
            .parse::<f64>()
            .map_err(|_| LineError::InvalidNumber(field.to_string()))
    };
    let (a, b, z) = (number(fields[0])?, number(fields[1])?, number(fields[2])?);
    let (x, y) = if inverted { (b, a) } else { (a, b) };

    Ok(XyzRecord {
        x,
        y,
        z,
        extra: fields[3..].to_vec(),
    })
}

/// Whether the file name ends in `.xyz`, ignoring case
pub fn is_xyz_file(path: &Path) -> bool {
    let suffix = format!(".{}", XYZ_EXTENSION);
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(&suffix))
        .unwrap_or(false)
}

/// All XYZ files at or below `path`, sorted by path
pub fn discover_xyz_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_xyz_files(path, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_xyz_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| Error::read(path, e))?;

    if metadata.is_dir() {
        for entry in fs::read_dir(path).map_err(|e| Error::read(path, e))? {
            let entry = entry.map_err(|e| Error::read(path, e))?;
            collect_xyz_files(&entry.path(), files)?;
        }
    } else if is_xyz_file(path) {
        files.push(path.to_path_buf());
    }

    Ok(())
}

/// Stream every record of every XYZ file under `path` into `sink`,
/// reporting on a progress bar of its own.
///
/// Lines that fail to parse are logged and counted as skipped, as are samples
/// the grid faults on with [`Error::CellOutOfRange`]. Any other error from
/// `sink` aborts ingestion. Blank lines are ignored.
pub fn ingest<F>(path: &Path, separator: &str, inverted: bool, sink: F) -> Result<IngestStats>
where
    F: FnMut(&XyzRecord) -> Result<()>,
{
    let pb = progress_bar(0, "files", "Ingesting soundings");
    let stats = ingest_with_progress(path, separator, inverted, &pb, sink)?;
    pb.finish_with_message("Soundings ingested");
    Ok(stats)
}

/// Like [`ingest`], but counts files on a caller-owned bar so parallel
/// ingestion runs can share one. The bar grows by the number of files found
/// and is left unfinished.
pub fn ingest_with_progress<F>(
    path: &Path,
    separator: &str,
    inverted: bool,
    pb: &ProgressBar,
    mut sink: F,
) -> Result<IngestStats>
where
    F: FnMut(&XyzRecord) -> Result<()>,
{
    let files = discover_xyz_files(path)?;
    let mut stats = IngestStats::default();

    pb.inc_length(files.len() as u64);
    for file in &files {
        stats += ingest_file(file, separator, inverted, &mut sink)?;
        pb.inc(1);
    }

    info!(
        path = %path.display(),
        files = stats.files,
        samples = stats.samples,
        skipped = stats.skipped,
        "ingestion finished"
    );
    Ok(stats)
}

fn ingest_file<F>(path: &Path, separator: &str, inverted: bool, sink: &mut F) -> Result<IngestStats>
where
    F: FnMut(&XyzRecord) -> Result<()>,
{
    let file = File::open(path).map_err(|e| Error::read(path, e))?;
    let mut reader = BufReader::new(file);
    let mut stats = IngestStats {
        files: 1,
        ..Default::default()
    };

    let mut line = String::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        line_no += 1;
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!(file = %path.display(), line = line_no, "skipping undecodable line");
                stats.lines += 1;
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(Error::read(path, e)),
        }

        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let record = match parse_line(&line, separator, inverted) {
            Ok(record) => record,
            Err(reason) => {
                warn!(file = %path.display(), line = line_no, "skipping line: {}", reason);
                stats.skipped += 1;
                continue;
            }
        };

        match sink(&record) {
            Ok(()) => stats.samples += 1,
            Err(e @ Error::CellOutOfRange { .. }) => {
                warn!(file = %path.display(), line = line_no, "skipping sample: {}", e);
                stats.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(stats)
}

impl BathymetryGrid {
    /// Ingest every `.xyz` file at or below `path`, samples given in `source_crs`.
    ///
    /// Fails up front if `source_crs` cannot be translated; afterwards only
    /// I/O failures abort, bad lines and edge faults are skipped.
    pub fn process(
        &self,
        path: &Path,
        source_crs: &str,
        inverted: bool,
        separator: &str,
    ) -> Result<IngestStats> {
        let pb = progress_bar(0, "files", "Ingesting soundings");
        let stats = self.process_with_progress(path, source_crs, inverted, separator, &pb)?;
        pb.finish_with_message("Soundings ingested");
        Ok(stats)
    }

    /// [`BathymetryGrid::process`] reporting on a shared progress bar
    pub fn process_with_progress(
        &self,
        path: &Path,
        source_crs: &str,
        inverted: bool,
        separator: &str,
        pb: &ProgressBar,
    ) -> Result<IngestStats> {
        self.translator_cache().resolve(source_crs)?;

        ingest_with_progress(path, separator, inverted, pb, |record| {
            self.add_sample(source_crs, record.x, record.y, record.z)
                .map(|_| ())
        })
    }

    /// Write `"<x> <y> <mean>"` for every populated cell, row by row.
    /// Coordinates are the cell's lower-left corner. Returns the line count.
    pub fn write_xyz(&self, path: &Path) -> Result<usize> {
        let file = File::create(path).map_err(|e| Error::write(path, e))?;
        let mut writer = BufWriter::new(file);

        let mut lines = 0;
        for (col, row, point) in self.populated() {
            let (x, y) = self.bounds().cell_origin(col, row);
            writeln!(
                writer,
                "{} {} {:.prec$}",
                x,
                y,
                point.average,
                prec = XYZ_DEPTH_PRECISION
            )
            .map_err(|e| Error::write(path, e))?;
            lines += 1;
        }
        writer.flush().map_err(|e| Error::write(path, e))?;

        info!(path = %path.display(), lines, "saved xyz export");
        Ok(lines)
    }
}
