//! Error types for bathymetry gridding

use std::path::PathBuf;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Gridding error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Grid bounds or cell pitch rejected at construction
    #[error(
        "Invalid grid bounds: x [{min_x}, {max_x}] step {step_x}, y [{min_y}, {max_y}] step {step_y}"
    )]
    InvalidBounds {
        min_x: f64,
        max_x: f64,
        step_x: f64,
        min_y: f64,
        max_y: f64,
        step_y: f64,
    },

    /// No translator between the two coordinate systems
    #[error("No coordinate translator from {from} to {to}")]
    UnsupportedCrs { from: String, to: String },

    /// Cell index outside the allocated raster
    #[error("Cell ({col}, {row}) is outside the grid")]
    CellOutOfRange { col: i64, row: i64 },

    /// Reading a file failed
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a file failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot encoding, decoding or format mismatch
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// PNG encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sample offered to a tile sink that was already closed
    #[error("Tile sink is closed")]
    SinkClosed,
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
