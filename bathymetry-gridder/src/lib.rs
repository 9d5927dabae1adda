//! Gridding of scattered bathymetry soundings.
//!
//! Two independent consumers of a `(x, y, z)` sounding stream:
//!
//! - [`BathymetryGrid`] averages samples into a fixed raster in its native
//!   CRS, and can be stored, reloaded and exported as PNG or XYZ text.
//! - [`TileSink`] appends samples to per-tile text files addressed by
//!   slippy-map tile coordinates.

pub mod bounds;
pub mod colormap;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod grid;
pub mod image_export;
pub mod manifest;
pub mod persistence;
pub mod progress;
pub mod tiles;
pub mod xyz;

pub use bounds::GridBounds;
pub use colormap::{ColorMapping, Colormap};
pub use config::GridConfig;
pub use coordinates::{CoordTranslator, ProjectionFactory, TranslatorCache, TranslatorFactory};
pub use error::{Error, Result};
pub use grid::{BathymetryGrid, DataPoint};
pub use manifest::{GridManifest, GridOutputs};
pub use tiles::{TileIndex, TileSink};
pub use xyz::{IngestStats, XyzRecord};
