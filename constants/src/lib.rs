/// Shared configuration for bathymetry gridding
pub mod crs;
pub mod grid;
pub mod tiles;

pub use crs::{WEB_MERCATOR, WGS84};
pub use grid::{DEFAULT_COLORMAP, SNAPSHOT_MAGIC, SNAPSHOT_VERSION, XYZ_EXTENSION};
pub use tiles::{DEFAULT_ZOOM_LEVEL, MAX_ZOOM_LEVEL};
