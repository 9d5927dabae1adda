/// Grid job configuration loaded from JSON
use crate::bounds::GridBounds;
use crate::colormap::Colormap;
use crate::error::{Error, Result};
use crate::grid::BathymetryGrid;
use constants::{DEFAULT_COLORMAP, WEB_MERCATOR, WGS84};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// CRS the grid bounds are expressed in.
    #[serde(default = "default_native_crs")]
    pub native_crs: String,
    pub min_x: f64,
    pub max_x: f64,
    pub step_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub step_y: f64,
    /// CRS of the soundings in the input files.
    #[serde(default = "default_source_crs")]
    pub source_crs: String,
    /// Input lines hold `y x z` instead of `x y z`.
    #[serde(default)]
    pub inverted: bool,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_colormap")]
    pub colormap: String,
    /// Colour scale limits; the observed depth range fills in what is missing.
    #[serde(default)]
    pub min_z: Option<f64>,
    #[serde(default)]
    pub max_z: Option<f64>,
    #[serde(default = "default_transparent")]
    pub transparent: bool,
}

fn default_native_crs() -> String {
    WEB_MERCATOR.to_string()
}

fn default_source_crs() -> String {
    WGS84.to_string()
}

fn default_separator() -> String {
    " ".to_string()
}

fn default_colormap() -> String {
    DEFAULT_COLORMAP.to_string()
}

fn default_transparent() -> bool {
    true
}

impl GridConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        let config: GridConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check bounds, colormap and separator without building anything
    pub fn validate(&self) -> Result<()> {
        self.bounds()?;
        self.colormap()?;
        if self.separator.is_empty() {
            return Err(Error::Config("separator must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<GridBounds> {
        GridBounds::new(
            self.min_x,
            self.max_x,
            self.step_x,
            self.min_y,
            self.max_y,
            self.step_y,
        )
    }

    pub fn colormap(&self) -> Result<Colormap> {
        self.colormap.parse()
    }

    /// Empty grid described by this configuration
    pub fn build_grid(&self) -> Result<BathymetryGrid> {
        Ok(BathymetryGrid::with_bounds(&self.native_crs, self.bounds()?))
    }
}
