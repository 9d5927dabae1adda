/// Export manifest describing a finished grid and the files written from it
use crate::bounds::GridBounds;
use crate::error::{Error, Result};
use crate::grid::BathymetryGrid;
use crate::xyz::IngestStats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output files produced for one grid, relative names as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridOutputs {
    pub snapshot: Option<String>,
    pub image: Option<String>,
    pub xyz: Option<String>,
}

/// Sidecar JSON written next to grid exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridManifest {
    pub native_crs: String,
    pub bounds: GridBounds,
    pub ncols: usize,
    pub nrows: usize,
    pub populated_cells: usize,
    /// Smallest and largest cell mean.
    pub depth_range: Option<(f64, f64)>,
    /// Colour scale limits used for the image, if one was rendered.
    pub color_scale: Option<(f64, f64)>,
    pub colormap: Option<String>,
    pub outputs: GridOutputs,
    pub ingest: Option<IngestStats>,
}

impl GridManifest {
    /// Describe `grid` as it is now
    pub fn describe(grid: &BathymetryGrid) -> Self {
        Self {
            native_crs: grid.native_crs().to_string(),
            bounds: *grid.bounds(),
            ncols: grid.ncols(),
            nrows: grid.nrows(),
            populated_cells: grid.populated_cells(),
            depth_range: grid.depth_range(),
            color_scale: None,
            colormap: None,
            outputs: GridOutputs::default(),
            ingest: None,
        }
    }

    /// Sidecar path for `output`: the full file name with `.json` appended,
    /// so `survey.grid` gets `survey.grid.json`.
    /// Fails if that path names any of the `protected` files.
    pub fn sidecar_path(output: &Path, protected: &[&Path]) -> Result<PathBuf> {
        let mut name = output.as_os_str().to_owned();
        name.push(".json");
        let path = PathBuf::from(name);

        if let Some(clash) = protected.iter().find(|p| same_file(p, &path)) {
            return Err(Error::Config(format!(
                "manifest {} would overwrite {}",
                path.display(),
                clash.display()
            )));
        }
        Ok(path)
    }

    /// Write pretty-printed JSON to `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, json).map_err(|e| Error::write(path, e))?;

        println!("Generated manifest: {}", path.display());
        self.print_summary();
        Ok(())
    }

    /// Prints manifest summary for verification.
    pub fn print_summary(&self) {
        println!("Manifest Summary:");
        println!(
            "  Grid: {}x{} cells in {} ({} populated)",
            self.ncols, self.nrows, self.native_crs, self.populated_cells
        );
        println!(
            "  Bounds: ({:.2}, {:.2}) to ({:.2}, {:.2})",
            self.bounds.min_x, self.bounds.min_y, self.bounds.max_x, self.bounds.max_y
        );
        match self.depth_range {
            Some((lo, hi)) => println!("  Depth: {:.2} to {:.2}", lo, hi),
            None => println!("  Depth: no samples"),
        }
        if let Some(ingest) = &self.ingest {
            println!(
                "  Ingested: {} samples from {} files ({} lines skipped)",
                ingest.samples, ingest.files, ingest.skipped
            );
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::WEB_MERCATOR;
    use tempfile::TempDir;

    #[test]
    fn test_describe_and_write() {
        let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 4.0, 2.0, 0.0, 4.0, 2.0).unwrap();
        grid.add_sample(WEB_MERCATOR, 1.0, 1.0, 8.0).unwrap();
        grid.add_sample(WEB_MERCATOR, 3.0, 3.0, 2.0).unwrap();

        let mut manifest = GridManifest::describe(&grid);
        manifest.outputs.xyz = Some("survey.xyz".to_string());
        manifest.ingest = Some(IngestStats {
            files: 1,
            lines: 3,
            samples: 2,
            skipped: 1,
        });

        assert_eq!(manifest.populated_cells, 2);
        assert_eq!(manifest.depth_range, Some((2.0, 8.0)));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("survey.json");
        manifest.write(&path).unwrap();

        let parsed: GridManifest =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_sidecar_path_appends_json() {
        let config = Path::new("jobs/survey.json");
        assert_eq!(
            GridManifest::sidecar_path(Path::new("out/survey.grid"), &[config]).unwrap(),
            PathBuf::from("out/survey.grid.json")
        );
        assert_eq!(
            GridManifest::sidecar_path(Path::new("survey"), &[]).unwrap(),
            PathBuf::from("survey.json")
        );
    }

    #[test]
    fn test_sidecar_path_never_replaces_config() {
        assert!(matches!(
            GridManifest::sidecar_path(Path::new("survey"), &[Path::new("survey.json")]),
            Err(Error::Config(_))
        ));

        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("survey.json");
        fs::write(&config, "{}").unwrap();
        let output = temp_dir.path().join(".").join("survey");
        assert!(GridManifest::sidecar_path(&output, &[&config]).is_err());
        assert_eq!(fs::read_to_string(&config).unwrap(), "{}");
    }
}
