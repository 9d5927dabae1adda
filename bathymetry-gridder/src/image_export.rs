/// PNG rendering of a depth grid, one pixel per cell
use crate::colormap::ColorMapping;
use crate::error::{Error, Result};
use crate::grid::BathymetryGrid;
use image::{ImageError, Rgba, RgbaImage};
use std::path::Path;
use tracing::info;

/// Background of cells without samples
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const OPAQUE_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

impl BathymetryGrid {
    /// Render cell means through `colormap` after normalising `[min_z, max_z]` to `[0, 1]`.
    /// Pixel `(col, row)` shows cell `(col, row)`; empty cells keep the background.
    pub fn render_image(
        &self,
        colormap: &dyn ColorMapping,
        min_z: f64,
        max_z: f64,
        transparent: bool,
    ) -> RgbaImage {
        let background = if transparent { TRANSPARENT } else { OPAQUE_BLACK };
        let mut image =
            RgbaImage::from_pixel(self.ncols() as u32, self.nrows() as u32, background);

        let span = max_z - min_z;
        for (col, row, point) in self.populated() {
            let normalized = if span != 0.0 {
                (point.average - min_z) / span
            } else {
                0.0
            };
            let (r, g, b) = colormap.map(normalized);
            image.put_pixel(col as u32, row as u32, Rgba([r, g, b, 255]));
        }

        image
    }

    /// Render and save as PNG
    pub fn write_image(
        &self,
        colormap: &dyn ColorMapping,
        min_z: f64,
        max_z: f64,
        transparent: bool,
        path: &Path,
    ) -> Result<()> {
        let image = self.render_image(colormap, min_z, max_z, transparent);
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| match e {
                ImageError::IoError(source) => Error::write(path, source),
                other => Error::Image(other),
            })?;

        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "saved depth image"
        );
        Ok(())
    }
}
