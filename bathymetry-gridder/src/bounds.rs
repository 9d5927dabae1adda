/// Grid extent, cell pitch and cell indexing in the native coordinate system
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub step_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub step_y: f64,
}

impl GridBounds {
    /// Create validated bounds.
    /// Rejects empty or inverted extents and non-positive steps (NaN included).
    pub fn new(
        min_x: f64,
        max_x: f64,
        step_x: f64,
        min_y: f64,
        max_y: f64,
        step_y: f64,
    ) -> Result<Self> {
        let bounds = Self {
            min_x,
            max_x,
            step_x,
            min_y,
            max_y,
            step_y,
        };

        let valid = max_x > min_x && max_y > min_y && step_x > 0.0 && step_y > 0.0;
        let finite = [min_x, max_x, step_x, min_y, max_y, step_y]
            .iter()
            .all(|v| v.is_finite());

        if valid && finite {
            Ok(bounds)
        } else {
            Err(Error::InvalidBounds {
                min_x,
                max_x,
                step_x,
                min_y,
                max_y,
                step_y,
            })
        }
    }

    /// Number of columns, `ceil((max_x - min_x) / step_x)`
    pub fn ncols(&self) -> usize {
        (((self.max_x - self.min_x) / self.step_x).ceil() as usize).max(1)
    }

    /// Number of rows, `ceil((max_y - min_y) / step_y)`
    pub fn nrows(&self) -> usize {
        (((self.max_y - self.min_y) / self.step_y).ceil() as usize).max(1)
    }

    /// Unchecked cell index of a native-CRS position.
    /// May be negative or past the last column/row; callers decide what to do with that.
    pub fn cell_index(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.min_x) / self.step_x).floor() as i64;
        let row = ((y - self.min_y) / self.step_y).floor() as i64;
        (col, row)
    }

    /// Native-CRS coordinates of a cell's lower-left corner
    pub fn cell_origin(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.min_x + col as f64 * self.step_x,
            self.min_y + row as f64 * self.step_y,
        )
    }
}
