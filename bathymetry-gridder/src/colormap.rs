/// Colour gradients for depth rasters
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Anything that turns a normalised value into a colour
pub trait ColorMapping: Send + Sync {
    /// Map a value in [0.0, 1.0] to RGB; out-of-range values are clamped
    fn map(&self, value: f64) -> (u8, u8, u8);
}

/// Built-in colormaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Jet,       // Blue -> Cyan -> Green -> Yellow -> Red
    Viridis,   // Purple -> Blue -> Green -> Yellow
    Turbo,     // Blue -> Cyan -> Green -> Yellow -> Orange -> Red
    Grayscale, // Black -> White
}

impl ColorMapping for Colormap {
    fn map(&self, value: f64) -> (u8, u8, u8) {
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

        match self {
            Colormap::Jet => jet_colormap(v),
            Colormap::Viridis => interpolate(&VIRIDIS, v),
            Colormap::Turbo => interpolate(&TURBO, v),
            Colormap::Grayscale => {
                let g = (v * 255.0).round() as u8;
                (g, g, g)
            }
        }
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jet" => Ok(Colormap::Jet),
            "viridis" => Ok(Colormap::Viridis),
            "turbo" => Ok(Colormap::Turbo),
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(Colormap::Grayscale),
            other => Err(Error::Config(format!("unknown colormap '{}'", other))),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::Jet => "jet",
            Colormap::Viridis => "viridis",
            Colormap::Turbo => "turbo",
            Colormap::Grayscale => "grayscale",
        };
        f.write_str(name)
    }
}

/// Simplified 5-point viridis control points
const VIRIDIS: [(f64, f64, f64); 5] = [
    (0.267004, 0.004874, 0.329415),
    (0.282623, 0.140926, 0.457517),
    (0.163625, 0.471133, 0.558148),
    (0.477504, 0.821444, 0.318195),
    (0.993248, 0.906157, 0.143936),
];

/// Simplified 6-point turbo approximation
const TURBO: [(f64, f64, f64); 6] = [
    (0.18995, 0.07176, 0.23217),
    (0.11770, 0.56700, 0.75088),
    (0.17205, 0.88797, 0.54362),
    (0.89567, 0.99343, 0.29685),
    (0.97809, 0.55414, 0.10540),
    (0.78801, 0.08080, 0.06051),
];

fn jet_colormap(v: f64) -> (u8, u8, u8) {
    let r = if v < 0.375 {
        0.0
    } else if v < 0.625 {
        (v - 0.375) / 0.25
    } else if v < 0.875 {
        1.0
    } else {
        1.0 - (v - 0.875) / 0.125 * 0.5
    };

    let g = if v < 0.125 {
        0.0
    } else if v < 0.375 {
        (v - 0.125) / 0.25
    } else if v < 0.625 {
        1.0
    } else if v < 0.875 {
        1.0 - (v - 0.625) / 0.25
    } else {
        0.0
    };

    let b = if v < 0.125 {
        0.5 + v / 0.125 * 0.5
    } else if v < 0.375 {
        1.0
    } else if v < 0.625 {
        1.0 - (v - 0.375) / 0.25
    } else {
        0.0
    };

    to_rgb(r, g, b)
}

/// Piecewise-linear blend between evenly spaced control points
fn interpolate(points: &[(f64, f64, f64)], v: f64) -> (u8, u8, u8) {
    let last = points.len() - 1;
    let idx = v * last as f64;
    let i = idx.floor() as usize;

    if i >= last {
        let (r, g, b) = points[last];
        return to_rgb(r, g, b);
    }

    let t = idx - i as f64;
    let (r0, g0, b0) = points[i];
    let (r1, g1, b1) = points[i + 1];

    to_rgb(r0 + t * (r1 - r0), g0 + t * (g1 - g0), b0 + t * (b1 - b0))
}

fn to_rgb(r: f64, g: f64, b: f64) -> (u8, u8, u8) {
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("JET".parse::<Colormap>().unwrap(), Colormap::Jet);
        assert_eq!(" viridis ".parse::<Colormap>().unwrap(), Colormap::Viridis);
        assert_eq!("grey".parse::<Colormap>().unwrap(), Colormap::Grayscale);
        assert!("rainbow".parse::<Colormap>().is_err());
        assert_eq!(Colormap::Turbo.to_string().parse::<Colormap>().unwrap(), Colormap::Turbo);
    }

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(Colormap::Jet.map(0.0), (0, 0, 127));
        assert_eq!(Colormap::Jet.map(0.5), (127, 255, 127));
        assert_eq!(Colormap::Jet.map(1.0), (127, 0, 0));
    }

    #[test]
    fn test_values_are_clamped() {
        for map in [Colormap::Jet, Colormap::Viridis, Colormap::Turbo, Colormap::Grayscale] {
            assert_eq!(map.map(-3.0), map.map(0.0));
            assert_eq!(map.map(7.0), map.map(1.0));
            assert_eq!(map.map(f64::NAN), map.map(0.0));
        }
        assert_eq!(Colormap::Grayscale.map(1.0), (255, 255, 255));
    }
}
