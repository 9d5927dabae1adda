/// Coordinate translation between reference systems and the per-grid translator cache
use crate::error::{Error, Result};
use constants::crs::{WEB_MERCATOR_MAX_LATITUDE, WEB_MERCATOR_RADIUS};
use constants::{WEB_MERCATOR, WGS84};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps a position from one coordinate system into another.
pub trait CoordTranslator: Send + Sync {
    fn translate(&self, x: f64, y: f64) -> (f64, f64);
}

/// Resolves translators for a (source, target) CRS pair.
pub trait TranslatorFactory: Send + Sync {
    fn create(&self, from: &str, to: &str) -> Result<Arc<dyn CoordTranslator>>;
}

/// Pass-through for samples already in the target system
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CoordTranslator for Identity {
    fn translate(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}

/// WGS84 (lon, lat) degrees to spherical Web Mercator metres
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84ToWebMercator;

impl CoordTranslator for Wgs84ToWebMercator {
    fn translate(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-WEB_MERCATOR_MAX_LATITUDE, WEB_MERCATOR_MAX_LATITUDE);
        let x = WEB_MERCATOR_RADIUS * lon.to_radians();
        let y = WEB_MERCATOR_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }
}

/// Spherical Web Mercator metres back to WGS84 (lon, lat) degrees
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorToWgs84;

impl CoordTranslator for WebMercatorToWgs84 {
    fn translate(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
        let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
        (lon, lat)
    }
}

/// Built-in factory: identity plus the WGS84 / Web Mercator pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionFactory;

impl TranslatorFactory for ProjectionFactory {
    fn create(&self, from: &str, to: &str) -> Result<Arc<dyn CoordTranslator>> {
        let from_key = normalize_crs(from);
        let to_key = normalize_crs(to);

        if from_key == to_key {
            return Ok(Arc::new(Identity));
        }

        match (from_key.as_str(), to_key.as_str()) {
            (WGS84, WEB_MERCATOR) => Ok(Arc::new(Wgs84ToWebMercator)),
            (WEB_MERCATOR, WGS84) => Ok(Arc::new(WebMercatorToWgs84)),
            _ => Err(Error::UnsupportedCrs {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

/// CRS identifiers compare case-insensitively and ignore surrounding whitespace
pub fn normalize_crs(crs: &str) -> String {
    crs.trim().to_ascii_uppercase()
}

/// Lazily populated translators from any source CRS into one target CRS.
/// Never persisted; a reloaded grid starts with an empty cache.
pub struct TranslatorCache {
    target: String,
    factory: Arc<dyn TranslatorFactory>,
    translators: RwLock<HashMap<String, Arc<dyn CoordTranslator>>>,
}

impl TranslatorCache {
    pub fn new(target: &str, factory: Arc<dyn TranslatorFactory>) -> Self {
        Self {
            target: target.to_string(),
            factory,
            translators: RwLock::new(HashMap::new()),
        }
    }

    /// Translator from `source` into the target CRS, created on first use.
    pub fn resolve(&self, source: &str) -> Result<Arc<dyn CoordTranslator>> {
        let key = normalize_crs(source);

        if let Some(translator) = self.translators.read().get(&key) {
            return Ok(Arc::clone(translator));
        }

        let mut translators = self.translators.write();
        // Another producer may have won the race between the two locks.
        if let Some(translator) = translators.get(&key) {
            return Ok(Arc::clone(translator));
        }

        let translator = self.factory.create(source, &self.target)?;
        debug!(source = %key, target = %self.target, "cached coordinate translator");
        translators.insert(key, Arc::clone(&translator));
        Ok(translator)
    }

    /// Translate a position from `source` into the target CRS
    pub fn translate(&self, source: &str, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.resolve(source)?.translate(x, y))
    }

    /// Number of distinct source systems resolved so far
    pub fn len(&self) -> usize {
        self.translators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TranslatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorCache")
            .field("target", &self.target)
            .field("cached", &self.len())
            .finish()
    }
}
