/// Coordinate reference system identifiers understood by the built-in translators

/// Geographic WGS84, axes (longitude, latitude) in degrees
pub const WGS84: &str = "EPSG:4326";

/// Spherical Web Mercator, axes (easting, northing) in metres
pub const WEB_MERCATOR: &str = "EPSG:3857";

/// Sphere radius used by Web Mercator (metres)
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is clamped (degrees)
pub const WEB_MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;
