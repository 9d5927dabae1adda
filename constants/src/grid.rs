/// Extension (case-insensitive) of XYZ sounding files picked up by batch ingestion
pub const XYZ_EXTENSION: &str = "xyz";

/// Magic bytes at the start of a stored grid snapshot
pub const SNAPSHOT_MAGIC: &[u8; 7] = b"BATHGRD";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u8 = 1;

/// Colormap used when none is configured
pub const DEFAULT_COLORMAP: &str = "jet";

/// Decimal places of the depth column in exported XYZ files
pub const XYZ_DEPTH_PRECISION: usize = 2;
