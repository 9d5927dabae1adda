/// Slippy-map zoom level used for tile bucketing unless overridden
pub const DEFAULT_ZOOM_LEVEL: u8 = 16;

/// Highest zoom level whose tile count still fits a u32 index
pub const MAX_ZOOM_LEVEL: u8 = 31;
