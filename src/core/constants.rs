//! Fixed parameters of the map view and the backend contract

/// Meters per degree of latitude (north-south direction)
pub const LAT_DEG_TO_METERS: f64 = 111317.0;

/// Default map center used when no viewport has been saved
pub const DEFAULT_CENTER_LAT: f64 = 59.87;
pub const DEFAULT_CENTER_LON: f64 = 23.25;
pub const DEFAULT_ZOOM: u8 = 12;

/// Wire schema version, part of every API path
pub const API_VERSION: u32 = 1;

/// Name of the cookie holding the last viewport
pub const VIEWPORT_COOKIE: &str = "map_pos";
pub const VIEWPORT_COOKIE_PATH: &str = "/";
pub const VIEWPORT_COOKIE_DAYS: u32 = 365;

/// Color of trip track markers
pub const TRIP_MARKER_COLOR: &str = "#ff0000";

pub const BOUNDS_UNAVAILABLE_MESSAGE: &str = "Map bounds are not available. Cannot show any data. \
Please change the zoom level or reload the map";
