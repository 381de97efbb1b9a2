//! Map-wide constants. Defaults for `AppConfig` are taken from here so
//! the numbers live in one place.

use crate::core::geo::LatLng;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Where the map opens: downtown Buenos Aires.
pub const INITIAL_CENTER: LatLng = LatLng {
    lat: -34.61315,
    lng: -58.37723,
};

/// Zoom the map opens at.
pub const INITIAL_ZOOM: f64 = 10.0;

/// Street-level zoom applied by every programmatic pan.
pub const STREET_ZOOM: f64 = 14.0;

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Marker glyph size in pixels (square).
pub const MARKER_ICON_SIZE: f32 = 30.0;

/// Autocomplete bias radius around the bias center.
pub const SEARCH_BIAS_RADIUS_M: u32 = 200_000;

/// Delay before an autocomplete request is issued for the current input.
pub const SEARCH_DEBOUNCE_MS: u64 = 200;

/// One-shot geolocation timeout.
pub const LOCATE_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

pub const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap contributors";

pub const DEFAULT_USER_AGENT: &str = concat!("filmspot/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

pub const DEFAULT_GEOLOCATION_ENDPOINT: &str = "https://ipapi.co/json/";
