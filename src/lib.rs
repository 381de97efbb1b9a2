//! # filmspot
//!
//! A scouting map for film locations. Click the map to drop a marker,
//! click a marker to see how long ago it was placed, search an address or
//! jump to your own position.
//!
//! The crate is split the same way the app is:
//!
//! - [`state`]: the marker store, the single owner of markers and selection
//! - [`camera`]: the pan-to capability handed out by the map view
//! - [`services`]: geolocation and the places/geocoding service
//! - [`ui`], [`tiles`] and [`app`]: the egui front end (feature `egui`)

pub mod camera;
pub mod core;
pub mod events;
pub mod prelude;
pub mod runtime;
pub mod services;
pub mod state;

#[cfg(feature = "egui")]
pub mod app;
#[cfg(feature = "egui")]
pub mod tiles;
#[cfg(feature = "egui")]
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use camera::{CameraController, CameraState, PanTo};
pub use crate::core::{config::AppConfig, geo::LatLng, viewport::Viewport};
pub use state::{Marker, MarkerId, MarkerStore, StoreSnapshot};

#[cfg(feature = "egui")]
pub use app::FilmSpotApp;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] services::geolocation::GeolocationError),

    #[error("Places error: {0}")]
    Places(#[from] services::places::PlacesError),

    #[error("Store error: {0}")]
    Store(#[from] state::store::StoreError),
}
