//! Prelude module for common filmspot types and traits
//!
//! `use filmspot::prelude::*;`

pub use crate::camera::{CameraController, CameraState, LifetimeToken, PanTo, ViewLifetime};

pub use crate::core::{
    config::{AppConfig, GeolocationConfig, MapConfig, PlacesConfig},
    geo::{LatLng, Point, TileCoord},
    viewport::Viewport,
};

pub use crate::events::{AppEvent, EventSender};

pub use crate::runtime::{AsyncSpawner, TaskHandle, TokioSpawner};

pub use crate::services::{
    locate, AddressResolver, DisabledGeolocation, DisabledPlaces, GeolocationError,
    GeolocationProvider, GooglePlaces, IpGeolocation, LocationBias, PlacesError, PlacesService,
    PositionOptions, QuerySequencer, Suggestion,
};

pub use crate::state::{Marker, MarkerId, MarkerStore, StoreError, StoreSnapshot};

#[cfg(feature = "egui")]
pub use crate::app::FilmSpotApp;

#[cfg(feature = "egui")]
pub use crate::ui::{format_relative, MapAction, MapView, SearchBox, SearchState};

pub use crate::{Error, Result};
