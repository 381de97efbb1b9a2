//! egui widgets: the map view, its popup and the address search box

pub mod map_view;
pub mod popup;
pub mod search;
pub mod style;

pub use map_view::{marker_at, MapAction, MapView};
pub use popup::{format_relative, MarkerPopup, PopupResponse, PopupStyle};
pub use search::{SearchAction, SearchBox, SearchState};
pub use style::{AttributionStyle, MapStyle, MarkerStyle, ZoomControlStyle};
