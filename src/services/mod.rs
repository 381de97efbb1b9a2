//! Async adapters over the outside world: device location and the
//! places/geocoding service. Both report failures to the log only.

pub mod geolocation;
pub mod places;

pub use geolocation::{
    locate, DisabledGeolocation, GeolocationError, GeolocationProvider, IpGeolocation,
    PositionOptions,
};
pub use places::{
    AddressRecord, AddressResolver, AutocompleteRequest, DisabledPlaces, GooglePlaces,
    LocationBias, PlacesError, PlacesService, QuerySequencer, QueryTicket, Suggestion,
};
