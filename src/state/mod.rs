//! Application state owned by the UI thread

pub mod store;

pub use store::{Marker, MarkerId, MarkerStore, StoreError, StoreSnapshot};
