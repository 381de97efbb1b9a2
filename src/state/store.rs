//! Marker store
//!
//! Single-writer store for the markers the user drops on the map and the
//! marker whose popup is open. Every change produces a new immutable
//! [`StoreSnapshot`]; readers hold `Arc`s to snapshots and never observe a
//! partially applied update. Subscribers receive each committed snapshot
//! over a channel.

use crate::core::geo::LatLng;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a marker, unique within one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// A user-placed point of interest. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LatLng,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} is not in the marker list")]
    UnknownMarker(MarkerId),
}

/// Immutable view of the store at one version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// Bumped on every committed change
    pub version: u64,
    /// Markers in click order
    pub markers: Arc<Vec<Marker>>,
    pub selection: Option<MarkerId>,
}

impl StoreSnapshot {
    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == id)
    }

    /// The marker the selection points at, if any
    pub fn selected(&self) -> Option<&Marker> {
        self.selection.and_then(|id| self.marker(id))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

pub struct MarkerStore {
    current: Arc<StoreSnapshot>,
    next_id: u64,
    subscribers: Vec<Sender<Arc<StoreSnapshot>>>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self {
            current: Arc::new(StoreSnapshot::default()),
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Appends a marker stamped with the current wall-clock time
    pub fn add_marker(&mut self, position: LatLng) -> MarkerId {
        self.add_marker_at(position, Utc::now())
    }

    /// Appends a marker with an explicit creation time
    pub fn add_marker_at(&mut self, position: LatLng, created_at: DateTime<Utc>) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;

        let mut markers = (*self.current.markers).clone();
        markers.push(Marker {
            id,
            position,
            created_at,
        });

        log::info!("added {} at {}", id, position);
        self.commit(StoreSnapshot {
            version: self.current.version + 1,
            markers: Arc::new(markers),
            selection: self.current.selection,
        });
        id
    }

    /// Opens the popup of `id`. Ids not in the list are rejected so the
    /// selection can never dangle.
    pub fn select_marker(&mut self, id: MarkerId) -> Result<(), StoreError> {
        if self.current.marker(id).is_none() {
            return Err(StoreError::UnknownMarker(id));
        }
        if self.current.selection == Some(id) {
            return Ok(());
        }

        log::debug!("selected {}", id);
        self.commit(StoreSnapshot {
            version: self.current.version + 1,
            markers: Arc::clone(&self.current.markers),
            selection: Some(id),
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.current.selection.is_none() {
            return;
        }

        log::debug!("selection cleared");
        self.commit(StoreSnapshot {
            version: self.current.version + 1,
            markers: Arc::clone(&self.current.markers),
            selection: None,
        });
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.current.markers
    }

    pub fn selection(&self) -> Option<MarkerId> {
        self.current.selection
    }

    pub fn selected(&self) -> Option<&Marker> {
        self.current.selected()
    }

    /// Receives every snapshot committed after this call
    pub fn subscribe(&mut self) -> Receiver<Arc<StoreSnapshot>> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn commit(&mut self, snapshot: StoreSnapshot) {
        self.current = Arc::new(snapshot);
        let current = &self.current;
        self.subscribers
            .retain(|subscriber| subscriber.send(Arc::clone(current)).is_ok());
    }
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut store = MarkerStore::new();
        let a = store.add_marker(LatLng::new(1.0, 1.0));
        let b = store.add_marker(LatLng::new(1.0, 1.0));
        assert_eq!(a, MarkerId(1));
        assert_eq!(b, MarkerId(2));
        // Same spot twice is two markers
        assert_eq!(store.markers().len(), 2);
    }

    #[test]
    fn test_select_unknown_marker_is_rejected() {
        let mut store = MarkerStore::new();
        store.add_marker(LatLng::new(0.0, 0.0));

        let err = store.select_marker(MarkerId(42)).unwrap_err();
        assert_eq!(err, StoreError::UnknownMarker(MarkerId(42)));
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = MarkerStore::new();
        store.add_marker(LatLng::new(0.0, 0.0));
        let before = store.snapshot();

        store.add_marker(LatLng::new(1.0, 1.0));

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.snapshot().version, before.version + 1);
    }

    #[test]
    fn test_selection_change_shares_marker_list() {
        let mut store = MarkerStore::new();
        let id = store.add_marker(LatLng::new(0.0, 0.0));
        let before = store.snapshot();

        store.select_marker(id).unwrap();

        assert!(Arc::ptr_eq(&before.markers, &store.snapshot().markers));
    }

    #[test]
    fn test_no_op_changes_do_not_bump_version() {
        let mut store = MarkerStore::new();
        let id = store.add_marker(LatLng::new(0.0, 0.0));
        store.clear_selection();
        assert_eq!(store.snapshot().version, 1);

        store.select_marker(id).unwrap();
        store.select_marker(id).unwrap();
        assert_eq!(store.snapshot().version, 2);
    }

    #[test]
    fn test_subscribers_receive_commits_and_are_pruned() {
        let mut store = MarkerStore::new();
        let rx = store.subscribe();
        let dropped = store.subscribe();
        drop(dropped);

        let id = store.add_marker(LatLng::new(2.0, 3.0));
        store.select_marker(id).unwrap();

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first.selection, None);
        assert_eq!(second.selection, Some(id));
        assert_eq!(store.subscribers.len(), 1);
    }
}
