use chrono::{Duration, TimeZone, Utc};
use filmspot::state::{MarkerId, MarkerStore, StoreError};
use filmspot::LatLng;

/// Store behaviour as seen by the map view: through snapshots and
/// subscriptions only
#[cfg(test)]
mod marker_store_tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn spot(i: u32) -> LatLng {
        LatLng::new(-34.6 + i as f64 * 0.01, -58.4 + i as f64 * 0.01)
    }

    #[test]
    fn test_adding_markers_never_touches_selection() {
        init_logging();
        let mut store = MarkerStore::new();
        let first = store.add_marker(spot(0));
        store.select_marker(first).unwrap();

        for i in 1..20 {
            store.add_marker(spot(i));
            assert_eq!(store.selection(), Some(first));
        }
        assert_eq!(store.markers().len(), 20);
    }

    #[test]
    fn test_selection_always_names_a_stored_marker() {
        init_logging();
        let mut store = MarkerStore::new();
        let ids: Vec<MarkerId> = (0..5).map(|i| store.add_marker(spot(i))).collect();

        for id in &ids {
            store.select_marker(*id).unwrap();
            let snapshot = store.snapshot();
            let selected = snapshot.selected().expect("selection resolves");
            assert_eq!(selected.id, *id);
        }

        let unknown = MarkerId(999);
        assert!(matches!(
            store.select_marker(unknown),
            Err(StoreError::UnknownMarker(id)) if id == unknown
        ));
        assert_eq!(store.selection(), Some(ids[4]));
    }

    #[test]
    fn test_markers_keep_insertion_order_and_distinct_ids() {
        init_logging();
        let mut store = MarkerStore::new();
        let a = store.add_marker(spot(1));
        let b = store.add_marker(spot(1));

        assert_ne!(a, b);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.markers[0].id, a);
        assert_eq!(snapshot.markers[1].id, b);
        assert_eq!(snapshot.markers[0].position, snapshot.markers[1].position);
    }

    #[test]
    fn test_old_snapshots_are_unchanged_by_later_edits() {
        init_logging();
        let mut store = MarkerStore::new();
        store.add_marker(spot(0));
        let before = store.snapshot();

        let id = store.add_marker(spot(1));
        store.select_marker(id).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.selection, None);
        assert!(store.snapshot().version > before.version);
    }

    #[test]
    fn test_subscribers_see_every_change_in_order() {
        init_logging();
        let mut store = MarkerStore::new();
        let updates = store.subscribe();

        let id = store.add_marker(spot(0));
        store.select_marker(id).unwrap();
        store.clear_selection();

        let received: Vec<_> = updates.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0].len(), 1);
        assert_eq!(received[1].selection, Some(id));
        assert_eq!(received[2].selection, None);
    }

    #[test]
    fn test_created_at_is_kept_verbatim() {
        init_logging();
        let mut store = MarkerStore::new();
        let placed = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();
        let id = store.add_marker_at(spot(0), placed);
        let later = store.add_marker_at(spot(1), placed + Duration::minutes(5));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.marker(id).unwrap().created_at, placed);
        assert_eq!(
            snapshot.marker(later).unwrap().created_at - placed,
            Duration::minutes(5)
        );
    }
}
