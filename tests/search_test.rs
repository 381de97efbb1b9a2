use async_trait::async_trait;
use filmspot::camera::{CameraController, PanTo};
use filmspot::constants::{INITIAL_CENTER, STREET_ZOOM};
use filmspot::core::geo::Point;
use filmspot::services::places::{
    AddressRecord, AddressResolver, AutocompleteRequest, LocationBias, PlacesError, PlacesService,
    Suggestion,
};
use filmspot::ui::search::{SearchBox, SearchState};
use filmspot::{LatLng, Viewport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Places backend answering each input after its own delay
#[derive(Default)]
struct ScriptedPlaces {
    delays: HashMap<String, u64>,
    addresses: HashMap<String, LatLng>,
    requests: Mutex<Vec<AutocompleteRequest>>,
}

impl ScriptedPlaces {
    fn with_delay(mut self, input: &str, millis: u64) -> Self {
        self.delays.insert(input.to_string(), millis);
        self
    }

    fn with_address(mut self, description: &str, location: LatLng) -> Self {
        self.addresses.insert(description.to_string(), location);
        self
    }
}

#[async_trait]
impl PlacesService for ScriptedPlaces {
    async fn autocomplete(&self, request: &AutocompleteRequest) -> Result<Vec<Suggestion>, PlacesError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = self.delays.get(&request.input).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![Suggestion {
            id: format!("id-{}", request.input),
            description: format!("{}, Buenos Aires", request.input),
        }])
    }

    async fn geocode(&self, address: &str) -> Result<Vec<AddressRecord>, PlacesError> {
        match self.addresses.get(address) {
            Some(location) => Ok(vec![AddressRecord {
                formatted_address: address.to_string(),
                location: *location,
            }]),
            None => Ok(Vec::new()),
        }
    }
}

fn bias() -> LocationBias {
    LocationBias {
        center: INITIAL_CENTER,
        radius_m: 200_000,
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[tokio::test]
    async fn test_slow_answer_to_old_query_is_never_shown() {
        init_logging();
        let places = ScriptedPlaces::default().with_delay("Pal", 80).with_delay("Palermo", 5);
        let resolver = Arc::new(AddressResolver::new(Arc::new(places), bias()));
        let mut search = SearchBox::new(resolver.sequencer().clone());

        let old = search.on_input("Pal").unwrap();
        let new = search.on_input("Palermo").unwrap();

        let old_task = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.suggest_latest(&old).await })
        };
        let new_task = {
            let resolver = Arc::clone(&resolver);
            let ticket = new.clone();
            tokio::spawn(async move { resolver.suggest_latest(&ticket).await })
        };

        let new_result = new_task.await.unwrap().expect("latest query is answered");
        assert!(search.apply_suggestions(new.seq, new_result));
        assert_eq!(search.suggestions()[0].description, "Palermo, Buenos Aires");

        assert!(old_task.await.unwrap().is_none());
        assert_eq!(search.suggestions().len(), 1);
        assert_eq!(search.suggestions()[0].id, "id-Palermo");
    }

    #[tokio::test]
    async fn test_stale_answer_is_rejected_by_the_search_box_too() {
        init_logging();
        let resolver = AddressResolver::new(Arc::new(ScriptedPlaces::default()), bias());
        let mut search = SearchBox::new(resolver.sequencer().clone());

        let old = search.on_input("Bel").unwrap();
        let old_result = resolver.suggest(&old.input).await;
        let new = search.on_input("Belgrano").unwrap();

        assert!(!search.apply_suggestions(old.seq, old_result));
        assert_eq!(search.state(), SearchState::Typing);

        let new_result = resolver.suggest_latest(&new).await.unwrap();
        assert!(search.apply_suggestions(new.seq, new_result));
        assert_eq!(search.state(), SearchState::SuggestionsShown);
    }

    #[tokio::test]
    async fn test_debounce_drops_superseded_queries_before_sending() {
        init_logging();
        let places = Arc::new(ScriptedPlaces::default());
        let resolver = Arc::new(
            AddressResolver::new(places.clone(), bias()).with_debounce(Duration::from_millis(30)),
        );

        let first = resolver.sequencer().issue("Re");
        let pending = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.suggest_latest(&first).await })
        };
        let second = resolver.sequencer().issue("Recoleta");

        assert!(resolver.suggest_latest(&second).await.is_some());
        assert!(pending.await.unwrap().is_none());

        let requests = places.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input, "Recoleta");
        assert_eq!(requests[0].bias, bias());
    }

    #[tokio::test]
    async fn test_selection_closes_list_and_pans_to_address() {
        init_logging();
        let obelisco = LatLng::new(-34.6037, -58.3816);
        let places = ScriptedPlaces::default().with_address("Obelisco, Buenos Aires", obelisco);
        let resolver = AddressResolver::new(Arc::new(places), bias());
        let mut search = SearchBox::new(resolver.sequencer().clone());
        let (_lifetime, camera) =
            CameraController::headless(Viewport::new(INITIAL_CENTER, 10.0, Point::new(800.0, 600.0)));

        let ticket = search.on_input("Obelisco").unwrap();
        let result = resolver.suggest_latest(&ticket).await.unwrap();
        search.apply_suggestions(ticket.seq, result);

        let suggestion = search.select(0).unwrap();
        assert!(search.suggestions().is_empty());
        assert_eq!(search.text(), "Obelisco, Buenos Aires");

        let located = resolver.resolve(&suggestion, &camera as &dyn PanTo).await.unwrap();
        search.finish_resolution();

        assert_eq!(located, obelisco);
        let state = camera.state().unwrap();
        assert_eq!(state.center, obelisco);
        assert_eq!(state.zoom, STREET_ZOOM);
        assert_eq!(search.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_unknown_address_leaves_camera_alone() {
        init_logging();
        let resolver = AddressResolver::new(Arc::new(ScriptedPlaces::default()), bias());
        let (_lifetime, camera) =
            CameraController::headless(Viewport::new(INITIAL_CENTER, 10.0, Point::new(800.0, 600.0)));
        let suggestion = Suggestion {
            id: "x".to_string(),
            description: "Nowhere".to_string(),
        };

        let result = resolver.resolve(&suggestion, &camera).await;

        assert!(matches!(result, Err(PlacesError::NoResults(_))));
        assert_eq!(camera.state().unwrap().center, INITIAL_CENTER);
        assert_eq!(camera.state().unwrap().zoom, 10.0);
    }
}
