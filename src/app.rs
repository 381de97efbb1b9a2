//! The application shell
//!
//! Composes the map view, the search box and the locate button over one
//! marker store. Background requests report back through the event
//! channel, drained at the start of every frame.

use crate::camera::PanTo;
use crate::core::config::AppConfig;
use crate::events::{self, AppEvent, EventSender};
use crate::runtime::{AsyncSpawner, TaskHandle};
use crate::services::geolocation::{
    self, DisabledGeolocation, GeolocationProvider, IpGeolocation, PositionOptions,
};
use crate::services::places::{
    AddressResolver, DisabledPlaces, GooglePlaces, LocationBias, PlacesService, QueryTicket,
    Suggestion,
};
use crate::state::store::MarkerStore;
use crate::tiles::{TileLayer, TileLoader, UrlTemplateSource};
use crate::ui::map_view::{MapAction, MapView};
use crate::ui::search::{SearchAction, SearchBox};
use crossbeam_channel::Receiver;
use egui::{pos2, vec2, Align2, RichText};
use std::sync::Arc;

pub const APP_TITLE: &str = "Film Here 🎬";

pub struct FilmSpotApp {
    config: AppConfig,
    store: MarkerStore,
    map_view: MapView,
    search: SearchBox,
    resolver: Arc<AddressResolver>,
    geolocation: Arc<dyn GeolocationProvider>,
    position_options: PositionOptions,
    spawner: Option<Arc<dyn AsyncSpawner>>,
    resolve_task: Option<TaskHandle>,
    events: EventSender,
    event_rx: Receiver<AppEvent>,
    locating: bool,
    load_error: Option<String>,
}

impl FilmSpotApp {
    /// Builds the services described by `config`. Without a places API key
    /// the search box is disabled; without a runtime no requests are made.
    pub fn new(
        config: AppConfig,
        spawner: Option<Arc<dyn AsyncSpawner>>,
        repaint: Option<egui::Context>,
    ) -> Self {
        let user_agent = config.map.user_agent.clone();

        let geolocation: Arc<dyn GeolocationProvider> = if config.geolocation.enabled {
            match IpGeolocation::new(config.geolocation.endpoint.clone(), &user_agent) {
                Ok(provider) => Arc::new(provider),
                Err(err) => {
                    log::warn!("geolocation disabled: {}", err);
                    Arc::new(DisabledGeolocation)
                }
            }
        } else {
            Arc::new(DisabledGeolocation)
        };

        let places: Option<Arc<dyn PlacesService>> = match &config.places.api_key {
            Some(key) => match GooglePlaces::new(key.clone(), config.places.base_url.clone(), &user_agent) {
                Ok(service) => Some(Arc::new(service)),
                Err(err) => {
                    log::warn!("address search disabled: {}", err);
                    None
                }
            },
            None => {
                log::warn!("no places API key configured, address search disabled");
                None
            }
        };
        let search_enabled = places.is_some();
        let places = places.unwrap_or_else(|| Arc::new(DisabledPlaces));

        let mut app = Self::with_services(config, geolocation, places, spawner, repaint.clone());
        app.search = SearchBox::new(app.resolver.sequencer().clone()).with_enabled(search_enabled);

        if app.load_error.is_none() {
            if let Some(spawner) = app.spawner.clone() {
                app.attach_tiles(spawner, repaint);
            }
        }
        app
    }

    /// Shell over the given services, without a basemap
    pub fn with_services(
        config: AppConfig,
        geolocation: Arc<dyn GeolocationProvider>,
        places: Arc<dyn PlacesService>,
        spawner: Option<Arc<dyn AsyncSpawner>>,
        repaint: Option<egui::Context>,
    ) -> Self {
        let load_error = match config.validate() {
            Ok(()) => None,
            Err(err) => {
                log::error!("cannot load map: {}", err);
                Some(err.to_string())
            }
        };
        if spawner.is_none() {
            log::warn!("no async runtime available, locate and search are disabled");
        }

        let mut store = MarkerStore::new();
        let map_view = MapView::new(config.map.clone(), store.snapshot(), store.subscribe());

        let (mut events, event_rx) = events::channel(map_view.lifetime_token());
        if let Some(ctx) = repaint {
            events = events.with_waker(move || ctx.request_repaint());
        }

        let bias = LocationBias {
            center: config.bias_center(),
            radius_m: config.places.bias_radius_m,
        };
        let resolver = Arc::new(AddressResolver::new(places, bias).with_debounce(config.places.debounce()));
        let search = SearchBox::new(resolver.sequencer().clone());
        let position_options = PositionOptions::from(&config.geolocation);

        Self {
            config,
            store,
            map_view,
            search,
            resolver,
            geolocation,
            position_options,
            spawner,
            resolve_task: None,
            events,
            event_rx,
            locating: false,
            load_error,
        }
    }

    fn attach_tiles(&mut self, spawner: Arc<dyn AsyncSpawner>, repaint: Option<egui::Context>) {
        let map = &self.config.map;
        let source = Arc::new(UrlTemplateSource::new(map.tile_url.clone(), map.attribution.clone()));
        match TileLoader::new(source, &map.user_agent, spawner) {
            Ok((loader, responses)) => {
                let loader = match repaint {
                    Some(ctx) => loader.with_repaint(ctx),
                    None => loader,
                };
                let tiles = TileLayer::new(loader, responses, map.tile_cache_size);
                self.map_view.set_tiles(tiles);
            }
            Err(err) => log::warn!("basemap unavailable: {}", err),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn map_view(&self) -> &MapView {
        &self.map_view
    }

    pub fn map_view_mut(&mut self) -> &mut MapView {
        &mut self.map_view
    }

    pub fn search(&self) -> &SearchBox {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchBox {
        &mut self.search
    }

    pub fn is_locating(&self) -> bool {
        self.locating
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn apply_map_action(&mut self, action: MapAction) {
        match action {
            MapAction::AddMarker(position) => {
                self.store.add_marker(position);
            }
            MapAction::SelectMarker(id) => {
                if let Err(err) = self.store.select_marker(id) {
                    log::warn!("{}", err);
                }
            }
            MapAction::ClearSelection => self.store.clear_selection(),
        }
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::PanTo(target) => match self.map_view.camera() {
                Some(camera) => camera.pan_to(target),
                None => log::debug!("map not loaded yet, dropping pan to {}", target),
            },
            AppEvent::LocateFinished => self.locating = false,
            AppEvent::Suggestions { seq, result } => {
                self.search.apply_suggestions(seq, result);
            }
            AppEvent::ResolveFinished => self.search.finish_resolution(),
        }
    }

    /// Applies every event that has arrived so far. Returns how many.
    pub fn drain_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_event(event);
            count += 1;
        }
        count
    }

    /// Starts a one-shot locate request. Ignored while one is already in
    /// flight or before the map has loaded.
    pub fn locate(&mut self) -> bool {
        if self.locating {
            log::debug!("locate already in progress");
            return false;
        }
        if !self.map_view.is_loaded() {
            log::debug!("locate requested before the map loaded");
            return false;
        }
        let Some(spawner) = &self.spawner else {
            return false;
        };

        self.locating = true;
        let provider = Arc::clone(&self.geolocation);
        let options = self.position_options;
        let events = self.events.clone();
        spawner.spawn(async move {
            // Failures are logged by `locate` and otherwise ignored
            geolocation::locate(provider.as_ref(), &options, &events).await.ok();
            events.send(AppEvent::LocateFinished);
        });
        true
    }

    pub fn start_query(&self, ticket: QueryTicket) {
        let Some(spawner) = &self.spawner else {
            return;
        };
        let resolver = Arc::clone(&self.resolver);
        let events = self.events.clone();
        spawner.spawn(async move {
            if let Some(result) = resolver.suggest_latest(&ticket).await {
                events.send(AppEvent::Suggestions {
                    seq: ticket.seq,
                    result,
                });
            }
        });
    }

    /// Geocodes `suggestion` and pans to it. A resolution still running for
    /// an earlier selection is cancelled, so only the newest one pans.
    pub fn start_resolve(&mut self, suggestion: Suggestion) {
        let Some(spawner) = &self.spawner else {
            return;
        };
        if let Some(previous) = self.resolve_task.take() {
            if !previous.is_finished() {
                log::debug!("cancelling superseded address resolution");
                previous.cancel();
            }
        }

        let resolver = Arc::clone(&self.resolver);
        let events = self.events.clone();
        self.resolve_task = Some(spawner.spawn(async move {
            resolver.resolve(&suggestion, &events).await.ok();
            events.send(AppEvent::ResolveFinished);
        }));
    }

    fn show_overlays(&mut self, ctx: &egui::Context) {
        let mut search_action = None;
        let search = &mut self.search;
        egui::Area::new(egui::Id::new("filmspot_search"))
            .order(egui::Order::Foreground)
            .fixed_pos(pos2(12.0, 12.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(APP_TITLE).heading().strong());
                    ui.add_space(4.0);
                    search_action = search.show(ui);
                });
            });
        match search_action {
            Some(SearchAction::Query(ticket)) => self.start_query(ticket),
            Some(SearchAction::Resolve(suggestion)) => self.start_resolve(suggestion),
            None => {}
        }

        let mut locate_clicked = false;
        let locating = self.locating;
        egui::Area::new(egui::Id::new("filmspot_locate"))
            .order(egui::Order::Foreground)
            .anchor(Align2::RIGHT_TOP, vec2(-12.0, 12.0))
            .show(ctx, |ui| {
                let button = egui::Button::new(RichText::new("📍").size(20.0)).min_size(vec2(36.0, 36.0));
                locate_clicked = ui
                    .add_enabled(!locating, button)
                    .on_hover_text("Go to my location")
                    .clicked();
            });
        if locate_clicked {
            self.locate();
        }

        if let Some(camera) = self.map_view.camera_state() {
            let markers = self.store.markers().len();
            egui::Area::new(egui::Id::new("filmspot_status"))
                .order(egui::Order::Foreground)
                .anchor(Align2::LEFT_BOTTOM, vec2(8.0, -8.0))
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.small(format!(
                            "{} · zoom {:.1} · {} marker{}",
                            camera.center,
                            camera.zoom,
                            markers,
                            if markers == 1 { "" } else { "s" }
                        ));
                    });
                });
        }
    }
}

impl eframe::App for FilmSpotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        if self.load_error.is_some() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Error loading map.").size(18.0));
                });
            });
            return;
        }

        let actions = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.map_view.show(ui))
            .inner;
        for action in actions {
            self.apply_map_action(action);
        }

        self.show_overlays(ctx);
    }
}
