//! The map view
//!
//! Draws the basemap, one glyph per marker and the popup of the selected
//! marker. It owns no business state: markers and selection come in as
//! store snapshots, and user intent goes out as [`MapAction`]s for the
//! shell to apply. The only thing it owns is the viewport, created on the
//! first layout; from then on [`MapView::camera`] hands out controllers.

use crate::camera::{CameraController, CameraState, LifetimeToken, ViewLifetime};
use crate::core::config::MapConfig;
use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::state::store::{Marker, MarkerId, StoreSnapshot};
use crate::tiles::{visible_tiles, TileLayer};
use crate::ui::popup::MarkerPopup;
use crate::ui::style::{MapStyle, MarkerStyle};
use chrono::Utc;
use crossbeam_channel::Receiver;
use egui::{pos2, vec2, Align2, Color32, Pos2, Rect, RichText, Sense, Stroke, Ui};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Wheel points per zoom level
const SCROLL_PER_ZOOM: f64 = 120.0;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum MapAction {
    AddMarker(LatLng),
    SelectMarker(MarkerId),
    ClearSelection,
}

pub struct MapView {
    config: MapConfig,
    style: MapStyle,
    viewport: Option<Arc<RwLock<Viewport>>>,
    lifetime: ViewLifetime,
    snapshot: Arc<StoreSnapshot>,
    snapshots: Receiver<Arc<StoreSnapshot>>,
    tiles: Option<TileLayer>,
    popup_close: Option<Rect>,
}

impl MapView {
    pub fn new(
        config: MapConfig,
        initial: Arc<StoreSnapshot>,
        snapshots: Receiver<Arc<StoreSnapshot>>,
    ) -> Self {
        Self {
            config,
            style: MapStyle::default(),
            viewport: None,
            lifetime: ViewLifetime::new(),
            snapshot: initial,
            snapshots,
            tiles: None,
            popup_close: None,
        }
    }

    pub fn set_tiles(&mut self, tiles: TileLayer) {
        self.tiles = Some(tiles);
    }

    pub fn with_style(mut self, style: MapStyle) -> Self {
        self.style = style;
        self
    }

    /// Token cancelled when this view is dropped
    pub fn lifetime_token(&self) -> LifetimeToken {
        self.lifetime.token()
    }

    pub fn is_loaded(&self) -> bool {
        self.viewport.is_some()
    }

    /// Creates the viewport on first call; later calls only resize it
    pub fn load(&mut self, size: Point) {
        match &self.viewport {
            Some(viewport) => {
                if let Ok(mut viewport) = viewport.write() {
                    viewport.set_size(size);
                }
            }
            None => {
                let viewport = Viewport::with_limits(
                    self.config.initial_center,
                    self.config.initial_zoom,
                    size,
                    self.config.min_zoom,
                    self.config.max_zoom,
                );
                log::info!(
                    "map loaded at {} zoom {} ({}x{})",
                    viewport.center,
                    viewport.zoom,
                    size.x,
                    size.y
                );
                self.viewport = Some(Arc::new(RwLock::new(viewport)));
            }
        }
    }

    /// Camera controller, available once the map has loaded
    pub fn camera(&self) -> Option<CameraController> {
        self.viewport.as_ref().map(|viewport| {
            CameraController::new(Arc::clone(viewport), self.lifetime.token())
                .with_street_zoom(self.config.street_zoom)
        })
    }

    pub fn camera_state(&self) -> Option<CameraState> {
        self.viewport
            .as_ref()
            .and_then(|viewport| viewport.read().ok().map(|v| v.camera_state()))
    }

    /// Screen rect of the open popup's close button, as last drawn
    pub fn popup_close_rect(&self) -> Option<Rect> {
        self.popup_close
    }

    /// Latest snapshot received from the store
    pub fn snapshot(&self) -> &Arc<StoreSnapshot> {
        &self.snapshot
    }

    /// Takes the newest published snapshot. Returns whether it changed.
    pub fn sync_snapshot(&mut self) -> bool {
        let mut changed = false;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            self.snapshot = snapshot;
            changed = true;
        }
        changed
    }

    pub fn show(&mut self, ui: &mut Ui) -> Vec<MapAction> {
        self.sync_snapshot();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        if rect.width() < 1.0 || rect.height() < 1.0 {
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Loading map...",
                egui::FontId::proportional(16.0),
                ui.visuals().text_color(),
            );
            return Vec::new();
        }
        self.load(Point::new(rect.width() as f64, rect.height() as f64));

        let Some(shared) = self.viewport.clone() else {
            return Vec::new();
        };
        let viewport = match shared.write() {
            Ok(mut viewport) => {
                if response.dragged() {
                    let delta = response.drag_delta();
                    viewport.pan_by(Point::new(delta.x as f64, delta.y as f64));
                }
                if let Some(hover) = response.hover_pos() {
                    let scroll = ui.input(|i| i.raw_scroll_delta.y) as f64;
                    if scroll.abs() > 0.1 {
                        let zoom = viewport.zoom + scroll / SCROLL_PER_ZOOM;
                        viewport.zoom_around(zoom, to_local(rect, hover));
                    }
                }
                viewport.clone()
            }
            Err(_) => {
                log::error!("viewport lock poisoned");
                return Vec::new();
            }
        };

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.style.background_color);
        self.paint_tiles(ui.ctx(), &painter, rect, &viewport);

        let half_icon = self.style.markers.size / 2.0;
        let hovered = response
            .hover_pos()
            .and_then(|pos| marker_at(&self.snapshot.markers, &viewport, to_local(rect, pos), half_icon));

        for marker in self.snapshot.markers.iter() {
            let center = to_screen(rect, viewport.lat_lng_to_pixel(&marker.position));
            if !rect.expand(half_icon).contains(center) {
                continue;
            }
            let outline = if self.snapshot.selection == Some(marker.id) {
                self.style.markers.selected_outline
            } else if hovered == Some(marker.id) {
                self.style.markers.hover_outline
            } else {
                self.style.markers.outline
            };
            paint_marker(&painter, center, &self.style.markers, outline);
        }

        let mut actions = Vec::new();
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = to_local(rect, pos);
                actions.push(match marker_at(&self.snapshot.markers, &viewport, local, half_icon) {
                    Some(id) => MapAction::SelectMarker(id),
                    None => MapAction::AddMarker(viewport.pixel_to_lat_lng(&local)),
                });
            }
        }

        self.popup_close = None;
        if let Some(marker) = self.snapshot.selected() {
            let anchor = to_screen(rect, viewport.lat_lng_to_pixel(&marker.position))
                - vec2(0.0, half_icon + 4.0);
            let popup = MarkerPopup::for_marker(marker, Utc::now());
            let popup = popup.show(ui.ctx(), anchor, &self.style.popup);
            self.popup_close = Some(popup.close_button);
            if popup.closed {
                actions.push(MapAction::ClearSelection);
            }
            // Keep the relative age fresh while the popup is open
            ui.ctx().request_repaint_after(Duration::from_secs(1));
        }

        if self.config.show_zoom_controls {
            self.show_zoom_controls(ui.ctx(), rect, &shared);
        }
        self.show_attribution(ui.ctx(), rect);

        actions
    }

    fn paint_tiles(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect, viewport: &Viewport) {
        if let Some(tiles) = self.tiles.as_mut() {
            tiles.poll(ctx);
        }

        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        for placed in visible_tiles(viewport) {
            let tile_rect = Rect::from_min_size(
                to_screen(rect, placed.min),
                vec2(placed.size as f32, placed.size as f32),
            );
            let texture = self
                .tiles
                .as_mut()
                .and_then(|tiles| tiles.texture_or_request(placed.coord));
            match texture {
                Some(texture) => {
                    painter.image(texture, tile_rect, uv, Color32::WHITE);
                }
                None => {
                    painter.rect_stroke(tile_rect, 0.0, self.style.grid_stroke);
                }
            }
        }
    }

    fn show_zoom_controls(&self, ctx: &egui::Context, rect: Rect, shared: &Arc<RwLock<Viewport>>) {
        let style = &self.style.zoom_controls;
        let size = vec2(style.button_size, style.button_size);
        let mut zoom_delta = 0.0;

        egui::Area::new(egui::Id::new("map_zoom_controls"))
            .order(egui::Order::Foreground)
            .fixed_pos(rect.right_bottom() - vec2(style.margin, style.margin + 16.0))
            .pivot(Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing.y = 0.0;
                for (label, delta) in [("+", 1.0), ("−", -1.0)] {
                    let button = egui::Button::new(RichText::new(label).size(18.0).color(style.text_color))
                        .fill(style.background_color)
                        .stroke(style.border_stroke)
                        .rounding(style.rounding);
                    if ui.add_sized(size, button).clicked() {
                        zoom_delta = delta;
                    }
                }
            });

        if zoom_delta != 0.0 {
            if let Ok(mut viewport) = shared.write() {
                let zoom = (viewport.zoom + zoom_delta).round();
                viewport.set_zoom(zoom);
                log::debug!("zoom control -> {}", viewport.zoom);
            }
            ctx.request_repaint();
        }
    }

    fn show_attribution(&self, ctx: &egui::Context, rect: Rect) {
        let text = match &self.tiles {
            Some(tiles) => tiles.attribution().to_string(),
            None => self.config.attribution.clone(),
        };
        if text.is_empty() {
            return;
        }

        let style = &self.style.attribution;
        egui::Area::new(egui::Id::new("map_attribution"))
            .order(egui::Order::Foreground)
            .fixed_pos(rect.right_bottom())
            .pivot(Align2::RIGHT_BOTTOM)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(style.background_color)
                    .inner_margin(style.padding)
                    .show(ui, |ui| {
                        ui.label(RichText::new(text).font(style.font_id.clone()).color(style.text_color));
                    });
            });
    }
}

/// Topmost marker whose glyph contains `point` (container pixels)
pub fn marker_at(markers: &[Marker], viewport: &Viewport, point: Point, half_size: f32) -> Option<MarkerId> {
    let half = half_size as f64;
    markers
        .iter()
        .rev()
        .find(|marker| {
            let center = viewport.lat_lng_to_pixel(&marker.position);
            (center.x - point.x).abs() <= half && (center.y - point.y).abs() <= half
        })
        .map(|marker| marker.id)
}

fn to_local(rect: Rect, pos: Pos2) -> Point {
    Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64)
}

fn to_screen(rect: Rect, point: Point) -> Pos2 {
    pos2(rect.min.x + point.x as f32, rect.min.y + point.y as f32)
}

/// Clapperboard glyph centred on `center`
fn paint_marker(painter: &egui::Painter, center: Pos2, style: &MarkerStyle, outline: Stroke) {
    let s = style.size;
    let board = Rect::from_center_size(center + vec2(0.0, s * 0.12), vec2(s * 0.8, s * 0.52));
    let clapper = Rect::from_min_size(
        pos2(board.min.x, board.min.y - s * 0.24),
        vec2(board.width(), s * 0.2),
    );

    painter.rect_filled(board, 2.0, style.board_color);
    painter.rect_stroke(board, 2.0, outline);
    painter.rect_filled(clapper, 1.0, style.board_color);

    let stripe = Stroke::new(s * 0.06, style.stripe_color);
    let step = clapper.width() / 4.0;
    for i in 0..4 {
        let x = clapper.min.x + step * i as f32;
        painter.line_segment(
            [pos2(x + step * 0.3, clapper.max.y), pos2(x + step * 0.8, clapper.min.y)],
            stripe,
        );
    }
    painter.rect_stroke(clapper, 1.0, outline);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PanTo;
    use crate::state::store::MarkerStore;

    fn view() -> (MarkerStore, MapView) {
        let mut store = MarkerStore::new();
        let snapshots = store.subscribe();
        let view = MapView::new(MapConfig::default(), store.snapshot(), snapshots);
        (store, view)
    }

    #[test]
    fn test_no_camera_before_load() {
        let (_store, mut view) = view();
        assert!(view.camera().is_none());
        assert!(view.camera_state().is_none());

        view.load(Point::new(800.0, 600.0));

        let state = view.camera_state().unwrap();
        assert!(view.is_loaded());
        assert_eq!(state.zoom, 10.0);
        assert_eq!(state.center, LatLng::new(-34.61315, -58.37723));
    }

    #[test]
    fn test_load_honours_configured_zoom_range() {
        let mut store = MarkerStore::new();
        let config = MapConfig {
            min_zoom: 0.0,
            initial_zoom: 1.0,
            ..MapConfig::default()
        };
        let mut view = MapView::new(config, store.snapshot(), store.subscribe());

        view.load(Point::new(800.0, 600.0));

        assert_eq!(view.camera_state().unwrap().zoom, 1.0);
    }

    #[test]
    fn test_second_load_keeps_camera() {
        let (_store, mut view) = view();
        view.load(Point::new(800.0, 600.0));
        view.camera().unwrap().pan_to(LatLng::new(-31.4201, -64.1888));

        view.load(Point::new(1024.0, 768.0));

        let state = view.camera_state().unwrap();
        assert_eq!(state.center, LatLng::new(-31.4201, -64.1888));
        assert_eq!(state.zoom, 14.0);
    }

    #[test]
    fn test_controllers_die_with_the_view() {
        let (_store, mut view) = view();
        view.load(Point::new(800.0, 600.0));
        let camera = view.camera().unwrap();

        drop(view);

        assert!(!camera.is_live());
    }

    #[test]
    fn test_view_follows_store_snapshots() {
        let (mut store, mut view) = view();
        assert!(!view.sync_snapshot());

        let id = store.add_marker(LatLng::new(-34.6, -58.4));
        store.select_marker(id).unwrap();

        assert!(view.sync_snapshot());
        assert_eq!(view.snapshot().len(), 1);
        assert_eq!(view.snapshot().selection, Some(id));
    }

    #[test]
    fn test_marker_hit_testing_prefers_topmost() {
        let mut store = MarkerStore::new();
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 10.0, Point::new(400.0, 400.0));
        let below = store.add_marker(LatLng::new(0.0, 0.0));
        let above = store.add_marker(LatLng::new(0.0, 0.0));
        let far = store.add_marker(viewport.pixel_to_lat_lng(&Point::new(50.0, 50.0)));

        assert_ne!(below, above);
        assert_eq!(marker_at(store.markers(), &viewport, Point::new(205.0, 195.0), 15.0), Some(above));
        assert_eq!(marker_at(store.markers(), &viewport, Point::new(52.0, 48.0), 15.0), Some(far));
        assert_eq!(marker_at(store.markers(), &viewport, Point::new(120.0, 300.0), 15.0), None);
    }
}
