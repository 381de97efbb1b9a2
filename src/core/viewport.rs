use crate::core::constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Center and zoom of the map, as observed from outside the view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LatLng,
    pub zoom: f64,
}

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::with_limits(center, zoom, size, MIN_ZOOM, MAX_ZOOM)
    }

    /// Like [`Viewport::new`], but `zoom` is clamped to `min_zoom..=max_zoom`
    /// only, not to the default range
    pub fn with_limits(center: LatLng, zoom: f64, size: Point, min_zoom: f64, max_zoom: f64) -> Self {
        let mut viewport = Self {
            center,
            zoom: zoom.clamp(min_zoom, max_zoom),
            size,
            min_zoom,
            max_zoom,
        };
        viewport.set_center(center);
        viewport
    }

    /// Sets the center, clamping latitude to the projectable range and
    /// wrapping longitude
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), LatLng::wrap_lng(center.lng));
    }

    /// Sets the zoom level, clamping to the configured range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.set_center(center);
        self.set_zoom(zoom);
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn camera_state(&self) -> CameraState {
        CameraState {
            center: self.center,
            zoom: self.zoom,
        }
    }

    /// World size in pixels at the given zoom
    pub fn world_size(zoom: f64) -> f64 {
        TILE_SIZE as f64 * 2_f64.powf(zoom)
    }

    /// Projects a LatLng to world pixel coordinates (Web Mercator, EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = Self::world_size(zoom.unwrap_or(self.zoom));
        let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();

        let x = (lat_lng.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;

        Point::new(x, y)
    }

    /// Inverse of [`Viewport::project`]
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = Self::world_size(zoom.unwrap_or(self.zoom));

        let lng = pixel.x / scale * 360.0 - 180.0;
        let n = PI - 2.0 * PI * pixel.y / scale;
        let lat = n.sinh().atan().to_degrees();

        LatLng::new(lat, lng)
    }

    /// Converts a coordinate to container pixels (origin at the top-left corner)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let world = self.project(lat_lng, None);
        let center = self.project(&self.center, None);
        let mut offset = world.subtract(&center);

        // Take the shortest way round the antimeridian
        let half_world = Self::world_size(self.zoom) / 2.0;
        if offset.x > half_world {
            offset.x -= 2.0 * half_world;
        } else if offset.x < -half_world {
            offset.x += 2.0 * half_world;
        }

        offset.add(&self.size.multiply(0.5))
    }

    /// Converts container pixels back to a coordinate
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let center = self.project(&self.center, None);
        let world = center.add(&pixel.subtract(&self.size.multiply(0.5)));
        let lat_lng = self.unproject(&world, None);
        LatLng::new(lat_lng.lat, LatLng::wrap_lng(lat_lng.lng))
    }

    /// Moves the map so that content follows a pointer dragged by `delta` pixels
    pub fn pan_by(&mut self, delta: Point) {
        let center = self.project(&self.center, None);
        let new_center = self.unproject(&center.subtract(&delta), None);
        self.set_center(new_center);
    }

    /// Changes zoom while keeping the coordinate under `anchor` fixed on screen
    pub fn zoom_around(&mut self, zoom: f64, anchor: Point) {
        let anchored = self.pixel_to_lat_lng(&anchor);
        self.set_zoom(zoom);

        let anchored_world = self.project(&anchored, None);
        let from_center = anchor.subtract(&self.size.multiply(0.5));
        let new_center = self.unproject(&anchored_world.subtract(&from_center), None);
        self.set_center(new_center);
    }
}
