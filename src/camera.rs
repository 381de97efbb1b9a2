//! Camera controller
//!
//! The map view creates the viewport on its first layout and hands out a
//! [`CameraController`] from then on. Other components only ever see the
//! [`PanTo`] capability; the viewport itself stays private to the view.

use crate::core::constants::STREET_ZOOM;
use crate::core::geo::LatLng;
use crate::core::viewport::Viewport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

pub use crate::core::viewport::CameraState;

/// Capability to recenter the map on a coordinate
pub trait PanTo: Send + Sync {
    fn pan_to(&self, target: LatLng);
}

/// Owned by the map view; cancels every token it handed out when dropped
#[derive(Debug)]
pub struct ViewLifetime {
    cancelled: Arc<AtomicBool>,
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> LifetimeToken {
        LifetimeToken {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Default for ViewLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewLifetime {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cheap handle checked by late async results before they touch the view
#[derive(Debug, Clone)]
pub struct LifetimeToken {
    cancelled: Arc<AtomicBool>,
}

impl LifetimeToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct CameraController {
    viewport: Arc<RwLock<Viewport>>,
    street_zoom: f64,
    token: LifetimeToken,
}

impl CameraController {
    pub(crate) fn new(viewport: Arc<RwLock<Viewport>>, token: LifetimeToken) -> Self {
        Self {
            viewport,
            street_zoom: STREET_ZOOM,
            token,
        }
    }

    /// A controller over a viewport of its own, for running without a window.
    /// Dropping the returned lifetime turns the controller into a no-op.
    pub fn headless(viewport: Viewport) -> (ViewLifetime, Self) {
        let lifetime = ViewLifetime::new();
        let controller = Self::new(Arc::new(RwLock::new(viewport)), lifetime.token());
        (lifetime, controller)
    }

    pub fn with_street_zoom(mut self, zoom: f64) -> Self {
        self.street_zoom = zoom;
        self
    }

    /// Current center and zoom, or `None` once the view is gone
    pub fn state(&self) -> Option<CameraState> {
        if self.token.is_cancelled() {
            return None;
        }
        self.viewport.read().ok().map(|viewport| viewport.camera_state())
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl PanTo for CameraController {
    /// Recenters on `target` at street zoom, whatever the zoom was before
    fn pan_to(&self, target: LatLng) {
        if self.token.is_cancelled() {
            log::debug!("dropping pan to {}: map view is gone", target);
            return;
        }

        match self.viewport.write() {
            Ok(mut viewport) => {
                viewport.set_view(target, self.street_zoom);
                log::info!("camera panned to {} at zoom {}", target, viewport.zoom);
            }
            Err(_) => log::error!("viewport lock poisoned, pan to {} skipped", target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    fn controller() -> (ViewLifetime, Arc<RwLock<Viewport>>, CameraController) {
        let lifetime = ViewLifetime::new();
        let viewport = Arc::new(RwLock::new(Viewport::new(
            LatLng::new(0.0, 0.0),
            3.0,
            Point::new(640.0, 480.0),
        )));
        let camera = CameraController::new(Arc::clone(&viewport), lifetime.token());
        (lifetime, viewport, camera)
    }

    #[test]
    fn test_pan_sets_center_and_street_zoom() {
        let (_lifetime, viewport, camera) = controller();
        camera.pan_to(LatLng::new(48.8566, 2.3522));

        let viewport = viewport.read().unwrap();
        assert_eq!(viewport.center, LatLng::new(48.8566, 2.3522));
        assert_eq!(viewport.zoom, STREET_ZOOM);
    }

    #[test]
    fn test_pan_after_view_dropped_is_ignored() {
        let (lifetime, viewport, camera) = controller();
        drop(lifetime);

        camera.pan_to(LatLng::new(10.0, 10.0));

        assert!(!camera.is_live());
        assert!(camera.state().is_none());
        assert_eq!(viewport.read().unwrap().center, LatLng::new(0.0, 0.0));
    }

    #[test]
    fn test_custom_street_zoom() {
        let (_lifetime, _viewport, camera) = controller();
        let camera = camera.with_street_zoom(16.0);
        camera.pan_to(LatLng::new(1.0, 1.0));
        assert_eq!(camera.state().unwrap().zoom, 16.0);
    }
}
