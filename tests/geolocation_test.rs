use async_trait::async_trait;
use filmspot::camera::{CameraController, PanTo};
use filmspot::constants::{INITIAL_CENTER, STREET_ZOOM};
use filmspot::core::geo::Point;
use filmspot::services::geolocation::{
    locate, DisabledGeolocation, GeolocationError, GeolocationProvider, PositionOptions,
};
use filmspot::{LatLng, Viewport};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Logger that keeps every record so tests can assert on failures
struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

fn logger() -> &'static CapturingLogger {
    static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).expect("no other logger installed");
        log::set_max_level(log::LevelFilter::Debug);
        logger
    })
}

/// Provider that never answers
struct SilentProvider;

#[async_trait]
impl GeolocationProvider for SilentProvider {
    async fn current_position(&self, _options: &PositionOptions) -> Result<LatLng, GeolocationError> {
        futures::future::pending().await
    }
}

/// Provider with a fixed answer
struct FixedProvider(Result<LatLng, GeolocationError>);

#[async_trait]
impl GeolocationProvider for FixedProvider {
    async fn current_position(&self, _options: &PositionOptions) -> Result<LatLng, GeolocationError> {
        self.0.clone()
    }
}

/// Records pans instead of moving a camera
#[derive(Default)]
struct RecordingTarget {
    pans: Mutex<Vec<LatLng>>,
}

impl PanTo for RecordingTarget {
    fn pan_to(&self, target: LatLng) {
        self.pans.lock().unwrap().push(target);
    }
}

fn options(timeout_ms: u64) -> PositionOptions {
    PositionOptions {
        timeout: Duration::from_millis(timeout_ms),
        ..PositionOptions::default()
    }
}

#[cfg(test)]
mod geolocation_tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_is_logged_and_changes_nothing() {
        let logger = logger();
        let target = RecordingTarget::default();

        let result = locate(&SilentProvider, &options(50), &target).await;

        assert_eq!(result, Err(GeolocationError::Timeout));
        assert!(target.pans.lock().unwrap().is_empty());

        let records = logger.records.lock().unwrap();
        assert!(records.iter().any(|(level, message)| {
            *level == log::Level::Warn && message.contains("timed out waiting for a position")
        }));
    }

    #[tokio::test]
    async fn test_success_pans_to_street_zoom() {
        let here = LatLng::new(-31.4201, -64.1888);
        let (_lifetime, camera) =
            CameraController::headless(Viewport::new(INITIAL_CENTER, 10.0, Point::new(800.0, 600.0)));

        let result = locate(&FixedProvider(Ok(here)), &PositionOptions::default(), &camera).await;

        assert_eq!(result, Ok(here));
        let state = camera.state().unwrap();
        assert_eq!(state.center, here);
        assert_eq!(state.zoom, STREET_ZOOM);
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_camera_alone() {
        let (_lifetime, camera) =
            CameraController::headless(Viewport::new(INITIAL_CENTER, 10.0, Point::new(800.0, 600.0)));

        let result = locate(
            &FixedProvider(Err(GeolocationError::PermissionDenied)),
            &PositionOptions::default(),
            &camera,
        )
        .await;

        assert_eq!(result, Err(GeolocationError::PermissionDenied));
        let state = camera.state().unwrap();
        assert_eq!(state.center, INITIAL_CENTER);
        assert_eq!(state.zoom, 10.0);
    }

    #[tokio::test]
    async fn test_out_of_range_fix_is_unavailable() {
        let target = RecordingTarget::default();

        let result = locate(
            &FixedProvider(Ok(LatLng::new(123.0, 0.0))),
            &PositionOptions::default(),
            &target,
        )
        .await;

        assert!(matches!(result, Err(GeolocationError::PositionUnavailable(_))));
        assert!(target.pans.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_provider_is_unsupported() {
        let target = RecordingTarget::default();
        let result = locate(&DisabledGeolocation, &PositionOptions::default(), &target).await;
        assert_eq!(result, Err(GeolocationError::Unsupported));
    }
}
