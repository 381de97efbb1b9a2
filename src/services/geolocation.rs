//! One-shot geolocation
//!
//! [`locate`] asks a [`GeolocationProvider`] for the current position,
//! bounded by the request timeout, and pans the camera on success. Failures
//! are logged and returned to the caller; nothing is shown to the user.

use crate::camera::PanTo;
use crate::core::config::GeolocationConfig;
use crate::core::geo::LatLng;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Options for a single position request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned; zero forces a fresh one
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(crate::core::constants::LOCATE_TIMEOUT_MS),
            maximum_age: Duration::ZERO,
        }
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            enable_high_accuracy: config.high_accuracy,
            timeout: config.timeout(),
            maximum_age: config.maximum_age(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("permission to read the location was denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out waiting for a position")]
    Timeout,

    #[error("geolocation is not available in this environment")]
    Unsupported,
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<LatLng, GeolocationError>;
}

/// Requests the current position and pans `target` to it.
///
/// The provider is raced against `options.timeout`, so a provider that
/// never answers still resolves as [`GeolocationError::Timeout`].
pub async fn locate(
    provider: &dyn GeolocationProvider,
    options: &PositionOptions,
    target: &dyn PanTo,
) -> Result<LatLng, GeolocationError> {
    log::debug!(
        "requesting position (high accuracy: {}, timeout: {:?}, max age: {:?})",
        options.enable_high_accuracy,
        options.timeout,
        options.maximum_age
    );

    let outcome = match tokio::time::timeout(options.timeout, provider.current_position(options)).await
    {
        Ok(Ok(position)) if !position.is_valid() => Err(GeolocationError::PositionUnavailable(
            format!("provider returned out-of-range position {}", position),
        )),
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    };

    match outcome {
        Ok(position) => {
            log::info!("located at {}", position);
            target.pan_to(position);
            Ok(position)
        }
        Err(err) => {
            log::warn!("geolocation failed: {}", err);
            Err(err)
        }
    }
}

/// Provider for environments without any location capability
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGeolocation;

#[async_trait]
impl GeolocationProvider for DisabledGeolocation {
    async fn current_position(&self, _options: &PositionOptions) -> Result<LatLng, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Network lookup of the approximate position of this machine's public IP.
///
/// The lookup is city-level whatever `enable_high_accuracy` says. The last
/// fix is kept and reused only while younger than `maximum_age`.
pub struct IpGeolocation {
    client: reqwest::Client,
    endpoint: String,
    last_fix: Mutex<Option<(LatLng, Instant)>>,
}

impl IpGeolocation {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> crate::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            last_fix: Mutex::new(None),
        })
    }

    fn cached(&self, maximum_age: Duration) -> Option<LatLng> {
        if maximum_age.is_zero() {
            return None;
        }
        let guard = self.last_fix.lock().ok()?;
        (*guard)
            .filter(|(_, taken_at)| taken_at.elapsed() <= maximum_age)
            .map(|(position, _)| position)
    }

    fn remember(&self, position: LatLng) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((position, Instant::now()));
        }
    }
}

/// Extracts a position from an IP lookup response body
pub(crate) fn parse_ip_location(body: &str) -> Result<LatLng, GeolocationError> {
    let response: IpLocationResponse = serde_json::from_str(body)
        .map_err(|e| GeolocationError::PositionUnavailable(format!("malformed response: {}", e)))?;

    if response.error {
        return Err(GeolocationError::PositionUnavailable(
            response.reason.unwrap_or_else(|| "lookup refused".to_string()),
        ));
    }

    match (response.latitude, response.longitude) {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(GeolocationError::PositionUnavailable(
            "response has no coordinates".to_string(),
        )),
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn current_position(&self, options: &PositionOptions) -> Result<LatLng, GeolocationError> {
        if let Some(position) = self.cached(options.maximum_age) {
            log::debug!("reusing cached fix {}", position);
            return Ok(position);
        }

        let response = self
            .client
            .get(&self.endpoint)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeolocationError::Timeout
                } else {
                    GeolocationError::PositionUnavailable(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeolocationError::PermissionDenied)
            }
            status if !status.is_success() => {
                return Err(GeolocationError::PositionUnavailable(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeolocationError::PositionUnavailable(e.to_string()))?;
        let position = parse_ip_location(&body)?;
        self.remember(position);
        Ok(position)
    }
}
