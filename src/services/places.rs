//! Address search
//!
//! Autocomplete suggestions are produced per keystroke. Every query is
//! tagged by a [`QuerySequencer`]; a response is only applied while its
//! sequence number is still the latest one issued, so a slow answer to an
//! old query can never replace the suggestions of a newer one.

use crate::camera::PanTo;
use crate::core::geo::LatLng;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Autocomplete candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub description: String,
}

/// Geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub formatted_address: String,
    pub location: LatLng,
}

/// Area autocomplete results are biased towards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationBias {
    pub center: LatLng,
    pub radius_m: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteRequest {
    pub input: String,
    pub bias: LocationBias,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacesError {
    #[error("no places API key configured")]
    MissingApiKey,

    #[error("places request failed: {0}")]
    Network(String),

    #[error("places API answered {status}: {message}")]
    Status { status: String, message: String },

    #[error("no address found for {0:?}")]
    NoResults(String),

    #[error("malformed places response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        PlacesError::Network(err.to_string())
    }
}

#[async_trait]
pub trait PlacesService: Send + Sync {
    /// Ranked suggestions for a partial address
    async fn autocomplete(&self, request: &AutocompleteRequest) -> Result<Vec<Suggestion>, PlacesError>;

    /// Address records matching a full address, best first
    async fn geocode(&self, address: &str) -> Result<Vec<AddressRecord>, PlacesError>;
}

/// A query tagged with its sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub seq: u64,
    pub input: String,
}

/// Hands out monotonically increasing query numbers. Clones share the
/// counter.
#[derive(Debug, Clone, Default)]
pub struct QuerySequencer {
    latest: Arc<AtomicU64>,
}

impl QuerySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket; every earlier ticket becomes stale
    pub fn issue(&self, input: impl Into<String>) -> QueryTicket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        QueryTicket {
            seq,
            input: input.into(),
        }
    }

    /// Makes every outstanding ticket stale without issuing a query
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest() == seq
    }
}

pub struct AddressResolver {
    service: Arc<dyn PlacesService>,
    bias: LocationBias,
    sequencer: QuerySequencer,
    debounce: Duration,
}

impl AddressResolver {
    pub fn new(service: Arc<dyn PlacesService>, bias: LocationBias) -> Self {
        Self {
            service,
            bias,
            sequencer: QuerySequencer::new(),
            debounce: Duration::ZERO,
        }
    }

    /// Wait this long before sending a query, dropping it if superseded
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn bias(&self) -> LocationBias {
        self.bias
    }

    pub fn sequencer(&self) -> &QuerySequencer {
        &self.sequencer
    }

    /// Biased autocomplete for `query`. Blank input yields no suggestions
    /// without a request.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, PlacesError> {
        let input = query.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let request = AutocompleteRequest {
            input: input.to_string(),
            bias: self.bias,
        };
        self.service.autocomplete(&request).await
    }

    /// Runs the query behind `ticket` unless a newer ticket exists, before
    /// or after the request. `None` means the result is stale and must be
    /// dropped.
    pub async fn suggest_latest(
        &self,
        ticket: &QueryTicket,
    ) -> Option<Result<Vec<Suggestion>, PlacesError>> {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.sequencer.is_latest(ticket.seq) {
            log::debug!("query #{} superseded before sending", ticket.seq);
            return None;
        }

        let result = self.suggest(&ticket.input).await;

        if !self.sequencer.is_latest(ticket.seq) {
            log::debug!("dropping stale suggestions for query #{}", ticket.seq);
            return None;
        }
        if let Err(err) = &result {
            log::warn!("autocomplete for {:?} failed: {}", ticket.input, err);
        }
        Some(result)
    }

    /// Geocodes the suggestion's description and pans `target` to the
    /// first result
    pub async fn resolve(
        &self,
        suggestion: &Suggestion,
        target: &dyn PanTo,
    ) -> Result<LatLng, PlacesError> {
        let outcome = self
            .service
            .geocode(&suggestion.description)
            .await
            .and_then(|records| {
                records
                    .into_iter()
                    .next()
                    .map(|record| record.location)
                    .ok_or_else(|| PlacesError::NoResults(suggestion.description.clone()))
            });

        match outcome {
            Ok(location) => {
                log::info!("resolved {:?} to {}", suggestion.description, location);
                target.pan_to(location);
                Ok(location)
            }
            Err(err) => {
                log::warn!("could not resolve {:?}: {}", suggestion.description, err);
                Err(err)
            }
        }
    }
}

/// Stand-in used when no API key is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPlaces;

#[async_trait]
impl PlacesService for DisabledPlaces {
    async fn autocomplete(&self, _request: &AutocompleteRequest) -> Result<Vec<Suggestion>, PlacesError> {
        Err(PlacesError::MissingApiKey)
    }

    async fn geocode(&self, _address: &str) -> Result<Vec<AddressRecord>, PlacesError> {
        Err(PlacesError::MissingApiKey)
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), PlacesError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(PlacesError::Status {
            status: other.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

pub(crate) fn parse_autocomplete(body: &str) -> Result<Vec<Suggestion>, PlacesError> {
    let response: AutocompleteResponse =
        serde_json::from_str(body).map_err(|e| PlacesError::Malformed(e.to_string()))?;
    check_status(&response.status, response.error_message)?;

    Ok(response
        .predictions
        .into_iter()
        .map(|prediction| Suggestion {
            id: prediction.place_id,
            description: prediction.description,
        })
        .collect())
}

pub(crate) fn parse_geocode(body: &str) -> Result<Vec<AddressRecord>, PlacesError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| PlacesError::Malformed(e.to_string()))?;
    check_status(&response.status, response.error_message)?;

    Ok(response
        .results
        .into_iter()
        .map(|result| AddressRecord {
            formatted_address: result.formatted_address,
            location: result.geometry.location,
        })
        .collect())
}

/// Google Places Autocomplete and Geocoding web APIs
pub struct GooglePlaces {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, user_agent: &str) -> crate::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, PlacesError> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::Network(format!("HTTP {}", status)));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PlacesService for GooglePlaces {
    async fn autocomplete(&self, request: &AutocompleteRequest) -> Result<Vec<Suggestion>, PlacesError> {
        let query = [
            ("input", request.input.clone()),
            (
                "location",
                format!("{},{}", request.bias.center.lat, request.bias.center.lng),
            ),
            ("radius", request.bias.radius_m.to_string()),
        ];
        let body = self.get("place/autocomplete/json", &query).await?;
        parse_autocomplete(&body)
    }

    async fn geocode(&self, address: &str) -> Result<Vec<AddressRecord>, PlacesError> {
        let body = self
            .get("geocode/json", &[("address", address.to_string())])
            .await?;
        parse_geocode(&body)
    }
}
