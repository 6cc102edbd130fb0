use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::route::{Coordinate, Route, Step};

pub const GOOGLE_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error when fetching directions: {0}")]
    Network(reqwest::Error),
    #[error("{message}")]
    Status { status: String, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        ProviderError::Network(err.without_url())
    }
}

// --- Wire format ---
// Every field decodes leniently: missing, null or mistyped values become `None`.

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Non-arrays become `None`; malformed elements become `T::default()` so positions are kept.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DirectionsResponse {
    #[serde(deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    error_message: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    routes: Option<Vec<GoogleRoute>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleRoute {
    #[serde(deserialize_with = "lenient_list")]
    legs: Option<Vec<GoogleLeg>>,
    #[serde(deserialize_with = "lenient")]
    overview_polyline: Option<EncodedPolyline>,
    #[serde(deserialize_with = "lenient")]
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EncodedPolyline {
    #[serde(deserialize_with = "lenient")]
    points: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleLeg {
    #[serde(deserialize_with = "lenient_list")]
    steps: Option<Vec<GoogleStep>>,
    #[serde(deserialize_with = "lenient")]
    duration_in_traffic: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    duration: Option<TextValue>,
    #[serde(deserialize_with = "lenient")]
    distance: Option<TextValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextValue {
    #[serde(deserialize_with = "lenient")]
    text: Option<String>,
    #[serde(deserialize_with = "lenient")]
    value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleStep {
    #[serde(deserialize_with = "lenient")]
    html_instructions: Option<String>,
    #[serde(deserialize_with = "lenient")]
    start_location: Option<GoogleLatLng>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleLatLng {
    #[serde(deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    lng: Option<f64>,
}

impl From<GoogleRoute> for Route {
    // Requests carry no waypoints, so only the first leg matters.
    fn from(raw: GoogleRoute) -> Self {
        let leg = raw
            .legs
            .and_then(|legs| legs.into_iter().next())
            .unwrap_or_default();

        let steps = leg
            .steps
            .unwrap_or_default()
            .into_iter()
            .map(|step| {
                let start = step
                    .start_location
                    .and_then(|loc| Coordinate::from_parts(loc.lat, loc.lng));
                Step::new(step.html_instructions.unwrap_or_default(), start)
            })
            .collect();

        let traffic_duration_secs = leg
            .duration_in_traffic
            .and_then(|d| d.value)
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| secs as u64);

        Route {
            steps,
            traffic_duration_secs,
            polyline: raw.overview_polyline.and_then(|p| p.points),
            summary: raw.summary,
            duration_text: leg.duration.and_then(|d| d.text),
            distance_text: leg.distance.and_then(|d| d.text),
        }
    }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectionsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::from_client(http, base_url))
    }

    pub fn from_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetches alternative driving routes with live traffic.
    ///
    /// `ZERO_RESULTS` is not an error: it comes back as an empty list.
    pub async fn fetch_routes(
        &self,
        api_key: &str,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Route>, ProviderError> {
        let origin = format!("{},{}", origin.lat, origin.lng);
        let destination = format!("{},{}", destination.lat, destination.lng);
        debug!(%origin, %destination, "requesting directions");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("key", api_key),
                ("alternatives", "true"),
                ("departure_time", "now"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: DirectionsResponse = response.json().await?;
        let status = body.status.unwrap_or_default();

        match status.as_str() {
            "OK" => {
                let routes: Vec<Route> = body
                    .routes
                    .unwrap_or_default()
                    .into_iter()
                    .map(Route::from)
                    .collect();
                debug!("provider returned {} route(s)", routes.len());
                Ok(routes)
            }
            "ZERO_RESULTS" => Ok(Vec::new()),
            _ => {
                let status = if status.is_empty() {
                    "GOOGLE_API_ERROR".to_string()
                } else {
                    status
                };
                let message = body
                    .error_message
                    .unwrap_or_else(|| "Error from Google Directions API".to_string());
                error!("Google Directions API error: {status} - {message}");
                Err(ProviderError::Status { status, message })
            }
        }
    }
}
