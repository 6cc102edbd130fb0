use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::provider::ProviderError;
use crate::ranker::{rank, RankError};
use crate::route::{Coordinate, RankedRoute, ScoredRoute};
use crate::AppState;

const REQUIRED_PARAMS: [&str; 4] = ["originLat", "originLng", "destinationLat", "destinationLng"];
const NOT_AVAILABLE: &str = "N/A";

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParams(Vec<&'static str>),
    #[error("Coordinate values must be valid numbers.")]
    InvalidNumber,
    #[error("Coordinates are outside of valid range.")]
    OutOfRange,
    #[error("Directions provider API key is not configured.")]
    MissingApiKey,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("No routes found between the specified locations.")]
    NoRoutes,
    #[error("No routes could be processed.")]
    Rank(#[from] RankError),
}

impl ApiError {
    fn status(&self) -> (StatusCode, String) {
        let (code, status) = match self {
            ApiError::MissingParams(_) => (StatusCode::BAD_REQUEST, "PARAMS_ERROR"),
            ApiError::InvalidNumber => (StatusCode::BAD_REQUEST, "VALUE_ERROR"),
            ApiError::OutOfRange => (StatusCode::BAD_REQUEST, "COORDS_INVALID_RANGE"),
            ApiError::MissingApiKey => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            ApiError::Provider(ProviderError::Network(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "NETWORK_ERROR_GOOGLE_API")
            }
            ApiError::Provider(ProviderError::Status { status, .. }) => {
                return (StatusCode::BAD_GATEWAY, status.clone());
            }
            ApiError::NoRoutes => (StatusCode::NOT_FOUND, "NO_ROUTES_FOUND"),
            ApiError::Rank(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR"),
        };
        (code, status.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, status) = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            status,
        };
        (code, Json(body)).into_response()
    }
}

// --- DTOs ---

#[derive(Serialize)]
pub struct RoutesResponse {
    status: &'static str,
    routes: Vec<RouteView>,
}

#[derive(Serialize)]
pub struct RouteView {
    polyline: Option<String>,
    risk_score: f64,
    hazards_coordinates: Vec<Coordinate>,
    reasons: Vec<String>,
    summary: String,
    duration_text: String,
    distance_text: String,
}

impl From<RankedRoute> for RouteView {
    fn from(ranked: RankedRoute) -> Self {
        let or_na = |text: Option<String>| text.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            polyline: ranked.route.polyline,
            risk_score: ranked.risk_score,
            hazards_coordinates: ranked.hazard_coordinates,
            reasons: ranked.reasons,
            summary: or_na(ranked.route.summary),
            duration_text: or_na(ranked.route.duration_text),
            distance_text: or_na(ranked.route.distance_text),
        }
    }
}

#[derive(Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    query: String,
}

// --- Handlers ---

pub async fn home() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Route risk relay is live!",
    }))
}

/// Placeholder suggestions until a geocoder is wired in.
pub async fn autocomplete(Query(params): Query<AutocompleteQuery>) -> Json<Vec<String>> {
    if params.query.is_empty() {
        return Json(Vec::new());
    }
    let q = params.query;
    Json(vec![format!("{q} Central"), format!("{q} Park"), format!("{q} Station")])
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let (origin, destination) = parse_endpoints(&params)?;

    let Some(api_key) = state.api_key.as_deref() else {
        error!("GOOGLE_MAPS_API_KEY is not configured");
        return Err(ApiError::MissingApiKey);
    };

    let routes = state
        .directions
        .fetch_routes(api_key, origin, destination)
        .await
        .inspect_err(|e| error!("directions request failed: {e}"))?;

    if routes.is_empty() {
        warn!(?origin, ?destination, "no routes found");
        return Err(ApiError::NoRoutes);
    }

    let scored: Vec<ScoredRoute> = routes
        .into_iter()
        .map(|route| {
            let assessment = state.scorer.score(&route);
            ScoredRoute { route, assessment }
        })
        .collect();

    let ranked = rank(scored, state.score_range)?;
    info!("scored {} route(s)", ranked.len());

    Ok(Json(RoutesResponse {
        status: "OK",
        routes: ranked.into_iter().map(RouteView::from).collect(),
    }))
}

fn parse_endpoints(params: &HashMap<String, String>) -> Result<(Coordinate, Coordinate), ApiError> {
    let missing: Vec<&'static str> = REQUIRED_PARAMS
        .iter()
        .copied()
        .filter(|name| !params.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingParams(missing));
    }

    let number = |name: &str| -> Result<f64, ApiError> {
        params
            .get(name)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or(ApiError::InvalidNumber)
    };
    let origin = Coordinate::new(number("originLat")?, number("originLng")?);
    let destination = Coordinate::new(number("destinationLat")?, number("destinationLng")?);

    let in_range = |c: Coordinate| (-90.0..=90.0).contains(&c.lat) && (-180.0..=180.0).contains(&c.lng);
    if !in_range(origin) || !in_range(destination) {
        return Err(ApiError::OutOfRange);
    }

    Ok((origin, destination))
}
