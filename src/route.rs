use geo::Point;
use serde::Serialize;

/// A latitude/longitude pair that is known to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate only when both halves are present and finite.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }

    // geo wants (x, y) = (lon, lat)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// One maneuver of a route.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    /// Free text, possibly with HTML markup.
    pub instruction: String,
    /// `None` when the provider omitted or only half-filled the location.
    pub start: Option<Coordinate>,
}

impl Step {
    pub fn new(instruction: impl Into<String>, start: Option<Coordinate>) -> Self {
        Self {
            instruction: instruction.into(),
            start,
        }
    }
}

/// One candidate path as returned by the directions provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub steps: Vec<Step>,
    pub traffic_duration_secs: Option<u64>,
    pub polyline: Option<String>,
    pub summary: Option<String>,
    pub duration_text: Option<String>,
    pub distance_text: Option<String>,
}

/// Output of the risk scorer for a single route.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskAssessment {
    pub raw_score: u64,
    pub hazard_coordinates: Vec<Coordinate>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRoute {
    pub route: Route,
    pub assessment: RiskAssessment,
}

/// A route after batch normalization. The raw score is gone by now.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRoute {
    pub route: Route,
    pub risk_score: f64,
    pub hazard_coordinates: Vec<Coordinate>,
    pub reasons: Vec<String>,
}
