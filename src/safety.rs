use geo::prelude::*;
use geo::Point;
use h3o::{CellIndex, LatLng, Resolution};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::route::Coordinate;

/// Steps closer than this (inclusive) count against a blackspot.
pub const BLACKSPOT_RADIUS_METERS: f64 = 250.0;

// ~1.2 km edges: anything within the radius sits in the same cell or a ring-1 neighbour.
const INDEX_RESOLUTION: Resolution = Resolution::Seven;

/// A location with a history of accidents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Blackspot {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BlackspotError {
    #[error("failed to read blackspot file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid blackspot file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("blackspot '{name}' has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinate { name: String, lat: f64, lon: f64 },
}

/// Read-only set of blackspots, bucketed by H3 cell.
///
/// Lookups keep the configured order: when a point is near several blackspots,
/// the one listed first wins.
#[derive(Debug, Clone, Default)]
pub struct BlackspotMap {
    blackspots: Vec<Blackspot>,
    cells: HashMap<CellIndex, Vec<usize>>,
}

impl BlackspotMap {
    pub fn new(blackspots: Vec<Blackspot>) -> Result<Self, BlackspotError> {
        let mut cells: HashMap<CellIndex, Vec<usize>> = HashMap::new();

        for (idx, spot) in blackspots.iter().enumerate() {
            let invalid = || BlackspotError::InvalidCoordinate {
                name: spot.name.clone(),
                lat: spot.lat,
                lon: spot.lon,
            };
            if !(-90.0..=90.0).contains(&spot.lat) || !(-180.0..=180.0).contains(&spot.lon) {
                return Err(invalid());
            }
            let cell = LatLng::new(spot.lat, spot.lon)
                .map_err(|_| invalid())?
                .to_cell(INDEX_RESOLUTION);
            cells.entry(cell).or_default().push(idx);
        }

        Ok(Self { blackspots, cells })
    }

    /// Loads a JSON array of `{ "lat", "lon", "name" }` objects.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BlackspotError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| BlackspotError::Io {
            path: display.clone(),
            source,
        })?;
        let blackspots: Vec<Blackspot> =
            serde_json::from_str(&raw).map_err(|source| BlackspotError::Parse {
                path: display,
                source,
            })?;
        Self::new(blackspots)
    }

    pub fn len(&self) -> usize {
        self.blackspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blackspots.is_empty()
    }

    /// First blackspot, in configured order, within [`BLACKSPOT_RADIUS_METERS`] of `coord`.
    pub fn first_within_radius(&self, coord: Coordinate) -> Option<&Blackspot> {
        let Ok(latlng) = LatLng::new(coord.lat, coord.lng) else {
            return None;
        };
        let target = coord.to_point();

        latlng
            .to_cell(INDEX_RESOLUTION)
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .sorted_unstable()
            .map(|idx| &self.blackspots[idx])
            .find(|spot| {
                Point::new(spot.lon, spot.lat).haversine_distance(&target)
                    <= BLACKSPOT_RADIUS_METERS
            })
    }
}
