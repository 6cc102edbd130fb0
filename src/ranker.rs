use itertools::{Itertools, MinMaxResult};

use crate::route::{RankedRoute, ScoredRoute};

/// Presentation range for normalized risk scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub floor: f64,
    pub ceiling: f64,
    /// Assigned to every route when a batch has no spread in raw scores.
    pub neutral: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            floor: 0.05,
            ceiling: 1.0,
            neutral: 0.1,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RankError {
    #[error("cannot rank an empty batch of routes")]
    EmptyBatch,
}

/// Rescales raw scores across one batch into `range`, keeping input order.
pub fn rank(routes: Vec<ScoredRoute>, range: ScoreRange) -> Result<Vec<RankedRoute>, RankError> {
    let (min, max) = match routes.iter().map(|r| r.assessment.raw_score).minmax() {
        MinMaxResult::NoElements => return Err(RankError::EmptyBatch),
        MinMaxResult::OneElement(score) => (score, score),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    let ranked = routes
        .into_iter()
        .map(|scored| {
            let risk_score = if max > min {
                let t = (scored.assessment.raw_score - min) as f64 / (max - min) as f64;
                range.floor + (range.ceiling - range.floor) * t
            } else {
                range.neutral
            };
            RankedRoute {
                route: scored.route,
                risk_score,
                hazard_coordinates: scored.assessment.hazard_coordinates,
                reasons: scored.assessment.reasons,
            }
        })
        .collect();

    Ok(ranked)
}
