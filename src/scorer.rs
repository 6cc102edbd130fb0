use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::route::{RiskAssessment, Route};
use crate::safety::BlackspotMap;

// Additive, unbounded above.
pub const HAZARD_PENALTY: u64 = 100;
pub const BLACKSPOT_PENALTY: u64 = 200;
/// Totals strictly above this get the combined-factors reason.
pub const HIGH_RISK_THRESHOLD: u64 = 700;

const SHARP_KEYWORD: &str = "sharp";
const OTHER_HAZARD_KEYWORDS: [&str; 3] = ["roundabout", "merge", "u-turn"];

pub const HIGH_RISK_REASON: &str = "Route identified as higher risk due to combined factors.";
pub const DEFAULT_REASON: &str = "Standard route profile. Drive safely.";

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"<[^>]*>").unwrap();
}

pub struct RiskScorer {
    blackspots: BlackspotMap,
}

impl RiskScorer {
    pub fn new(blackspots: BlackspotMap) -> Self {
        Self { blackspots }
    }

    pub fn score(&self, route: &Route) -> RiskAssessment {
        let mut total = 0u64;
        let mut reasons = Vec::new();

        // 1. Traffic exposure
        if let Some(secs) = route.traffic_duration_secs.filter(|&s| s > 0) {
            let minutes = secs / 60;
            total += minutes;
            reasons.push(format!("Potential traffic delay: {minutes} minutes"));
        }

        // 2. Hazardous maneuvers
        let mut hazard_coordinates = Vec::new();
        let mut sharp_turns = 0usize;
        let mut hazardous_steps = 0usize;

        for step in &route.steps {
            let text = normalize_instruction(&step.instruction);
            let sharp = text.contains(SHARP_KEYWORD);
            let other = OTHER_HAZARD_KEYWORDS.iter().any(|kw| text.contains(kw));

            if sharp {
                sharp_turns += 1;
            }
            if sharp || other {
                hazardous_steps += 1;
                total += HAZARD_PENALTY;
                hazard_coordinates.extend(step.start);
            }
        }

        if sharp_turns > 0 {
            reasons.push(format!("Route includes {sharp_turns} sharp turn(s)"));
        } else if hazardous_steps > 0 {
            reasons.push(format!(
                "Route includes {hazardous_steps} potentially hazardous maneuver(s)"
            ));
        }

        // 3. Blackspot proximity, at most one blackspot per step
        for start in route.steps.iter().filter_map(|step| step.start) {
            if let Some(spot) = self.blackspots.first_within_radius(start) {
                total += BLACKSPOT_PENALTY;
                reasons.push(format!("Passes near known accident blackspot: {}", spot.name));
            }
        }

        // 4. Aggregate
        if total > HIGH_RISK_THRESHOLD {
            reasons.push(HIGH_RISK_REASON.to_string());
        } else if total == 0 && reasons.is_empty() {
            reasons.push(DEFAULT_REASON.to_string());
        }

        RiskAssessment {
            raw_score: total,
            hazard_coordinates,
            reasons: reasons.into_iter().unique().collect(),
        }
    }
}

/// Lower-cased instruction text with HTML tags removed.
fn normalize_instruction(instruction: &str) -> String {
    MARKUP.replace_all(instruction, " ").to_lowercase()
}
