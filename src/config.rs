use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::provider::GOOGLE_DIRECTIONS_URL;
use crate::ranker::ScoreRange;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BLACKSPOTS_PATH: &str = "assets/blackspots.json";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("risk score range is inconsistent: floor {floor}, ceiling {ceiling}, neutral {neutral}")]
    Range { floor: f64, ceiling: f64, neutral: f64 },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Checked per request so the health endpoints work without it.
    pub api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub directions_url: String,
    pub provider_timeout: Duration,
    pub blackspots_path: PathBuf,
    pub score_range: ScoreRange,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;
        let ip: IpAddr = host
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var: "HOST", value: host.clone() })?;
        let bind_addr = SocketAddr::new(ip, port);

        let default_range = ScoreRange::default();
        let score_range = ScoreRange {
            floor: parse_or("RISK_SCORE_FLOOR", var("RISK_SCORE_FLOOR"), default_range.floor)?,
            ceiling: parse_or("RISK_SCORE_CEILING", var("RISK_SCORE_CEILING"), default_range.ceiling)?,
            neutral: parse_or("RISK_SCORE_NEUTRAL", var("RISK_SCORE_NEUTRAL"), default_range.neutral)?,
        };
        let ScoreRange { floor, ceiling, neutral } = score_range;
        if !(floor.is_finite() && ceiling.is_finite() && floor < ceiling)
            || !(neutral > floor && neutral <= ceiling)
        {
            return Err(ConfigError::Range { floor, ceiling, neutral });
        }

        let timeout_secs = parse_or("PROVIDER_TIMEOUT_SECS", var("PROVIDER_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid { var: "PROVIDER_TIMEOUT_SECS", value: "0".into() });
        }

        Ok(Self {
            api_key: var("GOOGLE_MAPS_API_KEY"),
            bind_addr,
            directions_url: var("DIRECTIONS_URL").unwrap_or_else(|| GOOGLE_DIRECTIONS_URL.to_string()),
            provider_timeout: Duration::from_secs(timeout_secs),
            blackspots_path: var("BLACKSPOTS_PATH")
                .unwrap_or_else(|| DEFAULT_BLACKSPOTS_PATH.to_string())
                .into(),
            score_range,
        })
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.directions_url, GOOGLE_DIRECTIONS_URL);
        assert_eq!(cfg.provider_timeout, Duration::from_secs(10));
        assert_eq!(cfg.blackspots_path, PathBuf::from("assets/blackspots.json"));
        assert_eq!(cfg.score_range, ScoreRange::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("GOOGLE_MAPS_API_KEY", "abc"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("PROVIDER_TIMEOUT_SECS", "3"),
            ("RISK_SCORE_FLOOR", "1"),
            ("RISK_SCORE_CEILING", "10"),
            ("RISK_SCORE_NEUTRAL", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.provider_timeout, Duration::from_secs(3));
        assert_eq!(cfg.score_range, ScoreRange { floor: 1.0, ceiling: 10.0, neutral: 2.0 });
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = config(&[("GOOGLE_MAPS_API_KEY", "  ")]).unwrap();
        assert_eq!(cfg.api_key, None);
    }

    #[test]
    fn accepts_ipv6_host() {
        let cfg = config(&[("HOST", "::1"), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.bind_addr, "[::1]:8080".parse().unwrap());
    }

    #[test]
    fn rejects_hostname() {
        let err = config(&[("HOST", "localhost")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { var: "HOST", value: "localhost".into() });
    }

    #[test]
    fn rejects_bad_port() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { var: "PORT", value: "eighty".into() });
    }

    #[test]
    fn rejects_neutral_at_floor() {
        let err = config(&[("RISK_SCORE_NEUTRAL", "0.05")]).unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = config(&[("RISK_SCORE_FLOOR", "2"), ("RISK_SCORE_CEILING", "1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(config(&[("PROVIDER_TIMEOUT_SECS", "0")]).is_err());
    }
}
