//! Runtime configuration for the gateways, the ranker and the courier
//! simulator.
//!
//! Every field has a default, so an empty JSON object is a valid config file.
//! Environment variables override file values after loading.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_OSRM_ENDPOINT: &str = "http://localhost:5000";
const DEFAULT_OSRM_PROFILE: &str = "driving";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Assumed courier speed when the provider is unavailable.
const DEFAULT_FALLBACK_SPEED_KMH: f64 = 30.0;

const DEFAULT_PREP_BUFFER_MINUTES: u32 = 20;
const DEFAULT_MIN_DELIVERY_MINUTES: u32 = 15;
const DEFAULT_ESTIMATE_SPEED_KMH: f64 = 30.0;
const DEFAULT_ESTIMATE_BUFFER_MINUTES: u32 = 10;

const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;
const DEFAULT_POINTS_PER_TICK: usize = 3;
const DEFAULT_MAX_TRACKED_ORDERS: usize = 10_000;

pub const ENV_OSRM_ENDPOINT: &str = "DELIVERY_OSRM_ENDPOINT";
pub const ENV_OSRM_PROFILE: &str = "DELIVERY_OSRM_PROFILE";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "DELIVERY_REQUEST_TIMEOUT_MS";
pub const ENV_TICK_INTERVAL_MS: &str = "DELIVERY_TICK_INTERVAL_MS";
pub const ENV_POINTS_PER_TICK: &str = "DELIVERY_POINTS_PER_TICK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value `{value}` for {key}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Routing provider connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Base URL of the OSRM-compatible service, e.g. `http://localhost:5000`.
    pub endpoint: String,
    /// OSRM profile segment of the request path.
    pub profile: String,
    /// Client-side timeout applied to every provider request.
    pub request_timeout_ms: u64,
    pub fallback_speed_kmh: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OSRM_ENDPOINT.to_string(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fallback_speed_kmh: DEFAULT_FALLBACK_SPEED_KMH,
        }
    }
}

impl RoutingConfig {
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// ETA buffers used when ranking stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Preparation and pickup time added on top of travel time.
    pub prep_buffer_minutes: u32,
    /// Lower bound for any non-zero delivery estimate.
    pub min_delivery_minutes: u32,
    /// Speed used by the distance-only estimate.
    pub estimate_speed_kmh: f64,
    /// Buffer added by the distance-only estimate.
    pub estimate_buffer_minutes: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            prep_buffer_minutes: DEFAULT_PREP_BUFFER_MINUTES,
            min_delivery_minutes: DEFAULT_MIN_DELIVERY_MINUTES,
            estimate_speed_kmh: DEFAULT_ESTIMATE_SPEED_KMH,
            estimate_buffer_minutes: DEFAULT_ESTIMATE_BUFFER_MINUTES,
        }
    }
}

/// Courier simulation cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub tick_interval_ms: u64,
    /// Route points the courier moves forward per tick.
    pub points_per_tick: usize,
    /// Per-order state reserved in memory. Exceeded, with a warning, only while
    /// more orders than this are out for delivery.
    pub max_tracked_orders: usize,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            points_per_tick: DEFAULT_POINTS_PER_TICK,
            max_tracked_orders: DEFAULT_MAX_TRACKED_ORDERS,
        }
    }
}

impl CourierConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub routing: RoutingConfig,
    pub ranking: RankingConfig,
    pub courier: CourierConfig,
}

impl DeliveryConfig {
    /// Load from a JSON file, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_OSRM_ENDPOINT) {
            self.routing.endpoint = endpoint;
        }
        if let Some(profile) = lookup(ENV_OSRM_PROFILE) {
            self.routing.profile = profile;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.routing.request_timeout_ms = parse_env(ENV_REQUEST_TIMEOUT_MS, raw)?;
        }
        if let Some(raw) = lookup(ENV_TICK_INTERVAL_MS) {
            self.courier.tick_interval_ms = parse_env(ENV_TICK_INTERVAL_MS, raw)?;
        }
        if let Some(raw) = lookup(ENV_POINTS_PER_TICK) {
            self.courier.points_per_tick = parse_env(ENV_POINTS_PER_TICK, raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("routing.endpoint is empty".into()));
        }
        if self.routing.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "routing.request_timeout_ms must be > 0".into(),
            ));
        }
        if !(self.routing.fallback_speed_kmh > 0.0) {
            return Err(ConfigError::Invalid(
                "routing.fallback_speed_kmh must be > 0".into(),
            ));
        }
        if !(self.ranking.estimate_speed_kmh > 0.0) {
            return Err(ConfigError::Invalid(
                "ranking.estimate_speed_kmh must be > 0".into(),
            ));
        }
        if self.courier.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "courier.tick_interval_ms must be > 0".into(),
            ));
        }
        if self.courier.points_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "courier.points_per_tick must be > 0".into(),
            ));
        }
        if self.courier.max_tracked_orders == 0 {
            return Err(ConfigError::Invalid(
                "courier.max_tracked_orders must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value: raw })
}
