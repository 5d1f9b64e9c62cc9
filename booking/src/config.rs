//! Configuration management for booking runs.
//!
//! Loads configuration from `AIRFARE_*` environment variables with sensible
//! defaults, then validates it.
//!
//! # Example
//!
//! ```no_run
//! use airfare_booking::config::BookingConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BookingConfig::from_env()?;
//! println!("Budget: {:?}", config.budget);
//! # Ok(())
//! # }
//! ```

use crate::agency::CandidatePolicy;
use crate::aggregate::DEFAULT_BUDGET;
use crate::geolocator::DEFAULT_GEOLOCATION_DELAY;
use crate::types::{GeoLocation, UserId};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default upper bound of the simulated data-source latency
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_millis(2000);

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration validation failed
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// How the driver prints its report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tickets
    #[default]
    Text,
    /// One JSON document
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected text or json".to_string()),
        }
    }
}

/// Booking run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Upper bound of the simulated user/flight access delay
    pub max_latency: Duration,
    /// Delay before the geolocator answers
    pub geolocation_delay: Duration,
    /// How long a batch may run before outstanding bookings are cancelled
    pub budget: Duration,
    /// Seed for every random decision (entropy when unset)
    pub seed: Option<u64>,
    /// Pin the geolocator to one location
    pub location: Option<GeoLocation>,
    /// How pooled agency results become candidates
    pub candidate_policy: CandidatePolicy,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Install the metrics recorder and print the metrics after the report
    pub metrics_enabled: bool,
    /// Report format
    pub output: OutputFormat,
    /// Users to book for (seed users plus one unknown id when unset)
    pub user_ids: Option<Vec<UserId>>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_latency: DEFAULT_MAX_LATENCY,
            geolocation_delay: DEFAULT_GEOLOCATION_DELAY,
            budget: DEFAULT_BUDGET,
            seed: None,
            location: None,
            candidate_policy: CandidatePolicy::default(),
            log_level: "info".to_string(),
            metrics_enabled: false,
            output: OutputFormat::default(),
            user_ids: None,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps variable names to values.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be parsed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            max_latency: parse_var(&lookup, "AIRFARE_MAX_LATENCY_MS")?
                .map_or(defaults.max_latency, Duration::from_millis),
            geolocation_delay: parse_var(&lookup, "AIRFARE_GEOLOCATION_DELAY_MS")?
                .map_or(defaults.geolocation_delay, Duration::from_millis),
            budget: parse_var(&lookup, "AIRFARE_BUDGET_SECS")?.map_or(defaults.budget, Duration::from_secs),
            seed: parse_var(&lookup, "AIRFARE_SEED")?,
            location: parse_var(&lookup, "AIRFARE_LOCATION")?,
            candidate_policy: match parse_var::<bool, _>(&lookup, "AIRFARE_DEDUPLICATE")? {
                Some(true) => CandidatePolicy::Deduplicate,
                Some(false) => CandidatePolicy::KeepDuplicates,
                None => defaults.candidate_policy,
            },
            log_level: lookup("AIRFARE_LOG_LEVEL").unwrap_or(defaults.log_level),
            metrics_enabled: parse_var(&lookup, "AIRFARE_METRICS")?.unwrap_or(defaults.metrics_enabled),
            output: parse_var(&lookup, "AIRFARE_OUTPUT")?.unwrap_or(defaults.output),
            user_ids: lookup("AIRFARE_USER_IDS")
                .map(|raw| parse_user_ids(&raw))
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.is_zero() {
            return Err(ConfigError::Validation("budget must be > 0".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.user_ids.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Validation("user_ids cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Set the maximum simulated latency
    #[must_use]
    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    /// Set the geolocation delay
    #[must_use]
    pub fn with_geolocation_delay(mut self, delay: Duration) -> Self {
        self.geolocation_delay = delay;
        self
    }

    /// Set the batch budget
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Seed every random decision
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pin the geolocator
    #[must_use]
    pub fn with_location(mut self, location: GeoLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the candidate policy
    #[must_use]
    pub fn with_candidate_policy(mut self, policy: CandidatePolicy) -> Self {
        self.candidate_policy = policy;
        self
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_user_ids(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse().map_err(|e: uuid::Error| ConfigError::InvalidValue {
                var: "AIRFARE_USER_IDS",
                value: id.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
