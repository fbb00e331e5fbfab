//! Engine configuration.
//!
//! Limits that bound the work a single call may do, plus the governing zone
//! used when wire inputs carry no offset. Values come from defaults, a JSON
//! document, or `ROOM_ENGINE_*` environment variables.

use std::env;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// How far a recurring candidate is expanded when checking conflicts.
///
/// Conflicts between series that only meet further apart than this are not
/// detected. Changing it changes conflict outcomes for long-running series.
pub const DEFAULT_CONFLICT_HORIZON_DAYS: u32 = 366;

/// Upper bound on `conflict_horizon_days`, about a century.
pub const MAX_CONFLICT_HORIZON_DAYS: u32 = 36_600;

/// Largest query span, in days, accepted by availability calls.
pub const DEFAULT_MAX_QUERY_DAYS: u32 = 366;

pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;

/// Zone the booking service was deployed in.
pub const DEFAULT_TIMEZONE: &str = "Australia/Perth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone used to read naive datetimes and local calendar days.
    pub timezone: String,
    pub conflict_horizon_days: u32,
    pub max_query_days: u32,
    pub slot_granularity_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            conflict_horizon_days: DEFAULT_CONFLICT_HORIZON_DAYS,
            max_query_days: DEFAULT_MAX_QUERY_DAYS,
            slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
        }
    }
}

impl EngineConfig {
    /// Build config from `ROOM_ENGINE_*` environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (same keys as [`from_env`](Self::from_env)).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let num = |key: &str, default: u32| {
            opt(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            timezone: opt("ROOM_ENGINE_TIMEZONE").unwrap_or(defaults.timezone),
            conflict_horizon_days: num(
                "ROOM_ENGINE_CONFLICT_HORIZON_DAYS",
                defaults.conflict_horizon_days,
            ),
            max_query_days: num("ROOM_ENGINE_MAX_QUERY_DAYS", defaults.max_query_days),
            slot_granularity_minutes: num(
                "ROOM_ENGINE_SLOT_MINUTES",
                defaults.slot_granularity_minutes,
            ),
        }
    }

    /// Parse and validate a JSON config document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The governing zone.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTimezone` if `timezone` is not an IANA identifier.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.conflict_horizon_days == 0 {
            return Err(EngineError::Config(
                "conflict_horizon_days must be positive".to_string(),
            ));
        }
        if self.conflict_horizon_days > MAX_CONFLICT_HORIZON_DAYS {
            return Err(EngineError::Config(format!(
                "conflict_horizon_days must be at most {MAX_CONFLICT_HORIZON_DAYS}"
            )));
        }
        if self.max_query_days == 0 {
            return Err(EngineError::Config("max_query_days must be positive".to_string()));
        }
        if self.slot_granularity_minutes == 0 {
            return Err(EngineError::Config(
                "slot_granularity_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
