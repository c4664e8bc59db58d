//! Configuration management and environment variable loading

use crate::types::{ProviderId, ProviderSet};
use crate::{OstomateError, Result};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on the number of records a search may return.
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Load environment variables from a .env file
///
/// Missing .env files are not an error; the process environment is used as-is.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(OstomateError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(OstomateError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(OstomateError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get required environment variable
pub fn get_required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        OstomateError::config(format!(
            "Required environment variable '{}' is not set. \
             Check your .env file or system environment.",
            key
        ))
    })
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable, treating empty values as unset
pub fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get environment variable as boolean
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(default)
}

/// Parse a comma separated provider list such as `crowd,local`.
///
/// Unknown names are rejected so a typo in the environment is not silently
/// turned into "provider disabled".
pub fn parse_provider_list(raw: &str) -> Result<ProviderSet> {
    let mut set = ProviderSet::empty();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id: ProviderId = name.parse()?;
        set.insert(id);
    }
    Ok(set)
}

/// Runtime settings for the aggregation and extraction pipeline
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Providers queried by a search when the caller does not say otherwise
    pub enabled_providers: ProviderSet,
    /// Default number of records returned by a search
    pub default_limit: usize,
    /// Upper bound on a single provider call
    pub provider_timeout: Duration,
    /// Upper bound on the language model extraction call
    pub model_timeout: Duration,
    /// Similarity threshold used for fuzzy name matching
    pub fuzzy_threshold: f32,
    /// Providers consulted while grounding food names in the local extraction pass
    pub grounding_providers: ProviderSet,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            enabled_providers: ProviderSet::all(),
            default_limit: 25,
            provider_timeout: Duration::from_millis(8_000),
            model_timeout: Duration::from_millis(15_000),
            fuzzy_threshold: 0.7,
            grounding_providers: ProviderSet::only(ProviderId::Local),
        }
    }
}

impl CoreConfig {
    /// Build configuration from `OSTOMATE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let enabled_providers = match get_env_opt("OSTOMATE_PROVIDERS") {
            Some(raw) => parse_provider_list(&raw)?,
            None => defaults.enabled_providers,
        };
        let grounding_providers = match get_env_opt("OSTOMATE_GROUNDING_PROVIDERS") {
            Some(raw) => parse_provider_list(&raw)?,
            None => defaults.grounding_providers,
        };

        let fuzzy_threshold = get_env_float("OSTOMATE_FUZZY_THRESHOLD", defaults.fuzzy_threshold);
        if !(0.0..=1.0).contains(&fuzzy_threshold) {
            return Err(OstomateError::config(format!(
                "OSTOMATE_FUZZY_THRESHOLD must be within [0, 1], got {}",
                fuzzy_threshold
            )));
        }

        Ok(Self {
            enabled_providers,
            default_limit: get_env_int("OSTOMATE_SEARCH_LIMIT", defaults.default_limit)
                .min(MAX_SEARCH_LIMIT),
            provider_timeout: Duration::from_millis(get_env_int(
                "OSTOMATE_PROVIDER_TIMEOUT_MS",
                defaults.provider_timeout.as_millis() as u64,
            )),
            model_timeout: Duration::from_millis(get_env_int(
                "OSTOMATE_MODEL_TIMEOUT_MS",
                defaults.model_timeout.as_millis() as u64,
            )),
            fuzzy_threshold,
            grounding_providers,
        })
    }
}
