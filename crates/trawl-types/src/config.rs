//! Engine-wide configuration (spec §6) and environment-variable loading,
//! modeled on the teacher's `riptide-config::env::EnvConfigLoader`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Disabled,
    Enabled,
    Bypass,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultStrategy {
    SpeedFirst,
    QualityFirst,
    CostFirst,
    Adaptive,
}

/// All enumerated config options from spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrawlConfig {
    pub max_concurrent_jobs: usize,
    pub scrape_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub reader_timeout_ms: u64,
    pub headless_timeout_ms: u64,
    pub min_content_length: usize,
    pub cache_mode: CacheMode,
    pub cache_ttl_s: u64,
    pub default_strategy: DefaultStrategy,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max: usize,
    pub circuit_breaker_timeout_ms: u64,
    pub circuit_breaker_error_threshold_pct: f64,
    pub circuit_breaker_reset_timeout_ms: u64,
    pub circuit_breaker_min_requests: u64,
    pub session_storage_path: String,
    pub session_auto_cleanup: bool,
    pub session_cleanup_interval_ms: u64,
}

impl Default for TrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            scrape_timeout_ms: 30_000,
            http_timeout_ms: 10_000,
            reader_timeout_ms: 15_000,
            headless_timeout_ms: 15_000,
            min_content_length: 200,
            cache_mode: CacheMode::Enabled,
            cache_ttl_s: 3600,
            default_strategy: DefaultStrategy::Adaptive,
            max_retries: 3,
            retry_backoff_base_ms: 500,
            rate_limit_window_ms: 1000,
            rate_limit_max: 10,
            circuit_breaker_timeout_ms: 10_000,
            circuit_breaker_error_threshold_pct: 50.0,
            circuit_breaker_reset_timeout_ms: 30_000,
            circuit_breaker_min_requests: 4,
            session_storage_path: "./sessions".to_string(),
            session_auto_cleanup: true,
            session_cleanup_interval_ms: 600_000,
        }
    }
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment variable not found: {var}")]
    NotFound { var: String },
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Loads config values from environment variables with an optional prefix,
/// required-var enforcement, and typed defaults.
pub struct EnvLoader {
    prefix: Option<String>,
    defaults: HashMap<String, String>,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self {
            prefix: None,
            defaults: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn default(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(var.into(), value.into());
        self
    }

    fn var_name(&self, var: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}{var}"),
            None => var.to_string(),
        }
    }

    pub fn get(&self, var: &str) -> Result<String, EnvError> {
        let full = self.var_name(var);
        env::var(&full).or_else(|_| {
            self.defaults
                .get(var)
                .cloned()
                .ok_or(EnvError::NotFound { var: full })
        })
    }

    pub fn get_uint(&self, var: &str) -> Result<u64, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::InvalidValue {
            var: self.var_name(var),
            reason: format!("not an unsigned integer: {e}"),
        })
    }

    pub fn get_usize(&self, var: &str) -> Result<usize, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::InvalidValue {
            var: self.var_name(var),
            reason: format!("not an integer: {e}"),
        })
    }

    pub fn get_float(&self, var: &str) -> Result<f64, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::InvalidValue {
            var: self.var_name(var),
            reason: format!("not a float: {e}"),
        })
    }

    pub fn get_bool(&self, var: &str) -> Result<bool, EnvError> {
        let value = self.get(var)?;
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(EnvError::InvalidValue {
                var: self.var_name(var),
                reason: format!("not a boolean: {value}"),
            }),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_cache_mode(value: &str) -> Option<CacheMode> {
    match value.to_lowercase().as_str() {
        "disabled" => Some(CacheMode::Disabled),
        "enabled" => Some(CacheMode::Enabled),
        "bypass" => Some(CacheMode::Bypass),
        "read_only" | "readonly" => Some(CacheMode::ReadOnly),
        _ => None,
    }
}

fn parse_default_strategy(value: &str) -> Option<DefaultStrategy> {
    match value.to_lowercase().as_str() {
        "speed_first" => Some(DefaultStrategy::SpeedFirst),
        "quality_first" => Some(DefaultStrategy::QualityFirst),
        "cost_first" => Some(DefaultStrategy::CostFirst),
        "adaptive" => Some(DefaultStrategy::Adaptive),
        _ => None,
    }
}

/// Load a [`TrawlConfig`] from `TRAWL_*` environment variables, falling back
/// to [`TrawlConfig::default`] for anything unset.
pub fn load_from_env() -> TrawlConfig {
    let defaults = TrawlConfig::default();
    let loader = EnvLoader::new().with_prefix("TRAWL_");

    TrawlConfig {
        cache_mode: loader
            .get("CACHE_MODE")
            .ok()
            .and_then(|v| parse_cache_mode(&v))
            .unwrap_or(defaults.cache_mode),
        cache_ttl_s: loader.get_uint("CACHE_TTL_S").unwrap_or(defaults.cache_ttl_s),
        default_strategy: loader
            .get("DEFAULT_STRATEGY")
            .ok()
            .and_then(|v| parse_default_strategy(&v))
            .unwrap_or(defaults.default_strategy),
        max_concurrent_jobs: loader
            .get_usize("MAX_CONCURRENT_JOBS")
            .unwrap_or(defaults.max_concurrent_jobs),
        scrape_timeout_ms: loader
            .get_uint("SCRAPE_TIMEOUT_MS")
            .unwrap_or(defaults.scrape_timeout_ms),
        http_timeout_ms: loader
            .get_uint("HTTP_TIMEOUT_MS")
            .unwrap_or(defaults.http_timeout_ms),
        reader_timeout_ms: loader
            .get_uint("READER_TIMEOUT_MS")
            .unwrap_or(defaults.reader_timeout_ms),
        headless_timeout_ms: loader
            .get_uint("HEADLESS_TIMEOUT_MS")
            .unwrap_or(defaults.headless_timeout_ms),
        min_content_length: loader
            .get_usize("MIN_CONTENT_LENGTH")
            .unwrap_or(defaults.min_content_length),
        max_retries: loader
            .get_uint("MAX_RETRIES")
            .map(|v| v as u32)
            .unwrap_or(defaults.max_retries),
        retry_backoff_base_ms: loader
            .get_uint("RETRY_BACKOFF_BASE_MS")
            .unwrap_or(defaults.retry_backoff_base_ms),
        rate_limit_window_ms: loader
            .get_uint("RATE_LIMIT_WINDOW_MS")
            .unwrap_or(defaults.rate_limit_window_ms),
        rate_limit_max: loader
            .get_usize("RATE_LIMIT_MAX")
            .unwrap_or(defaults.rate_limit_max),
        circuit_breaker_timeout_ms: loader
            .get_uint("CIRCUIT_BREAKER_TIMEOUT_MS")
            .unwrap_or(defaults.circuit_breaker_timeout_ms),
        circuit_breaker_error_threshold_pct: loader
            .get_float("CIRCUIT_BREAKER_ERROR_THRESHOLD_PCT")
            .unwrap_or(defaults.circuit_breaker_error_threshold_pct),
        circuit_breaker_reset_timeout_ms: loader
            .get_uint("CIRCUIT_BREAKER_RESET_TIMEOUT_MS")
            .unwrap_or(defaults.circuit_breaker_reset_timeout_ms),
        circuit_breaker_min_requests: loader
            .get_uint("CIRCUIT_BREAKER_MIN_REQUESTS")
            .unwrap_or(defaults.circuit_breaker_min_requests),
        session_auto_cleanup: loader
            .get_bool("SESSION_AUTO_CLEANUP")
            .unwrap_or(defaults.session_auto_cleanup),
        session_cleanup_interval_ms: loader
            .get_uint("SESSION_CLEANUP_INTERVAL_MS")
            .unwrap_or(defaults.session_cleanup_interval_ms),
        session_storage_path: loader
            .get("SESSION_STORAGE_PATH")
            .unwrap_or(defaults.session_storage_path),
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_min_content_length_is_200() {
        assert_eq!(TrawlConfig::default().min_content_length, 200);
    }

    #[test]
    fn env_loader_falls_back_to_default_value() {
        let loader = EnvLoader::new()
            .with_prefix("TRAWL_TEST_")
            .default("UNSET_VAR", "42");
        assert_eq!(loader.get_uint("UNSET_VAR").unwrap(), 42);
    }

    #[test]
    fn env_loader_parses_bool_variants() {
        let loader = EnvLoader::new().default("FLAG", "yes");
        assert!(loader.get_bool("FLAG").unwrap());
    }

    #[test]
    fn load_from_env_matches_defaults_when_unset() {
        let cfg = load_from_env();
        assert_eq!(cfg.min_content_length, 200);
        assert_eq!(cfg.rate_limit_max, TrawlConfig::default().rate_limit_max);
        assert_eq!(cfg.cache_mode, TrawlConfig::default().cache_mode);
        assert_eq!(cfg.default_strategy, TrawlConfig::default().default_strategy);
    }

    #[test]
    fn parses_cache_mode_and_strategy_strings() {
        assert_eq!(parse_cache_mode("read_only"), Some(CacheMode::ReadOnly));
        assert_eq!(parse_cache_mode("bogus"), None);
        assert_eq!(parse_default_strategy("cost_first"), Some(DefaultStrategy::CostFirst));
        assert_eq!(parse_default_strategy("bogus"), None);
    }
}
