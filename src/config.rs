//! Runtime configuration
//!
//! Read from the environment (a `.env` file is loaded by the binaries first).

use crate::error::AdvisorError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const LLM_DISABLED: [&str; 3] = ["off", "disabled", "none"];

/// Text-generation endpoint settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.1:8b".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub port: u16,
    /// `None` selects the offline classifier and template presenter
    pub llm: Option<LlmConfig>,
    pub database_url: Option<String>,
    pub catalog_dir: Option<PathBuf>,
    /// Idle session lifetime; `None` keeps sessions forever
    pub session_ttl: Option<chrono::Duration>,
    pub recommendation_seed: Option<u64>,
}

impl AdvisorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = parse_or(get("PORT").or_else(|| get("API_PORT")), "PORT", DEFAULT_PORT)?;

        let llm = match get("LLM_API_URL") {
            Some(url) if LLM_DISABLED.contains(&url.to_lowercase().as_str()) => None,
            url => {
                let defaults = LlmConfig::default();
                Some(LlmConfig {
                    api_url: url.unwrap_or(defaults.api_url),
                    model: get("LLM_MODEL").unwrap_or(defaults.model),
                    api_key: get("LLM_API_KEY"),
                    timeout: Duration::from_secs(parse_or(
                        get("LLM_TIMEOUT_SECS"),
                        "LLM_TIMEOUT_SECS",
                        defaults.timeout.as_secs(),
                    )?),
                    temperature: defaults.temperature,
                    max_tokens: defaults.max_tokens,
                })
            }
        };

        let ttl_secs: u64 = parse_or(
            get("SESSION_TTL_SECS"),
            "SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )?;
        let session_ttl = if ttl_secs == 0 {
            None
        } else {
            let too_large = || AdvisorError::ConfigError(format!("SESSION_TTL_SECS is too large: {}", ttl_secs));
            let secs = i64::try_from(ttl_secs).map_err(|_| too_large())?;
            Some(chrono::Duration::try_seconds(secs).ok_or_else(too_large)?)
        };

        let recommendation_seed = match get("RECOMMENDATION_SEED") {
            Some(raw) => Some(parse_value(&raw, "RECOMMENDATION_SEED")?),
            None => None,
        };

        Ok(Self {
            port,
            llm,
            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
            catalog_dir: get("CATALOG_DIR").map(PathBuf::from),
            session_ttl,
            recommendation_seed,
        })
    }
}

fn parse_value<T: FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AdvisorError::ConfigError(format!("{} has an invalid value: {}", key, raw)))
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(&raw, key),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AdvisorConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AdvisorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        let llm = cfg.llm.unwrap();
        assert_eq!(llm.model, "llama3.1:8b");
        assert_eq!(llm.timeout, Duration::from_secs(60));
        assert_eq!(cfg.session_ttl, Some(chrono::Duration::hours(24)));
        assert!(cfg.database_url.is_none());
        assert!(cfg.recommendation_seed.is_none());
    }

    #[test]
    fn test_overrides_and_fallback_keys() {
        let cfg = config(&[
            ("API_PORT", "9000"),
            ("POSTGRES_URL", "postgres://localhost/advisor"),
            ("LLM_MODEL", "mistral"),
            ("LLM_API_KEY", "secret"),
            ("SESSION_TTL_SECS", "0"),
            ("RECOMMENDATION_SEED", "42"),
            ("CATALOG_DIR", "/srv/catalog"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/advisor"));
        assert_eq!(cfg.llm.as_ref().unwrap().model, "mistral");
        assert_eq!(cfg.llm.as_ref().unwrap().api_key.as_deref(), Some("secret"));
        assert!(cfg.session_ttl.is_none());
        assert_eq!(cfg.recommendation_seed, Some(42));
        assert_eq!(cfg.catalog_dir, Some(PathBuf::from("/srv/catalog")));
    }

    #[test]
    fn test_llm_can_be_disabled() {
        assert!(config(&[("LLM_API_URL", "off")]).unwrap().llm.is_none());
        assert!(config(&[("LLM_API_URL", "Disabled")]).unwrap().llm.is_none());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(AdvisorError::ConfigError(_))));
        assert!(matches!(
            config(&[("RECOMMENDATION_SEED", "-1")]),
            Err(AdvisorError::ConfigError(_))
        ));
    }

    #[test]
    fn test_out_of_range_ttl_is_rejected_not_unlimited() {
        for secs in ["10000000000000000", "18446744073709551615"] {
            assert!(
                matches!(config(&[("SESSION_TTL_SECS", secs)]), Err(AdvisorError::ConfigError(_))),
                "{} should be rejected",
                secs
            );
        }
        let cfg = config(&[("SESSION_TTL_SECS", "3600")]).unwrap();
        assert_eq!(cfg.session_ttl, Some(chrono::Duration::hours(1)));
    }
}
