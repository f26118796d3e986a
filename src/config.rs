//! Runtime configuration from `HEALTHQUOTE_*` environment variables.
//!
//! Each binary reads its settings once at startup. Unset variables fall back
//! to the defaults below; set-but-invalid values are a [`ConfigError`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

pub const PREDICT_ADDR_ENV: &str = "HEALTHQUOTE_PREDICT_ADDR";
pub const MODEL_PATH_ENV: &str = "HEALTHQUOTE_MODEL_PATH";
pub const CORS_PERMISSIVE_ENV: &str = "HEALTHQUOTE_CORS_PERMISSIVE";
pub const RECORDS_ADDR_ENV: &str = "HEALTHQUOTE_RECORDS_ADDR";
pub const RECORDS_PATH_ENV: &str = "HEALTHQUOTE_RECORDS_PATH";
pub const FRONTEND_ADDR_ENV: &str = "HEALTHQUOTE_FRONTEND_ADDR";
pub const API_URL_ENV: &str = "HEALTHQUOTE_API_URL";
pub const SESSION_TTL_ENV: &str = "HEALTHQUOTE_SESSION_TTL_MINUTES";

const DEFAULT_PREDICT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MODEL_PATH: &str = "models/premium_model.json";
const DEFAULT_RECORDS_ADDR: &str = "127.0.0.1:8001";
const DEFAULT_RECORDS_PATH: &str = "patients.json";
const DEFAULT_FRONTEND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_API_URL: &str = "http://localhost:8000/predict";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the prediction API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictConfig {
    pub addr: SocketAddr,
    pub model_path: PathBuf,
    pub cors_permissive: bool,
}

/// Settings for the record API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsConfig {
    pub addr: SocketAddr,
    pub data_path: PathBuf,
}

/// Settings for the web front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    pub addr: SocketAddr,
    pub api_url: String,
    pub session_ttl: Duration,
}

impl PredictConfig {
    /// # Errors
    /// Returns error if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            addr: parse_or(&get, PREDICT_ADDR_ENV, DEFAULT_PREDICT_ADDR)?,
            model_path: get(MODEL_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            cors_permissive: flag(&get, CORS_PERMISSIVE_ENV)?,
        })
    }
}

impl RecordsConfig {
    /// # Errors
    /// Returns error if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            addr: parse_or(&get, RECORDS_ADDR_ENV, DEFAULT_RECORDS_ADDR)?,
            data_path: get(RECORDS_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_RECORDS_PATH.to_string())
                .into(),
        })
    }
}

impl FrontendConfig {
    /// # Errors
    /// Returns error if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = get(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: API_URL_ENV,
                value: api_url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let minutes: i64 = match get(SESSION_TTL_ENV) {
            None => DEFAULT_SESSION_TTL_MINUTES,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(m) if m > 0 => m,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: SESSION_TTL_ENV,
                        value: raw,
                        reason: "expected a positive number of minutes".to_string(),
                    })
                }
            },
        };

        Ok(Self {
            addr: parse_or(&get, FRONTEND_ADDR_ENV, DEFAULT_FRONTEND_ADDR)?,
            api_url,
            session_ttl: Duration::minutes(minutes),
        })
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get(var).unwrap_or_else(|| default.to_string());
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn flag(get: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<bool, ConfigError> {
    match get(var) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value: raw,
                reason: "expected true or false".to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let predict = PredictConfig::from_lookup(lookup(&[])).expect("Should parse");
        assert_eq!(predict.addr.port(), 8000);
        assert_eq!(predict.model_path, PathBuf::from("models/premium_model.json"));
        assert!(!predict.cors_permissive);

        let records = RecordsConfig::from_lookup(lookup(&[])).expect("Should parse");
        assert_eq!(records.addr.port(), 8001);
        assert_eq!(records.data_path, PathBuf::from("patients.json"));

        let frontend = FrontendConfig::from_lookup(lookup(&[])).expect("Should parse");
        assert_eq!(frontend.addr.port(), 5000);
        assert_eq!(frontend.api_url, "http://localhost:8000/predict");
        assert_eq!(frontend.session_ttl, Duration::minutes(30));
    }

    #[test]
    fn test_overrides() {
        let predict = PredictConfig::from_lookup(lookup(&[
            (PREDICT_ADDR_ENV, "0.0.0.0:9000"),
            (MODEL_PATH_ENV, "/srv/model.json"),
            (CORS_PERMISSIVE_ENV, "TRUE"),
        ]))
        .expect("Should parse");
        assert_eq!(predict.addr.to_string(), "0.0.0.0:9000");
        assert_eq!(predict.model_path, PathBuf::from("/srv/model.json"));
        assert!(predict.cors_permissive);

        let frontend = FrontendConfig::from_lookup(lookup(&[
            (SESSION_TTL_ENV, "5"),
            (API_URL_ENV, "https://api.example.in/predict"),
        ]))
        .expect("Should parse");
        assert_eq!(frontend.session_ttl, Duration::minutes(5));
        assert_eq!(frontend.api_url, "https://api.example.in/predict");
    }

    #[test]
    fn test_invalid_values() {
        let err = RecordsConfig::from_lookup(lookup(&[(RECORDS_ADDR_ENV, "localhost")]))
            .expect_err("Should reject");
        assert!(err.to_string().contains(RECORDS_ADDR_ENV));

        assert!(PredictConfig::from_lookup(lookup(&[(CORS_PERMISSIVE_ENV, "maybe")])).is_err());
        assert!(FrontendConfig::from_lookup(lookup(&[(SESSION_TTL_ENV, "0")])).is_err());
        assert!(FrontendConfig::from_lookup(lookup(&[(API_URL_ENV, "ftp://x")])).is_err());
    }
}
