use crate::constants::{
    DEFAULT_APP_PORT, FACEBOOK_API_VERSION, FACEBOOK_BASE_URL, POLL_INTERVAL_SECS,
    POLL_MAX_ATTEMPTS, SWEEP_INTERVAL_SECS,
};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub api_version: String,
    pub graph_url: Url,
    pub app_port: u16,
    pub poll_interval: Duration,
    /// `None` polls until the job reaches a terminal status.
    pub poll_max_attempts: Option<u32>,
    pub sweep_interval: Duration,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    MissingEnv(String),
    #[error("Invalid URL in {name}: {reason}")]
    InvalidUrl { name: String, reason: String },
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = get("FB_ACCESS_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnv("FB_ACCESS_TOKEN".to_string()))?;

        let api_version = get("FB_API_VERSION").unwrap_or_else(|| FACEBOOK_API_VERSION.to_string());

        let raw_graph_url = get("FB_GRAPH_URL").unwrap_or_else(|| FACEBOOK_BASE_URL.to_string());
        let graph_url = Url::parse(&raw_graph_url).map_err(|e| ConfigError::InvalidUrl {
            name: "FB_GRAPH_URL".to_string(),
            reason: e.to_string(),
        })?;

        let app_port = parse_or("APP_PORT", get("APP_PORT"), DEFAULT_APP_PORT)?;
        let poll_secs = parse_or(
            "POLL_INTERVAL_SECS",
            get("POLL_INTERVAL_SECS"),
            POLL_INTERVAL_SECS,
        )?;
        let max_attempts =
            parse_or("POLL_MAX_ATTEMPTS", get("POLL_MAX_ATTEMPTS"), POLL_MAX_ATTEMPTS)?;
        let sweep_secs = parse_or(
            "SWEEP_INTERVAL_SECS",
            get("SWEEP_INTERVAL_SECS"),
            SWEEP_INTERVAL_SECS,
        )?;

        Ok(Self {
            access_token,
            api_version,
            graph_url,
            app_port,
            poll_interval: Duration::from_secs(poll_secs),
            poll_max_attempts: (max_attempts > 0).then_some(max_attempts),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
    }
}
