use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use color_eyre::eyre::{eyre, WrapErr};
use dotenv::dotenv;
use reqwest::Url;

use crate::sync::{SyncTiming, DASHBOARD_REFETCH_INTERVAL, DEFAULT_MAX_STATUS_POLLS, STATUS_POLL_INTERVAL};
use crate::view::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
const DEFAULT_LOG_FILE: &str = "craft-pulse.log";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: Url,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub log_file: PathBuf,
    pub debug: bool,
    pub sync: SyncTiming,
}

impl AppConfig {
    /// Load `.env` (if any) and read the configuration from the process
    /// environment.
    pub fn from_env() -> color_eyre::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> color_eyre::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_base = get("CRAFT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = parse_base_url(&raw_base)?;

        let timeout_secs = parse_or("CRAFT_REQUEST_TIMEOUT_SECS", get("CRAFT_REQUEST_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;
        let page_size = parse_or("CRAFT_PAGE_SIZE", get("CRAFT_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(eyre!("CRAFT_PAGE_SIZE must be at least 1"));
        }
        let max_polls = parse_or("CRAFT_MAX_STATUS_POLLS", get("CRAFT_MAX_STATUS_POLLS"), DEFAULT_MAX_STATUS_POLLS)?;

        let debug = get("DEBUG").is_some_and(|value| !matches!(value.as_str(), "0" | "false"));

        Ok(Self {
            api_base,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            page_size,
            log_file: get("CRAFT_LOG_FILE").map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            debug,
            sync: SyncTiming {
                status_poll: STATUS_POLL_INTERVAL,
                dashboard_refetch: DASHBOARD_REFETCH_INTERVAL,
                max_status_polls: (max_polls > 0).then_some(max_polls),
            },
        })
    }
}

/// The base URL must be able to carry path segments; a trailing slash is
/// added so joined paths stay under it.
fn parse_base_url(raw: &str) -> color_eyre::Result<Url> {
    let mut url = Url::parse(raw).wrap_err_with(|| format!("invalid CRAFT_API_BASE: {raw}"))?;
    if url.cannot_be_a_base() {
        return Err(eyre!("CRAFT_API_BASE cannot be used as a base URL: {raw}"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> color_eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| eyre!("invalid {key} value {raw:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> color_eyre::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_base.as_str(), "http://localhost:8080/");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_file, PathBuf::from("craft-pulse.log"));
        assert_eq!(config.sync.max_status_polls, Some(720));
        assert_eq!(config.sync.status_poll, Duration::from_secs(5));
        assert!(!config.debug);
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = config(&[
            ("CRAFT_API_BASE", "https://pulse.example.com/v1"),
            ("CRAFT_PAGE_SIZE", "25"),
            ("CRAFT_MAX_STATUS_POLLS", "0"),
            ("CRAFT_LOG_FILE", "/tmp/pulse.log"),
            ("DEBUG", "1"),
        ])
        .unwrap();
        assert_eq!(config.api_base.as_str(), "https://pulse.example.com/v1/");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.sync.max_status_polls, None);
        assert_eq!(config.log_file, PathBuf::from("/tmp/pulse.log"));
        assert!(config.debug);
    }

    #[test]
    fn malformed_values_are_reported() {
        assert!(config(&[("CRAFT_API_BASE", "not a url")]).is_err());
        assert!(config(&[("CRAFT_API_BASE", "mailto:ops@example.com")]).is_err());
        assert!(config(&[("CRAFT_PAGE_SIZE", "many")]).is_err());
        assert!(config(&[("CRAFT_PAGE_SIZE", "0")]).is_err());
        assert!(config(&[("DEBUG", "false")]).is_ok_and(|c| !c.debug));
    }
}
