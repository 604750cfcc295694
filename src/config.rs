//! Settings for the `m2rest` binary and test harnesses.
//!
//! The library itself never reads the environment; callers build a
//! [`StoreConfig`] and a client. This module does that from `MAGENTO_*`
//! variables.

use std::time::Duration;

use crate::client::{MagentoClient, StoreConfig};
use crate::error::{MagentoError, Result};

pub const ENV_HOST: &str = "MAGENTO_HOST";
pub const ENV_BEARER_TOKEN: &str = "MAGENTO_BEARER_TOKEN";
pub const ENV_STORE_CODE: &str = "MAGENTO_STORE_CODE";
pub const ENV_TIMEOUT: &str = "MAGENTO_TIMEOUT";
pub const ENV_DEBUG: &str = "MAGENTO_DEBUG";

const DEFAULT_STORE_CODE: &str = "all";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Store URL, e.g. `https://shop.example.com`.
    pub host: String,
    pub bearer_token: String,
    pub store_code: String,
    pub timeout: Duration,
    pub debug: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("store_code", &self.store_code)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::ConfigMissing`] if `MAGENTO_HOST` or
    /// `MAGENTO_BEARER_TOKEN` is unset, or `MAGENTO_TIMEOUT` is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    MagentoError::ConfigMissing(format!("{key} environment variable not set"))
                })
        };

        let host = normalize_host(&required(ENV_HOST)?);
        let bearer_token = required(ENV_BEARER_TOKEN)?;
        let store_code = lookup(ENV_STORE_CODE)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_CODE.to_string());

        let timeout = match lookup(ENV_TIMEOUT) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                MagentoError::ConfigMissing(format!(
                    "{ENV_TIMEOUT} must be a number of seconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let debug = lookup(ENV_DEBUG)
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            host,
            bearer_token,
            store_code,
            timeout: Duration::from_secs(timeout),
            debug,
        })
    }

    /// The store endpoint described by these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL.
    pub fn store_config(&self) -> Result<StoreConfig> {
        StoreConfig::from_url(&self.host, self.store_code.clone())
    }

    /// Build an integration-token client.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is invalid or the client cannot be built.
    pub fn client(&self) -> Result<MagentoClient> {
        MagentoClient::builder(self.store_config()?)
            .bearer_token(&self.bearer_token)
            .timeout(self.timeout)
            .build()
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
