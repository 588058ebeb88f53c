//! Backend selection and connection settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `INVENTORY_*` environment variables and the
//! configuration file, in the usual OrthoConfig precedence.

use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::outbound::rest::RestClientConfig;

const DEFAULT_BACKEND: &str = "local";
const DEFAULT_DATA_DIR: &str = "./inventory-data";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Storage medium to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// JSON document in a local directory.
    Local,
    /// PostgREST tables over HTTP.
    Remote,
}

impl FromStr for Backend {
    type Err = SettingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(SettingsError::UnknownBackend {
                value: raw.to_owned(),
            }),
        }
    }
}

/// Settings that cannot be turned into a working backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// `backend` is neither `local` nor `remote`.
    #[error("unknown backend '{value}', expected 'local' or 'remote'")]
    UnknownBackend {
        /// Rejected value.
        value: String,
    },
    /// A remote backend was selected without the named setting.
    #[error("the remote backend requires {setting}")]
    MissingRemoteSetting {
        /// Missing setting name.
        setting: &'static str,
    },
    /// `rest_url` does not parse.
    #[error("invalid rest_url '{value}': {message}")]
    InvalidRestUrl {
        /// Rejected value.
        value: String,
        /// Parser error text.
        message: String,
    },
}

/// Inventory runtime settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INVENTORY")]
pub struct InventorySettings {
    /// `local` or `remote`.
    #[ortho_config(default = String::from(DEFAULT_BACKEND))]
    pub backend: String,
    /// PostgREST project URL for the remote backend.
    pub rest_url: Option<String>,
    /// Access key for the remote backend.
    pub api_key: Option<String>,
    /// Directory holding the local document.
    pub data_dir: Option<String>,
    /// Poll cadence for the remote subscription, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Per-request timeout for the remote backend, in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl InventorySettings {
    /// Selected backend.
    ///
    /// # Errors
    ///
    /// [`SettingsError::UnknownBackend`] for unrecognised values.
    pub fn backend(&self) -> Result<Backend, SettingsError> {
        Backend::from_str(&self.backend)
    }

    /// Directory for the local document, falling back to the default.
    pub fn data_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Remote poll cadence, falling back to the default.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Remote request timeout, falling back to the default.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    /// Client settings for the remote backend.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingRemoteSetting`] when the URL or key is
    /// absent, [`SettingsError::InvalidRestUrl`] when the URL is malformed.
    pub fn rest_client_config(&self) -> Result<RestClientConfig, SettingsError> {
        let raw_url = self
            .rest_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::MissingRemoteSetting {
                setting: "rest_url",
            })?;
        let api_key = self
            .api_key
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::MissingRemoteSetting { setting: "api_key" })?;
        let base_url = Url::parse(raw_url).map_err(|err| SettingsError::InvalidRestUrl {
            value: raw_url.to_owned(),
            message: err.to_string(),
        })?;
        Ok(RestClientConfig {
            base_url,
            api_key: api_key.to_owned(),
            timeout: self.request_timeout(),
        })
    }
}
