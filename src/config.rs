//! Configuration for the type-negotiation client.
//!
//! All connection behaviour is controlled through [`ClientConfig`], built
//! via its [`ClientConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs, serialise them for diagnostics, and diff
//! two runs to understand why their outcomes differ.

use crate::error::TablecastError;
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::service::HttpTypeService`].
///
/// Built via [`ClientConfig::builder()`] or using
/// [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use tablecast::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://127.0.0.1:8000")
///     .timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_url(), "http://127.0.0.1:8000/api/upload/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the inference/conversion service, without a trailing
    /// slash. Default: `http://127.0.0.1:8000`.
    pub base_url: String,

    /// Path of the upload/inference endpoint. Default: `/api/upload/`.
    pub upload_path: String,

    /// Path of the conversion endpoint. Default: `/api/convert/`.
    pub convert_path: String,

    /// Per-request timeout in seconds. Default: 30.
    ///
    /// The workflow itself specifies no timeout semantics; hitting this
    /// limit surfaces as a transport failure like any other network error.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/api/upload/".to_string(),
            convert_path: "/api/convert/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the upload/inference endpoint.
    pub fn upload_url(&self) -> String {
        join_url(&self.base_url, &self.upload_path)
    }

    /// Full URL of the conversion endpoint.
    pub fn convert_url(&self) -> String {
        join_url(&self.base_url, &self.convert_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = path.into();
        self
    }

    pub fn convert_path(mut self, path: impl Into<String>) -> Self {
        self.config.convert_path = path.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, TablecastError> {
        let c = &self.config;
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(TablecastError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        for (name, path) in [("upload_path", &c.upload_path), ("convert_path", &c.convert_path)] {
            if !path.starts_with('/') {
                return Err(TablecastError::InvalidConfig(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }
        Ok(self.config)
    }
}
