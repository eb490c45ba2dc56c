//! The opaque HTTP boundary: upload/inference and conversion round-trips.
//!
//! The service is reached through the [`TypeService`] trait so the workflow
//! and its tests never depend on a live backend — integration tests script
//! a double, embedders can wrap the real client with middleware. The one
//! production implementation, [`HttpTypeService`], speaks the wire protocol
//! of the inference backend: multipart `POST`s, JSON bodies.
//!
//! ## Failure mapping
//!
//! Every failure collapses into one of two [`ServiceError`] shapes. A
//! non-2xx response decodes its body for the optional `error` message and
//! per-column `details` (falling back to the HTTP status line); anything
//! that prevents a decodable response at all — refused connection, timeout,
//! malformed success body — is a transport failure. Neither shape is ever
//! propagated as `Err` past the workflow: completions fold into session
//! state.

use crate::config::ClientConfig;
use crate::error::{ServiceError, TablecastError};
use crate::session::FileHandle;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Multipart field name carrying the raw file on both endpoints.
const FIELD_FILE: &str = "file";
/// Multipart field name carrying the JSON-encoded token mapping on convert.
const FIELD_DATA_TYPES: &str = "dataTypes";

/// Successful upload response: column name → inferred type token.
#[derive(Debug, Clone, Deserialize)]
pub struct InferredTypes {
    pub inferred_types: BTreeMap<String, String>,
}

/// Failure body shared by both endpoints. All fields optional; an empty
/// object (or no JSON at all) still maps to a usable rejection.
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<BTreeMap<String, String>>,
}

/// The two server round-trips the workflow performs.
#[async_trait]
pub trait TypeService: Send + Sync {
    /// Upload the file and receive the inferred column → token mapping.
    async fn infer_types(&self, file: &FileHandle)
        -> Result<BTreeMap<String, String>, ServiceError>;

    /// Submit the file plus a column → token mapping for server-side
    /// re-typing. Success contents are opaque to the workflow.
    async fn convert(
        &self,
        file: &FileHandle,
        data_types: &BTreeMap<String, String>,
    ) -> Result<(), ServiceError>;
}

/// `reqwest`-backed [`TypeService`] for the real backend.
#[derive(Debug, Clone)]
pub struct HttpTypeService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTypeService {
    /// Build a client for the configured endpoints.
    pub fn new(config: ClientConfig) -> Result<Self, TablecastError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TablecastError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The file as a multipart part, name and media type attached.
    fn file_part(file: &FileHandle) -> Result<Part, ServiceError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| ServiceError::Transport {
                reason: format!("building multipart body: {e}"),
            })
    }

    /// Decode a non-2xx response into a rejection.
    async fn rejection(response: reqwest::Response) -> ServiceError {
        let status_line = response.status().to_string();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        rejection_from(status_line, body)
    }
}

/// Fold a status line and decoded body into [`ServiceError::Rejected`].
fn rejection_from(status_line: String, body: ErrorBody) -> ServiceError {
    ServiceError::Rejected {
        message: body.error.unwrap_or(status_line),
        details: body.details.unwrap_or_default(),
    }
}

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport {
        reason: e.to_string(),
    }
}

#[async_trait]
impl TypeService for HttpTypeService {
    async fn infer_types(
        &self,
        file: &FileHandle,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        let url = self.config.upload_url();
        info!("uploading '{}' ({} bytes) to {}", file.name, file.bytes.len(), url);

        let form = Form::new().part(FIELD_FILE, Self::file_part(file)?);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let decoded: InferredTypes = response.json().await.map_err(|e| ServiceError::Transport {
            reason: format!("decoding inference response: {e}"),
        })?;
        debug!("inferred {} columns", decoded.inferred_types.len());
        Ok(decoded.inferred_types)
    }

    async fn convert(
        &self,
        file: &FileHandle,
        data_types: &BTreeMap<String, String>,
    ) -> Result<(), ServiceError> {
        let url = self.config.convert_url();
        info!(
            "converting '{}' with {} column types via {}",
            file.name,
            data_types.len(),
            url
        );

        let encoded = serde_json::to_string(data_types).map_err(|e| ServiceError::Transport {
            reason: format!("encoding data types: {e}"),
        })?;
        let form = Form::new()
            .part(FIELD_FILE, Self::file_part(file)?)
            .text(FIELD_DATA_TYPES, encoded);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // Success contents are opaque; an undecodable body is not a failure.
        if let Err(e) = response.json::<serde_json::Value>().await {
            debug!("ignoring undecodable convert success body: {e}");
        }
        Ok(())
    }
}
