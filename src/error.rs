//! Error types for the tablecast library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TablecastError`] — **Local**: the file could not be read, classified,
//!   or parsed, or the configuration is invalid. Returned as
//!   `Err(TablecastError)` from the parsing and config entry points.
//!
//! * [`ServiceError`] — **Round-trip**: one of the two network calls
//!   (upload, convert) failed. Carried inside a completion
//!   [`crate::session::Event`] and folded into the session's status message
//!   (and, for convert, its per-column error map) rather than propagated.
//!
//! The separation matches the workflow's tolerance policy: nothing here is
//! fatal to a session. A bad file yields an empty preview plus an error
//! status; a failed round-trip leaves previously fetched state intact.

use std::path::PathBuf;
use thiserror::Error;

/// Local errors raised while selecting, classifying, or parsing a file,
/// or while building a configuration.
///
/// Network failures use [`ServiceError`] and travel inside session events
/// rather than being propagated here.
#[derive(Debug, Error)]
pub enum TablecastError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The declared media type is neither CSV nor Excel.
    #[error("Unsupported file type '{media_type}': expected CSV or Excel")]
    UnsupportedMediaType { media_type: String },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The CSV content could not be parsed into rows.
    #[error("Malformed CSV content: {detail}")]
    MalformedCsv { detail: String },

    /// The Excel workbook could not be decoded, or it has no worksheet.
    #[error("Failed to decode workbook: {detail}")]
    WorkbookDecode { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed network round-trip to the type service.
///
/// Stored inside [`crate::session::Event::InferenceFailed`] and
/// [`crate::session::Event::ConversionFailed`]; the reducer turns it into a
/// status message. Serialisable so it survives into `--json` CLI output.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ServiceError {
    /// The service answered with a non-2xx status. `message` is the decoded
    /// `error` field of the body when present, otherwise the HTTP status
    /// line. `details` maps column names to the token that failed to apply
    /// (convert endpoint only; empty otherwise).
    #[error("Service rejected the request: {message}")]
    Rejected {
        message: String,
        details: std::collections::BTreeMap<String, String>,
    },

    /// The request never produced a decodable response: connection refused,
    /// timeout, or a malformed body.
    #[error("Transport failure: {reason}")]
    Transport { reason: String },
}

impl ServiceError {
    /// True when the failure carries per-column detail worth displaying.
    pub fn has_details(&self) -> bool {
        matches!(self, ServiceError::Rejected { details, .. } if !details.is_empty())
    }
}
