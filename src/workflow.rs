//! Workflow entry points: the discrete user actions, in order.
//!
//! Each function takes the session state by value, performs at most one
//! piece of I/O, and returns the next state with the completion event
//! already applied. The UI-free shape keeps the sequencing rules in one
//! place: selection parses locally and resets derived state, upload and
//! convert are serialised round-trips, and every completion is tagged with
//! the [`crate::session::FileId`] it was issued for so a stale response
//! cannot clobber a newer file's session.
//!
//! # Errors
//!
//! Nothing here returns a network error. Round-trip failures fold into the
//! returned state's status message (and per-column error map); only
//! [`select_path`] can fail, and only for local file-system reasons.

use crate::error::TablecastError;
use crate::preview::{self, MediaKind};
use crate::service::TypeService;
use crate::session::{Event, SessionState};
use std::path::Path;
use tracing::{debug, info};

/// Status text for a selection that is neither CSV nor Excel.
const UNSUPPORTED_MSG: &str = "Please upload a CSV or Excel file.";

/// Select a file: classify it, parse a local preview, reset derived state.
///
/// Unsupported media types and malformed content produce an empty preview
/// plus an error status on the returned state; the selection itself always
/// takes effect, superseding any in-flight request for the previous file.
pub fn select_file(
    state: SessionState,
    name: impl Into<String>,
    media_type: impl Into<String>,
    bytes: Vec<u8>,
) -> SessionState {
    let name = name.into();
    let media_type = media_type.into();
    info!("selected '{}' ({}, {} bytes)", name, media_type, bytes.len());

    let parsed = MediaKind::classify(&media_type).and_then(|kind| preview::parse_preview(&bytes, kind));

    let state = state.apply(Event::FileSelected {
        name,
        media_type,
        bytes,
    });
    let id = match state.file() {
        Some(file) => file.id,
        None => return state,
    };

    match parsed {
        Ok(preview) => state.apply(Event::PreviewParsed { file: id, preview }),
        Err(TablecastError::UnsupportedMediaType { .. }) => state.apply(Event::PreviewFailed {
            file: id,
            reason: UNSUPPORTED_MSG.to_string(),
        }),
        Err(e) => state.apply(Event::PreviewFailed {
            file: id,
            reason: format!("Could not read the file: {e}"),
        }),
    }
}

/// Select a file from disk, deriving its declared media type from the
/// extension. CLI convenience over [`select_file`].
pub fn select_path(state: SessionState, path: &Path) -> Result<SessionState, TablecastError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TablecastError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => TablecastError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TablecastError::Internal(format!("reading '{}': {e}", path.display())),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = preview::declared_media_type(path);

    Ok(select_file(state, name, media_type, bytes))
}

/// Upload the selected file for type inference.
///
/// No-op (state returned unchanged) when no file is selected. On success
/// both the current and original type mappings are set to the translated
/// inference; on failure the prior mappings survive and only the status
/// changes.
pub async fn upload(state: SessionState, service: &dyn TypeService) -> SessionState {
    let file = match state.file() {
        Some(file) => file.clone(),
        None => {
            debug!("upload requested with no file selected");
            return state;
        }
    };

    match service.infer_types(&file).await {
        Ok(inferred) => state.apply(Event::InferenceSucceeded {
            file: file.id,
            inferred,
        }),
        Err(error) => state.apply(Event::InferenceFailed {
            file: file.id,
            error,
        }),
    }
}

/// Submit the current mapping, translated back to server tokens, for
/// server-side conversion.
///
/// Normally reached only while dirty (the enable gate is
/// [`SessionState::can_convert`]), but tolerates any state: with no file
/// selected it returns unchanged, and a clean mapping is simply submitted
/// as-is.
pub async fn convert(state: SessionState, service: &dyn TypeService) -> SessionState {
    let file = match state.file() {
        Some(file) => file.clone(),
        None => {
            debug!("convert requested with no file selected");
            return state;
        }
    };
    if !state.dirty() {
        debug!("convert requested on a clean session");
    }

    let tokens = state.submission_tokens();
    match service.convert(&file, &tokens).await {
        Ok(()) => state.apply(Event::ConversionSucceeded { file: file.id }),
        Err(error) => state.apply(Event::ConversionFailed {
            file: file.id,
            error,
        }),
    }
}
