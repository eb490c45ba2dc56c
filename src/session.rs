//! Session state and the pure event reducer.
//!
//! Everything the workflow knows lives in one explicit [`SessionState`]
//! value. Every user action and every network completion is a named
//! [`Event`], and [`SessionState::apply`] is the single transition function
//! from `(old state, event)` to new state. No ambient globals, no
//! callbacks — which is what makes the whole state machine unit-testable
//! without a UI harness or a live server.
//!
//! ## Stale completions
//!
//! Requests are not cancelled when a new file is selected. Instead, every
//! file selection assigns a fresh [`FileId`], in-flight requests capture the
//! id they were issued for, and the reducer silently drops completion
//! events whose id no longer matches the current file.

use crate::dtypes::{self, DisplayLabel};
use crate::error::ServiceError;
use crate::preview::Preview;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Session-unique identity of a selected file.
///
/// Monotonically increasing within one session; used only to match network
/// completions against the file they were issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// The user-selected file: name, declared media type, raw bytes.
///
/// Immutable once selected; replaced wholesale by the next selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHandle {
    pub id: FileId,
    pub name: String,
    pub media_type: String,
    /// Raw content, resent verbatim on both round-trips.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Outcome kind of the most recent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// User-visible message reflecting the most recent operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Where the session currently stands.
///
/// Derived from state, never stored: `Idle` until a file is selected,
/// `Previewing` until an inference succeeds, then `Inferred` with the dirty
/// flag tracking unsubmitted overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Previewing,
    Inferred { dirty: bool },
}

/// A user action or network completion consumed by the reducer.
#[derive(Debug, Clone)]
pub enum Event {
    /// User selected a file. Resets all derived state.
    FileSelected {
        name: String,
        media_type: String,
        bytes: Vec<u8>,
    },
    /// Local parsing produced preview rows.
    PreviewParsed { file: FileId, preview: Preview },
    /// Local parsing failed (unsupported type or malformed content).
    PreviewFailed { file: FileId, reason: String },
    /// The upload round-trip returned an inferred column → token mapping.
    InferenceSucceeded {
        file: FileId,
        inferred: BTreeMap<String, String>,
    },
    /// The upload round-trip failed.
    InferenceFailed { file: FileId, error: ServiceError },
    /// User picked a label for one column.
    TypeOverridden { column: String, label: DisplayLabel },
    /// The convert round-trip accepted the submitted mapping.
    ConversionSucceeded { file: FileId },
    /// The convert round-trip failed.
    ConversionFailed { file: FileId, error: ServiceError },
}

/// The whole negotiation session: selected file, preview, type mappings,
/// per-column conversion errors, and the latest status message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    next_file_id: u64,
    file: Option<FileHandle>,
    preview: Preview,
    current_types: BTreeMap<String, DisplayLabel>,
    original_types: BTreeMap<String, DisplayLabel>,
    /// Column → display label (or raw token for unknown tokens) the last
    /// conversion failed on.
    conversion_errors: BTreeMap<String, String>,
    status: Option<Status>,
}

impl SessionState {
    /// A fresh, idle session.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn file(&self) -> Option<&FileHandle> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// The user-editable column → label mapping.
    pub fn current_types(&self) -> &BTreeMap<String, DisplayLabel> {
        &self.current_types
    }

    /// Snapshot of the mapping as of the last accepted inference/convert.
    pub fn original_types(&self) -> &BTreeMap<String, DisplayLabel> {
        &self.original_types
    }

    pub fn conversion_errors(&self) -> &BTreeMap<String, String> {
        &self.conversion_errors
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// True when the user's edits differ from the last accepted mapping.
    ///
    /// Compared as whole maps, so re-selecting the inferred label flips the
    /// session back to clean.
    pub fn dirty(&self) -> bool {
        self.current_types != self.original_types
    }

    /// Convert is enabled only for a selected file with unsubmitted edits.
    pub fn can_convert(&self) -> bool {
        self.file.is_some() && self.dirty()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.file.is_none() {
            SessionPhase::Idle
        } else if self.original_types.is_empty() {
            SessionPhase::Previewing
        } else {
            SessionPhase::Inferred {
                dirty: self.dirty(),
            }
        }
    }

    /// The current mapping translated back to server tokens, as submitted
    /// to the convert endpoint.
    pub fn submission_tokens(&self) -> BTreeMap<String, String> {
        self.current_types
            .iter()
            .map(|(column, label)| (column.clone(), label.token().to_string()))
            .collect()
    }

    // ── Reducer ───────────────────────────────────────────────────────────

    /// Apply one event, producing the next state.
    ///
    /// Pure: no I/O, no clocks. Completion events carrying a [`FileId`]
    /// other than the current file's are discarded unchanged.
    pub fn apply(mut self, event: Event) -> Self {
        match event {
            Event::FileSelected {
                name,
                media_type,
                bytes,
            } => {
                self.next_file_id += 1;
                self.file = Some(FileHandle {
                    id: FileId(self.next_file_id),
                    name,
                    media_type,
                    bytes,
                });
                self.preview = Preview::empty();
                self.current_types.clear();
                self.original_types.clear();
                self.conversion_errors.clear();
                self.status = None;
                self
            }

            Event::PreviewParsed { file, preview } => {
                if !self.is_current(file) {
                    return self.discard_stale("preview", file);
                }
                self.preview = preview;
                self
            }

            Event::PreviewFailed { file, reason } => {
                if !self.is_current(file) {
                    return self.discard_stale("preview", file);
                }
                self.preview = Preview::empty();
                self.status = Some(Status::error(reason));
                self
            }

            Event::InferenceSucceeded { file, inferred } => {
                if !self.is_current(file) {
                    return self.discard_stale("inference", file);
                }
                let labels: BTreeMap<String, DisplayLabel> = inferred
                    .iter()
                    .map(|(column, token)| (column.clone(), dtypes::label_for(token)))
                    .collect();
                self.current_types = labels.clone();
                self.original_types = labels;
                self.conversion_errors.clear();
                self.status = Some(Status::success("File uploaded successfully."));
                self
            }

            Event::InferenceFailed { file, error } => {
                if !self.is_current(file) {
                    return self.discard_stale("inference", file);
                }
                // Prior inference state stays intact on failure.
                self.status = Some(match error {
                    ServiceError::Rejected { message, .. } => {
                        Status::error(format!("Upload failed: {message}"))
                    }
                    ServiceError::Transport { .. } => {
                        Status::error("Error uploading file. Please try again.")
                    }
                });
                self
            }

            Event::TypeOverridden { column, label } => {
                // Columns come only from inference; overriding an unknown
                // column is a no-op.
                if let Some(entry) = self.current_types.get_mut(&column) {
                    *entry = label;
                }
                self
            }

            Event::ConversionSucceeded { file } => {
                if !self.is_current(file) {
                    return self.discard_stale("conversion", file);
                }
                self.original_types = self.current_types.clone();
                self.conversion_errors.clear();
                self.status = Some(Status::success("Conversion successful."));
                self
            }

            Event::ConversionFailed { file, error } => {
                if !self.is_current(file) {
                    return self.discard_stale("conversion", file);
                }
                match error {
                    ServiceError::Rejected { message, details } => {
                        self.status = Some(Status::error(format!("Conversion failed: {message}")));
                        self.conversion_errors = details
                            .into_iter()
                            .map(|(column, token)| {
                                let shown = dtypes::known_label_for(&token)
                                    .map(|label| label.as_str().to_string())
                                    .unwrap_or(token);
                                (column, shown)
                            })
                            .collect();
                    }
                    ServiceError::Transport { .. } => {
                        // Error map untouched: the request may never have
                        // reached the service.
                        self.status =
                            Some(Status::error("Error during conversion. Please try again."));
                    }
                }
                self
            }
        }
    }

    fn is_current(&self, id: FileId) -> bool {
        self.file.as_ref().map(|f| f.id) == Some(id)
    }

    fn discard_stale(self, what: &str, id: FileId) -> Self {
        debug!(
            "discarding stale {} completion for {} (current: {})",
            what,
            id,
            self.file
                .as_ref()
                .map(|f| f.id.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        self
    }
}
