//! End-to-end workflow tests for tablecast.
//!
//! These drive the full negotiation workflow — select, upload, override,
//! convert — against a scripted [`TypeService`] double, so every network
//! outcome can be replayed deterministically without a live backend.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use tablecast::session::Event;
use tablecast::{
    workflow, DisplayLabel, FileHandle, ServiceError, SessionPhase, SessionState, StatusKind,
    TypeService,
};

// ── Scripted service double ──────────────────────────────────────────────────

/// Replays queued responses and records what the workflow submitted.
#[derive(Default)]
struct ScriptedService {
    infer_responses: Mutex<VecDeque<Result<BTreeMap<String, String>, ServiceError>>>,
    convert_responses: Mutex<VecDeque<Result<(), ServiceError>>>,
    submitted_data_types: Mutex<Vec<BTreeMap<String, String>>>,
}

impl ScriptedService {
    fn with_inference(pairs: &[(&str, &str)]) -> Self {
        let service = Self::default();
        service.push_inference(Ok(to_map(pairs)));
        service
    }

    fn push_inference(&self, response: Result<BTreeMap<String, String>, ServiceError>) {
        self.infer_responses.lock().unwrap().push_back(response);
    }

    fn push_convert(&self, response: Result<(), ServiceError>) {
        self.convert_responses.lock().unwrap().push_back(response);
    }

    fn last_submitted(&self) -> BTreeMap<String, String> {
        self.submitted_data_types
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("convert was never called")
    }
}

#[async_trait]
impl TypeService for ScriptedService {
    async fn infer_types(
        &self,
        _file: &FileHandle,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        self.infer_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected infer_types call")
    }

    async fn convert(
        &self,
        _file: &FileHandle,
        data_types: &BTreeMap<String, String>,
    ) -> Result<(), ServiceError> {
        self.submitted_data_types
            .lock()
            .unwrap()
            .push(data_types.clone());
        self.convert_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected convert call")
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn select_people_csv(state: SessionState) -> SessionState {
    workflow::select_file(
        state,
        "people.csv",
        "text/csv",
        b"age,name\n30,alice\n41,bob\n".to_vec(),
    )
}

fn assert_success(state: &SessionState, context: &str) {
    let status = state.status().unwrap_or_else(|| panic!("[{context}] no status"));
    assert_eq!(
        status.kind,
        StatusKind::Success,
        "[{context}] expected success, got: {}",
        status.text
    );
}

fn rejected(message: &str, details: &[(&str, &str)]) -> ServiceError {
    ServiceError::Rejected {
        message: message.to_string(),
        details: to_map(details),
    }
}

// ── Selection & preview ──────────────────────────────────────────────────────

#[test]
fn csv_selection_previews_first_rows() {
    let state = select_people_csv(SessionState::new());
    assert_eq!(state.phase(), SessionPhase::Previewing);
    assert_eq!(state.preview().header().unwrap(), ["age", "name"]);
    assert_eq!(state.preview().data_rows().len(), 2);
}

#[test]
fn pdf_selection_errors_without_preview() {
    let state = workflow::select_file(
        SessionState::new(),
        "report.pdf",
        "application/pdf",
        b"%PDF-1.7 ...".to_vec(),
    );
    assert!(state.preview().is_empty());
    let status = state.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Please upload a CSV or Excel file.");
}

#[test]
fn select_path_reads_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "age,name\n30,alice\n").unwrap();

    let state = workflow::select_path(SessionState::new(), &path).unwrap();
    assert_eq!(state.file().unwrap().media_type, "text/csv");
    assert_eq!(state.preview().header().unwrap(), ["age", "name"]);
}

// ── Upload & inference ───────────────────────────────────────────────────────

#[tokio::test]
async fn inference_translates_tokens_to_labels() {
    let service = ScriptedService::with_inference(&[("age", "Int64"), ("name", "object")]);

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;

    assert_success(&state, "upload");
    assert_eq!(state.current_types()["age"], DisplayLabel::Integer);
    assert_eq!(state.current_types()["name"], DisplayLabel::Text);
    assert!(!state.dirty(), "fresh inference must be clean");
    assert_eq!(state.phase(), SessionPhase::Inferred { dirty: false });
}

#[tokio::test]
async fn unknown_token_falls_back_to_text() {
    let service = ScriptedService::with_inference(&[("geo", "geometry")]);

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;

    assert_eq!(state.current_types()["geo"], DisplayLabel::Text);
    // And it re-submits as the default raw token.
    assert_eq!(state.submission_tokens()["geo"], "object");
}

#[tokio::test]
async fn upload_rejection_sets_status_and_keeps_prior_inference() {
    let service = ScriptedService::with_inference(&[("age", "Int64")]);
    service.push_inference(Err(rejected("No file uploaded.", &[])));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;
    assert_success(&state, "first upload");

    let state = workflow::upload(state, &service).await;
    let status = state.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.text.contains("Upload failed: No file uploaded."));
    // Prior inference survives the failed refresh.
    assert_eq!(state.current_types()["age"], DisplayLabel::Integer);
}

#[tokio::test]
async fn upload_transport_failure_is_generic() {
    let service = ScriptedService::default();
    service.push_inference(Err(ServiceError::Transport {
        reason: "connection refused".into(),
    }));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;

    let status = state.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Error uploading file. Please try again.");
}

// ── Override & convert ───────────────────────────────────────────────────────

#[tokio::test]
async fn override_then_convert_submits_reverse_mapped_tokens() {
    let service = ScriptedService::with_inference(&[("age", "Int64"), ("name", "object")]);
    service.push_convert(Ok(()));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;

    let state = state.apply(Event::TypeOverridden {
        column: "age".into(),
        label: DisplayLabel::Float,
    });
    assert!(state.dirty());
    assert!(state.can_convert());

    let state = workflow::convert(state, &service).await;

    assert_eq!(
        service.last_submitted(),
        to_map(&[("age", "float64"), ("name", "object")])
    );
    assert_success(&state, "convert");
    assert_eq!(state.original_types(), state.current_types());
    assert!(!state.dirty(), "successful convert must flip to clean");
    assert!(state.conversion_errors().is_empty());
}

#[tokio::test]
async fn convert_rejection_maps_details_into_error_map() {
    let service = ScriptedService::with_inference(&[("age", "Int64"), ("name", "object")]);
    service.push_convert(Err(rejected("bad types", &[("age", "float64")])));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;
    let state = state.apply(Event::TypeOverridden {
        column: "age".into(),
        label: DisplayLabel::Float,
    });
    let state = workflow::convert(state, &service).await;

    let status = state.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.text.contains("bad types"));
    assert_eq!(state.conversion_errors()["age"], "Float");
    // The edit is still pending: dirty remains set for a retry.
    assert!(state.dirty());
}

#[tokio::test]
async fn convert_transport_failure_preserves_error_map() {
    let service = ScriptedService::with_inference(&[("age", "Int64")]);
    service.push_convert(Err(rejected("bad types", &[("age", "float64")])));
    service.push_convert(Err(ServiceError::Transport {
        reason: "timed out".into(),
    }));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;
    let state = state.apply(Event::TypeOverridden {
        column: "age".into(),
        label: DisplayLabel::Float,
    });
    let state = workflow::convert(state, &service).await;
    assert_eq!(state.conversion_errors()["age"], "Float");

    let state = workflow::convert(state, &service).await;
    assert_eq!(
        state.status().unwrap().text,
        "Error during conversion. Please try again."
    );
    assert_eq!(state.conversion_errors()["age"], "Float");
}

#[tokio::test]
async fn convert_tolerates_a_clean_session() {
    let service = ScriptedService::with_inference(&[("age", "Int64")]);
    service.push_convert(Ok(()));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;
    assert!(!state.can_convert());

    // The gate is advisory; invoking convert anyway submits the clean map.
    let state = workflow::convert(state, &service).await;
    assert_eq!(service.last_submitted(), to_map(&[("age", "Int64")]));
    assert_success(&state, "clean convert");
}

// ── Re-selection ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_selection_resets_inference_and_errors() {
    let service = ScriptedService::with_inference(&[("age", "Int64")]);
    service.push_convert(Err(rejected("bad types", &[("age", "float64")])));

    let state = select_people_csv(SessionState::new());
    let state = workflow::upload(state, &service).await;
    let state = state.apply(Event::TypeOverridden {
        column: "age".into(),
        label: DisplayLabel::Float,
    });
    let state = workflow::convert(state, &service).await;
    assert!(!state.conversion_errors().is_empty());

    let state = select_people_csv(state);
    assert_eq!(state.phase(), SessionPhase::Previewing);
    assert!(state.current_types().is_empty());
    assert!(state.original_types().is_empty());
    assert!(state.conversion_errors().is_empty());
    assert!(!state.dirty());
    assert!(!state.preview().is_empty(), "new file still previews");
}
