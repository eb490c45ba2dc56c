//! # tablecast
//!
//! Preview tabular files (CSV/Excel) locally and negotiate per-column data
//! types with a remote inference service.
//!
//! ## Why this crate?
//!
//! Re-typing a freshly uploaded dataset is a conversation, not a one-shot
//! call: the service proposes a type per column, the user corrects a few,
//! and only the corrected set is worth a conversion request. This crate
//! implements that conversation as an explicit, UI-free state machine —
//! select, preview, infer, override, convert — so any front end (the
//! bundled CLI, a desktop shell, a web view) can drive it and test it
//! without a live backend.
//!
//! ## Workflow Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Select    classify by media type, parse a 6-row local preview
//!  ├─ 2. Upload    POST the raw file; receive column → dtype tokens
//!  ├─ 3. Translate tokens → display labels (Text, Date, Integer, …)
//!  ├─ 4. Override  user edits labels; dirty = current ≠ original
//!  └─ 5. Convert   POST file + token mapping; per-column errors surfaced
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablecast::{workflow, ClientConfig, DisplayLabel, HttpTypeService, SessionState};
//! use tablecast::session::Event;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = HttpTypeService::new(ClientConfig::default())?;
//!
//!     let state = workflow::select_path(SessionState::new(), "people.csv".as_ref())?;
//!     let state = workflow::upload(state, &service).await;
//!
//!     let state = state.apply(Event::TypeOverridden {
//!         column: "age".into(),
//!         label: DisplayLabel::Float,
//!     });
//!     let state = workflow::convert(state, &service).await;
//!
//!     if let Some(status) = state.status() {
//!         println!("{}", status.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tablecast` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! tablecast = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dtypes;
pub mod error;
pub mod preview;
pub mod service;
pub mod session;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use dtypes::{label_for, token_for, DisplayLabel, DEFAULT_TOKEN};
pub use error::{ServiceError, TablecastError};
pub use preview::{MediaKind, Preview, PREVIEW_ROWS};
pub use service::{HttpTypeService, TypeService};
pub use session::{FileHandle, FileId, SessionPhase, SessionState, Status, StatusKind};
