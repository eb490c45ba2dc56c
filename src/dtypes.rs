//! The fixed type vocabulary: server tokens ↔ user-facing display labels.
//!
//! The inference service speaks pandas-style dtype tokens (`float64`,
//! `datetime64[ns]`, …); users pick from a closed set of display labels
//! ("Float", "Date", …). Both directions are precomputed once at startup
//! from a single canonical `(token, label)` list, so the reverse map can
//! never drift from the forward one.
//!
//! ## Lossy fallbacks
//!
//! The server vocabulary is open-ended — a newer backend may emit tokens
//! this build has never seen. Translation is therefore total in both
//! directions: an unknown token maps to [`DisplayLabel::Text`], and the
//! reverse direction falls back to [`DEFAULT_TOKEN`]. The round-trip
//! `unknown → Text → "object"` is deliberate and covered by tests.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Token a display label re-submits as when the label has no table entry.
///
/// `object` is the token paired with the fallback [`DisplayLabel::Text`],
/// so unknown-token round-trips land on it.
pub const DEFAULT_TOKEN: &str = "object";

/// User-facing name for a column data type.
///
/// The set is closed: every value the session ever stores for a column is
/// one of these eight labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisplayLabel {
    Text,
    Date,
    Integer,
    Float,
    Category,
    #[serde(rename = "True/False")]
    TrueFalse,
    Complex,
    Duration,
}

/// The single canonical `(token, label)` table.
///
/// Everything else in this module — forward map, reverse map, the CLI's
/// label listing — derives from this array.
pub const CANONICAL: [(&str, DisplayLabel); 8] = [
    ("complex128", DisplayLabel::Complex),
    ("datetime64[ns]", DisplayLabel::Date),
    ("timedelta64[ns]", DisplayLabel::Duration),
    ("Int64", DisplayLabel::Integer),
    ("float64", DisplayLabel::Float),
    ("object", DisplayLabel::Text),
    ("category", DisplayLabel::Category),
    ("bool", DisplayLabel::TrueFalse),
];

static FORWARD: Lazy<HashMap<&'static str, DisplayLabel>> =
    Lazy::new(|| CANONICAL.iter().copied().collect());

static REVERSE: Lazy<HashMap<DisplayLabel, &'static str>> =
    Lazy::new(|| CANONICAL.iter().map(|&(token, label)| (label, token)).collect());

/// Translate a server token to its display label.
///
/// Unknown tokens fall back to [`DisplayLabel::Text`].
pub fn label_for(token: &str) -> DisplayLabel {
    FORWARD.get(token).copied().unwrap_or(DisplayLabel::Text)
}

/// Translate a server token to its display label, without the fallback.
///
/// Used when a raw pass-through is wanted for unknown tokens (the
/// per-column conversion-error display).
pub fn known_label_for(token: &str) -> Option<DisplayLabel> {
    FORWARD.get(token).copied()
}

/// Translate a display label back to its server token.
///
/// The label set is closed so every label has a table entry; the
/// [`DEFAULT_TOKEN`] fallback exists to keep the function total should the
/// table and the enum ever disagree.
pub fn token_for(label: DisplayLabel) -> &'static str {
    REVERSE.get(&label).copied().unwrap_or(DEFAULT_TOKEN)
}

impl DisplayLabel {
    /// All labels, in canonical table order. Drives the CLI's
    /// "available labels" listing and the override dropdown of embedders.
    pub fn all() -> impl Iterator<Item = DisplayLabel> {
        CANONICAL.into_iter().map(|(_, label)| label)
    }

    /// The label's user-facing text.
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayLabel::Text => "Text",
            DisplayLabel::Date => "Date",
            DisplayLabel::Integer => "Integer",
            DisplayLabel::Float => "Float",
            DisplayLabel::Category => "Category",
            DisplayLabel::TrueFalse => "True/False",
            DisplayLabel::Complex => "Complex",
            DisplayLabel::Duration => "Duration",
        }
    }

    /// The server token this label re-submits as.
    pub fn token(self) -> &'static str {
        token_for(self)
    }
}

impl fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayLabel {
    type Err = String;

    /// Parse a label from user input, case-insensitively.
    ///
    /// "true/false" and "bool" are both accepted for [`DisplayLabel::TrueFalse`]
    /// since that is what people type at a shell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        for label in DisplayLabel::all() {
            if label.as_str().eq_ignore_ascii_case(normalized) {
                return Ok(label);
            }
        }
        if normalized.eq_ignore_ascii_case("bool") || normalized.eq_ignore_ascii_case("boolean") {
            return Ok(DisplayLabel::TrueFalse);
        }
        Err(format!(
            "unknown display label '{}' (expected one of: {})",
            s,
            DisplayLabel::all()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}
