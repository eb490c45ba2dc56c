//! Local file classification and preview parsing.
//!
//! Nothing here touches the network: a selected file is classified by its
//! declared media type, parsed locally, and reduced to the handful of
//! leading rows shown to the user before any server interaction.
//!
//! ## Why re-serialise Excel through CSV?
//!
//! Worksheet cells arrive from [`calamine`] as typed values, not text. The
//! preview pipeline flattens them through a `csv::Writer` and re-parses the
//! delimited text with the same reader the CSV path uses, so both formats
//! hit identical quoting, trimming, and row-shape behaviour. One parser to
//! test instead of two.

use crate::error::TablecastError;
use calamine::{open_workbook_auto_from_rs, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Number of leading rows kept for preview: the header plus five data rows.
pub const PREVIEW_ROWS: usize = 6;

const MIME_CSV: &str = "text/csv";
const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MIME_XLS: &str = "application/vnd.ms-excel";

/// Supported tabular formats, classified from a declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Csv,
    Excel,
}

impl MediaKind {
    /// Classify a declared media type into a supported format.
    ///
    /// Anything other than CSV or the two Excel media types is rejected;
    /// the workflow folds the rejection into an error status rather than
    /// propagating it.
    pub fn classify(media_type: &str) -> Result<MediaKind, TablecastError> {
        match media_type {
            MIME_CSV => Ok(MediaKind::Csv),
            MIME_XLSX | MIME_XLS => Ok(MediaKind::Excel),
            other => Err(TablecastError::UnsupportedMediaType {
                media_type: other.to_string(),
            }),
        }
    }
}

/// Derive a declared media type from a file path's extension.
///
/// Browsers hand the workflow a media type with the file; CLI users hand it
/// a path. `mime_guess` bridges the gap (`.csv` → `text/csv`, `.xlsx` → the
/// OOXML spreadsheet type, unknown → `application/octet-stream`).
pub fn declared_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// The leading rows of a parsed file: first row is the header.
///
/// Derived data — discarded and rebuilt on every file selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    rows: Vec<Vec<String>>,
}

impl Preview {
    /// An empty preview (no file parsed, or parsing failed).
    pub fn empty() -> Self {
        Self::default()
    }

    /// All retained rows, header first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row, if any rows were parsed.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse raw file bytes into a [`Preview`] according to the classified kind.
///
/// Keeps only the first [`PREVIEW_ROWS`] rows. Malformed content returns an
/// error; it never panics.
pub fn parse_preview(bytes: &[u8], kind: MediaKind) -> Result<Preview, TablecastError> {
    match kind {
        MediaKind::Csv => parse_csv(bytes),
        MediaKind::Excel => {
            let rows = decode_workbook(bytes)?;
            let delimited = rows_to_delimited(&rows)?;
            parse_csv(delimited.as_bytes())
        }
    }
}

/// Parse delimited text into preview rows.
///
/// No-header mode (the first row is data like any other — the preview
/// treats it as the header) and flexible record lengths, since ragged rows
/// are a preview concern, not a parse failure.
fn parse_csv(bytes: &[u8]) -> Result<Preview, TablecastError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::with_capacity(PREVIEW_ROWS);
    for record in reader.records().take(PREVIEW_ROWS) {
        let record = record.map_err(|e| TablecastError::MalformedCsv {
            detail: e.to_string(),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Preview { rows })
}

/// Decode the first worksheet of an Excel workbook into rows of cell text.
fn decode_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, TablecastError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| TablecastError::WorkbookDecode {
            detail: e.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TablecastError::WorkbookDecode {
            detail: "workbook has no worksheets".to_string(),
        })?
        .map_err(|e| TablecastError::WorkbookDecode {
            detail: e.to_string(),
        })?;

    // Only the preview window is ever needed; stop early.
    Ok(range
        .rows()
        .take(PREVIEW_ROWS)
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Re-serialise worksheet rows to delimited text for the common CSV path.
fn rows_to_delimited(rows: &[Vec<String>]) -> Result<String, TablecastError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| TablecastError::Internal(format!("re-serialise worksheet: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TablecastError::Internal(format!("re-serialise worksheet: {e}")))?;
    String::from_utf8(bytes).map_err(|e| TablecastError::Internal(format!("utf-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_supported_types() {
        assert_eq!(MediaKind::classify("text/csv").unwrap(), MediaKind::Csv);
        assert_eq!(MediaKind::classify(MIME_XLSX).unwrap(), MediaKind::Excel);
        assert_eq!(MediaKind::classify(MIME_XLS).unwrap(), MediaKind::Excel);
    }

    #[test]
    fn classify_rejects_pdf() {
        let err = MediaKind::classify("application/pdf").unwrap_err();
        assert!(matches!(err, TablecastError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(declared_media_type(Path::new("data.csv")), "text/csv");
        assert_eq!(declared_media_type(Path::new("data.xlsx")), MIME_XLSX);
        assert_eq!(declared_media_type(Path::new("data.xls")), MIME_XLS);
        assert_eq!(
            declared_media_type(Path::new("data.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn csv_preview_basic() {
        let preview = parse_preview(b"name,age\nalice,30\nbob,41\n", MediaKind::Csv).unwrap();
        assert_eq!(preview.header().unwrap(), ["name", "age"]);
        assert_eq!(preview.data_rows().len(), 2);
        assert_eq!(preview.data_rows()[1], vec!["bob", "41"]);
    }

    #[test]
    fn csv_preview_bounded_to_six_rows() {
        let mut content = String::from("h1,h2\n");
        for i in 0..20 {
            content.push_str(&format!("a{i},b{i}\n"));
        }
        let preview = parse_preview(content.as_bytes(), MediaKind::Csv).unwrap();
        assert_eq!(preview.rows().len(), PREVIEW_ROWS);
        assert_eq!(preview.data_rows().len(), PREVIEW_ROWS - 1);
    }

    #[test]
    fn csv_preview_quoted_cells() {
        let preview =
            parse_preview(b"city,note\n\"Portland, OR\",ok\n", MediaKind::Csv).unwrap();
        assert_eq!(preview.data_rows()[0][0], "Portland, OR");
    }

    #[test]
    fn csv_preview_ragged_rows_tolerated() {
        let preview = parse_preview(b"a,b,c\n1,2\n", MediaKind::Csv).unwrap();
        assert_eq!(preview.data_rows()[0].len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_preview() {
        let preview = parse_preview(b"", MediaKind::Csv).unwrap();
        assert!(preview.is_empty());
        assert!(preview.header().is_none());
        assert!(preview.data_rows().is_empty());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = parse_preview(&[0x66, 0x6f, 0xff, 0xfe, 0x2c, 0x62], MediaKind::Csv);
        assert!(matches!(err, Err(TablecastError::MalformedCsv { .. })));
    }

    #[test]
    fn garbage_bytes_are_not_a_workbook() {
        let err = parse_preview(b"definitely not a zip archive", MediaKind::Excel);
        assert!(matches!(err, Err(TablecastError::WorkbookDecode { .. })));
    }

    #[test]
    fn worksheet_rows_round_trip_through_delimiter() {
        let rows = vec![
            vec!["name".to_string(), "note".to_string()],
            vec!["alice".to_string(), "said \"hi\", left".to_string()],
        ];
        let delimited = rows_to_delimited(&rows).unwrap();
        let preview = parse_csv(delimited.as_bytes()).unwrap();
        assert_eq!(preview.rows()[1][1], "said \"hi\", left");
    }
}
