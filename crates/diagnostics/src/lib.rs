//! Diagnostics for the contact log decoder.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], and [`LineIndex`] used to
//! report fatal decode errors, assembly notes, and image writer warnings.
//! Diagnostic codes live in the [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps line numbers to byte offsets of a contact log.
///
/// Lines and columns are **0-indexed**. The log is handled as raw bytes, so
/// the index is built from `&[u8]`; text callers pass `str::as_bytes()`.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from raw log bytes.
    pub fn new(input: &[u8]) -> Self {
        let mut line_starts = vec![0usize];
        line_starts.extend(
            input
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Byte offset of the start of the given 0-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Absolute byte offset of `column` on `line`, if the line exists.
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        self.line_start(line).map(|start| start + column)
    }
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The input cannot be decoded.
    Error,
    /// Something was dropped or skipped.
    Warn,
    /// A default was applied.
    Info,
}

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first byte (0-based).
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }
}

/// A diagnostic produced while decoding, assembling, or persisting contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g., `"CLOG1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Byte span in the input log, when the diagnostic points at one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context such as `"entity"`, `"field"` or `"line"`.
    ///
    /// `BTreeMap` keeps serialized key order deterministic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Info, message, span)
    }

    /// Attach context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    let text = match id {
        codes::TRUNCATED_LINE => {
            "A line ended before a complete (entity ID, length, payload) triple \
             could be read. Every triple must fit inside its line; the whole \
             decode is abandoned because later data can no longer be attributed \
             reliably."
        }
        codes::INVALID_LENGTH_ENCODING => {
            "A length field must contain only hexadecimal digits (0-9, A-F). \
             Check that the layout's widths match the file."
        }
        codes::UNKNOWN_FIELD_CODE => {
            "The field code at the start of a line is not declared in the \
             layout. Add it to the layout's `fields` table or use the layout \
             the file was written with."
        }
        codes::MISSING_FIELD => {
            "A contact has no entry for one of the fields a record is built \
             from. The field's default was used: an empty name, an empty list, \
             or no image."
        }
        codes::INVALID_TIMESTAMP => {
            "A call log entry is not a whole number of seconds since the Unix \
             epoch and was left out of the contact's call history."
        }
        codes::IMAGE_EXISTS => {
            "An image with this contact's file name already exists in the \
             output directory. Existing files are never overwritten."
        }
        codes::INVALID_IMAGE_DATA => {
            "A contact's image payload is not valid base64, so no image file \
             was written for it."
        }
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_single_line() {
        let idx = LineIndex::new(b"86B70001");
        assert_eq!(idx.line_start(0), Some(0));
        assert_eq!(idx.line_start(1), None);
        assert_eq!(idx.offset_of(0, 7), Some(7));
    }

    #[test]
    fn line_index_two_lines() {
        let idx = LineIndex::new(b"ab\ncd");
        assert_eq!(idx.line_start(1), Some(3));
        assert_eq!(idx.offset_of(1, 1), Some(4)); // 'd'
        assert_eq!(idx.line_start(2), None);
    }

    #[test]
    fn line_index_crlf_lines() {
        let idx = LineIndex::new(b"ab\r\ncd\r\n");
        assert_eq!(idx.line_start(1), Some(4));
        // The final terminator opens an empty last line.
        assert_eq!(idx.line_start(2), Some(8));
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new(b"");
        assert_eq!(idx.offset_of(0, 0), Some(0));
        assert_eq!(idx.offset_of(1, 0), None);
    }

    #[test]
    fn line_index_offset_of() {
        let idx = LineIndex::new(b"ab\ncd\nef");
        assert_eq!(idx.offset_of(0, 1), Some(1));
        assert_eq!(idx.offset_of(2, 1), Some(7));
        assert_eq!(idx.offset_of(3, 0), None);
    }

    // ── Span ────────────────────────────────────────────────────────────

    #[test]
    #[should_panic(expected = "Span end (3) < start (5)")]
    fn span_new_inverted_panics() {
        Span::new(5, 3);
    }

    // ── Diagnostic ──────────────────────────────────────────────────────

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(codes::TRUNCATED_LINE, "line 3 is truncated", None);
        assert_eq!(format!("{d}"), "error[CLOG1001]: line 3 is truncated");
    }

    #[test]
    fn diagnostic_constructors_set_severity() {
        assert!(Diagnostic::error(codes::UNKNOWN_FIELD_CODE, "x", None).is_error());
        assert_eq!(
            Diagnostic::warn(codes::INVALID_TIMESTAMP, "x", None).severity,
            Severity::Warn
        );
        assert_eq!(
            Diagnostic::info(codes::MISSING_FIELD, "x", None).severity,
            Severity::Info
        );
    }

    #[test]
    fn all_codes_have_explanations() {
        for code in codes::ALL {
            assert!(
                explain(code).is_some(),
                "diagnostic code {code} has no explain() entry"
            );
        }
    }

    #[test]
    fn explain_unknown_code_is_none() {
        assert!(explain("CLOG9999").is_none());
    }

    #[test]
    fn diagnostic_serde_omits_none_fields() {
        let d = Diagnostic::info(codes::MISSING_FIELD, "defaulted", None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("span"), "{json}");
        assert!(!json.contains("context"), "{json}");
        assert!(json.contains(r#""severity":"info""#), "{json}");
    }

    #[test]
    fn diagnostic_context_serde_roundtrip() {
        let d = Diagnostic::warn(codes::INVALID_TIMESTAMP, "bad", Some(Span::new(4, 9)))
            .with_context(BTreeMap::from([
                ("entity".into(), "0001".into()),
                ("value".into(), "abc".into()),
            ]));
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
        assert!(json.find("entity").unwrap() < json.find("value").unwrap());
    }
}
