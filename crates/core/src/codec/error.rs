use std::collections::BTreeMap;

use contactlog_diagnostics::{Diagnostic, LineIndex, Span, codes};
use thiserror::Error;

use super::lexer::{LexError, LinePart};

/// A fatal decode failure. Any of these aborts the whole pass.
///
/// `line` is the 0-based line index and `offset` the byte offset within that
/// line; messages show lines 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A field code, entity ID, length field or payload ran past the end of
    /// its line.
    #[error(
        "line {}: truncated {part} at byte {offset} (needs {needed} bytes, {remaining} remain)",
        .line + 1
    )]
    TruncatedLine {
        /// Line index.
        line: usize,
        /// Start of the truncated token.
        offset: usize,
        /// Which token was truncated.
        part: LinePart,
        /// Bytes the token requires.
        needed: usize,
        /// Bytes that were left.
        remaining: usize,
    },

    /// A length field is not hexadecimal.
    #[error("line {}: length field {raw:?} at byte {offset} is not hexadecimal", .line + 1)]
    InvalidLengthEncoding {
        /// Line index.
        line: usize,
        /// Start of the length field.
        offset: usize,
        /// The field's raw contents.
        raw: String,
    },

    /// The line's field code is not declared in the layout.
    #[error("line {}: unknown field code {code:?}", .line + 1)]
    UnknownFieldCode {
        /// Line index.
        line: usize,
        /// The unrecognized code.
        code: String,
    },
}

impl DecodeError {
    /// Attach a line index to a lexer error.
    pub fn from_lex(line: usize, err: LexError) -> Self {
        match err {
            LexError::Truncated {
                part,
                offset,
                needed,
                remaining,
            } => DecodeError::TruncatedLine {
                line,
                offset,
                part,
                needed,
                remaining,
            },
            LexError::InvalidLength { offset, raw } => {
                DecodeError::InvalidLengthEncoding { line, offset, raw }
            }
        }
    }

    /// 0-based index of the offending line.
    pub fn line(&self) -> usize {
        match self {
            DecodeError::TruncatedLine { line, .. }
            | DecodeError::InvalidLengthEncoding { line, .. }
            | DecodeError::UnknownFieldCode { line, .. } => *line,
        }
    }

    /// Byte offset of the failure within its line.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::TruncatedLine { offset, .. }
            | DecodeError::InvalidLengthEncoding { offset, .. } => *offset,
            DecodeError::UnknownFieldCode { .. } => 0,
        }
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::TruncatedLine { .. } => codes::TRUNCATED_LINE,
            DecodeError::InvalidLengthEncoding { .. } => codes::INVALID_LENGTH_ENCODING,
            DecodeError::UnknownFieldCode { .. } => codes::UNKNOWN_FIELD_CODE,
        }
    }

    /// Number of bytes of the line the failure covers.
    fn width(&self) -> usize {
        match self {
            DecodeError::TruncatedLine { remaining, .. } => *remaining,
            DecodeError::InvalidLengthEncoding { raw, .. } => raw.len(),
            DecodeError::UnknownFieldCode { code, .. } => code.len(),
        }
    }

    /// Convert to an error [`Diagnostic`] whose span points into the input
    /// the `index` was built from.
    pub fn to_diagnostic(&self, index: &LineIndex) -> Diagnostic {
        let span = index
            .offset_of(self.line(), self.offset())
            .map(|start| Span::new(start, start + self.width()));

        let mut context = BTreeMap::from([
            ("line".to_string(), (self.line() + 1).to_string()),
            ("offset".to_string(), self.offset().to_string()),
        ]);
        match self {
            DecodeError::TruncatedLine {
                part,
                needed,
                remaining,
                ..
            } => {
                context.insert("part".into(), part.to_string());
                context.insert("needed".into(), needed.to_string());
                context.insert("remaining".into(), remaining.to_string());
            }
            DecodeError::InvalidLengthEncoding { raw, .. } => {
                context.insert("value".into(), raw.clone());
            }
            DecodeError::UnknownFieldCode { code, .. } => {
                context.insert("code".into(), code.clone());
            }
        }

        Diagnostic::error(self.code(), self.to_string(), span).with_context(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_one_based_lines() {
        let err = DecodeError::UnknownFieldCode {
            line: 0,
            code: "ZZZZ".into(),
        };
        assert_eq!(err.to_string(), "line 1: unknown field code \"ZZZZ\"");
    }

    #[test]
    fn diagnostic_span_is_absolute() {
        let input = b"86B7000100003Bob\n86B70002zzzzzAl\n";
        let err = DecodeError::InvalidLengthEncoding {
            line: 1,
            offset: 8,
            raw: "zzzzz".into(),
        };
        let diag = err.to_diagnostic(&LineIndex::new(input));
        assert_eq!(diag.id, codes::INVALID_LENGTH_ENCODING);
        assert_eq!(diag.span, Some(Span::new(25, 30)));
        assert_eq!(&input[25..30], b"zzzzz");
        let ctx = diag.context.unwrap();
        assert_eq!(ctx["line"], "2");
        assert_eq!(ctx["value"], "zzzzz");
    }

    #[test]
    fn lex_errors_keep_their_offsets() {
        let err = DecodeError::from_lex(
            3,
            LexError::Truncated {
                part: LinePart::Payload,
                offset: 13,
                needed: 9,
                remaining: 4,
            },
        );
        assert_eq!(err.line(), 3);
        assert_eq!(err.offset(), 13);
        assert_eq!(err.code(), codes::TRUNCATED_LINE);
    }
}
