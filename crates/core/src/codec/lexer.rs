use std::fmt;

use contactlog_layout::Widths;
use thiserror::Error;

/// The token a lexer was reading when the line ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePart {
    /// The field-type code at offset 0.
    FieldCode,
    /// The entity ID that opens a triple.
    EntityId,
    /// The hexadecimal length field.
    Length,
    /// The payload announced by the length field.
    Payload,
}

impl fmt::Display for LinePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinePart::FieldCode => "field code",
            LinePart::EntityId => "entity ID",
            LinePart::Length => "length field",
            LinePart::Payload => "payload",
        })
    }
}

/// A lexing failure within one line. Offsets are bytes from the line start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A token would extend past the logical end of the line.
    #[error("{part} at byte {offset} needs {needed} bytes but only {remaining} remain")]
    Truncated {
        /// Which token was being read.
        part: LinePart,
        /// Where the token starts.
        offset: usize,
        /// Bytes the token requires.
        needed: usize,
        /// Bytes left before the logical end.
        remaining: usize,
    },
    /// A length field holds something other than hexadecimal digits.
    #[error("length field {raw:?} at byte {offset} is not hexadecimal")]
    InvalidLength {
        /// Where the length field starts.
        offset: usize,
        /// The field's raw contents.
        raw: String,
    },
}

/// One `(entity ID, length, payload)` triple, borrowed from its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple<'a> {
    /// The entity the payload belongs to.
    pub entity_id: &'a [u8],
    /// The raw length field, in whatever hex case the line used.
    pub length: &'a [u8],
    /// The payload bytes (length field already consumed).
    pub payload: &'a [u8],
    /// Byte offset of the entity ID.
    pub start: usize,
    /// Byte offset one past the payload.
    pub end: usize,
}

/// A lexed line: its field code and the triples packed after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedLine<'a> {
    /// Raw field-type code.
    pub code: &'a [u8],
    /// Triples in line order.
    pub triples: Vec<Triple<'a>>,
}

/// Drop a trailing `\n`, `\r\n` or `\r` from a line.
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse a length field as a hexadecimal unsigned integer.
///
/// Only ASCII hex digits are accepted; an empty field or one that overflows
/// `usize` yields `None`.
pub fn parse_hex_len(raw: &[u8]) -> Option<usize> {
    if raw.is_empty() {
        return None;
    }
    raw.iter().try_fold(0usize, |acc, b| {
        let digit = char::from(*b).to_digit(16)?;
        acc.checked_mul(16)?.checked_add(digit as usize)
    })
}

/// Read the field-type code of a line without lexing its triples.
pub fn read_field_code<'a>(line: &'a [u8], widths: &Widths) -> Result<&'a [u8], LexError> {
    take(strip_terminator(line), 0, widths.field_code, LinePart::FieldCode)
}

/// Lex one line into its field code and triples.
///
/// The cursor starts just past the field code and reads triples until it
/// lands exactly on the logical end of the line (terminator excluded). A
/// token that would cross the logical end is an error; nothing is silently
/// truncated. A line holding only the field code yields no triples.
pub fn lex_line<'a>(line: &'a [u8], widths: &Widths) -> Result<LexedLine<'a>, LexError> {
    let line = strip_terminator(line);
    let code = take(line, 0, widths.field_code, LinePart::FieldCode)?;
    let mut cursor = widths.field_code;
    let mut triples = Vec::new();

    while cursor < line.len() {
        let start = cursor;

        let entity_id = take(line, cursor, widths.entity_id, LinePart::EntityId)?;
        cursor += widths.entity_id;

        let raw_len = take(line, cursor, widths.length, LinePart::Length)?;
        let len = parse_hex_len(raw_len).ok_or_else(|| LexError::InvalidLength {
            offset: cursor,
            raw: String::from_utf8_lossy(raw_len).into_owned(),
        })?;
        cursor += widths.length;

        let payload = take(line, cursor, len, LinePart::Payload)?;
        cursor += len;

        triples.push(Triple {
            entity_id,
            length: raw_len,
            payload,
            start,
            end: cursor,
        });
    }

    Ok(LexedLine { code, triples })
}

fn take(line: &[u8], offset: usize, needed: usize, part: LinePart) -> Result<&[u8], LexError> {
    offset
        .checked_add(needed)
        .and_then(|end| line.get(offset..end))
        .ok_or(LexError::Truncated {
            part,
            offset,
            needed,
            remaining: line.len().saturating_sub(offset),
        })
}
