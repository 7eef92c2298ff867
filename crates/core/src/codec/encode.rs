use contactlog_layout::{Layout, Widths};
use thiserror::Error;

use super::lexer::LexedLine;
use super::table::FieldTable;

/// Errors raised while writing the packed format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// No field code is declared for a table column.
    #[error("field '{0}' is not declared in the layout")]
    UndeclaredField(String),

    /// A field code does not match the configured width.
    #[error("field code {code:?} is not {expected} bytes wide")]
    FieldCodeWidth {
        /// The offending code.
        code: String,
        /// Configured field-code width.
        expected: usize,
    },

    /// An entity ID does not match the configured width.
    #[error("entity ID {id:?} is not {expected} bytes wide")]
    EntityIdWidth {
        /// The offending ID.
        id: String,
        /// Configured entity-ID width.
        expected: usize,
    },

    /// A payload is longer than the length field can express.
    #[error("payload of {len} bytes exceeds the {max}-byte limit of the length field")]
    PayloadTooLong {
        /// Payload length.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },
}

/// Write one line (without terminator) from a field code and its
/// `(entity ID, payload)` pairs.
///
/// Length fields are written as zero-padded uppercase hex.
pub fn encode_line<'a, I>(code: &[u8], triples: I, widths: &Widths) -> Result<Vec<u8>, EncodeError>
where
    I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
{
    if code.len() != widths.field_code {
        return Err(EncodeError::FieldCodeWidth {
            code: String::from_utf8_lossy(code).into_owned(),
            expected: widths.field_code,
        });
    }
    let max = widths.max_payload_len();

    let mut out = code.to_vec();
    for (id, payload) in triples {
        if id.len() != widths.entity_id {
            return Err(EncodeError::EntityIdWidth {
                id: String::from_utf8_lossy(id).into_owned(),
                expected: widths.entity_id,
            });
        }
        if payload.len() > max {
            return Err(EncodeError::PayloadTooLong {
                len: payload.len(),
                max,
            });
        }
        out.extend_from_slice(id);
        out.extend_from_slice(format!("{:0width$X}", payload.len(), width = widths.length).as_bytes());
        out.extend_from_slice(payload);
    }
    Ok(out)
}

/// Write a lexed line back out (without terminator) exactly as it was read.
///
/// Length fields are copied verbatim, so a line with lowercase hex lengths
/// comes back unchanged. Use [`encode_line`] for the canonical form.
pub fn reencode_line(lexed: &LexedLine<'_>) -> Vec<u8> {
    let mut out = lexed.code.to_vec();
    for triple in &lexed.triples {
        out.extend_from_slice(triple.entity_id);
        out.extend_from_slice(triple.length);
        out.extend_from_slice(triple.payload);
    }
    out
}

/// Write a table back out in canonical form: one `\n`-terminated line per
/// field in name order, entities in ID order, list values in their original
/// order. Decoding the result with the same layout gives an equal table.
pub fn encode_table(table: &FieldTable, layout: &Layout) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for (name, column) in table.columns() {
        let code = layout
            .code_for(name)
            .ok_or_else(|| EncodeError::UndeclaredField(name.to_string()))?;
        let payloads = column.payloads();
        let triples = payloads
            .iter()
            .map(|(id, payload)| (id.as_bytes(), *payload));
        out.extend(encode_line(code.as_bytes(), triples, &layout.widths)?);
        out.push(b'\n');
    }
    Ok(out)
}
