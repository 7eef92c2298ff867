//! Contact log decoder core.
//!
//! Decodes the packed, delimiter-free contact log format into a
//! [`FieldTable`] and pivots that table into one [`ContactRecord`] per
//! contact. The main entry points are [`decode_bytes`] for decoding,
//! [`assemble`] for assembly, and [`decode_contacts`] for both.

#![warn(missing_docs)]

/// Record assembly: contacts from a decoded table.
pub mod assemble;
/// The packed line format: lexer, table builder, encoder.
pub mod codec;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Codec
pub use codec::blob::Blob;
pub use codec::encode::{EncodeError, encode_line, encode_table, reencode_line};
pub use codec::error::DecodeError;
pub use codec::lexer::{LexError, LexedLine, LinePart, Triple, lex_line};
pub use codec::table::{
    EntityId, FieldColumn, FieldTable, FieldTableBuilder, build_field_table, decode_bytes,
};

// Assembly
pub use assemble::record::ContactRecord;
pub use assemble::timestamp::format_epoch;
pub use assemble::{Assembly, assemble};

// Layout and diagnostics
pub use contactlog_diagnostics::{Diagnostic, LineIndex, Severity, Span, codes};
pub use contactlog_layout::{FieldDef, FieldKind, Layout, RecordBinding, Widths};

/// Decode a whole log and assemble its contacts in one call.
///
/// Fails on the first malformed line; no records are produced in that case.
pub fn decode_contacts(input: &[u8], layout: &Layout) -> Result<Assembly, DecodeError> {
    let table = decode_bytes(input, layout)?;
    Ok(assemble(&table, &layout.record))
}
