//! The packed contact log format: lexing, table building, and re-encoding.
//!
//! A line is a fixed-width field code followed by zero or more packed
//! `(entity ID, hex length, payload)` triples with no separators:
//!
//! ```text
//! 86B7 0001 00005 Alice 0002 00003 Bob
//! ^code ^id ^len  ^payload
//! ```
//!
//! (spaces added for readability; the real format has none).

/// Base64-serialized byte payloads.
pub mod blob;
/// Canonical writer for the packed format.
pub mod encode;
/// Fatal decode errors.
pub mod error;
/// Line lexer.
pub mod lexer;
/// Field table and its builder.
pub mod table;
