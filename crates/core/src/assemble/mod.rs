//! Pivot a decoded [`FieldTable`] into one [`ContactRecord`] per entity.
//!
//! Missing data is never an error here. An entity without a name gets an
//! empty name, one without phones or calls gets an empty list (each noted
//! with an `Info` diagnostic), and one without an image simply has none.
//! Call-log entries that are not epoch seconds are dropped with a warning.

/// The assembled contact record.
pub mod record;
/// Epoch-second parsing and formatting.
pub mod timestamp;

use std::collections::BTreeMap;

use contactlog_diagnostics::{Diagnostic, codes};
use contactlog_layout::RecordBinding;
use serde::Serialize;

use crate::codec::table::{EntityId, FieldTable};
use record::ContactRecord;
use timestamp::parse_epoch;

/// Records assembled from one table, with the notes raised along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assembly {
    /// One record per entity, in entity-ID order.
    pub records: Vec<ContactRecord>,
    /// `Info` and `Warn` diagnostics; assembly never produces errors.
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    /// Number of assembled records (equal to the table's entity count).
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Assemble every entity in `table` using the fields named by `binding`.
pub fn assemble(table: &FieldTable, binding: &RecordBinding) -> Assembly {
    let mut diagnostics = Vec::new();
    let records = table
        .entity_ids()
        .iter()
        .map(|id| assemble_one(table, binding, id, &mut diagnostics))
        .collect();
    Assembly {
        records,
        diagnostics,
    }
}

fn assemble_one(
    table: &FieldTable,
    binding: &RecordBinding,
    id: &EntityId,
    diagnostics: &mut Vec<Diagnostic>,
) -> ContactRecord {
    let key = id.as_bytes();

    let first = table.scalar(&binding.first, key).unwrap_or_else(|| {
        diagnostics.push(missing_field(id, "first", &binding.first));
        ""
    });
    let last = table.scalar(&binding.last, key).unwrap_or_else(|| {
        diagnostics.push(missing_field(id, "last", &binding.last));
        ""
    });
    let phones = match table.list(&binding.phones, key) {
        Some(phones) => phones.to_vec(),
        None => {
            diagnostics.push(missing_field(id, "phones", &binding.phones));
            Vec::new()
        }
    };
    let call_times = match table.list(&binding.call_times, key) {
        Some(raw) => parse_call_times(id, raw, diagnostics),
        None => {
            diagnostics.push(missing_field(id, "call_times", &binding.call_times));
            Vec::new()
        }
    };
    let image = table.binary(&binding.image, key).cloned();

    ContactRecord::new(id.clone(), first, last, phones, call_times, image)
}

fn parse_call_times(id: &EntityId, raw: &[String], diagnostics: &mut Vec<Diagnostic>) -> Vec<i64> {
    raw.iter()
        .filter_map(|value| {
            let parsed = parse_epoch(value);
            if parsed.is_none() {
                diagnostics.push(
                    Diagnostic::warn(
                        codes::INVALID_TIMESTAMP,
                        format!("contact {id}: call time {value:?} is not epoch seconds; skipped"),
                        None,
                    )
                    .with_context(BTreeMap::from([
                        ("entity".to_string(), id.to_string()),
                        ("value".to_string(), value.clone()),
                    ])),
                );
            }
            parsed
        })
        .collect()
}

fn missing_field(id: &EntityId, slot: &str, field: &str) -> Diagnostic {
    Diagnostic::info(
        codes::MISSING_FIELD,
        format!("contact {id} has no '{field}' value; using the default"),
        None,
    )
    .with_context(BTreeMap::from([
        ("entity".to_string(), id.to_string()),
        ("field".to_string(), field.to_string()),
        ("slot".to_string(), slot.to_string()),
    ]))
}
