//! Plain-text contact report.

use std::fmt::Write as _;

use contactlog_core::ContactRecord;

const INDENT: &str = "                    ";
const SEPARATOR_WIDTH: usize = 40;

/// Render the report: a total line, then one block per contact with its
/// full name, phone numbers and formatted call log.
pub(crate) fn render_report(records: &[ContactRecord]) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Total contacts found: {}", records.len());
    for record in records {
        let _ = writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH));
        out.push_str(&render_contact(record));
    }
    out
}

fn render_contact(record: &ContactRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Full name:");
    let _ = writeln!(out, "{INDENT}{}", record.display_name());
    let _ = writeln!(out, "Phone number(s):");
    for phone in record.phone_numbers() {
        let _ = writeln!(out, "{INDENT}{phone}");
    }
    let _ = writeln!(out, "Call logs:");
    for entry in record.call_log() {
        let _ = writeln!(out, "{INDENT}{entry}");
    }
    out
}
