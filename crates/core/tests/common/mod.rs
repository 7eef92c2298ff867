//! Shared fixtures for `contactlog_core` integration tests.

#![allow(unreachable_pub)]

use std::collections::BTreeMap;

use contactlog_core::{FieldDef, FieldKind, Layout, RecordBinding, Widths};

/// Layout with readable four-letter codes:
/// `AAAA` first, `BBBB` last, `PPPP` phone (list), `TTTT` time (list),
/// `IIII` image (binary).
#[allow(dead_code)]
pub fn letters_layout() -> Layout {
    let fields = [
        ("AAAA", FieldDef::new("first", FieldKind::Scalar)),
        ("BBBB", FieldDef::new("last", FieldKind::Scalar)),
        ("PPPP", FieldDef::new("phone", FieldKind::List)),
        ("TTTT", FieldDef::new("time", FieldKind::List)),
        ("IIII", FieldDef::new("image", FieldKind::Binary)),
    ];
    Layout {
        id: "letters".into(),
        widths: Widths::default(),
        fields: fields
            .into_iter()
            .map(|(code, def)| (code.to_string(), def))
            .collect::<BTreeMap<_, _>>(),
        record: RecordBinding::default(),
    }
}

/// Build one line (no terminator) with default widths and uppercase hex
/// lengths.
#[allow(dead_code)]
pub fn line(code: &str, triples: &[(&str, &str)]) -> String {
    let mut out = code.to_string();
    for (id, payload) in triples {
        out.push_str(id);
        out.push_str(&format!("{:05X}", payload.len()));
        out.push_str(payload);
    }
    out
}

/// Join lines with `\n`, terminating the last one too.
#[allow(dead_code)]
pub fn file(lines: &[String]) -> Vec<u8> {
    let mut out = String::new();
    for l in lines {
        out.push_str(l);
        out.push('\n');
    }
    out.into_bytes()
}
