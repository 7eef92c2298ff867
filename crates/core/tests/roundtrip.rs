//! Canonical re-encoding: decode, encode, decode again.

mod common;

use common::{file, letters_layout, line};
use contactlog_core::{Layout, Widths, decode_bytes, encode_table};

fn sample() -> Vec<u8> {
    file(&[
        line("TTTT", &[("0002", "1600000000"), ("0001", "0"), ("0002", "5")]),
        line("AAAA", &[("0002", "Bob"), ("0001", "Al")]),
        line("PPPP", &[("0001", "555-0100")]),
        line("AAAA", &[("0001", "Alice")]),
        line("IIII", &[("0003", "aGVsbG8="), ("0004", "")]),
        line("PPPP", &[("0001", "555-0200"), ("0002", "555-0900")]),
    ])
}

#[test]
fn encoded_table_decodes_to_equal_table() {
    let layout = letters_layout();
    let table = decode_bytes(&sample(), &layout).unwrap();
    let encoded = encode_table(&table, &layout).unwrap();
    let again = decode_bytes(&encoded, &layout).unwrap();
    assert_eq!(again, table);
}

#[test]
fn normalization_is_idempotent() {
    let layout = letters_layout();
    let once = encode_table(&decode_bytes(&sample(), &layout).unwrap(), &layout).unwrap();
    let twice = encode_table(&decode_bytes(&once, &layout).unwrap(), &layout).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn canonical_form_is_one_line_per_field() {
    let layout = letters_layout();
    let table = decode_bytes(&sample(), &layout).unwrap();
    let encoded = String::from_utf8(encode_table(&table, &layout).unwrap()).unwrap();

    let lines: Vec<_> = encoded.lines().collect();
    assert_eq!(
        lines,
        [
            "AAAA000100005Alice000200003Bob",
            "IIII000300008aGVsbG8=000400000",
            "PPPP000100008555-0100000100008555-0200000200008555-0900",
            "TTTT000100001000020000A16000000000002000015",
        ]
    );
}

#[test]
fn scalar_overwrites_are_collapsed() {
    let layout = letters_layout();
    let table = decode_bytes(&sample(), &layout).unwrap();
    let encoded = encode_table(&table, &layout).unwrap();
    let text = String::from_utf8(encoded).unwrap();
    assert_eq!(text.matches("AAAA").count(), 1);
}

#[test]
fn default_layout_roundtrip() {
    let layout = Layout::default();
    let input = b"86B7000100004Jane\n9E60000100003Doe\nD81200010000170001000010\n";
    let table = decode_bytes(input, &layout).unwrap();
    let encoded = encode_table(&table, &layout).unwrap();
    assert_eq!(decode_bytes(&encoded, &layout).unwrap(), table);
}

#[test]
fn custom_widths_roundtrip() {
    let mut layout = letters_layout();
    layout.widths = Widths {
        field_code: 4,
        entity_id: 2,
        length: 2,
    };
    let input = b"AAAA0105Alice0203Bob\nPPPP01015\n";
    let table = decode_bytes(input, &layout).unwrap();
    assert_eq!(table.scalar("first", "02"), Some("Bob"));
    let encoded = encode_table(&table, &layout).unwrap();
    assert_eq!(encoded, b"AAAA0105Alice0203Bob\nPPPP01015\n");
}
