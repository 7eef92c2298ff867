//! Tests for the line lexer.

mod common;

use common::line;
use contactlog_core::codec::lexer::{LexError, LinePart, lex_line, strip_terminator};
use contactlog_core::{Widths, encode_line, reencode_line};

fn lex(input: &str) -> Result<Vec<(String, String)>, LexError> {
    lex_line(input.as_bytes(), &Widths::default()).map(|lexed| {
        lexed
            .triples
            .iter()
            .map(|t| {
                (
                    String::from_utf8_lossy(t.entity_id).into_owned(),
                    String::from_utf8_lossy(t.payload).into_owned(),
                )
            })
            .collect()
    })
}

// ── Valid lines ─────────────────────────────────────────────────────────

#[test]
fn single_triple() {
    let lexed = lex_line(b"AAAA000100005Alice\n", &Widths::default()).unwrap();
    assert_eq!(lexed.code, b"AAAA");
    assert_eq!(lexed.triples.len(), 1);
    assert_eq!(lexed.triples[0].entity_id, b"0001");
    assert_eq!(lexed.triples[0].payload, b"Alice");
}

#[test]
fn code_only_line_has_no_triples() {
    let lexed = lex_line(b"AAAA\n", &Widths::default()).unwrap();
    assert_eq!(lexed.code, b"AAAA");
    assert!(lexed.triples.is_empty());
}

#[test]
fn packed_triples_keep_order() {
    let input = line("PPPP", &[("0001", "555-0100"), ("0002", "555-0300"), ("0001", "555-0200")]);
    assert_eq!(
        lex(&input).unwrap(),
        vec![
            ("0001".to_string(), "555-0100".to_string()),
            ("0002".to_string(), "555-0300".to_string()),
            ("0001".to_string(), "555-0200".to_string()),
        ]
    );
}

#[test]
fn crlf_and_missing_terminator_are_equivalent() {
    let bare = line("AAAA", &[("0001", "Alice")]);
    let lf = format!("{bare}\n");
    let crlf = format!("{bare}\r\n");
    assert_eq!(lex(&bare).unwrap(), lex(&lf).unwrap());
    assert_eq!(lex(&bare).unwrap(), lex(&crlf).unwrap());
}

#[test]
fn empty_payload_is_valid() {
    assert_eq!(
        lex("IIII000100000\n").unwrap(),
        vec![("0001".to_string(), String::new())]
    );
}

#[test]
fn lowercase_hex_length() {
    let payload = "x".repeat(0x1a);
    let input = format!("AAAA00010001a{payload}");
    assert_eq!(lex(&input).unwrap()[0].1, payload);
}

#[test]
fn payload_may_contain_digits_and_codes() {
    // Payload bytes are never inspected, even when they look like a triple.
    let input = line("AAAA", &[("0001", "000200003Bob")]);
    assert_eq!(
        lex(&input).unwrap(),
        vec![("0001".to_string(), "000200003Bob".to_string())]
    );
}

#[test]
fn independent_widths() {
    let widths = Widths {
        field_code: 2,
        entity_id: 6,
        length: 3,
    };
    let lexed = lex_line(b"FN00000A003Eve", &widths).unwrap();
    assert_eq!(lexed.code, b"FN");
    assert_eq!(lexed.triples[0].entity_id, b"00000A");
    assert_eq!(lexed.triples[0].payload, b"Eve");
}

// ── Malformed lines ─────────────────────────────────────────────────────

#[test]
fn truncated_entity_id() {
    assert_eq!(
        lex("AAAA000100005Alice00\n").unwrap_err(),
        LexError::Truncated {
            part: LinePart::EntityId,
            offset: 18,
            needed: 4,
            remaining: 2,
        }
    );
}

#[test]
fn truncated_length_field() {
    assert_eq!(
        lex("AAAA000100\n").unwrap_err(),
        LexError::Truncated {
            part: LinePart::Length,
            offset: 8,
            needed: 5,
            remaining: 2,
        }
    );
}

#[test]
fn payload_longer_than_line() {
    assert_eq!(
        lex("AAAA000100009Alice\n").unwrap_err(),
        LexError::Truncated {
            part: LinePart::Payload,
            offset: 13,
            needed: 9,
            remaining: 5,
        }
    );
}

#[test]
fn payload_cannot_borrow_the_terminator() {
    // Six bytes requested, five bytes plus a newline available.
    let err = lex("AAAA000100006Alice\n").unwrap_err();
    assert!(matches!(
        err,
        LexError::Truncated {
            part: LinePart::Payload,
            ..
        }
    ));
}

#[test]
fn non_hex_length() {
    assert_eq!(
        lex("AAAA0001zzzzzAlice\n").unwrap_err(),
        LexError::InvalidLength {
            offset: 8,
            raw: "zzzzz".into(),
        }
    );
}

#[test]
fn signed_length_is_rejected() {
    assert!(matches!(
        lex("AAAA0001+0005Alice").unwrap_err(),
        LexError::InvalidLength { .. }
    ));
}

#[test]
fn line_shorter_than_code() {
    assert!(matches!(
        lex("AA").unwrap_err(),
        LexError::Truncated {
            part: LinePart::FieldCode,
            ..
        }
    ));
}

// ── Round-trip ──────────────────────────────────────────────────────────

fn assert_reencodes(input: &[u8], widths: &Widths) {
    let lexed = lex_line(input, widths).unwrap();
    let encoded = reencode_line(&lexed);
    assert_eq!(
        encoded,
        strip_terminator(input),
        "\n--- Round-trip failed ---\nInput:   {:?}\nEncoded: {:?}\n",
        String::from_utf8_lossy(input),
        String::from_utf8_lossy(&encoded),
    );
}

#[test]
fn lex_then_encode_reproduces_line() {
    let lines = [
        line("AAAA", &[("0001", "Alice")]),
        line("PPPP", &[("0001", "555-0100"), ("0001", "555-0200"), ("0003", "")]),
        line("IIII", &[("0002", "iVBORw0KGgo".repeat(40).as_str())]),
        "TTTT".to_string(),
        format!("AAAA00010001a{}", "x".repeat(0x1a)),
        format!("IIII0001001bc{}0002000ff{}", "y".repeat(0x1bc), "z".repeat(0xff)),
    ];
    for l in &lines {
        assert_reencodes(format!("{l}\n").as_bytes(), &Widths::default());
        assert_reencodes(format!("{l}\r\n").as_bytes(), &Widths::default());
    }
}

#[test]
fn lex_then_encode_with_custom_widths() {
    let widths = Widths {
        field_code: 2,
        entity_id: 3,
        length: 2,
    };
    assert_reencodes(b"FN00103Eve00202Al", &widths);
    assert_reencodes(format!("FN0010a{}", "e".repeat(10)).as_bytes(), &widths);
}

#[test]
fn canonical_encoding_uppercases_lengths() {
    let input = format!("AAAA00010001a{}", "x".repeat(0x1a));
    let lexed = lex_line(input.as_bytes(), &Widths::default()).unwrap();
    let triples = lexed.triples.iter().map(|t| (t.entity_id, t.payload));
    let canonical = encode_line(lexed.code, triples, &Widths::default()).unwrap();
    assert_eq!(canonical, format!("AAAA00010001A{}", "x".repeat(0x1a)).as_bytes());
}

// ── Robustness ──────────────────────────────────────────────────────────

struct SimpleRng(u64);

impl SimpleRng {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }
}

#[test]
fn random_lines_never_panic() {
    let mut rng = SimpleRng(0x5EED);
    let alphabet = b"0123456789ABCDEFzz\r\n";
    for _ in 0..2_000 {
        let len = (rng.next() % 64) as usize;
        let input: Vec<u8> = (0..len)
            .map(|_| alphabet[(rng.next() as usize) % alphabet.len()])
            .collect();
        if let Ok(lexed) = lex_line(&input, &Widths::default()) {
            let logical = strip_terminator(&input).len();
            let mut cursor = 4;
            for t in &lexed.triples {
                assert_eq!(t.start, cursor);
                assert!(t.end <= logical);
                cursor = t.end;
            }
            assert_eq!(cursor, logical);
        }
    }
}
