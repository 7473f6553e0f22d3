//! Fuzz target for structured data-channel envelopes
//!
//! # Strategy
//!
//! - Round trip: arbitrary sender/text through the encoder and back
//! - Shape attacks: envelopes with wrong field types, missing fields, extra
//!   fields and unknown kinds
//! - Deep nesting: JSON nested far beyond any real payload
//!
//! # Invariants
//!
//! - Encoded chat always decodes to the same text; an empty sender decodes as
//!   the unknown-sender label
//! - Malformed shapes return errors, never panic
//! - Nesting is bounded by the JSON parser, never overflows the stack

#![no_main]

use arbitrary::Arbitrary;
use carebridge_proto::{ChatPayload, DataMessage, UNKNOWN_SENDER};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum EnvelopeAttack {
    RoundTrip { sender: String, text: String },
    WrongTypes { kind: FieldValue, sender: FieldValue, text: FieldValue },
    UnknownKind { kind: String, extra: String },
    DeeplyNested { depth: u16 },
}

#[derive(Debug, Clone, Arbitrary)]
enum FieldValue {
    Missing,
    Null,
    Number(i64),
    Bool(bool),
    Text(String),
    Array,
}

impl FieldValue {
    fn json(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Null => Some("null".to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Text(s) => Some(format!("{s:?}")),
            Self::Array => Some("[1,2]".to_string()),
        }
    }
}

fuzz_target!(|attack: EnvelopeAttack| {
    match attack {
        EnvelopeAttack::RoundTrip { sender, text } => {
            let bytes = ChatPayload::new(sender.clone(), text.clone())
                .encode()
                .unwrap_or_else(|e| panic!("encoding valid strings failed: {e}"));

            match DataMessage::decode(&bytes) {
                Ok(DataMessage::Chat(chat)) => {
                    let expected = if sender.is_empty() { UNKNOWN_SENDER } else { sender.as_str() };
                    assert_eq!(chat.sender, expected);
                    assert_eq!(chat.text, text);
                }
                other => panic!("round trip produced {other:?}"),
            }
        }

        EnvelopeAttack::WrongTypes { kind, sender, text } => {
            let fields: Vec<String> = [("type", kind), ("sender", sender), ("text", text)]
                .iter()
                .filter_map(|(name, value)| value.json().map(|v| format!("\"{name}\":{v}")))
                .collect();
            let json = format!("{{{}}}", fields.join(","));
            let _ = DataMessage::decode(json.as_bytes());
        }

        EnvelopeAttack::UnknownKind { kind, extra } => {
            let json = unknown_envelope(&kind, &extra);
            if let Ok(message) = DataMessage::decode(json.as_bytes()) {
                if kind != "chat" {
                    assert_eq!(message, DataMessage::Unknown { kind });
                }
            }
        }

        EnvelopeAttack::DeeplyNested { depth } => {
            let depth = usize::from(depth % 4096);
            let json = format!(
                "{{\"type\":\"chat\",\"text\":{}1{}}}",
                "[".repeat(depth),
                "]".repeat(depth)
            );
            assert!(DataMessage::decode(json.as_bytes()).is_err());
        }
    }
});

/// Envelope with an arbitrary kind and an extra field. Strings are quoted with
/// `Debug`; the escapes it does not share with JSON fail to parse.
fn unknown_envelope(kind: &str, extra: &str) -> String {
    format!("{{\"type\":{kind:?},\"extra\":{extra:?}}}")
}
