//! Data-channel envelopes.
//!
//! Application messages ride the media session's side-channel as UTF-8 JSON
//! objects discriminated by a `type` field:
//!
//! ```text
//! {"type":"chat","sender":"<identity>","text":"<message>"}
//! ```
//!
//! `chat` is the only kind this client understands. Any other `type` value is
//! reserved: it decodes to [`DataMessage::Unknown`] so receivers can ignore it
//! without treating it as corruption.
//!
//! # Invariants
//!
//! - Encoding goes through `serde_json` only, so the wire bytes are always
//!   valid UTF-8 and decoding them reproduces the exact sender and text.
//! - Decoding never panics; every rejected payload maps to a
//!   [`ProtocolError`].

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Discriminator value for chat envelopes.
pub const CHAT_KIND: &str = "chat";

/// Sender label used when a chat envelope omits (or blanks) its sender.
pub const UNKNOWN_SENDER: &str = "Remote";

/// How a data packet is delivered by the media transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Ordered and retransmitted by the transport.
    Reliable,
    /// Best effort, may be dropped or reordered.
    Lossy,
}

/// A chat message as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPayload {
    /// Identity of the sending participant.
    pub sender: String,
    /// Message body.
    pub text: String,
}

impl ChatPayload {
    /// Create a chat payload.
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self { sender: sender.into(), text: text.into() }
    }

    /// Serialize to the UTF-8 JSON wire form.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let envelope = ChatEnvelope { kind: CHAT_KIND, sender: &self.sender, text: &self.text };
        serde_json::to_vec(&envelope).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Borrowed view used for encoding so field order on the wire is fixed.
#[derive(Serialize)]
struct ChatEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    sender: &'a str,
    text: &'a str,
}

/// Owned form accepted when decoding. Extra fields are ignored.
#[derive(Deserialize)]
struct RawChat {
    #[serde(default)]
    sender: Option<String>,
    text: String,
}

/// A decoded data-channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataMessage {
    /// Chat message.
    Chat(ChatPayload),
    /// Well-formed envelope with a `type` this client does not handle.
    Unknown {
        /// The unrecognized `type` value.
        kind: String,
    },
}

impl DataMessage {
    /// Decode a raw data-channel payload.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidUtf8` if the bytes are not UTF-8
    /// - `ProtocolError::Json` if the text is not JSON
    /// - `ProtocolError::MissingType` if there is no string `type` field
    /// - `ProtocolError::MalformedChat` if a `chat` envelope lacks a string
    ///   `text`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidUtf8 { valid_up_to: e.valid_up_to() })?;

        let value: serde_json::Value = serde_json::from_str(text)?;

        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        if kind != CHAT_KIND {
            return Ok(Self::Unknown { kind: kind.to_owned() });
        }

        let raw: RawChat =
            serde_json::from_value(value).map_err(|e| ProtocolError::MalformedChat(e.to_string()))?;

        let sender = raw
            .sender
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_owned());

        Ok(Self::Chat(ChatPayload { sender, text: raw.text }))
    }

    /// Encode to wire bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` for [`DataMessage::Unknown`], which carries
    ///   no body to send
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Chat(chat) => chat.encode(),
            Self::Unknown { kind } => {
                Err(ProtocolError::Encode(format!("cannot encode unknown kind `{kind}`")))
            },
        }
    }

    /// Delivery mode this message must be sent with.
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self {
            Self::Chat(_) | Self::Unknown { .. } => DeliveryMode::Reliable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_wire_format() {
        let bytes = ChatPayload::new("Me", "hello").encode().unwrap();
        insta::assert_snapshot!(
            String::from_utf8(bytes).unwrap(),
            @r#"{"type":"chat","sender":"Me","text":"hello"}"#
        );
    }

    #[test]
    fn multibyte_round_trip() {
        let original = ChatPayload::new("Me", "héllo 🙂");
        let bytes = original.encode().unwrap();

        assert_eq!(DataMessage::decode(&bytes).unwrap(), DataMessage::Chat(original));
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let decoded = DataMessage::decode(br#"{"type":"reaction","emoji":"+1"}"#).unwrap();
        assert_eq!(decoded, DataMessage::Unknown { kind: "reaction".into() });
    }

    #[test]
    fn missing_sender_falls_back() {
        let decoded = DataMessage::decode(br#"{"type":"chat","text":"hi"}"#).unwrap();
        assert_eq!(decoded, DataMessage::Chat(ChatPayload::new(UNKNOWN_SENDER, "hi")));

        let decoded = DataMessage::decode(br#"{"type":"chat","sender":"","text":"hi"}"#).unwrap();
        assert_eq!(decoded, DataMessage::Chat(ChatPayload::new(UNKNOWN_SENDER, "hi")));
    }

    #[test]
    fn missing_text_is_malformed() {
        let err = DataMessage::decode(br#"{"type":"chat","sender":"a"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedChat(_)));

        let err = DataMessage::decode(br#"{"type":"chat","sender":"a","text":7}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedChat(_)));
    }

    #[test]
    fn rejects_non_envelopes() {
        assert!(matches!(DataMessage::decode(b"not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(DataMessage::decode(b"[1,2,3]"), Err(ProtocolError::MissingType)));
        assert!(matches!(DataMessage::decode(br#"{"type":5}"#), Err(ProtocolError::MissingType)));
        assert!(matches!(
            DataMessage::decode(&[0x7b, 0xff, 0x7d]),
            Err(ProtocolError::InvalidUtf8 { valid_up_to: 1 })
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let decoded =
            DataMessage::decode(br#"{"type":"chat","sender":"dr","text":"ok","ts":1}"#).unwrap();
        assert_eq!(decoded, DataMessage::Chat(ChatPayload::new("dr", "ok")));
    }

    #[test]
    fn unknown_cannot_be_encoded() {
        let msg = DataMessage::Unknown { kind: "typing".into() };
        assert!(matches!(msg.encode(), Err(ProtocolError::Encode(_))));
        assert_eq!(msg.delivery_mode(), DeliveryMode::Reliable);
    }
}
