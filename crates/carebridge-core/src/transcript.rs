//! In-memory chat transcript.
//!
//! Append-only, ordered by arrival. Incoming payloads are validated at the
//! boundary: only a decoded `chat` envelope produces an entry. Everything else
//! is logged and dropped so a misbehaving peer can never break the screen.
//!
//! Timestamps are taken on arrival. Peers do not share a clock, so the
//! transcript orders by receipt, not by send time.

use carebridge_proto::{ChatPayload, DataMessage, ProtocolError};

/// Sender label for messages composed on this device.
pub const LOCAL_SENDER: &str = "Me";

/// A transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender label (`"Me"` for local echo).
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Local wall-clock arrival time, Unix milliseconds.
    pub received_at: u64,
}

impl ChatMessage {
    /// Whether this entry is the local echo of a sent message.
    pub fn is_local(&self) -> bool {
        self.sender == LOCAL_SENDER
    }
}

/// What happened to an incoming payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// A chat message was appended.
    Appended,
    /// Valid envelope of a kind this client ignores.
    Ignored {
        /// The unrecognized `type` value.
        kind: String,
    },
    /// Payload could not be decoded.
    Rejected(ProtocolError),
}

/// A chat message ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingChat {
    /// Trimmed text, used for the local echo once the publish succeeds.
    pub text: String,
    /// Encoded envelope to publish reliably.
    pub payload: Vec<u8>,
}

impl OutgoingChat {
    /// Compose a message from the user's draft.
    ///
    /// The draft is trimmed. On the wire the sender is the local participant
    /// identity, falling back to [`LOCAL_SENDER`]. Returns `None` for a blank
    /// draft.
    pub fn compose(identity: Option<&str>, draft: &str) -> Result<Option<Self>, ProtocolError> {
        let text = draft.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let sender = identity.filter(|id| !id.is_empty()).unwrap_or(LOCAL_SENDER);
        let payload = ChatPayload::new(sender, text).encode()?;

        Ok(Some(Self { text: text.to_owned(), payload }))
    }
}

/// Ordered chat history for one session screen.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a raw data-channel payload.
    ///
    /// `from` is the transport-level identity of the publishing participant
    /// and is only used for logging; the displayed sender comes from the
    /// envelope. Appends exactly one entry for a chat envelope and none
    /// otherwise. Never fails.
    pub fn receive(&mut self, payload: &[u8], from: Option<&str>, received_at: u64) -> ReceiveOutcome {
        let from = from.unwrap_or("unknown");

        match DataMessage::decode(payload) {
            Ok(DataMessage::Chat(chat)) => {
                tracing::debug!(%from, bytes = payload.len(), "chat message received");
                self.messages.push(ChatMessage { sender: chat.sender, text: chat.text, received_at });
                ReceiveOutcome::Appended
            },
            Ok(DataMessage::Unknown { kind }) => {
                tracing::debug!(%from, %kind, "ignoring data message of unknown kind");
                ReceiveOutcome::Ignored { kind }
            },
            Err(e) => {
                tracing::debug!(%from, bytes = payload.len(), error = %e, "dropping undecodable payload");
                ReceiveOutcome::Rejected(e)
            },
        }
    }

    /// Append the local echo of a successfully published message.
    pub fn push_local(&mut self, text: impl Into<String>, received_at: u64) {
        self.messages.push(ChatMessage {
            sender: LOCAL_SENDER.to_owned(),
            text: text.into(),
            received_at,
        });
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Most recent message. `None` if empty.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
