//! Fuzz target for DataMessage::decode
//!
//! Arbitrary bytes arriving on the data channel must never panic the
//! receiver, and must never reach the transcript unless they decode as chat.

#![no_main]

use carebridge_core::{ReceiveOutcome, Transcript};
use carebridge_proto::DataMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = DataMessage::decode(data);

    let mut transcript = Transcript::new();
    let outcome = transcript.receive(data, None, 0);

    match (decoded, outcome) {
        (Ok(DataMessage::Chat(chat)), ReceiveOutcome::Appended) => {
            assert_eq!(transcript.len(), 1);
            let message = &transcript.messages()[0];
            assert_eq!((&message.sender, &message.text), (&chat.sender, &chat.text));
        }
        (Ok(DataMessage::Unknown { .. }), ReceiveOutcome::Ignored { .. })
        | (Err(_), ReceiveOutcome::Rejected(_)) => assert!(transcript.is_empty()),
        (decoded, outcome) => panic!("decode {decoded:?} disagrees with receive {outcome:?}"),
    }
});
