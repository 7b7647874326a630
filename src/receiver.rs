//! Receive-side decode state machine.
//!
//! Consumes capture buffers in arrival order, interprets the codec's
//! status codes, tracks the syncing flag and turns payloads into chat
//! messages, opening the crypto envelope when the session has
//! encryption enabled.

use crate::codec::{DecodeOutput, ModemCodec, STATUS_NOPE, STATUS_PING, STATUS_SYNC};
use crate::crypto;
use crate::error::ChatError;
use crate::message::{ChatMessage, MessageSink};
use crate::settings::Settings;

/// Placeholder when the codec produced no callsign.
pub const UNKNOWN_CALLSIGN: &str = "???";
/// Shown in place of a payload that failed decryption.
pub const UNREADABLE: &str = "[unreadable]";

/// Outcome of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Payload { text: String, callsign: String },
    SyncAcquired,
    PreambleMismatch,
    PreamblePing,
    DecodeFailed,
}

/// Map a raw codec status to a decode outcome.
///
/// Status 0 means the decoder is still accumulating samples and carries
/// no news; every other code maps to exactly one variant.
pub fn interpret(output: &DecodeOutput) -> Option<DecodeResult> {
    match output.status {
        n if n > 0 => Some(DecodeResult::Payload {
            text: output.message.clone(),
            callsign: normalize_callsign(&output.callsign),
        }),
        0 => None,
        STATUS_SYNC => Some(DecodeResult::SyncAcquired),
        STATUS_NOPE => Some(DecodeResult::PreambleMismatch),
        STATUS_PING => Some(DecodeResult::PreamblePing),
        _ => Some(DecodeResult::DecodeFailed),
    }
}

fn normalize_callsign(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_CALLSIGN.to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Decoder channel selector for the decode call. A negative selector
/// falls back to the codec default for the channel count.
pub fn effective_channel(selected: i32, channels: u32) -> i32 {
    if selected >= 0 {
        selected
    } else if channels == 2 {
        3
    } else {
        0
    }
}

/// One receive stream. Owns the syncing flag so separate sessions never
/// share state.
#[derive(Debug, Default)]
pub struct Receiver {
    syncing: bool,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// True between a sync detection and the next terminal result.
    pub fn syncing(&self) -> bool {
        self.syncing
    }

    /// Run one capture buffer through the codec and deliver whatever it
    /// produced. The codec accumulates partial symbols across calls, so
    /// buffers must arrive in capture order.
    pub fn process(
        &mut self,
        codec: &mut dyn ModemCodec,
        pcm: &[i16],
        settings: &Settings,
        sink: &mut dyn MessageSink,
    ) {
        let output = codec.decode(
            pcm,
            settings.sample_rate,
            1,
            effective_channel(settings.channel, 1),
        );
        let Some(result) = interpret(&output) else {
            return;
        };

        match result {
            DecodeResult::Payload { text, callsign } => {
                self.syncing = false;
                deliver_payload(text, callsign, settings, sink);
            }
            DecodeResult::SyncAcquired => {
                // Announce once; the codec keeps reporting sync while it
                // collects payload symbols.
                if !self.syncing {
                    sink.deliver(ChatMessage::notice("signal detected"));
                }
                self.syncing = true;
            }
            DecodeResult::PreambleMismatch => {
                self.syncing = false;
                sink.deliver(ChatMessage::notice("preamble nope"));
            }
            DecodeResult::PreamblePing => {
                self.syncing = false;
                sink.deliver(ChatMessage::notice("preamble ping"));
            }
            DecodeResult::DecodeFailed => {
                self.syncing = false;
                sink.deliver(ChatMessage::notice("decode failed"));
            }
        }
    }
}

fn deliver_payload(
    text: String,
    callsign: String,
    settings: &Settings,
    sink: &mut dyn MessageSink,
) {
    if !settings.encrypt {
        sink.deliver(ChatMessage::incoming(callsign, text));
        return;
    }

    let passphrase = settings.passphrase.trim();
    let opened = if passphrase.is_empty() {
        Err(ChatError::MissingPassphrase)
    } else {
        crypto::decrypt(&text, passphrase)
    };

    match opened {
        Ok(plain) => {
            sink.deliver(ChatMessage::incoming(
                callsign,
                String::from_utf8_lossy(&plain).into_owned(),
            ));
        }
        Err(e) => {
            // Keep the timeline contiguous: the failure is reported and
            // the message still shows up, just unreadable.
            log::warn!("Inbound envelope rejected: {e}");
            sink.deliver(ChatMessage::notice(format!("decrypt failed: {e}")));
            sink.deliver(ChatMessage::incoming(callsign, UNREADABLE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    struct ScriptedCodec {
        outputs: Vec<DecodeOutput>,
    }

    impl ScriptedCodec {
        fn new(outputs: Vec<DecodeOutput>) -> Self {
            let mut outputs = outputs;
            outputs.reverse();
            Self { outputs }
        }
    }

    impl ModemCodec for ScriptedCodec {
        fn encode(&mut self, _request: &crate::codec::TransmitRequest, _max: usize) -> Vec<i16> {
            Vec::new()
        }

        fn decode(&mut self, _pcm: &[i16], _rate: u32, _ch: u32, _sel: i32) -> DecodeOutput {
            self.outputs.pop().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Vec<ChatMessage>,
    }

    impl MessageSink for RecordingSink {
        fn deliver(&mut self, message: ChatMessage) {
            self.messages.push(message);
        }
    }

    fn run(outputs: Vec<DecodeOutput>, settings: &Settings) -> (Receiver, Vec<ChatMessage>) {
        let mut codec = ScriptedCodec::new(outputs);
        let mut sink = RecordingSink::default();
        let mut receiver = Receiver::new();
        let buffers = codec.outputs.len();
        for _ in 0..buffers {
            receiver.process(&mut codec, &[0i16; 128], settings, &mut sink);
        }
        (receiver, sink.messages)
    }

    #[test]
    fn status_mapping_is_total_and_exclusive() {
        for status in -10..=10 {
            let output = DecodeOutput::status(status);
            let result = interpret(&output);
            match status {
                0 => assert_eq!(result, None),
                n if n > 0 => assert!(matches!(result, Some(DecodeResult::Payload { .. }))),
                STATUS_SYNC => assert_eq!(result, Some(DecodeResult::SyncAcquired)),
                STATUS_NOPE => assert_eq!(result, Some(DecodeResult::PreambleMismatch)),
                STATUS_PING => assert_eq!(result, Some(DecodeResult::PreamblePing)),
                _ => assert_eq!(result, Some(DecodeResult::DecodeFailed)),
            }
        }
    }

    #[test]
    fn sync_announced_once_then_mismatch_clears() {
        let settings = Settings::default();
        let (receiver, messages) = run(
            vec![
                DecodeOutput::status(STATUS_SYNC),
                DecodeOutput::status(STATUS_SYNC),
                DecodeOutput::status(STATUS_NOPE),
            ],
            &settings,
        );

        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["signal detected", "preamble nope"]);
        assert!(!receiver.syncing());
    }

    #[test]
    fn syncing_true_only_between_sync_and_terminal() {
        let settings = Settings::default();
        let mut codec = ScriptedCodec::new(vec![
            DecodeOutput::status(STATUS_SYNC),
            DecodeOutput::status(0),
            DecodeOutput::payload("hello", "k1abc"),
        ]);
        let mut sink = RecordingSink::default();
        let mut receiver = Receiver::new();

        receiver.process(&mut codec, &[0; 64], &settings, &mut sink);
        assert!(receiver.syncing());
        // Status 0 carries no news and must not disturb the flag.
        receiver.process(&mut codec, &[0; 64], &settings, &mut sink);
        assert!(receiver.syncing());
        receiver.process(&mut codec, &[0; 64], &settings, &mut sink);
        assert!(!receiver.syncing());
    }

    #[test]
    fn ping_and_failure_are_reported_and_clear_sync() {
        let settings = Settings::default();
        let (receiver, messages) = run(
            vec![
                DecodeOutput::status(STATUS_SYNC),
                DecodeOutput::status(STATUS_PING),
                DecodeOutput::status(-1),
            ],
            &settings,
        );
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["signal detected", "preamble ping", "decode failed"]);
        assert!(!receiver.syncing());
    }

    #[test]
    fn plaintext_payload_is_delivered_with_normalized_callsign() {
        let settings = Settings::default();
        let (_, messages) = run(vec![DecodeOutput::payload("cq cq", "k1abc")], &settings);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Them);
        assert_eq!(messages[0].callsign, "K1ABC");
        assert_eq!(messages[0].text, "cq cq");
    }

    #[test]
    fn missing_callsign_gets_placeholder() {
        let settings = Settings::default();
        let (_, messages) = run(vec![DecodeOutput::payload("hi", "  ")], &settings);
        assert_eq!(messages[0].callsign, UNKNOWN_CALLSIGN);
    }

    #[test]
    fn encrypted_payload_round_trips() {
        let settings = Settings {
            encrypt: true,
            passphrase: "shared".to_string(),
            ..Settings::default()
        };
        let wire = crypto::encrypt(b"covert", "shared").unwrap();
        let (receiver, messages) = run(vec![DecodeOutput::payload(wire, "W1AW")], &settings);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "covert");
        assert_eq!(messages[0].callsign, "W1AW");
        assert!(!receiver.syncing());
    }

    #[test]
    fn failed_authentication_shows_unreadable_placeholder() {
        let settings = Settings {
            encrypt: true,
            passphrase: "ours".to_string(),
            ..Settings::default()
        };
        let wire = crypto::encrypt(b"covert", "theirs").unwrap();
        let (receiver, messages) = run(
            vec![
                DecodeOutput::status(STATUS_SYNC),
                DecodeOutput::payload(wire, "W1AW"),
            ],
            &settings,
        );

        assert_eq!(messages.len(), 3);
        assert!(messages[1].text.starts_with("decrypt failed"));
        assert_eq!(messages[2].text, UNREADABLE);
        assert_eq!(messages[2].callsign, "W1AW");
        assert!(!receiver.syncing());
    }

    #[test]
    fn encrypted_mode_without_passphrase_is_a_decrypt_failure() {
        let settings = Settings {
            encrypt: true,
            ..Settings::default()
        };
        let (_, messages) = run(vec![DecodeOutput::payload("whatever", "X")], &settings);
        assert!(messages[0].text.starts_with("decrypt failed"));
        assert_eq!(messages[1].text, UNREADABLE);
    }

    #[test]
    fn channel_selector_defaults() {
        assert_eq!(effective_channel(2, 1), 2);
        assert_eq!(effective_channel(0, 2), 0);
        assert_eq!(effective_channel(-1, 2), 3);
        assert_eq!(effective_channel(-1, 1), 0);
    }
}
