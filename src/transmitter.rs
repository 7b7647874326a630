//! Transmit-side pipeline: gate, seal, encode.
//!
//! Pure steps only; playback scheduling and the mute protocol live in
//! the controller so these functions stay testable without audio
//! hardware.

use crate::capacity;
use crate::codec::{ModemCodec, TransmitRequest};
use crate::crypto;
use crate::error::{ChatError, Result};
use crate::settings::Settings;
use crate::{MAX_ON_AIR_BYTES, MAX_TX_SECONDS};

/// A message that passed gating, ready for the codec.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// What goes on the air: the plaintext, or the sealed envelope.
    pub wire_text: String,
    /// What the operator typed, for the local echo.
    pub echo_text: String,
    pub encrypted: bool,
}

/// Apply the capacity gate and the crypto envelope to raw input.
///
/// Returns `Ok(None)` for whitespace-only input: a silent no-op, not an
/// error. The capacity gate runs on the predicted on-air size, so an
/// oversize message is refused before any crypto work.
pub fn prepare(raw: &str, settings: &Settings) -> Result<Option<OutboundMessage>> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let on_air = capacity::on_air_bytes(text.len(), settings.encrypt);
    if on_air > MAX_ON_AIR_BYTES {
        return Err(ChatError::CapacityExceeded {
            on_air,
            limit: MAX_ON_AIR_BYTES,
            encrypted: settings.encrypt,
        });
    }

    let wire_text = if settings.encrypt {
        let passphrase = settings.passphrase.trim();
        if passphrase.is_empty() {
            return Err(ChatError::MissingPassphrase);
        }
        crypto::encrypt(text.as_bytes(), passphrase)?
    } else {
        text.to_string()
    };

    Ok(Some(OutboundMessage {
        wire_text,
        echo_text: text.to_string(),
        encrypted: settings.encrypt,
    }))
}

/// Build the codec call for one prepared message.
pub fn transmit_request(message: &OutboundMessage, settings: &Settings) -> TransmitRequest {
    TransmitRequest {
        wire_text: message.wire_text.clone(),
        callsign: settings.callsign.clone(),
        carrier_frequency: settings.carrier_frequency,
        noise_symbols: settings.noise_symbols,
        fancy_header: settings.fancy_header,
        sample_rate: settings.sample_rate,
        channel: settings.channel,
    }
}

/// Synthesize the waveform, bounded to [`MAX_TX_SECONDS`] of samples at
/// the current rate.
pub fn encode(
    codec: &mut dyn ModemCodec,
    message: &OutboundMessage,
    settings: &Settings,
) -> Result<Vec<i16>> {
    let max_samples = settings.sample_rate as usize * MAX_TX_SECONDS;
    let samples = codec.encode(&transmit_request(message, settings), max_samples);
    if samples.is_empty() {
        return Err(ChatError::EncodeRejected);
    }
    Ok(samples)
}
