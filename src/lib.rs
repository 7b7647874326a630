//! modemchat - text chat over an acoustic data modem.
//!
//! Captures microphone audio on a dedicated real-time thread, streams it
//! through the external modem decoder and renders received messages;
//! outgoing text is optionally sealed in an AES-GCM envelope, synthesized
//! to a waveform and played over the speaker while the microphone path is
//! suppressed.

pub mod audio;
pub mod capacity;
pub mod codec;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod message;
pub mod receiver;
pub mod settings;
pub mod transmitter;

pub use error::{ChatError, Result};

/// Maximum number of bytes the acoustic channel carries per message.
pub const MAX_ON_AIR_BYTES: usize = 170;

/// Nonce length in the wire envelope.
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length.
pub const TAG_LEN: usize = 16;

/// Upper bound on one transmission, in seconds of samples at the current
/// rate. Bounds worst-case memory for the encode call.
pub const MAX_TX_SECONDS: usize = 10;
