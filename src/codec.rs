//! Contract with the physical-layer modem codec.
//!
//! The modulation scheme, symbol timing and FEC live in an external
//! library; the pipeline relies only on this call contract. The decoder
//! accumulates state across calls, so exactly one decode stream may be
//! outstanding at a time.

/// Carrier or sync tone detected, payload still arriving.
pub const STATUS_SYNC: i32 = -2;
/// Preamble present but malformed.
pub const STATUS_NOPE: i32 = -5;
/// Preamble decoded as a keep-alive ping.
pub const STATUS_PING: i32 = -6;

/// Everything one encode call needs; immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitRequest {
    /// Text handed to the codec: plaintext or the sealed envelope.
    pub wire_text: String,
    pub callsign: String,
    pub carrier_frequency: i32,
    pub noise_symbols: i32,
    pub fancy_header: bool,
    pub sample_rate: u32,
    pub channel: i32,
}

/// Raw outcome of one decode call.
///
/// `status` follows the table interpreted by [`crate::receiver`];
/// `message` and `callsign` are only meaningful when `status` is
/// positive.
#[derive(Debug, Clone, Default)]
pub struct DecodeOutput {
    pub status: i32,
    pub message: String,
    pub callsign: String,
}

impl DecodeOutput {
    pub fn status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn payload(message: impl Into<String>, callsign: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: message.len() as i32,
            message,
            callsign: callsign.into(),
        }
    }
}

pub trait ModemCodec: Send {
    /// Synthesize the waveform for one message, writing at most
    /// `max_samples` samples. An empty buffer means the codec refused
    /// the payload.
    fn encode(&mut self, request: &TransmitRequest, max_samples: usize) -> Vec<i16>;

    /// Feed one buffer of PCM to the decoder and report its status.
    /// Buffers must arrive in capture order.
    fn decode(
        &mut self,
        pcm: &[i16],
        sample_rate: u32,
        channels: u32,
        channel_select: i32,
    ) -> DecodeOutput;
}

#[cfg(feature = "native-codec")]
pub use native::NativeModem;

#[cfg(feature = "native-codec")]
mod native {
    use std::ffi::{CStr, CString, c_char, c_int};

    use super::{DecodeOutput, ModemCodec, TransmitRequest};

    #[link(name = "modemcodec")]
    unsafe extern "C" {
        fn modem_encode(
            message: *const c_char,
            callsign: *const c_char,
            carrier: c_int,
            noise: c_int,
            fancy: c_int,
            rate: c_int,
            channel: c_int,
            out: *mut i16,
            max_samples: c_int,
        ) -> c_int;

        fn modem_decode(
            samples: *const i16,
            count: c_int,
            rate: c_int,
            channels: c_int,
            channel_select: c_int,
            out_message: *mut c_char,
            max_len: c_int,
            out_call: *mut c_char,
            call_len: c_int,
        ) -> c_int;
    }

    const MESSAGE_CAP: usize = 256;
    const CALLSIGN_CAP: usize = 16;

    /// Safe wrapper over the modem library's C interface.
    pub struct NativeModem;

    impl ModemCodec for NativeModem {
        fn encode(&mut self, request: &TransmitRequest, max_samples: usize) -> Vec<i16> {
            // Interior NULs cannot cross the C boundary; the codec would
            // truncate there anyway.
            let Ok(message) = CString::new(request.wire_text.as_str()) else {
                return Vec::new();
            };
            let Ok(callsign) = CString::new(request.callsign.as_str()) else {
                return Vec::new();
            };

            let mut out = vec![0i16; max_samples];
            let written = unsafe {
                modem_encode(
                    message.as_ptr(),
                    callsign.as_ptr(),
                    request.carrier_frequency,
                    request.noise_symbols,
                    request.fancy_header as c_int,
                    request.sample_rate as c_int,
                    request.channel,
                    out.as_mut_ptr(),
                    max_samples as c_int,
                )
            };
            out.truncate(written.max(0) as usize);
            out
        }

        fn decode(
            &mut self,
            pcm: &[i16],
            sample_rate: u32,
            channels: u32,
            channel_select: i32,
        ) -> DecodeOutput {
            let mut message = [0u8; MESSAGE_CAP];
            let mut callsign = [0u8; CALLSIGN_CAP];
            let status = unsafe {
                modem_decode(
                    pcm.as_ptr(),
                    pcm.len() as c_int,
                    sample_rate as c_int,
                    channels as c_int,
                    channel_select,
                    message.as_mut_ptr() as *mut c_char,
                    MESSAGE_CAP as c_int,
                    callsign.as_mut_ptr() as *mut c_char,
                    CALLSIGN_CAP as c_int,
                )
            };

            DecodeOutput {
                status,
                message: c_buffer_to_string(&message),
                callsign: c_buffer_to_string(&callsign),
            }
        }
    }

    fn c_buffer_to_string(buffer: &[u8]) -> String {
        CStr::from_bytes_until_nul(buffer)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
