//! Control-flow side of the pipeline.
//!
//! Routes capture buffers into the receiver, turns operator input into
//! transmissions and owns the mute and busy state. The audio threads
//! never read any of this; captured buffers arriving while muted are
//! discarded here, on the control side.

use std::path::PathBuf;

use crate::MAX_ON_AIR_BYTES;
use crate::audio::{AudioConfig, AudioEvent, AudioPort};
use crate::capacity;
use crate::codec::ModemCodec;
use crate::error::ChatError;
use crate::message::{ChatMessage, MessageSink};
use crate::receiver::Receiver;
use crate::settings::Settings;
use crate::transmitter;

/// Depth of the audio-to-control event channel.
pub const EVENT_QUEUE_DEPTH: usize = 64;

pub struct Controller {
    settings: Settings,
    settings_path: Option<PathBuf>,
    codec: Box<dyn ModemCodec>,
    receiver: Receiver,
    sink: Box<dyn MessageSink>,
    audio: Box<dyn AudioPort>,
    /// Microphone suppressed while our own transmission plays out.
    muted: bool,
    /// A transmission is queued or playing; the codec is not reentrant.
    transmitting: bool,
}

impl Controller {
    pub fn new(
        settings: Settings,
        codec: Box<dyn ModemCodec>,
        sink: Box<dyn MessageSink>,
        audio: Box<dyn AudioPort>,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            settings,
            settings_path,
            codec,
            receiver: Receiver::new(),
            sink,
            audio,
            muted: false,
            transmitting: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn transmitting(&self) -> bool {
        self.transmitting
    }

    /// Bring the audio threads up, reporting a failure once instead of
    /// retrying.
    pub fn start_audio(&mut self) {
        let config = AudioConfig::from_settings(&self.settings);
        if let Err(e) = self.audio.ensure_started(&config) {
            log::error!("Audio init failed: {:#}", e);
            self.sink
                .deliver(ChatMessage::notice("audio init failed, check the devices"));
        }
    }

    pub fn shutdown(&mut self) {
        self.audio.shutdown();
    }

    pub fn handle_audio_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Pcm(pcm) => {
                if self.muted {
                    // Self-reception guard: our own tone is still on the
                    // speaker.
                    return;
                }
                self.receiver.process(
                    self.codec.as_mut(),
                    &pcm,
                    &self.settings,
                    self.sink.as_mut(),
                );
            }
            AudioEvent::CaptureReady { sample_rate } => {
                self.sink.deliver(ChatMessage::notice(format!(
                    "mic initialized @ {sample_rate} Hz"
                )));
            }
            AudioEvent::CaptureFailed(reason) => {
                log::error!("Capture failed: {reason}");
                self.audio.shutdown();
                self.sink.deliver(ChatMessage::notice(
                    "mic init failed — check microphone access",
                ));
            }
            AudioEvent::PlaybackFailed(reason) => {
                log::error!("Playback failed: {reason}");
                self.audio.shutdown();
                // Never leave the mic stuck off because the speaker path
                // died mid-transmission.
                self.muted = false;
                self.transmitting = false;
                self.sink
                    .deliver(ChatMessage::notice("audio output failed, check the speaker"));
            }
            AudioEvent::PlaybackFinished => {
                self.transmitting = false;
                if self.muted {
                    self.muted = false;
                    log::debug!("Transmission played out, mic re-enabled");
                }
            }
        }
    }

    /// One line of operator input: a slash command or a message to send.
    pub fn handle_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            self.handle_command(rest);
        } else {
            self.send(line);
        }
    }

    /// Drive one send through the gate, seal, encode and play steps.
    /// Every step can abort the whole send; the local echo survives any
    /// failure past the gate.
    pub fn send(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        if self.transmitting {
            self.report_send_error(ChatError::ChannelBusy);
            return;
        }

        let message = match transmitter::prepare(raw, &self.settings) {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                self.report_send_error(e);
                return;
            }
        };

        // Optimistic echo: the operator sees what was queued whether or
        // not the transmission below succeeds.
        let echo = if message.encrypted {
            format!("🔒 {}", message.echo_text)
        } else {
            message.echo_text.clone()
        };
        self.sink
            .deliver(ChatMessage::outgoing(self.settings.callsign.clone(), echo));

        let config = AudioConfig::from_settings(&self.settings);
        if let Err(e) = self.audio.ensure_started(&config) {
            log::error!("Audio output unavailable: {:#}", e);
            self.sink.deliver(ChatMessage::notice(
                "audio output unavailable, message not transmitted",
            ));
            return;
        }

        let samples = match transmitter::encode(self.codec.as_mut(), &message, &self.settings) {
            Ok(samples) => samples,
            Err(e) => {
                self.sink
                    .deliver(ChatMessage::notice(format!("encode failed: {e}")));
                return;
            }
        };

        if self.settings.mute_during_tx {
            self.muted = true;
        }
        self.transmitting = true;
        if let Err(e) = self.audio.play(samples) {
            log::error!("Playback scheduling failed: {:#}", e);
            self.muted = false;
            self.transmitting = false;
            self.sink
                .deliver(ChatMessage::notice("playback failed, message not transmitted"));
        }
    }

    fn report_send_error(&mut self, err: ChatError) {
        let text = match err {
            ChatError::CapacityExceeded { .. } => format!("{err}. Shorten it."),
            ChatError::ChannelBusy => {
                "channel busy, wait for the current transmission".to_string()
            }
            _ => err.to_string(),
        };
        self.sink.deliver(ChatMessage::notice(text));
    }

    fn handle_command(&mut self, command_line: &str) {
        let mut parts = command_line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").trim();

        match command {
            "callsign" => {
                self.settings.callsign = if arg.is_empty() {
                    "WEB".to_string()
                } else {
                    arg.to_uppercase()
                };
                self.notice(format!("callsign set to {}", self.settings.callsign));
                self.persist();
            }
            "carrier" => match arg.parse::<i32>() {
                Ok(hz) => {
                    self.settings.carrier_frequency = hz;
                    self.notice(format!("carrier frequency set to {hz} Hz"));
                    self.persist();
                }
                Err(_) => self.notice("usage: /carrier <hz>"),
            },
            "noise" => match arg.parse::<i32>() {
                Ok(symbols) => {
                    self.settings.noise_symbols = symbols;
                    self.notice(format!("noise symbols set to {symbols}"));
                    self.persist();
                }
                Err(_) => self.notice("usage: /noise <count>"),
            },
            "fancy" => match parse_toggle(arg) {
                Some(on) => {
                    self.settings.fancy_header = on;
                    self.notice(format!("fancy header {}", on_off(on)));
                    self.persist();
                }
                None => self.notice("usage: /fancy on|off"),
            },
            "rate" => match arg.parse::<u32>() {
                Ok(rate) => {
                    self.settings.sample_rate = rate;
                    self.persist();
                    // The device has to be re-acquired for a new rate.
                    let config = AudioConfig::from_settings(&self.settings);
                    if let Err(e) = self.audio.restart(&config) {
                        log::error!("Audio restart failed: {:#}", e);
                        self.notice("audio restart failed, check the devices");
                    }
                }
                Err(_) => self.notice("usage: /rate <hz>"),
            },
            "channel" => match arg.parse::<i32>() {
                Ok(channel) => {
                    self.settings.channel = channel;
                    self.notice(format!("channel selector set to {channel}"));
                    self.persist();
                }
                Err(_) => self.notice("usage: /channel <n>"),
            },
            "encrypt" => match parse_toggle(arg) {
                Some(on) => {
                    self.settings.encrypt = on;
                    self.notice(format!("encryption {}", on_off(on)));
                    self.report_capacity("");
                }
                None => self.notice("usage: /encrypt on|off"),
            },
            "psk" => {
                self.settings.passphrase = arg.to_string();
                self.notice(if arg.is_empty() {
                    "passphrase cleared"
                } else {
                    "passphrase set (kept in memory only)"
                });
            }
            "mute" => match parse_toggle(arg) {
                Some(on) => {
                    self.settings.mute_during_tx = on;
                    self.notice(format!("mute during transmit {}", on_off(on)));
                }
                None => self.notice("usage: /mute on|off"),
            },
            "bytes" => self.report_capacity(arg),
            "help" => self.notice(
                "commands: /callsign /carrier /noise /fancy /rate /channel \
                 /encrypt /psk /mute /bytes /quit",
            ),
            other => self.notice(format!("unknown command: /{other}")),
        }
    }

    /// Console rendition of the live byte indicator.
    fn report_capacity(&mut self, text: &str) {
        let on_air = capacity::on_air_bytes(text.len(), self.settings.encrypt);
        let suffix = if self.settings.encrypt { " (enc)" } else { "" };
        self.notice(format!("{on_air} / {MAX_ON_AIR_BYTES} bytes{suffix}"));
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.sink.deliver(ChatMessage::notice(text));
    }

    fn persist(&mut self) {
        let Some(path) = self.settings_path.clone() else {
            return;
        };
        if let Err(e) = self.settings.save(&path) {
            log::warn!("Failed to save settings to {}: {:#}", path.display(), e);
        }
    }
}

fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
