//! Audio thread lifecycle.
//!
//! Capture and playback run on dedicated OS threads (NOT tokio tasks)
//! so real-time audio I/O never contends with the async control loop.
//! Everything the threads report back travels over one event channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::Result;
use tokio::sync::mpsc;

use super::{capture, playback};
use crate::settings::Settings;

/// Devices and rate for one generation of audio threads.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA capture device name (e.g. "default", "plughw:0,0")
    pub capture_device: String,
    /// ALSA playback device name
    pub playback_device: String,
    /// Desired sample rate (may be negotiated by hardware)
    pub sample_rate: u32,
}

impl AudioConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            capture_device: settings.capture_device.clone(),
            playback_device: settings.playback_device.clone(),
            sample_rate: settings.sample_rate,
        }
    }
}

/// Everything the audio threads report to the control side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// One converted capture buffer, in strict arrival order.
    Pcm(Vec<i16>),
    /// Capture device opened; reported once with the negotiated rate.
    CaptureReady { sample_rate: u32 },
    /// Capture path failed and will not retry.
    CaptureFailed(String),
    /// The queued transmission finished playing out.
    PlaybackFinished,
    /// Playback path failed and will not retry.
    PlaybackFailed(String),
}

/// The audio system manages the capture and playback threads.
///
/// - Capture thread: ALSA float frames, PCM conversion, `events`
/// - Playback thread: `jobs`, float conversion, ALSA playback, `events`
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    capture_handle: Option<JoinHandle<()>>,
    playback_handle: Option<JoinHandle<()>>,
}

impl AudioSystem {
    /// Start the audio threads.
    ///
    /// * `config` - devices and rate for this generation
    /// * `events` - sender for capture buffers and thread notifications
    /// * `jobs`   - receiver for waveforms to play
    pub fn start(
        config: AudioConfig,
        events: mpsc::Sender<AudioEvent>,
        jobs: mpsc::Receiver<Vec<i16>>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));

        log::info!(
            "Audio starting — capture: \"{}\", playback: \"{}\", rate: {}Hz",
            config.capture_device,
            config.playback_device,
            config.sample_rate,
        );

        let capture_handle = {
            let running = running.clone();
            let config = config.clone();
            let events = events.clone();
            thread::Builder::new()
                .name("audio-capture".into())
                .spawn(move || {
                    if let Err(e) = capture::capture_thread(&config, events.clone(), &running) {
                        log::error!("Capture thread error: {:#}", e);
                        let _ = events.blocking_send(AudioEvent::CaptureFailed(format!("{e:#}")));
                    }
                })?
        };

        let playback_handle = {
            let running = running.clone();
            thread::Builder::new()
                .name("audio-playback".into())
                .spawn(move || {
                    if let Err(e) = playback::playback_thread(&config, jobs, events.clone(), &running)
                    {
                        log::error!("Playback thread error: {:#}", e);
                        let _ = events.blocking_send(AudioEvent::PlaybackFailed(format!("{e:#}")));
                    }
                })?
        };

        Ok(Self {
            running,
            capture_handle: Some(capture_handle),
            playback_handle: Some(playback_handle),
        })
    }

    /// Signal threads to stop and wait for capture to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.capture_handle.take() {
            let _ = h.join();
        }
        // Playback exits when the jobs sender is dropped; detach it here
        // to avoid blocking on an in-flight transmission.
        self.playback_handle.take();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
