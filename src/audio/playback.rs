//! Speaker playback thread: receives synthesized waveforms from the
//! control side, converts them to float output and reports completion
//! so the controller can re-enable the microphone path.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::sync::mpsc;

use super::system::{AudioConfig, AudioEvent};
use super::alsa_device;

pub(super) fn playback_thread(
    config: &AudioConfig,
    mut jobs: mpsc::Receiver<Vec<i16>>,
    events: mpsc::Sender<AudioEvent>,
    running: &AtomicBool,
) -> Result<()> {
    let (pcm, params) = alsa_device::open_playback(&config.playback_device, config.sample_rate)?;
    let io = pcm.io_f32()?;

    log::info!(
        "Playback ready: rate={}, period={}",
        params.sample_rate,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        // Block until the controller hands us a waveform (or shuts down
        // by dropping the sender).
        let Some(samples) = jobs.blocking_recv() else {
            log::info!("Playback channel closed");
            break;
        };

        let waveform: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

        // Write with retry to handle short writes and XRUN recovery.
        let mut written = 0;
        let mut retries = 0u32;
        while written < waveform.len() {
            match io.writei(&waveform[written..]) {
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                Err(e) => {
                    log::warn!("ALSA playback error: {}, recovering...", e);
                    retries += 1;
                    if let Err(e2) = pcm.prepare() {
                        log::error!("Failed to recover PCM playback: {}", e2);
                        return Err(e2.into());
                    }
                    if retries >= 3 {
                        log::error!(
                            "Max recovery retries reached, dropping {} unplayed samples",
                            waveform.len() - written,
                        );
                        break;
                    }
                }
            }
        }

        // Let the tone ring out fully before reporting completion; the
        // controller unmutes the microphone on this event.
        if let Err(e) = pcm.drain() {
            log::warn!("Playback drain failed: {}", e);
        }
        if events.blocking_send(AudioEvent::PlaybackFinished).is_err() {
            return Ok(());
        }
        if let Err(e) = pcm.prepare() {
            log::warn!("Failed to rearm playback after drain: {}", e);
        }
    }

    log::info!("Playback stopped");
    Ok(())
}
