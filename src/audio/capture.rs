//! Microphone capture thread: the real-time half of the receive path.
//!
//! Reads float frames from ALSA, converts them to 16-bit PCM and hands
//! each buffer to the control side through a bounded channel. The loop
//! never blocks on the control side: a full channel drops the buffer.
//! Crypto and codec work never happen here.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::sync::mpsc;

use super::system::{AudioConfig, AudioEvent};
use super::alsa_device;

pub(super) fn capture_thread(
    config: &AudioConfig,
    events: mpsc::Sender<AudioEvent>,
    running: &AtomicBool,
) -> Result<()> {
    let (pcm, params) = alsa_device::open_capture(&config.capture_device, config.sample_rate)?;
    let io = pcm.io_f32()?;

    let mut frame = vec![0f32; params.period_size];
    let mut scratch: Vec<i16> = Vec::new();

    // One-time, before the real-time loop starts.
    let _ = events.blocking_send(AudioEvent::CaptureReady {
        sample_rate: params.sample_rate,
    });
    log::info!(
        "Capture started: rate={}, period={}",
        params.sample_rate,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        match io.readi(&mut frame) {
            // An empty read keeps the loop alive without a handoff.
            Ok(0) => continue,
            Ok(frames) => {
                frame_to_pcm(&frame[..frames], &mut scratch);
                // The scratch buffer is reused next period; the decode
                // side gets its own copy so a later callback can never
                // mutate a buffer it already handed off.
                match events.try_send(AudioEvent::Pcm(scratch.clone())) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!("Decode queue full, dropping {} captured samples", frames);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => return Ok(()),
                }
            }
            Err(e) => {
                log::warn!("ALSA capture error: {}, recovering...", e);
                pcm.prepare()?;
            }
        }
    }

    log::info!("Capture stopped");
    Ok(())
}

/// Convert one float frame to 16-bit PCM with clamped scaling.
///
/// The scratch buffer is reused while the frame size is unchanged and
/// reallocated when it differs.
pub fn frame_to_pcm(frame: &[f32], out: &mut Vec<i16>) {
    if out.len() != frame.len() {
        out.resize(frame.len(), 0);
    }
    for (dst, &s) in out.iter_mut().zip(frame) {
        *dst = if s <= -1.0 {
            i16::MIN
        } else if s >= 1.0 {
            i16::MAX
        } else {
            (s * 32767.0).round() as i16
        };
    }
}
