//! ALSA PCM device wrappers for the microphone and speaker paths.
//!
//! The modem path is mono float end to end: capture frames are converted
//! to 16-bit PCM for the decoder, and synthesized waveforms are converted
//! back to float for playback.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct NegotiatedParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Period size in frames
    pub period_size: usize,
}

/// Open a PCM device for capture (the microphone path).
pub fn open_capture(device: &str, sample_rate: u32) -> Result<(PCM, NegotiatedParams)> {
    open_pcm(device, Direction::Capture, sample_rate, "capture")
}

/// Open a PCM device for playback (the speaker path).
pub fn open_playback(device: &str, sample_rate: u32) -> Result<(PCM, NegotiatedParams)> {
    open_pcm(device, Direction::Playback, sample_rate, "playback")
}

fn open_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    dir_name: &str,
) -> Result<(PCM, NegotiatedParams)> {
    let pcm = PCM::new(device, direction, false)
        .with_context(|| format!("Failed to open PCM device '{}' for {}", device, dir_name))?;

    {
        let hwp = HwParams::any(&pcm).context("Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::FloatLE)?;
        hwp.set_channels(1)?;
        hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let (actual_rate, period_size) = {
        let hwp = pcm.hw_params_current()?;
        (hwp.get_rate()?, hwp.get_period_size()? as usize)
    };

    let params = NegotiatedParams {
        sample_rate: actual_rate,
        period_size,
    };

    log::info!(
        "ALSA {}: device={}, rate={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        period_size,
    );

    Ok((pcm, params))
}
