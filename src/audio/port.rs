//! Output seam between the controller and the audio threads.
//!
//! The controller talks to a trait so the pipeline is testable without
//! hardware; the real implementation owns the thread generation and the
//! playback job queue.

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;

use super::system::{AudioConfig, AudioEvent, AudioSystem};

/// Waveforms waiting for the speaker. One transmission is outstanding
/// at a time, so the queue stays shallow.
const PLAYBACK_QUEUE_DEPTH: usize = 2;

pub trait AudioPort: Send {
    /// Bring the audio threads up if they are not already running.
    fn ensure_started(&mut self, config: &AudioConfig) -> Result<()>;

    /// Queue one waveform for playback. Must not block.
    fn play(&mut self, samples: Vec<i16>) -> Result<()>;

    /// Tear down and re-acquire the devices (sample-rate changes).
    fn restart(&mut self, config: &AudioConfig) -> Result<()>;

    /// Stop the audio threads; `ensure_started` may be called again.
    fn shutdown(&mut self);
}

/// ALSA-backed implementation used by the binary.
pub struct AlsaPort {
    events: mpsc::Sender<AudioEvent>,
    system: Option<AudioSystem>,
    jobs: Option<mpsc::Sender<Vec<i16>>>,
}

impl AlsaPort {
    pub fn new(events: mpsc::Sender<AudioEvent>) -> Self {
        Self {
            events,
            system: None,
            jobs: None,
        }
    }
}

impl AudioPort for AlsaPort {
    fn ensure_started(&mut self, config: &AudioConfig) -> Result<()> {
        if self.system.is_some() {
            return Ok(());
        }
        let (jobs_tx, jobs_rx) = mpsc::channel(PLAYBACK_QUEUE_DEPTH);
        let system = AudioSystem::start(config.clone(), self.events.clone(), jobs_rx)?;
        self.system = Some(system);
        self.jobs = Some(jobs_tx);
        Ok(())
    }

    fn play(&mut self, samples: Vec<i16>) -> Result<()> {
        let jobs = self.jobs.as_ref().context("audio output not started")?;
        jobs.try_send(samples)
            .map_err(|_| anyhow!("playback queue unavailable"))
    }

    fn restart(&mut self, config: &AudioConfig) -> Result<()> {
        self.shutdown();
        self.ensure_started(config)
    }

    fn shutdown(&mut self) {
        // Dropping the jobs sender wakes the playback thread; stop()
        // joins capture.
        self.jobs = None;
        if let Some(mut system) = self.system.take() {
            system.stop();
        }
    }
}
