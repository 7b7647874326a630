//! User preferences: persisted modem settings plus session-only toggles.
//!
//! The persisted part survives restarts as a TOML file under the user
//! config directory. The pipeline never reads ambient state; callers
//! pass a snapshot of this struct into every transmit or decode call.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Operator callsign sent with every transmission.
    pub callsign: String,
    /// Base acoustic tone frequency in Hz.
    pub carrier_frequency: i32,
    /// Extra noise symbols prepended by the codec.
    pub noise_symbols: i32,
    /// Decorated transmission header.
    pub fancy_header: bool,
    /// Takes effect after the audio device is re-acquired.
    pub sample_rate: u32,
    /// Decoder channel selector; negative picks the codec default.
    pub channel: i32,
    pub capture_device: String,
    pub playback_device: String,

    // Session-only: the passphrase and encryption mode are deliberately
    // never written to disk.
    #[serde(skip)]
    pub encrypt: bool,
    #[serde(skip)]
    pub passphrase: String,
    #[serde(skip, default = "default_on")]
    pub mute_during_tx: bool,
}

fn default_on() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            callsign: "WEB".to_string(),
            carrier_frequency: 1500,
            noise_symbols: 0,
            fancy_header: false,
            sample_rate: 48000,
            channel: 0,
            capture_device: "default".to_string(),
            playback_device: "default".to_string(),
            encrypt: false,
            passphrase: String::new(),
            mute_during_tx: true,
        }
    }
}

impl Settings {
    /// Default on-disk location, e.g. `~/.config/modemchat/settings.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modemchat").join("settings.toml"))
    }

    /// Load from `path`, falling back to defaults when the file is
    /// missing or malformed. A malformed file is reported, not fatal.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
