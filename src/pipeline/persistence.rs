// settings live next to where maelzel runs; loaded once on startup and
// rewritten on every change so a crash never loses more than one edit

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::pipeline::song::Playlist;
use crate::shared::{Pitch, Tone};

const MAELZEL_DIR: &str = ".maelzel";
const SETTINGS_FILE: &str = "settings.json";

/// Everything maelzel remembers between sessions. The playlist itself is
/// kept inline so the last session comes back without re-supplying the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playlist: Option<Playlist>,
    pub song_index: Option<usize>,
    pub tone: Tone,
    pub pitch: Pitch,
    pub autoplay: bool,
    pub auto_thresholds: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playlist: None,
            song_index: None,
            tone: Tone::Click,
            pitch: Pitch::Default,
            autoplay: true,
            auto_thresholds: true,
        }
    }
}

// <dir>/.maelzel/settings.json
fn settings_file_path(dir: &Path) -> PathBuf {
    dir.join(MAELZEL_DIR).join(SETTINGS_FILE)
}

/// Ok(None) when no settings file exists yet; Err when one exists but
/// cannot be read or parsed, so the caller can report it instead of
/// silently wiping the user's record.
pub fn load_settings(dir: &Path) -> anyhow::Result<Option<Settings>> {
    let path = settings_file_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let settings = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(settings))
}

// save the settings to disk, making the directory if it doesn't exist yet
pub fn save_settings(dir: &Path, settings: &Settings) -> anyhow::Result<()> {
    let path = settings_file_path(dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, json)?;
    Ok(())
}
