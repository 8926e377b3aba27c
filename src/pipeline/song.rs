// the playlist document and its normalization. uploads are parsed into raw
// structs first so validation can name the exact offending song instead of
// bubbling a generic serde error; one bad song aborts the whole load.

use serde::{Deserialize, Serialize};

use crate::error::PlaylistError;

pub const DEFAULT_MEASURE: &str = "4/4";
pub const DEFAULT_DURATION: &str = "0:00";

// document shape as uploaded, everything optional
#[derive(Debug, Deserialize)]
struct RawPlaylist {
    #[serde(default)]
    title: String,
    #[serde(default)]
    songs: Vec<RawSong>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSong {
    title: Option<String>,
    bpm: Option<u32>,
    measure: Option<String>,
    duration: Option<String>,
    auto_stop: Option<u32>,
    auto_silence: Option<u32>,
}

/// A normalized playlist entry. Built once at load time, never mutated
/// afterward; `index` is its position in display and navigation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub index: usize,
    pub title: String,
    pub bpm: u32,
    pub measure: String,
    pub duration: String,
    pub duration_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_silence: Option<u32>,
}

impl Song {
    fn normalize(index: usize, raw: RawSong) -> Result<Self, PlaylistError> {
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(PlaylistError::MissingTitle(index))?;
        let bpm = raw
            .bpm
            .filter(|b| *b > 0)
            .ok_or(PlaylistError::MissingBpm(index))?;

        for (field, value) in [("autoStop", raw.auto_stop), ("autoSilence", raw.auto_silence)] {
            if value == Some(0) {
                return Err(PlaylistError::BadThreshold {
                    index,
                    title: title.clone(),
                    field,
                });
            }
        }

        let measure = raw.measure.unwrap_or_else(|| DEFAULT_MEASURE.to_string());
        let duration = raw.duration.unwrap_or_else(|| DEFAULT_DURATION.to_string());
        let duration_secs = parse_duration(&duration)?;

        Ok(Self {
            index,
            title,
            bpm,
            measure,
            duration,
            duration_secs,
            auto_stop: raw.auto_stop,
            auto_silence: raw.auto_silence,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub title: String,
    pub songs: Vec<Song>,
}

impl Playlist {
    /// Parse and validate an uploaded playlist document. Fails as a whole:
    /// a single invalid song yields no playlist at all.
    pub fn from_json(text: &str) -> Result<Self, PlaylistError> {
        let raw: RawPlaylist = serde_json::from_str(text)?;
        let mut songs = Vec::with_capacity(raw.songs.len());
        for (index, raw_song) in raw.songs.into_iter().enumerate() {
            songs.push(Song::normalize(index, raw_song)?);
        }
        Ok(Self {
            title: raw.title,
            songs,
        })
    }

    pub fn total_duration_secs(&self) -> u32 {
        self.songs.iter().map(|s| s.duration_secs).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} Songs - Duration: {}",
            self.songs.len(),
            format_duration(self.total_duration_secs())
        )
    }
}

/// "mm:ss" → seconds. Exactly one colon, both parts integers.
pub fn parse_duration(duration: &str) -> Result<u32, PlaylistError> {
    let bad = || PlaylistError::BadDuration(duration.to_string());
    let (minutes, seconds) = duration.split_once(':').ok_or_else(bad)?;
    if seconds.contains(':') {
        return Err(bad());
    }
    let minutes: u32 = minutes.trim().parse().map_err(|_| bad())?;
    let seconds: u32 = seconds.trim().parse().map_err(|_| bad())?;
    Ok(minutes * 60 + seconds)
}

pub fn format_duration(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
