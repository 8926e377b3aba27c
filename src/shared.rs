// vocabulary shared between the controller, the audio layer, and the tui.
// the tui only ever reads a DisplayState snapshot and emits InputEvents;
// all actual state lives behind the middle layer.

use serde::{Deserialize, Serialize};

use crate::player::PlaybackState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Click,
    Sine,
}

impl Tone {
    pub fn next(self) -> Self {
        match self {
            Tone::Click => Tone::Sine,
            Tone::Sine => Tone::Click,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tone::Click => "click",
            Tone::Sine => "sine",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pitch {
    Low,
    #[default]
    Default,
    High,
}

impl Pitch {
    /// Multiplier applied to a tone's base frequency.
    pub fn multiplier(self) -> f32 {
        match self {
            Pitch::Low => 0.75,
            Pitch::Default => 1.0,
            Pitch::High => 1.5,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Pitch::Low => Pitch::Default,
            Pitch::Default => Pitch::High,
            Pitch::High => Pitch::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pitch::Low => "low",
            Pitch::Default => "default",
            Pitch::High => "high",
        }
    }
}

// semantic input events, resolved by the tui from raw key presses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    PlayPause,
    Stop,
    NextSong,
    PrevSong,
    CursorUp,
    CursorDown,
    PlaySelected,
    CycleTone,
    CyclePitch,
    ToggleAutoplay,
    ToggleThresholds,
    NudgeBpm(i32),
    ReloadPlaylist,
    Quit,
}

// one playlist row, pre-formatted for the view
#[derive(Clone, Debug)]
pub struct SongRow {
    pub no: usize, // 1-based, as shown
    pub title: String,
    pub bpm_label: String,
    pub auto_label: String,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub playlist_title: String,
    pub playlist_subtitle: String,
    pub rows: Vec<SongRow>,
    pub cursor: usize,
    pub now_playing: Option<usize>,

    pub song_no: String,
    pub song_title: String,
    pub song_bpm: String,
    pub song_infos: String,
    pub progress: String, // "elapsed / duration", empty when nothing runs

    pub state: PlaybackState,
    pub bar_text: String,       // 1-based bar number, "-" when not running
    pub beat_cell: Option<u32>, // lit cell in [0, 4) while running
    pub muted: bool,

    pub tone: Tone,
    pub pitch: Pitch,
    pub autoplay: bool,
    pub thresholds: bool,
    pub status: String,
}
