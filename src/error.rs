use thiserror::Error;

use crate::player::PlaybackState;

/// Configuration errors raised while loading a playlist document.
/// Any of these aborts the whole load; there is no partial playlist.
#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("song {0}: missing mandatory \"title\" attribute")]
    MissingTitle(usize),

    #[error("song {0}: missing mandatory \"bpm\" attribute")]
    MissingBpm(usize),

    #[error("song {index} (\"{title}\"): {field} must be a positive bar count")]
    BadThreshold {
        index: usize,
        title: String,
        field: &'static str,
    },

    #[error("illegal format for duration, expected mm:ss, actual=\"{0}\"")]
    BadDuration(String),

    #[error("failed to parse playlist JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Protocol errors from the playback state machine. These indicate a
/// caller bug, not something expected at runtime when the UI guards
/// its inputs correctly.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("illegal state transition: {from:?} -> {to:?}")]
    Illegal {
        from: PlaybackState,
        to: PlaybackState,
    },

    #[error("cannot play: no song armed")]
    NoSongArmed,
}
