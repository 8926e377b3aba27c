// the middle layer owns all application state: the playlist, the selection,
// the player, and the persisted flags. the tui renders what display_state()
// hands it and sends semantic InputEvents back; nothing else crosses.

use std::path::{Path, PathBuf};

use crate::audio_api::TonePort;
use crate::pipeline::persistence::Settings;
use crate::pipeline::song::{Playlist, Song, format_duration};
use crate::player::{PlaybackState, Player};
use crate::shared::{DisplayState, InputEvent, SongRow};

pub struct Middle {
    playlist: Option<Playlist>,
    playlist_path: Option<PathBuf>,
    current: Option<usize>,
    cursor: usize,
    player: Player,
    autoplay: bool,
    thresholds: bool,
    status: String,
    dirty: bool,
}

impl Middle {
    pub fn with_settings(settings: Settings) -> Self {
        let current = match (&settings.playlist, settings.song_index) {
            (Some(playlist), Some(index)) if index < playlist.songs.len() => Some(index),
            _ => None,
        };
        Self {
            cursor: current.unwrap_or(0),
            playlist: settings.playlist,
            playlist_path: None,
            current,
            player: Player::new(settings.tone, settings.pitch),
            autoplay: settings.autoplay,
            thresholds: settings.auto_thresholds,
            status: String::new(),
            dirty: false,
        }
    }

    fn songs(&self) -> &[Song] {
        self.playlist.as_ref().map_or(&[], |p| p.songs.as_slice())
    }

    pub fn handle_input(&mut self, event: InputEvent, port: &mut dyn TonePort) {
        match event {
            InputEvent::PlayPause => self.toggle_play_pause(port),
            InputEvent::Stop => {
                // mirror a disabled stop button: ignore when already stopped
                if self.player.state() != PlaybackState::Stopped {
                    self.transition(PlaybackState::Stopped, port);
                }
            }
            InputEvent::NextSong => self.step_song(1, port),
            InputEvent::PrevSong => self.step_song(-1, port),
            InputEvent::CursorUp => self.cursor = self.cursor.saturating_sub(1),
            InputEvent::CursorDown => {
                if self.cursor + 1 < self.songs().len() {
                    self.cursor += 1;
                }
            }
            InputEvent::PlaySelected => {
                if !self.songs().is_empty() {
                    self.play_song_at(self.cursor, port);
                }
            }
            InputEvent::CycleTone => {
                self.player.set_tone(self.player.tone().next());
                self.dirty = true;
            }
            InputEvent::CyclePitch => {
                self.player.set_pitch(self.player.pitch().next());
                self.dirty = true;
            }
            InputEvent::ToggleAutoplay => {
                self.autoplay = !self.autoplay;
                self.dirty = true;
            }
            InputEvent::ToggleThresholds => {
                self.thresholds = !self.thresholds;
                self.dirty = true;
            }
            InputEvent::NudgeBpm(delta) => self.player.nudge_bpm(delta),
            InputEvent::ReloadPlaylist => self.reload_playlist(),
            InputEvent::Quit => {} // handled by the main loop
        }
    }

    fn toggle_play_pause(&mut self, port: &mut dyn TonePort) {
        match self.player.state() {
            PlaybackState::Playing => self.transition(PlaybackState::Paused, port),
            PlaybackState::Paused => self.transition(PlaybackState::Playing, port),
            PlaybackState::Stopped => {
                if self.player.is_armed() {
                    // restart the stopped song from beat zero
                    self.transition(PlaybackState::Playing, port);
                } else if let Some(index) = self.current {
                    self.play_song_at(index, port);
                }
            }
        }
    }

    fn transition(&mut self, target: PlaybackState, port: &mut dyn TonePort) {
        if let Err(e) = self.player.request(target, &*port) {
            self.status = e.to_string();
        }
    }

    fn play_song_at(&mut self, index: usize, port: &mut dyn TonePort) {
        let Some(song) = self.songs().get(index).cloned() else {
            return;
        };
        self.current = Some(index);
        self.cursor = index;
        if let Err(e) = self.player.play_song(&song, &*port) {
            self.status = e.to_string();
        }
        self.dirty = true;
    }

    /// Next/previous wraps around the playlist. With autoplay the new song
    /// starts immediately; without it only the selection moves and playback
    /// resets to stopped.
    fn step_song(&mut self, delta: i32, port: &mut dyn TonePort) {
        let len = self.songs().len();
        let Some(current) = self.current else {
            return; // navigation needs a song to step from
        };
        if len == 0 {
            return;
        }
        let index = (current as i32 + delta).rem_euclid(len as i32) as usize;
        if self.autoplay {
            self.play_song_at(index, port);
        } else {
            self.select_stopped(index);
        }
    }

    fn select_stopped(&mut self, index: usize) {
        self.current = Some(index);
        self.cursor = index;
        self.player.clear_song();
        self.dirty = true;
    }

    /// Load (or re-load) a playlist document. A file that fails to read or
    /// validate leaves the previous playlist and selection untouched; only
    /// the status line reports it.
    pub fn load_playlist_file(&mut self, path: &Path) {
        self.playlist_path = Some(path.to_path_buf());
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                self.status = format!("{}: {e}", path.display());
                return;
            }
        };
        match Playlist::from_json(&text) {
            Ok(playlist) => self.replace_playlist(playlist),
            Err(e) => self.status = format!("playlist not replaced: {e}"),
        }
    }

    fn replace_playlist(&mut self, playlist: Playlist) {
        // a replaced playlist takes whatever was playing with it
        self.player.clear_song();
        self.status = format!(
            "loaded \"{}\" ({} songs)",
            playlist.title,
            playlist.songs.len()
        );
        self.playlist = Some(playlist);
        self.current = None;
        self.cursor = 0;
        self.dirty = true;
    }

    fn reload_playlist(&mut self) {
        match self.playlist_path.clone() {
            Some(path) => self.load_playlist_file(&path),
            None => self.status = "no playlist file to reload".to_string(),
        }
    }

    /// The per-loop scheduling pass.
    pub fn tick(&mut self, port: &mut dyn TonePort) {
        let song = self
            .current
            .and_then(|index| self.playlist.as_ref().and_then(|p| p.songs.get(index)));
        self.player.tick(port, song, self.thresholds);
    }

    /// True once per settings change; the main loop persists on it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn settings(&self) -> Settings {
        Settings {
            playlist: self.playlist.clone(),
            song_index: self.current,
            tone: self.player.tone(),
            pitch: self.player.pitch(),
            autoplay: self.autoplay,
            auto_thresholds: self.thresholds,
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let songs = self.songs();
        let rows = songs
            .iter()
            .map(|song| SongRow {
                no: song.index + 1,
                title: song.title.clone(),
                bpm_label: format!("{} bpm", song.bpm),
                auto_label: auto_label(song),
            })
            .collect();

        let current_song = self.current.and_then(|index| songs.get(index));
        let (song_no, song_title, song_bpm, song_infos) = match current_song {
            Some(song) => (
                (song.index + 1).to_string(),
                song.title.clone(),
                format!("{} bpm", self.player.bpm().unwrap_or(song.bpm)),
                auto_label(song),
            ),
            None => (
                String::new(),
                "Play a song".to_string(),
                String::new(),
                String::new(),
            ),
        };

        let beat = self.player.last_beat().filter(|b| b.running);
        let progress = match (beat, self.player.bpm(), current_song) {
            (Some(b), Some(bpm), Some(song)) if song.duration_secs > 0 => {
                let elapsed = (b.beat * 60 / bpm as u64) as u32;
                format!(
                    "{} / {}",
                    format_duration(elapsed),
                    format_duration(song.duration_secs)
                )
            }
            _ => String::new(),
        };

        let (playlist_title, playlist_subtitle) = match &self.playlist {
            Some(playlist) => (playlist.title.clone(), playlist.summary()),
            None => (
                "No playlist loaded".to_string(),
                "pass a playlist.json on the command line".to_string(),
            ),
        };

        DisplayState {
            playlist_title,
            playlist_subtitle,
            rows,
            cursor: self.cursor,
            now_playing: self.current,
            song_no,
            song_title,
            song_bpm,
            song_infos,
            progress,
            state: self.player.state(),
            bar_text: beat.map_or_else(|| "-".to_string(), |b| (b.bar + 1).to_string()),
            beat_cell: beat.map(|b| b.beat_in_bar),
            muted: self.player.is_muted(),
            tone: self.player.tone(),
            pitch: self.player.pitch(),
            autoplay: self.autoplay,
            thresholds: self.thresholds,
            status: self.status.clone(),
        }
    }
}

fn auto_label(song: &Song) -> String {
    match (song.auto_stop, song.auto_silence) {
        (Some(bars), _) => format!("Auto-Stop: {bars}"),
        (None, Some(bars)) => format!("Auto-Silence: {bars}"),
        (None, None) => String::new(),
    }
}
