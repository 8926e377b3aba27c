//! Playback state machine. Owns at most one metronome at a time and is the
//! only place that starts, stops, or replaces one; the transition table is
//! enforced here so the rest of the app can't wedge the scheduler.

use crate::audio_api::TonePort;
use crate::error::TransportError;
use crate::metronome::{BeatEvent, BeatResponse, Metronome};
use crate::pipeline::song::Song;
use crate::shared::{Pitch, Tone};

const MIN_BPM: i32 = 20;
const MAX_BPM: i32 = 300;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

pub struct Player {
    state: PlaybackState,
    metronome: Option<Metronome>,
    tone: Tone,
    pitch: Pitch,
    last_beat: Option<BeatEvent>,
}

impl Player {
    pub fn new(tone: Tone, pitch: Pitch) -> Self {
        Self {
            state: PlaybackState::Stopped,
            metronome: None,
            tone,
            pitch,
            last_beat: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether a scheduler is armed for the current song. Stopped + armed
    /// means play will restart the same song from beat zero.
    pub fn is_armed(&self) -> bool {
        self.metronome.is_some()
    }

    pub fn is_muted(&self) -> bool {
        self.metronome.as_ref().is_some_and(Metronome::is_muted)
    }

    /// Live scheduler tempo; differs from the song's bpm after a nudge.
    pub fn bpm(&self) -> Option<u32> {
        self.metronome.as_ref().map(Metronome::bpm)
    }

    pub fn last_beat(&self) -> Option<BeatEvent> {
        self.last_beat
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Request a transition. Exactly the legal table; anything else is a
    /// typed error and leaves the state untouched.
    pub fn request(
        &mut self,
        target: PlaybackState,
        port: &dyn TonePort,
    ) -> Result<(), TransportError> {
        use PlaybackState::*;
        match (self.state, target) {
            (Stopped, Playing) | (Paused, Playing) | (Playing, Playing) => {
                let metronome = self.metronome.as_mut().ok_or(TransportError::NoSongArmed)?;
                metronome.start(port);
            }
            (Paused, Stopped) | (Playing, Stopped) => {
                if let Some(metronome) = self.metronome.as_mut() {
                    if let Some(reset) = metronome.stop(true) {
                        self.last_beat = Some(reset);
                    }
                }
            }
            (Playing, Paused) => {
                if let Some(metronome) = self.metronome.as_mut() {
                    metronome.stop(false);
                }
            }
            (from, to) => return Err(TransportError::Illegal { from, to }),
        }
        self.state = target;
        Ok(())
    }

    /// Switch to a song: the old scheduler is stopped and discarded no
    /// matter what state it was in, a fresh one is armed at the song's
    /// tempo with the current tone/pitch carried over, and playback starts.
    pub fn play_song(&mut self, song: &Song, port: &dyn TonePort) -> Result<(), TransportError> {
        if let Some(old) = self.metronome.as_mut() {
            old.stop(false);
        }
        self.metronome = Some(Metronome::new(song.bpm, self.tone, self.pitch));
        self.last_beat = None;
        self.request(PlaybackState::Playing, port)
    }

    /// Drop the scheduler entirely (song deselected, or selection moved
    /// without autoplay). Play afterwards arms the selection fresh.
    pub fn clear_song(&mut self) {
        if let Some(metronome) = self.metronome.as_mut() {
            metronome.stop(true);
        }
        self.metronome = None;
        self.last_beat = None;
        self.state = PlaybackState::Stopped;
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
        if let Some(metronome) = self.metronome.as_mut() {
            metronome.set_tone(tone);
        }
    }

    pub fn set_pitch(&mut self, pitch: Pitch) {
        self.pitch = pitch;
        if let Some(metronome) = self.metronome.as_mut() {
            metronome.set_pitch(pitch);
        }
    }

    /// Nudge the live tempo. The song itself keeps its configured bpm;
    /// replaying it builds a scheduler back at that tempo.
    pub fn nudge_bpm(&mut self, delta: i32) {
        if let Some(metronome) = self.metronome.as_mut() {
            let bpm = (metronome.bpm() as i32 + delta).clamp(MIN_BPM, MAX_BPM);
            metronome.set_bpm(bpm as u32);
        }
    }

    /// The per-loop scheduling pass. Applies the auto-stop / auto-silence
    /// policy on every beat notification: with the thresholds toggle on and
    /// the song defining a bar count, effective_bar = bar + 1 past the
    /// count stops playback (auto-stop) or mutes the scheduler
    /// (auto-silence) on that very beat.
    pub fn tick(&mut self, port: &mut dyn TonePort, song: Option<&Song>, thresholds: bool) {
        let Some(metronome) = self.metronome.as_mut() else {
            return;
        };
        if !metronome.is_running() {
            return;
        }
        let (auto_stop, auto_silence) = match song {
            Some(s) if thresholds => (s.auto_stop, s.auto_silence),
            _ => (None, None),
        };

        let mut events: Vec<BeatEvent> = Vec::new();
        metronome.run_tick(port, &mut |event| {
            events.push(event);
            if !event.running {
                return BeatResponse::default();
            }
            let effective_bar = event.bar + 1;
            BeatResponse {
                stop: auto_stop.is_some_and(|bars| effective_bar > bars as u64),
                mute: auto_silence.is_some_and(|bars| effective_bar > bars as u64),
            }
        });

        if let Some(last) = events.last() {
            self.last_beat = Some(*last);
        }
        if events.iter().any(|event| !event.running) {
            // the scheduler reset itself on auto-stop
            self.state = PlaybackState::Stopped;
        }
    }
}
