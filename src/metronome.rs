//! The look-ahead beat scheduler.
//!
//! A coarse ~25ms tick drains every beat whose due time has entered a 100ms
//! horizon on the audio clock. As long as the horizon exceeds the tick's
//! worst-case delay, no beat is dropped or audibly late: tones are stamped
//! with audio-clock times, so jitter in tick arrival never reaches the ear.

use crate::audio_api::TonePort;
use crate::shared::{Pitch, Tone};

pub const BEATS_PER_BAR: u32 = 4; // 'measure' is parsed but only 4/4 is honored

/// How far ahead of the audio clock beats are scheduled (sec).
const SCHEDULE_AHEAD_SECS: f64 = 0.1;
/// Safety margin between start() and the first beat (sec).
const START_DELAY_SECS: f64 = 0.05;
/// How often the owner is expected to call run_tick (ms).
pub const TICK_INTERVAL_MS: u64 = 25;

/// One beat notification. Delivered once per scheduled beat while running,
/// and exactly once as (0, 0, 0, running=false) on a reset-stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeatEvent {
    pub beat: u64,
    pub bar: u64,
    pub beat_in_bar: u32,
    pub running: bool,
}

/// What the listener wants done with the beat it was just handed.
/// `stop` halts and resets the scheduler before the beat is sounded;
/// `mute` silences it from this beat onward. Both default to off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BeatResponse {
    pub stop: bool,
    pub mute: bool,
}

pub struct Metronome {
    bpm: u32,
    next_note_time: f64, // audio-clock time of the next unscheduled beat
    running: bool,
    muted: bool,
    tone: Tone,
    pitch: Pitch,
    current_beat: u64, // beats since start
    current_beat_in_bar: u32,
}

impl Metronome {
    pub fn new(bpm: u32, tone: Tone, pitch: Pitch) -> Self {
        assert!(bpm > 0, "bpm must be greater than 0");
        Self {
            bpm,
            next_note_time: 0.0,
            running: false,
            muted: false,
            tone,
            pitch,
            current_beat: 0,
            current_beat_in_bar: 0,
        }
    }

    /// Begin (or resume) beating. No-op while already running. The first
    /// beat lands a short margin after "now" so the audio thread is never
    /// asked for a frame that has already passed.
    pub fn start(&mut self, port: &dyn TonePort) {
        if self.running {
            return;
        }
        self.running = true;
        self.next_note_time = port.now() + START_DELAY_SECS;
    }

    /// Halt scheduling. With `reset`, beat counters and the mute flag are
    /// cleared and the one synchronous reset notification is returned so
    /// the observer can blank its display. A plain stop (pause) keeps the
    /// counters for a later resume.
    pub fn stop(&mut self, reset: bool) -> Option<BeatEvent> {
        self.running = false;
        if reset {
            self.current_beat = 0;
            self.current_beat_in_bar = 0;
            self.muted = false;
            Some(BeatEvent {
                beat: 0,
                bar: 0,
                beat_in_bar: 0,
                running: false,
            })
        } else {
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    pub fn set_pitch(&mut self, pitch: Pitch) {
        self.pitch = pitch;
    }

    /// Takes effect on the next beat-interval computation; beats already
    /// handed to the audio thread keep their times.
    pub fn set_bpm(&mut self, bpm: u32) {
        assert!(bpm > 0, "bpm must be greater than 0");
        self.bpm = bpm;
    }

    /// One scheduling pass. Drains every beat due within the look-ahead
    /// horizon, in beat order: notify the listener, honor its response,
    /// emit the tone, advance. A stop response resets the scheduler and
    /// ends the drain without sounding the triggering beat.
    pub fn run_tick(
        &mut self,
        port: &mut dyn TonePort,
        on_beat: &mut dyn FnMut(BeatEvent) -> BeatResponse,
    ) {
        if !self.running {
            return;
        }
        let horizon = port.now() + SCHEDULE_AHEAD_SECS;
        while self.next_note_time < horizon {
            let event = BeatEvent {
                beat: self.current_beat,
                bar: self.current_beat / BEATS_PER_BAR as u64,
                beat_in_bar: self.current_beat_in_bar,
                running: true,
            };
            let response = on_beat(event);
            if response.stop {
                if let Some(reset) = self.stop(true) {
                    on_beat(reset);
                }
                break;
            }
            if response.mute {
                // listener runs before tone emission, so the beat that
                // trips auto-silence is itself already silent
                self.muted = true;
            }
            if !self.muted {
                port.schedule_tone(
                    self.next_note_time,
                    self.current_beat_in_bar,
                    self.tone,
                    self.pitch,
                );
            }
            self.advance();
        }
    }

    // advance the counters and the due time by one beat at the current tempo
    fn advance(&mut self) {
        let seconds_per_beat = 60.0 / self.bpm as f64;
        self.next_note_time += seconds_per_beat;
        self.current_beat += 1;
        self.current_beat_in_bar = (self.current_beat_in_bar + 1) % BEATS_PER_BAR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::testing::FakePort;

    fn run_for(m: &mut Metronome, port: &mut FakePort, secs: f64) -> Vec<BeatEvent> {
        let mut events = Vec::new();
        let ticks = (secs / 0.025).round() as usize;
        for _ in 0..ticks {
            m.run_tick(port, &mut |ev| {
                events.push(ev);
                BeatResponse::default()
            });
            port.advance(0.025);
        }
        events
    }

    #[test]
    fn beat_count_and_spacing_at_120_bpm() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);
        run_for(&mut m, &mut port, 10.0);

        // beats land at 0.05 + 0.5k; everything due before 10.0 + horizon
        let expected = (0..).take_while(|k| 0.05 + 0.5 * (*k as f64) < 10.0 + 0.1).count();
        assert_eq!(port.scheduled.len(), expected);

        for pair in port.scheduled.windows(2) {
            let gap = pair[1].at - pair[0].at;
            assert!((gap - 0.5).abs() < 1e-9, "uneven beat spacing: {gap}");
        }
    }

    #[test]
    fn counters_cycle_through_the_bar() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(240, Tone::Click, Pitch::Default);
        m.start(&port);
        let events = run_for(&mut m, &mut port, 5.0);

        assert!(events.len() > 12);
        for ev in &events {
            assert!(ev.running);
            assert_eq!(ev.beat_in_bar as u64, ev.beat % 4);
            assert_eq!(ev.bar, ev.beat / 4);
        }
    }

    #[test]
    fn reset_stop_then_start_replays_from_beat_zero() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);
        run_for(&mut m, &mut port, 3.0);

        let reset = m.stop(true).expect("reset-stop must notify");
        assert_eq!(
            reset,
            BeatEvent { beat: 0, bar: 0, beat_in_bar: 0, running: false }
        );
        assert!(!m.is_running());

        m.start(&port);
        let events = run_for(&mut m, &mut port, 1.0);
        assert_eq!(events[0].beat, 0);
        assert_eq!(events[0].beat_in_bar, 0);
    }

    #[test]
    fn pause_keeps_counters_for_resume() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);
        let before = run_for(&mut m, &mut port, 2.0);
        let last = before.last().unwrap().beat;

        assert!(m.stop(false).is_none());
        m.start(&port);
        let after = run_for(&mut m, &mut port, 1.0);
        assert_eq!(after[0].beat, last + 1);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);
        run_for(&mut m, &mut port, 1.0);
        let scheduled = port.scheduled.len();

        m.start(&port); // must not rewind next_note_time
        run_for(&mut m, &mut port, 1.0);
        assert!(port.scheduled.len() > scheduled);
        let beats: Vec<u64> = port.scheduled.iter().map(|t| (t.at * 1e6) as u64).collect();
        let mut sorted = beats.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(beats.len(), sorted.len(), "duplicate or rewound beats");
    }

    #[test]
    fn muting_suppresses_tones_but_not_notifications() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);
        m.set_muted(true);
        let events = run_for(&mut m, &mut port, 2.0);

        assert!(!events.is_empty());
        assert!(port.scheduled.is_empty());
    }

    #[test]
    fn tempo_change_applies_from_the_next_beat() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(60, Tone::Click, Pitch::Default);
        m.start(&port);
        run_for(&mut m, &mut port, 2.5); // a few 1.0s beats
        let before = port.scheduled.len();
        assert!(before >= 2);

        m.set_bpm(120);
        run_for(&mut m, &mut port, 2.5);

        let times: Vec<f64> = port.scheduled.iter().map(|t| t.at).collect();
        for pair in times[..before].windows(2) {
            assert!((pair[1] - pair[0] - 1.0).abs() < 1e-9);
        }
        for pair in times[before..].windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn a_late_tick_drains_the_whole_backlog_in_order() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);

        // simulate a stalled timer: one second passes without any tick
        port.advance(1.0);
        let mut events = Vec::new();
        m.run_tick(&mut port, &mut |ev| {
            events.push(ev);
            BeatResponse::default()
        });

        assert!(events.len() >= 2, "backlog was not drained");
        for pair in events.windows(2) {
            assert_eq!(pair[1].beat, pair[0].beat + 1);
        }
        for pair in port.scheduled.windows(2) {
            assert!(pair[1].at > pair[0].at);
        }
    }

    #[test]
    fn stop_response_halts_before_the_triggering_beat_sounds() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);

        let mut events = Vec::new();
        for _ in 0..200 {
            m.run_tick(&mut port, &mut |ev| {
                events.push(ev);
                BeatResponse { stop: ev.running && ev.beat == 3, mute: false }
            });
            port.advance(0.025);
        }

        // beats 0..=2 sounded, beat 3 notified but silent, then the reset
        assert_eq!(port.scheduled.len(), 3);
        let running: Vec<u64> = events.iter().filter(|e| e.running).map(|e| e.beat).collect();
        assert_eq!(running, vec![0, 1, 2, 3]);
        assert!(!events.last().unwrap().running);
        assert!(!m.is_running());
    }

    #[test]
    fn mute_response_silences_the_triggering_beat_too() {
        let mut port = FakePort::default();
        let mut m = Metronome::new(120, Tone::Click, Pitch::Default);
        m.start(&port);

        for _ in 0..200 {
            m.run_tick(&mut port, &mut |ev| BeatResponse {
                stop: false,
                mute: ev.beat >= 2,
            });
            port.advance(0.025);
        }

        assert_eq!(port.scheduled.len(), 2);
        assert!(m.is_muted());
        assert!(m.is_running());
    }
}
