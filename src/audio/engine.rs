use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio_api::{AudioCommand, ToneParams};

use super::voice::Voice;

const MAX_VOICES: usize = 8; // hard cap so we never malloc in the audio callback

/// Renders scheduled tones into the output stream and owns the audio clock:
/// every block it publishes its rendered-frame count, which is what the
/// scheduler reads as "now".
pub struct Engine {
    sample_rate: f32,
    frames: u64, // frames rendered since stream start
    clock: Arc<AtomicU64>,
    voices: [Option<Voice>; MAX_VOICES],
}

impl Engine {
    pub fn new(sample_rate: u32, clock: Arc<AtomicU64>) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            frames: 0,
            clock,
            voices: [None; MAX_VOICES],
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Tone(params) => self.schedule_voice(params),
        }
    }

    fn schedule_voice(&mut self, params: ToneParams) {
        // a tone whose time has already passed starts on the next frame
        let due = (params.at * self.sample_rate as f64).round();
        let start_frame = (due.max(0.0) as u64).max(self.frames);
        let voice = Voice::new(params, self.sample_rate, start_frame);

        let slot = self
            .voices
            .iter()
            .position(|v| !v.as_ref().is_some_and(|v| v.alive))
            .unwrap_or(0);
        self.voices[slot] = Some(voice);
    }

    /// Fill one interleaved output block. Tones are mono; the same sample
    /// goes to every channel.
    pub fn render_block(&mut self, out: &mut [f32], channels: usize) {
        let n_frames = out.len() / channels;
        for i in 0..n_frames {
            let frame = self.frames + i as u64;
            let mut sample = 0.0f32;
            for voice in self.voices.iter_mut().flatten() {
                sample += voice.sample(frame);
            }
            for ch in 0..channels {
                out[i * channels + ch] = sample;
            }
        }
        self.frames += n_frames as u64;
        self.clock.store(self.frames, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Pitch, Tone};

    const SR: u32 = 48_000;

    fn engine() -> (Engine, Arc<AtomicU64>) {
        let clock = Arc::new(AtomicU64::new(0));
        (Engine::new(SR, Arc::clone(&clock)), clock)
    }

    fn tone_at(at: f64) -> AudioCommand {
        AudioCommand::Tone(ToneParams {
            at,
            beat_in_bar: 0,
            tone: Tone::Click,
            pitch: Pitch::Default,
        })
    }

    fn render(engine: &mut Engine, frames: usize, channels: usize) -> Vec<f32> {
        let mut block = vec![0.0f32; frames * channels];
        engine.render_block(&mut block, channels);
        block
    }

    #[test]
    fn a_scheduled_tone_starts_at_its_frame_not_earlier() {
        let (mut engine, _) = engine();
        engine.handle_cmd(tone_at(0.1)); // frame 4800

        let early = render(&mut engine, 4800, 1);
        assert!(early.iter().all(|s| *s == 0.0), "tone sounded early");

        let on_time = render(&mut engine, 4800, 1);
        assert!(on_time.iter().any(|s| *s != 0.0), "tone never sounded");
    }

    #[test]
    fn a_late_tone_starts_immediately_instead_of_never() {
        let (mut engine, _) = engine();
        render(&mut engine, 9600, 1); // clock is already past 0.1s
        engine.handle_cmd(tone_at(0.1));

        let block = render(&mut engine, 512, 1);
        assert!(block.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn the_frame_clock_tracks_rendered_frames() {
        let (mut engine, clock) = engine();
        render(&mut engine, 480, 2);
        assert_eq!(clock.load(Ordering::Acquire), 480);
        render(&mut engine, 256, 2);
        assert_eq!(clock.load(Ordering::Acquire), 736);
    }

    #[test]
    fn tones_fan_out_to_every_channel() {
        let (mut engine, _) = engine();
        engine.handle_cmd(tone_at(0.0));
        let block = render(&mut engine, 256, 2);
        for frame in block.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(block.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn a_click_fully_decays_and_frees_its_slot() {
        let (mut engine, _) = engine();
        engine.handle_cmd(tone_at(0.0));
        render(&mut engine, SR as usize / 10, 1); // 100ms, click lasts 30ms

        let tail = render(&mut engine, 512, 1);
        assert!(tail.iter().all(|s| *s == 0.0), "click outlived its 30ms");
    }
}
