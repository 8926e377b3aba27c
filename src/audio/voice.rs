use std::f32::consts::TAU;

use crate::audio_api::ToneParams;
use crate::shared::Tone;

// accent on the downbeat, a step lower on the rest of the bar
fn base_frequency(tone: Tone, beat_in_bar: u32) -> f32 {
    let downbeat = beat_in_bar == 0;
    match tone {
        Tone::Click => {
            if downbeat {
                1200.0
            } else {
                1000.0
            }
        }
        Tone::Sine => {
            if downbeat {
                1568.0
            } else {
                1046.0
            }
        }
    }
}

/// One scheduled transient. Silent until its start frame arrives, then an
/// oscillator with a per-tone envelope: a click holds gain 1.0 through
/// +1ms, decays exponentially to 0.001 by +20ms and is dead at +30ms; a
/// sine holds flat gain 1.0 for 50ms.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    start_frame: u64,
    phase: f32,
    phase_inc: f32,
    amp: f32,
    decay: f32, // per-frame multiplier inside the decay span
    attack_end: u64,
    decay_end: u64,
    total: u64,
    rendered: u64,
    pub alive: bool,
}

impl Voice {
    pub fn new(params: ToneParams, sample_rate: f32, start_frame: u64) -> Self {
        let freq = base_frequency(params.tone, params.beat_in_bar) * params.pitch.multiplier();
        let phase_inc = TAU * freq / sample_rate;
        let ms = |m: f64| (sample_rate as f64 * m / 1000.0).round() as u64;

        let (attack_end, decay_end, total) = match params.tone {
            Tone::Click => (ms(1.0), ms(20.0), ms(30.0)),
            Tone::Sine => (ms(50.0), ms(50.0), ms(50.0)),
        };
        let decay_span = decay_end.saturating_sub(attack_end).max(1);
        let decay = match params.tone {
            Tone::Click => 0.001f32.powf(1.0 / decay_span as f32),
            Tone::Sine => 1.0,
        };

        Self {
            start_frame,
            phase: 0.0,
            phase_inc,
            amp: 1.0,
            decay,
            attack_end,
            decay_end,
            total,
            rendered: 0,
            alive: true,
        }
    }

    /// Contribution of this voice at absolute engine frame `frame`.
    pub fn sample(&mut self, frame: u64) -> f32 {
        if !self.alive || frame < self.start_frame {
            return 0.0;
        }
        if self.rendered >= self.total {
            self.alive = false;
            return 0.0;
        }

        let out = self.amp * self.phase.sin();
        self.phase += self.phase_inc;
        if self.phase > TAU {
            self.phase -= TAU;
        }
        if self.rendered >= self.attack_end && self.rendered < self.decay_end {
            self.amp *= self.decay;
        }
        self.rendered += 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Pitch;

    const SR: f32 = 48_000.0;

    fn params(tone: Tone, beat_in_bar: u32, pitch: Pitch) -> ToneParams {
        ToneParams { at: 0.0, beat_in_bar, tone, pitch }
    }

    fn drain(voice: &mut Voice) -> Vec<f32> {
        let mut out = Vec::new();
        let mut frame = 0;
        while voice.alive {
            out.push(voice.sample(frame));
            frame += 1;
            assert!(frame < 10 * SR as u64, "voice never died");
        }
        out
    }

    // count sign changes to estimate the rendered frequency
    fn cycles(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] > 0.0) != (w[1] > 0.0) && w[1] != 0.0)
            .count()
            / 2
    }

    #[test]
    fn voice_is_silent_until_its_start_frame() {
        let mut voice = Voice::new(params(Tone::Click, 0, Pitch::Default), SR, 100);
        for frame in 0..100 {
            assert_eq!(voice.sample(frame), 0.0);
        }
        assert!(voice.alive);
        let audible = (100..200).map(|f| voice.sample(f)).any(|s| s != 0.0);
        assert!(audible);
    }

    #[test]
    fn click_dies_at_thirty_milliseconds() {
        let mut voice = Voice::new(params(Tone::Click, 1, Pitch::Default), SR, 0);
        let samples = drain(&mut voice);
        assert_eq!(samples.len() as u64, (SR as f64 * 0.030).round() as u64 + 1);
    }

    #[test]
    fn sine_lasts_fifty_milliseconds_flat() {
        let mut voice = Voice::new(params(Tone::Sine, 1, Pitch::Default), SR, 0);
        let samples = drain(&mut voice);
        assert_eq!(samples.len() as u64, (SR as f64 * 0.050).round() as u64 + 1);
        // flat gain: the last full cycle still peaks near 1.0
        let tail_peak = samples[samples.len() - 64..]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak > 0.9, "sine tail decayed: {tail_peak}");
    }

    #[test]
    fn click_envelope_decays_towards_a_milli() {
        let mut voice = Voice::new(params(Tone::Click, 1, Pitch::Default), SR, 0);
        let samples = drain(&mut voice);
        let head_peak = samples[..48].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        // past the 20ms decay target the residual holds around 0.001
        let late = &samples[(SR as usize * 21 / 1000)..(SR as usize * 29 / 1000)];
        let late_peak = late.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(head_peak > 0.8, "attack should reach full gain: {head_peak}");
        assert!(late_peak < 0.002, "decay should reach ~0.001: {late_peak}");
    }

    #[test]
    fn frequencies_follow_beat_and_pitch() {
        // (tone, beat, pitch, expected Hz)
        let cases = [
            (Tone::Click, 0, Pitch::Default, 1200.0),
            (Tone::Click, 2, Pitch::Default, 1000.0),
            (Tone::Click, 1, Pitch::High, 1500.0),
            (Tone::Sine, 0, Pitch::Default, 1568.0),
            (Tone::Sine, 3, Pitch::Low, 784.5),
        ];
        for (tone, beat, pitch, expected) in cases {
            let mut voice = Voice::new(params(tone, beat, pitch), SR, 0);
            let samples = drain(&mut voice);
            let secs = samples.len() as f32 / SR;
            let measured = cycles(&samples) as f32 / secs;
            let error = (measured - expected).abs() / expected;
            assert!(
                error < 0.05,
                "{tone:?} beat {beat} {pitch:?}: measured {measured} Hz, expected {expected}"
            );
        }
    }
}
