use crate::shared::{Pitch, Tone};

/// One tone to sound at a given point on the audio timeline.
/// `at` is in seconds on the audio clock, not wall time.
#[derive(Clone, Copy, Debug)]
pub struct ToneParams {
    pub at: f64,
    pub beat_in_bar: u32,
    pub tone: Tone,
    pub pitch: Pitch,
}

#[derive(Clone, Copy, Debug)]
pub enum AudioCommand {
    // Scheduling is declarative: the engine holds the voice until the
    // requested frame arrives, the sender never waits.
    Tone(ToneParams),
}

/// The scheduler's view of the audio backend: a monotonic clock plus
/// fire-and-forget tone scheduling. The cpal handle implements this in
/// production; tests drive the scheduler with a hand-cranked fake.
pub trait TonePort {
    /// Seconds on the audio clock. Advances independently of the caller.
    fn now(&self) -> f64;

    fn schedule_tone(&mut self, at: f64, beat_in_bar: u32, tone: Tone, pitch: Pitch);
}

// purely for testing: a port whose clock only moves when the test says so,
// recording every scheduled tone for inspection
#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Default)]
    pub struct FakePort {
        pub clock: f64,
        pub scheduled: Vec<ToneParams>,
    }

    impl FakePort {
        pub fn advance(&mut self, secs: f64) {
            self.clock += secs;
        }
    }

    impl TonePort for FakePort {
        fn now(&self) -> f64 {
            self.clock
        }

        fn schedule_tone(&mut self, at: f64, beat_in_bar: u32, tone: Tone, pitch: Pitch) {
            self.scheduled.push(ToneParams {
                at,
                beat_in_bar,
                tone,
                pitch,
            });
        }
    }
}
