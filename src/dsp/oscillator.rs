//! Sine oscillator with self-feedback, phase-modulatable from outside.

use std::f64::consts::TAU;

/// A sinusoidal phase accumulator whose output is fed back into its own
/// phase through a two-sample averaging history.
#[derive(Debug, Clone)]
pub struct FeedbackOscillator {
    frequency: f64,
    feedback: f64,
    /// Current phase in radians, kept in [0, 2π).
    phase: f64,
    phase_inc: f64,
    /// Last two output samples, newest first.
    history: [f64; 2],
    sample_rate: f64,
}

impl FeedbackOscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        FeedbackOscillator {
            frequency,
            feedback: 0.0,
            phase: 0.0,
            phase_inc: TAU * frequency / sample_rate,
            history: [0.0; 2],
            sample_rate,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.phase_inc = TAU * frequency / self.sample_rate;
    }

    pub fn feedback(&self) -> f64 {
        self.feedback
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Set the phase in radians, normalized into [0, 2π).
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(TAU);
    }

    /// Compute the sample at the current state without advancing it.
    pub fn peek(&self, phase_mod: f64) -> f64 {
        let fb_in = 0.5 * (self.history[0] + self.history[1]);
        (self.phase + fb_in * self.feedback + phase_mod).sin()
    }

    /// Generate the next sample and advance phase and feedback history.
    ///
    /// The phase is wrapped at most once per call, so frequencies above the
    /// sample rate are not supported.
    pub fn next_sample(&mut self, phase_mod: f64) -> f64 {
        let sample = self.peek(phase_mod);

        self.history[1] = self.history[0];
        self.history[0] = sample;

        self.phase += self.phase_inc;
        if self.phase >= TAU {
            self.phase -= TAU;
        }

        sample
    }
}
