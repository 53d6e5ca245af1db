//! Low-frequency oscillator with five shapes and optional one-pole smoothing.

use std::f64::consts::TAU;

use crate::patch::LfoWaveform;

/// Portion of one LFO period covered by full smoothing.
const MAX_SMOOTH_PERIOD_FRACTION: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct Lfo {
    pub waveform: LfoWaveform,
    frequency: f64,
    /// Normalized phase in [0, 1).
    phase: f64,
    smooth_samples: usize,
    current: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new(sample_rate: f64) -> Self {
        Lfo {
            waveform: LfoWaveform::Sine,
            frequency: 1.0,
            phase: 0.0,
            smooth_samples: 0,
            current: 0.0,
            sample_rate,
        }
    }

    /// Reconfigure rate, shape and smoothing in one go. The frequency is
    /// applied first because the smoothing length depends on it.
    pub fn set_params(&mut self, frequency: f64, waveform: LfoWaveform, smooth: f64) {
        self.frequency = frequency;
        self.waveform = waveform;
        self.set_smoothing(smooth);
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Set normalized phase; the integer part is discarded.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Smoothing amount in [0, 1]. Zero disables the filter; one uses a time
    /// constant of a quarter of the current period.
    pub fn set_smoothing(&mut self, amount: f64) {
        let amount = amount.clamp(0.0, 1.0);
        if amount == 0.0 {
            self.smooth_samples = 0;
            return;
        }
        let period_samples = self.sample_rate / self.frequency.max(1e-6);
        self.smooth_samples = (amount * MAX_SMOOTH_PERIOD_FRACTION * period_samples) as usize;
    }

    pub fn smooth_samples(&self) -> usize {
        self.smooth_samples
    }

    fn raw_value(&self) -> f64 {
        let p = self.phase;
        match self.waveform {
            LfoWaveform::Sine => (TAU * p).sin(),
            LfoWaveform::Triangle => 4.0 * (p - 0.5).abs() - 1.0,
            LfoWaveform::SawUp => 2.0 * p - 1.0,
            LfoWaveform::SawDown => -2.0 * p + 1.0,
            LfoWaveform::Square => {
                if p > 0.5 {
                    1.0
                } else if p < 0.5 {
                    -1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn next_sample(&mut self) -> f64 {
        let raw = self.raw_value();

        self.phase += self.frequency / self.sample_rate;
        self.phase -= self.phase.trunc();

        if self.smooth_samples <= 1 {
            self.current = raw;
        } else {
            self.current += (raw - self.current) / self.smooth_samples as f64;
        }
        self.current
    }
}
