//! One-shot exponential decay used as a modulation source.

/// Level the decay reaches after the configured release time (-80 dB).
pub const RELEASE_FLOOR: f64 = 1e-4;

/// Multiplicative decay from 1.0 towards [`RELEASE_FLOOR`], then silence.
#[derive(Debug, Clone)]
pub struct ExpReleaseEnvelope {
    release_samples: usize,
    alpha: f64,
    value: f64,
    index: usize,
    sample_rate: f64,
}

impl ExpReleaseEnvelope {
    pub fn new(release_seconds: f64, sample_rate: f64) -> Self {
        let mut env = ExpReleaseEnvelope {
            release_samples: 1,
            alpha: 0.0,
            value: 0.0,
            index: 0,
            sample_rate,
        };
        env.set_release_seconds(release_seconds);
        env
    }

    pub fn set_release_seconds(&mut self, seconds: f64) {
        self.set_release_samples((seconds * self.sample_rate) as usize);
    }

    pub fn set_release_samples(&mut self, samples: usize) {
        self.release_samples = samples.max(1);
        self.alpha = RELEASE_FLOOR.powf(1.0 / self.release_samples as f64);
    }

    pub fn release_samples(&self) -> usize {
        self.release_samples
    }

    /// Restart the decay from 1.0.
    pub fn trigger(&mut self) {
        self.index = 0;
        self.value = 1.0;
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.index >= self.release_samples {
            return 0.0;
        }
        let out = self.value;
        self.value *= self.alpha;
        self.index += 1;
        out
    }
}
