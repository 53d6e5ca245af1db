//! Linear ADSR envelope with gate and optional auto-release timer.

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Convert milliseconds to a whole number of samples, at least one.
///
/// The per-millisecond rate is truncated first (44 samples/ms at 44.1 kHz).
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> usize {
    let samples_per_ms = (sample_rate * 0.001).trunc();
    ((samples_per_ms * ms) as usize).max(1)
}

/// Gated ADSR envelope with linear attack/decay/release segments.
///
/// All segment lengths are stored as sample counts of at least one so no
/// segment can divide by zero. The output is scaled by `amplitude`, which may
/// be negative.
#[derive(Debug, Clone)]
pub struct LinearEnvelope {
    attack: usize,
    decay: usize,
    sustain: f64,
    release: usize,
    amplitude: f64,

    gate: bool,
    stage: Stage,
    index: usize,
    value: f64,
    /// Value captured when the release segment started.
    release_start: f64,
    /// Samples left before the gate closes on its own.
    gate_countdown: Option<usize>,
    sample_rate: f64,
}

impl LinearEnvelope {
    /// Create an envelope with times given in milliseconds.
    pub fn new(
        attack_ms: f64,
        decay_ms: f64,
        sustain: f64,
        release_ms: f64,
        amplitude: f64,
        sample_rate: f64,
    ) -> Self {
        let mut env = LinearEnvelope {
            attack: 1,
            decay: 1,
            sustain: 0.0,
            release: 1,
            amplitude,
            gate: false,
            stage: Stage::Idle,
            index: 0,
            value: 0.0,
            release_start: 0.0,
            gate_countdown: None,
            sample_rate,
        };
        env.set_params(attack_ms, decay_ms, sustain, release_ms);
        env
    }

    /// Set attack, decay, sustain and release (times in milliseconds).
    pub fn set_params(&mut self, attack_ms: f64, decay_ms: f64, sustain: f64, release_ms: f64) {
        self.set_attack_ms(attack_ms);
        self.set_decay_ms(decay_ms);
        self.set_sustain(sustain);
        self.set_release_ms(release_ms);
    }

    pub fn set_attack_ms(&mut self, ms: f64) {
        self.attack = ms_to_samples(ms, self.sample_rate);
    }

    pub fn set_decay_ms(&mut self, ms: f64) {
        self.decay = ms_to_samples(ms, self.sample_rate);
    }

    pub fn set_release_ms(&mut self, ms: f64) {
        self.release = ms_to_samples(ms, self.sample_rate);
    }

    pub fn set_attack_samples(&mut self, samples: usize) {
        self.attack = samples.max(1);
    }

    pub fn set_decay_samples(&mut self, samples: usize) {
        self.decay = samples.max(1);
    }

    pub fn set_release_samples(&mut self, samples: usize) {
        self.release = samples.max(1);
    }

    pub fn set_sustain(&mut self, sustain: f64) {
        self.sustain = sustain.max(0.0);
    }

    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude;
    }

    pub fn attack_samples(&self) -> usize {
        self.attack
    }

    pub fn decay_samples(&self) -> usize {
        self.decay
    }

    pub fn release_samples(&self) -> usize {
        self.release
    }

    pub fn sustain(&self) -> f64 {
        self.sustain
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_gated(&self) -> bool {
        self.gate
    }

    /// Open or close the gate.
    ///
    /// Opening an already open gate does nothing, so a sounding envelope is
    /// never restarted. `hold_samples` closes the gate automatically after
    /// that many calls to [`next_sample`](Self::next_sample).
    pub fn set_gate(&mut self, gate: bool, hold_samples: Option<usize>) {
        if gate && !self.gate {
            self.gate = true;
            self.stage = Stage::Attack;
            self.index = 0;
            self.gate_countdown = hold_samples;
        } else if !gate && self.gate {
            self.gate = false;
            self.stage = Stage::Release;
            self.index = 0;
            self.gate_countdown = None;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Generate the next envelope sample, scaled by the amplitude.
    pub fn next_sample(&mut self) -> f64 {
        if !self.is_playing() {
            return 0.0;
        }

        if let Some(remaining) = self.gate_countdown {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.set_gate(false, None);
            } else {
                self.gate_countdown = Some(remaining);
            }
        }

        match self.stage {
            Stage::Idle => {}
            Stage::Attack => {
                self.value = self.index as f64 / self.attack as f64;
                self.index += 1;
                if self.index >= self.attack {
                    self.stage = Stage::Decay;
                    self.index = 0;
                }
            }
            Stage::Decay => {
                self.value = 1.0 + (self.sustain - 1.0) * (self.index as f64 / self.decay as f64);
                self.index += 1;
                if self.index >= self.decay {
                    self.stage = Stage::Sustain;
                    self.index = 0;
                }
            }
            Stage::Sustain => {
                self.value = self.sustain;
                if !self.gate {
                    self.stage = Stage::Release;
                    self.index = 0;
                }
            }
            Stage::Release => {
                if self.index == 0 {
                    self.release_start = self.value;
                }
                self.value =
                    self.release_start * (1.0 - self.index as f64 / self.release as f64);
                self.index += 1;
                if self.index >= self.release {
                    self.stage = Stage::Idle;
                    self.value = 0.0;
                    self.index = 0;
                }
            }
        }

        self.value * self.amplitude
    }
}
