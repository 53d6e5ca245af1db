//! Voice — four operators wired by one algorithm, an amplitude envelope
//! and a modulation matrix.

use log::warn;

use crate::patch::{ModDestination, OperatorParams, PatchParameters};

use super::algorithm::{Algorithm, Operators};
use super::envelope::LinearEnvelope;
use super::modulation::{ModulationMatrix, ModulationTarget};
use super::operator::Operator;

/// Everything the modulation matrix is allowed to touch.
#[derive(Debug, Clone)]
pub struct VoiceCore {
    pub operators: Operators,
    pub amp_envelope: LinearEnvelope,
    mix: f64,
}

impl VoiceCore {
    fn new(sample_rate: f64) -> Self {
        VoiceCore {
            operators: Operators::new(sample_rate),
            amp_envelope: LinearEnvelope::new(1.0, 1.0, 1.0, 1.0, 1.0, sample_rate),
            mix: 0.5,
        }
    }

    pub fn mix(&self) -> f64 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amp_envelope.set_amplitude(amplitude.clamp(0.0, 1.0));
    }
}

impl ModulationTarget for VoiceCore {
    fn modulation_value(&self, destination: ModDestination) -> f64 {
        let ops = &self.operators;
        match destination {
            ModDestination::Mix => self.mix,
            ModDestination::Amplitude => self.amp_envelope.amplitude(),
            ModDestination::RatioA => ops.a.ratio(),
            ModDestination::LevelA => ops.a.level(),
            ModDestination::FeedbackA => ops.a.feedback(),
            ModDestination::RatioB1 => ops.b1.ratio(),
            ModDestination::LevelB1 => ops.b1.level(),
            ModDestination::FeedbackB1 => ops.b1.feedback(),
            ModDestination::RatioB2 => ops.b2.ratio(),
            ModDestination::LevelB2 => ops.b2.level(),
            ModDestination::FeedbackB2 => ops.b2.feedback(),
            ModDestination::RatioC => ops.c.ratio(),
            ModDestination::FeedbackC => ops.c.feedback(),
        }
    }

    fn apply_modulation(&mut self, destination: ModDestination, value: f64) {
        let ops = &mut self.operators;
        match destination {
            ModDestination::Mix => self.set_mix(value),
            ModDestination::Amplitude => self.set_amplitude(value),
            ModDestination::RatioA => ops.a.set_ratio(value),
            ModDestination::LevelA => ops.a.set_level(value.max(0.0)),
            ModDestination::FeedbackA => ops.a.set_feedback(value.max(0.0)),
            ModDestination::RatioB1 => ops.b1.set_ratio(value),
            ModDestination::LevelB1 => ops.b1.set_level(value.max(0.0)),
            ModDestination::FeedbackB1 => ops.b1.set_feedback(value.max(0.0)),
            ModDestination::RatioB2 => ops.b2.set_ratio(value),
            ModDestination::LevelB2 => ops.b2.set_level(value.max(0.0)),
            ModDestination::FeedbackB2 => ops.b2.set_feedback(value.max(0.0)),
            ModDestination::RatioC => ops.c.set_ratio(value),
            ModDestination::FeedbackC => ops.c.set_feedback(value.max(0.0)),
        }
    }
}

fn apply_operator_params(op: &mut Operator, params: &OperatorParams) {
    op.set_ratio(params.ratio);
    op.set_feedback(params.feedback);
    op.set_adsr(params.attack, params.decay, params.sustain, params.release);
    op.set_level(params.level);
}

/// A single polyphony slot. Busy while its amplitude envelope is not idle.
#[derive(Debug, Clone)]
pub struct Voice {
    pub core: VoiceCore,
    pub matrix: ModulationMatrix,
    algorithm: Algorithm,
    frequency: f64,
}

impl Voice {
    pub fn new(sample_rate: f64) -> Self {
        Voice {
            core: VoiceCore::new(sample_rate),
            matrix: ModulationMatrix::new(sample_rate),
            algorithm: Algorithm::default(),
            frequency: 0.0,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        for op in self.core.operators.iter_mut() {
            op.set_base_frequency(frequency);
        }
    }

    /// Pull the patch into the operators and the amplitude envelope, then
    /// rebind the modulation matrix so its centers see the fresh values.
    pub fn update_static_parameters(&mut self, patch: &PatchParameters) {
        self.algorithm = Algorithm::try_from(patch.algorithm()).unwrap_or_else(|e| {
            warn!("{e}; keeping algorithm {}", self.algorithm.number());
            self.algorithm
        });
        self.core.set_mix(patch.mix());

        let amp = &patch.amp;
        self.core
            .amp_envelope
            .set_params(amp.attack, amp.decay, amp.sustain, amp.release);
        self.core.set_amplitude(amp.amplitude);

        let ops = &mut self.core.operators;
        apply_operator_params(&mut ops.a, &patch.a);
        apply_operator_params(&mut ops.b1, &patch.b1);
        apply_operator_params(&mut ops.b2, &patch.b2);
        ops.c.set_ratio(patch.c.ratio);
        ops.c.set_feedback(patch.c.feedback);

        self.matrix.bind(&self.core, patch);
    }

    pub fn note_on(&mut self, frequency: f64, hold_samples: Option<usize>, patch: &PatchParameters) {
        self.set_frequency(frequency);
        self.update_static_parameters(patch);
        self.core.amp_envelope.set_gate(true, hold_samples);
        for op in self.core.operators.iter_mut() {
            op.note_on(frequency, hold_samples);
        }
        self.matrix.on_note_trigger();
    }

    pub fn note_off(&mut self) {
        self.core.amp_envelope.set_gate(false, None);
        for op in self.core.operators.iter_mut() {
            op.note_off();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.core.amp_envelope.is_playing()
    }

    pub fn next_sample(&mut self) -> f64 {
        if !self.is_playing() {
            self.matrix.advance_idle();
            return 0.0;
        }
        self.matrix.apply(&mut self.core);
        let (x, y) = self.algorithm.process(&mut self.core.operators);
        let mix = self.core.mix;
        let out = y * mix + x * (1.0 - mix);
        out * self.core.amp_envelope.next_sample()
    }

    pub fn reset_phases(&mut self) {
        for op in self.core.operators.iter_mut() {
            op.oscillator.set_phase(0.0);
        }
    }

    pub fn reset_lfo_phases(&mut self) {
        self.matrix.reset_lfo_phases();
    }
}
