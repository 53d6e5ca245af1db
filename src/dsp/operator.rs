//! Operator — one feedback oscillator paired with its modulation-index
//! envelope.

use super::envelope::LinearEnvelope;
use super::oscillator::FeedbackOscillator;

/// An FM operator.
///
/// The envelope does not scale the operator's own audio. Callers read
/// [`modulation_index`](Self::modulation_index) and multiply the audio
/// sample by it before feeding it into another operator.
#[derive(Debug, Clone)]
pub struct Operator {
    pub oscillator: FeedbackOscillator,
    pub envelope: LinearEnvelope,
    ratio: f64,
    /// Voice fundamental the ratio applies to.
    base_frequency: f64,
}

impl Operator {
    pub fn new(sample_rate: f64) -> Self {
        Operator {
            oscillator: FeedbackOscillator::new(0.0, sample_rate),
            envelope: LinearEnvelope::new(100.0, 200.0, 0.4, 300.0, 0.0, sample_rate),
            ratio: 1.0,
            base_frequency: 0.0,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
        self.oscillator.set_frequency(self.base_frequency * ratio);
    }

    pub fn set_base_frequency(&mut self, frequency: f64) {
        self.base_frequency = frequency;
        self.oscillator.set_frequency(frequency * self.ratio);
    }

    pub fn feedback(&self) -> f64 {
        self.oscillator.feedback()
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.oscillator.set_feedback(feedback);
    }

    /// Envelope peak, i.e. the maximum modulation index.
    pub fn level(&self) -> f64 {
        self.envelope.amplitude()
    }

    pub fn set_level(&mut self, level: f64) {
        self.envelope.set_amplitude(level);
    }

    pub fn set_adsr(&mut self, attack_ms: f64, decay_ms: f64, sustain: f64, release_ms: f64) {
        self.envelope.set_params(attack_ms, decay_ms, sustain, release_ms);
    }

    pub fn note_on(&mut self, frequency: f64, hold_samples: Option<usize>) {
        self.set_base_frequency(frequency);
        self.envelope.set_gate(true, hold_samples);
    }

    pub fn note_off(&mut self) {
        self.envelope.set_gate(false, None);
    }

    /// Advance the oscillator with the given phase modulation input.
    pub fn next_sample(&mut self, fm_input: f64) -> f64 {
        self.oscillator.next_sample(fm_input)
    }

    /// Advance the envelope by one sample and return it.
    pub fn modulation_index(&mut self) -> f64 {
        self.envelope.next_sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ratio_scales_frequency() {
        let mut op = Operator::new(44100.0);
        op.set_ratio(2.0);
        op.note_on(220.0, None);
        assert_abs_diff_eq!(op.oscillator.frequency(), 440.0);
        op.set_ratio(0.5);
        assert_abs_diff_eq!(op.oscillator.frequency(), 110.0);
        op.set_base_frequency(1000.0);
        assert_abs_diff_eq!(op.oscillator.frequency(), 500.0);
    }

    #[test]
    fn envelope_does_not_scale_audio() {
        let mut op = Operator::new(44100.0);
        op.set_level(0.0);
        op.note_on(440.0, None);
        let mut reference = FeedbackOscillator::new(440.0, 44100.0);
        for _ in 0..100 {
            assert_eq!(op.next_sample(0.0), reference.next_sample(0.0));
        }
    }

    #[test]
    fn modulation_index_follows_envelope() {
        let mut op = Operator::new(44100.0);
        op.set_level(2.0);
        op.set_adsr(1.0, 1.0, 1.0, 1.0);
        assert_eq!(op.modulation_index(), 0.0);
        op.note_on(440.0, None);
        // 44-sample attack from 0 towards the level
        assert_eq!(op.modulation_index(), 0.0);
        for _ in 0..43 {
            op.modulation_index();
        }
        assert_abs_diff_eq!(op.modulation_index(), 2.0, epsilon = 1e-12);
        op.note_off();
        assert_abs_diff_eq!(op.modulation_index(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn feedback_and_level_accessors() {
        let mut op = Operator::new(44100.0);
        op.set_feedback(0.7);
        op.set_level(1.5);
        assert_eq!(op.feedback(), 0.7);
        assert_eq!(op.level(), 1.5);
    }
}
