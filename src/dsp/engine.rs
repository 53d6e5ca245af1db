//! Polyphonic engine — a fixed pool of voices sharing one patch.
//!
//! Voices are allocated once at construction and reused. A note-on takes
//! the first idle voice in pool order; with every voice busy the note is
//! dropped.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::patch::PatchParameters;

use super::voice::Voice;

/// Concert pitch of MIDI note 69.
pub const A4_FREQUENCY: f64 = 440.0;

/// Convert a MIDI note number to frequency: `440 * 2^((midi - 69) / 12)`.
pub fn midi_to_frequency(midi: u8) -> f64 {
    A4_FREQUENCY * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub num_voices: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44100.0,
            num_voices: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolyphonicEngine {
    config: EngineConfig,
    pub patch: PatchParameters,
    voices: Vec<Voice>,
}

impl Default for PolyphonicEngine {
    fn default() -> Self {
        PolyphonicEngine::new(EngineConfig::default())
    }
}

impl PolyphonicEngine {
    pub fn new(config: EngineConfig) -> Self {
        PolyphonicEngine {
            config,
            patch: PatchParameters::default(),
            voices: (0..config.num_voices)
                .map(|_| Voice::new(config.sample_rate))
                .collect(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Number of voices currently sounding.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_playing()).count()
    }

    /// Start a note on the first idle voice. Returns `false` when the pool
    /// is exhausted and the note was dropped.
    pub fn note_on(&mut self, midi: u8, hold_samples: Option<usize>) -> bool {
        let frequency = midi_to_frequency(midi);
        match self.voices.iter_mut().find(|v| !v.is_playing()) {
            Some(voice) => {
                voice.note_on(frequency, hold_samples, &self.patch);
                true
            }
            None => {
                debug!("no free voice for note {midi}, dropped");
                false
            }
        }
    }

    /// Release every voice tuned exactly to `midi`'s frequency.
    pub fn note_off(&mut self, midi: u8) {
        let frequency = midi_to_frequency(midi);
        for voice in self.voices.iter_mut().filter(|v| v.frequency() == frequency) {
            voice.note_off();
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.note_off();
        }
    }

    /// Sum of one sample from every voice.
    pub fn next_sample(&mut self) -> f64 {
        self.voices.iter_mut().map(|v| v.next_sample()).sum()
    }

    pub fn render(&mut self, num_samples: usize) -> Vec<f64> {
        (0..num_samples).map(|_| self.next_sample()).collect()
    }

    /// Append `num_samples` samples to `out`.
    pub fn render_into(&mut self, out: &mut Vec<f64>, num_samples: usize) {
        out.reserve(num_samples);
        for _ in 0..num_samples {
            out.push(self.next_sample());
        }
    }

    pub fn reset_phases(&mut self) {
        for voice in &mut self.voices {
            voice.reset_phases();
        }
    }

    pub fn reset_lfo_phases(&mut self) {
        for voice in &mut self.voices {
            voice.reset_lfo_phases();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_to_frequency_basic() {
        assert_eq!(midi_to_frequency(69), 440.0);
        assert!((midi_to_frequency(60) - 261.63).abs() < 0.01);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn default_config() {
        let engine = PolyphonicEngine::default();
        assert_eq!(engine.sample_rate(), 44100.0);
        assert_eq!(engine.voices().len(), 6);
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"num_voices": 2}"#).unwrap();
        assert_eq!(config.num_voices, 2);
        assert_eq!(config.sample_rate, 44100.0);
    }

    #[test]
    fn render_length_exact() {
        let mut engine = PolyphonicEngine::default();
        assert_eq!(engine.render(0).len(), 0);
        engine.note_on(60, None);
        assert_eq!(engine.render(1).len(), 1);
        assert_eq!(engine.render(12345).len(), 12345);
    }

    #[test]
    fn note_on_takes_first_free_voice() {
        let mut engine = PolyphonicEngine::default();
        assert!(engine.note_on(60, None));
        assert!(engine.note_on(64, None));
        assert_eq!(engine.voices()[0].frequency(), midi_to_frequency(60));
        assert_eq!(engine.voices()[1].frequency(), midi_to_frequency(64));
        assert_eq!(engine.active_voices(), 2);
    }

    #[test]
    fn full_pool_drops_note() {
        let mut engine = PolyphonicEngine::new(EngineConfig {
            num_voices: 2,
            ..EngineConfig::default()
        });
        assert!(engine.note_on(60, None));
        assert!(engine.note_on(62, None));
        let before: Vec<f64> = engine.voices().iter().map(|v| v.frequency()).collect();
        assert!(!engine.note_on(64, None));
        let after: Vec<f64> = engine.voices().iter().map(|v| v.frequency()).collect();
        assert_eq!(before, after);
        assert_eq!(engine.active_voices(), 2);
    }

    #[test]
    fn note_off_matches_frequency() {
        let mut engine = PolyphonicEngine::default();
        engine.note_on(60, None);
        engine.note_on(60, None);
        engine.note_on(67, None);
        engine.note_off(60);
        assert!(!engine.voices()[0].core.amp_envelope.is_gated());
        assert!(!engine.voices()[1].core.amp_envelope.is_gated());
        assert!(engine.voices()[2].core.amp_envelope.is_gated());

        engine.all_notes_off();
        assert!(engine.voices().iter().all(|v| !v.core.amp_envelope.is_gated()));
    }

    #[test]
    fn released_voices_become_free() {
        let mut engine = PolyphonicEngine::new(EngineConfig {
            num_voices: 1,
            ..EngineConfig::default()
        });
        engine.patch.set_amp_release(1.0);
        engine.note_on(60, Some(10));
        // hold 10 samples, then a 44-sample release
        engine.render(54);
        assert_eq!(engine.active_voices(), 0);
        assert!(engine.note_on(72, None));
    }

    #[test]
    fn output_is_sum_of_voices() {
        let mut single = PolyphonicEngine::default();
        single.note_on(60, None);
        let one = single.render(512);

        let mut double = PolyphonicEngine::default();
        double.note_on(60, None);
        double.note_on(60, None);
        let two = double.render(512);

        for (a, b) in one.iter().zip(&two) {
            assert!((2.0 * a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn render_into_appends() {
        let mut engine = PolyphonicEngine::default();
        let mut out = vec![1.0, 2.0];
        engine.render_into(&mut out, 10);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[..2], &[1.0, 2.0]);
    }
}
