//! Patch parameters: the static sound description every voice reads on
//! note-on.
//!
//! Setters clamp into their valid ranges; validation of raw user input
//! (names, finiteness, index ranges) lives in [`crate::params`].

use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Number of LFO slots in a patch.
pub const NUM_LFOS: usize = 3;

/// Lowest operator frequency ratio accepted by the patch.
pub const MIN_RATIO: f64 = 0.125;

/// Modulation destinations, in table order (index 0-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ModDestination {
    Mix,
    Amplitude,
    RatioA,
    LevelA,
    FeedbackA,
    RatioB1,
    LevelB1,
    FeedbackB1,
    RatioB2,
    LevelB2,
    FeedbackB2,
    RatioC,
    FeedbackC,
}

impl ModDestination {
    pub const ALL: [ModDestination; 13] = [
        ModDestination::Mix,
        ModDestination::Amplitude,
        ModDestination::RatioA,
        ModDestination::LevelA,
        ModDestination::FeedbackA,
        ModDestination::RatioB1,
        ModDestination::LevelB1,
        ModDestination::FeedbackB1,
        ModDestination::RatioB2,
        ModDestination::LevelB2,
        ModDestination::FeedbackB2,
        ModDestination::RatioC,
        ModDestination::FeedbackC,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for ModDestination {
    type Error = ParamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize).ok_or(ParamError::DestinationOutOfRange(value as f64))
    }
}

impl From<ModDestination> for u8 {
    fn from(dest: ModDestination) -> u8 {
        dest as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LfoWaveform {
    #[default]
    Sine,
    Triangle,
    SawUp,
    SawDown,
    Square,
}

impl TryFrom<u8> for LfoWaveform {
    type Error = ParamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LfoWaveform::Sine),
            1 => Ok(LfoWaveform::Triangle),
            2 => Ok(LfoWaveform::SawUp),
            3 => Ok(LfoWaveform::SawDown),
            4 => Ok(LfoWaveform::Square),
            other => Err(ParamError::WaveformOutOfRange(other as f64)),
        }
    }
}

impl From<LfoWaveform> for u8 {
    fn from(wave: LfoWaveform) -> u8 {
        wave as u8
    }
}

/// One LFO slot: where it modulates and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LfoSpec {
    #[serde(default)]
    pub destination: Option<ModDestination>,
    pub amount: f64,
    /// Rate in Hz.
    pub frequency: f64,
    #[serde(default)]
    pub waveform: LfoWaveform,
    /// Smoothing in [0, 1].
    #[serde(default)]
    pub smooth: f64,
}

impl Default for LfoSpec {
    fn default() -> Self {
        LfoSpec {
            destination: None,
            amount: 0.5,
            frequency: 1.0,
            waveform: LfoWaveform::Sine,
            smooth: 0.0,
        }
    }
}

/// The exponential-release modulation envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpEnvSpec {
    #[serde(default)]
    pub destination: Option<ModDestination>,
    pub amount: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for ExpEnvSpec {
    fn default() -> Self {
        ExpEnvSpec {
            destination: None,
            amount: 0.0,
            release: 0.1,
        }
    }
}

/// Ratio, feedback and modulation-index envelope of a modulating operator.
/// Times are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorParams {
    pub ratio: f64,
    pub feedback: f64,
    pub level: f64,
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for OperatorParams {
    fn default() -> Self {
        OperatorParams {
            ratio: 1.0,
            feedback: 0.0,
            level: 0.0,
            attack: 100.0,
            decay: 200.0,
            sustain: 1.0,
            release: 300.0,
        }
    }
}

impl OperatorParams {
    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio.max(MIN_RATIO);
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback.max(0.0);
    }

    pub fn set_level(&mut self, level: f64) {
        self.level = level.max(0.0);
    }

    pub fn set_attack(&mut self, ms: f64) {
        self.attack = ms.max(0.0);
    }

    pub fn set_decay(&mut self, ms: f64) {
        self.decay = ms.max(0.0);
    }

    pub fn set_sustain(&mut self, sustain: f64) {
        self.sustain = sustain.max(0.0);
    }

    pub fn set_release(&mut self, ms: f64) {
        self.release = ms.max(0.0);
    }
}

/// Operator C only exposes ratio and feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierParams {
    pub ratio: f64,
    pub feedback: f64,
}

impl Default for CarrierParams {
    fn default() -> Self {
        CarrierParams {
            ratio: 1.0,
            feedback: 0.0,
        }
    }
}

impl CarrierParams {
    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio.max(MIN_RATIO);
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback.max(0.0);
    }
}

/// Overall amplitude envelope. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AmpEnvelopeParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
    /// Peak amplitude in [0, 1].
    pub amplitude: f64,
}

impl Default for AmpEnvelopeParams {
    fn default() -> Self {
        AmpEnvelopeParams {
            attack: 100.0,
            decay: 300.0,
            sustain: 0.8,
            release: 400.0,
            amplitude: 1.0,
        }
    }
}

/// The full sound description shared by all voices.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchParameters {
    algorithm: u8,
    mix: f64,
    master_volume: f64,
    pub amp: AmpEnvelopeParams,
    pub a: OperatorParams,
    pub b1: OperatorParams,
    pub b2: OperatorParams,
    pub c: CarrierParams,
    pub lfos: [LfoSpec; NUM_LFOS],
    pub mod_env: ExpEnvSpec,
}

impl Default for PatchParameters {
    fn default() -> Self {
        PatchParameters {
            algorithm: 1,
            mix: 0.5,
            master_volume: 1.0,
            amp: AmpEnvelopeParams::default(),
            a: OperatorParams::default(),
            b1: OperatorParams::default(),
            b2: OperatorParams::default(),
            c: CarrierParams::default(),
            lfos: Default::default(),
            mod_env: ExpEnvSpec::default(),
        }
    }
}

impl PatchParameters {
    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Select one of the eight operator topologies.
    pub fn set_algorithm(&mut self, algorithm: u8) -> Result<(), ParamError> {
        if !(1..=8).contains(&algorithm) {
            return Err(ParamError::AlgorithmOutOfRange(algorithm as f64));
        }
        self.algorithm = algorithm;
        Ok(())
    }

    pub fn mix(&self) -> f64 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_amp_attack(&mut self, ms: f64) {
        self.amp.attack = ms.max(0.0);
    }

    pub fn set_amp_decay(&mut self, ms: f64) {
        self.amp.decay = ms.max(0.0);
    }

    pub fn set_amp_sustain(&mut self, sustain: f64) {
        self.amp.sustain = sustain.max(0.0);
    }

    pub fn set_amp_release(&mut self, ms: f64) {
        self.amp.release = ms.max(0.0);
    }

    pub fn set_amp_amplitude(&mut self, amplitude: f64) {
        self.amp.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// LFO slot by its 1-based index.
    pub fn lfo(&self, index: usize) -> Result<&LfoSpec, ParamError> {
        index
            .checked_sub(1)
            .and_then(|i| self.lfos.get(i))
            .ok_or(ParamError::LfoIndexOutOfRange(index))
    }

    pub fn lfo_mut(&mut self, index: usize) -> Result<&mut LfoSpec, ParamError> {
        index
            .checked_sub(1)
            .and_then(|i| self.lfos.get_mut(i))
            .ok_or(ParamError::LfoIndexOutOfRange(index))
    }
}
