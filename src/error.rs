//! Error types for the FM engine and its parameter / preset surface.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SynthError>;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),
    #[error("Note error: {0}")]
    Note(#[from] NoteError),
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
    /// A previous holder of the engine lock panicked mid-update.
    #[error("Engine lock poisoned")]
    EngineLock,
}

/// Rejected parameter writes. The patch is left untouched when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("Value for '{name}' is not a finite number")]
    NotFinite { name: String },
    #[error("Parameter '{0}' requires a value")]
    MissingValue(String),
    #[error("Algorithm {0} out of range (1-8)")]
    AlgorithmOutOfRange(f64),
    #[error("LFO index {0} out of range (1-3)")]
    LfoIndexOutOfRange(usize),
    #[error("Modulation destination {0} out of range (0-12)")]
    DestinationOutOfRange(f64),
    #[error("LFO waveform {0} out of range (0-4)")]
    WaveformOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error("Unrecognized note name '{0}'")]
    UnknownName(String),
    #[error("Invalid octave in '{0}'")]
    InvalidOctave(String),
    #[error("Note value {0} out of MIDI range (0-127)")]
    OutOfRange(i64),
}

/// Grids the sequencer refuses to render. Returned before any note reaches
/// the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error("Step length {0} is not a finite, non-negative number of seconds")]
    InvalidStepLength(f64),
    #[error("Sequence of {steps} steps x {loops} loops is too long to render")]
    TooLong { steps: usize, loops: usize },
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Cannot save a preset with an empty name")]
    EmptyName,
    #[error("Preset '{0}' already exists")]
    AlreadyExists(String),
    #[error("Preset '{name}' not found in {path}")]
    NotFound { name: String, path: String },
    #[error("Preset file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preset file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}
