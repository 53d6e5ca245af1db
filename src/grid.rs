//! Note grid — the step sequence consumed by the sequencer.
//!
//! A grid is a JSON list where each element is `null` (rest), an integer
//! MIDI note, a note name such as `"C#4"`, or a list of those (chord).

use serde::{Deserialize, Serialize};

use crate::error::NoteError;

/// A single note, either a MIDI number or a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteRef {
    Midi(i64),
    Name(String),
}

impl NoteRef {
    pub fn to_midi(&self) -> Result<u8, NoteError> {
        match self {
            NoteRef::Midi(n) => u8::try_from(*n)
                .ok()
                .filter(|n| *n <= 127)
                .ok_or(NoteError::OutOfRange(*n)),
            NoteRef::Name(name) => note_to_midi(name),
        }
    }
}

impl From<u8> for NoteRef {
    fn from(midi: u8) -> Self {
        NoteRef::Midi(midi as i64)
    }
}

impl From<&str> for NoteRef {
    fn from(name: &str) -> Self {
        NoteRef::Name(name.to_string())
    }
}

/// One grid step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Chord(Vec<NoteRef>),
    Note(NoteRef),
    Rest,
}

impl Step {
    /// MIDI notes triggered by this step; empty for a rest.
    pub fn midi_notes(&self) -> Result<Vec<u8>, NoteError> {
        match self {
            Step::Rest => Ok(Vec::new()),
            Step::Note(note) => Ok(vec![note.to_midi()?]),
            Step::Chord(notes) => notes.iter().map(NoteRef::to_midi).collect(),
        }
    }
}

/// Parse a JSON note grid.
pub fn parse_grid(json: &str) -> Result<Vec<Step>, serde_json::Error> {
    serde_json::from_str(json)
}

fn semitone(name: &str) -> Option<i64> {
    Some(match name {
        "C" => 0,
        "C#" | "DB" => 1,
        "D" => 2,
        "D#" | "EB" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "GB" => 6,
        "G" => 7,
        "G#" | "AB" => 8,
        "A" => 9,
        "A#" | "BB" => 10,
        "B" => 11,
        _ => return None,
    })
}

/// Parse a note name (e.g. "C4", "f#3", "Bb-1") into a MIDI note number.
///
/// Case-insensitive. The octave may be negative; C4 = 60.
pub fn note_to_midi(note: &str) -> Result<u8, NoteError> {
    let upper = note.trim().to_uppercase();
    let split = upper
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .unwrap_or(upper.len());
    let (name, octave) = upper.split_at(split);

    let semitone = semitone(name).ok_or_else(|| NoteError::UnknownName(name.to_string()))?;
    let octave: i64 = octave
        .parse()
        .map_err(|_| NoteError::InvalidOctave(note.to_string()))?;

    let midi = 12 * (octave + 1) + semitone;
    u8::try_from(midi)
        .ok()
        .filter(|m| *m <= 127)
        .ok_or(NoteError::OutOfRange(midi))
}
