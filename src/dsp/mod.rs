//! DSP Engine — four-operator FM synthesis in pure Rust.
//!
//! Everything here is deterministic: given the same patch, the same note
//! events and the same starting phases, the rendered samples are identical.
//! The same code powers the WASM bindings and offline WAV export.

pub mod algorithm;
pub mod engine;
pub mod envelope;
pub mod exp_envelope;
pub mod lfo;
pub mod modulation;
pub mod operator;
pub mod oscillator;
pub mod renderer;
pub mod sequencer;
pub mod voice;
