//! WAV renderer — renders a note grid to a WAV byte buffer.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;
use crate::grid::Step;

use super::engine::PolyphonicEngine;
use super::sequencer::create_sequence;

/// Render a grid through `engine` and encode it as 16-bit mono WAV.
pub fn render_wav(
    engine: &mut PolyphonicEngine,
    steps: &[Step],
    step_length: f64,
    loops: usize,
) -> Result<Vec<u8>> {
    let samples = create_sequence(engine, steps, step_length, loops)?;
    encode_wav(&samples, engine.sample_rate() as u32)
}

/// Map a float sample to 16-bit PCM. NaN becomes silence, infinities and
/// overs are clipped.
pub fn quantize(sample: f64) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    (s * i16::MAX as f64) as i16
}

/// Encode mono float samples to a 16-bit PCM WAV byte buffer.
pub fn encode_wav(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buf = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = WavWriter::new(&mut buf, spec)?;
    for &sample in samples {
        writer.write_sample(quantize(sample))?;
    }
    writer.finalize()?;

    Ok(buf.into_inner())
}
