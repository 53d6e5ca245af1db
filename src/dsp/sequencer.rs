//! Step sequencer — drives the engine through a note grid and renders the
//! result into one normalized buffer.

use log::debug;

use crate::error::SequenceError;
use crate::grid::Step;

use super::engine::PolyphonicEngine;

/// Samples per step: `round(step_length * sample_rate)`.
pub fn step_samples(step_length: f64, sample_rate: f64) -> usize {
    (step_length * sample_rate).round().max(0.0) as usize
}

/// Samples appended after the last step so the amplitude release can ring
/// out.
pub fn release_tail_samples(engine: &PolyphonicEngine) -> usize {
    (engine.patch.amp.release * 0.001 * engine.sample_rate()).max(0.0) as usize
}

/// Render `loops` passes over `steps`, each step lasting `step_length`
/// seconds, plus the release tail.
///
/// Every note of a step is held for exactly one step. The whole grid and
/// the output length are validated before anything is rendered, so a
/// rejected request leaves the engine untouched. The output is
/// peak-normalized to the patch's master volume unless it is entirely
/// silent.
pub fn create_sequence(
    engine: &mut PolyphonicEngine,
    steps: &[Step],
    step_length: f64,
    loops: usize,
) -> Result<Vec<f64>, SequenceError> {
    if !step_length.is_finite() || step_length < 0.0 {
        return Err(SequenceError::InvalidStepLength(step_length));
    }
    let resolved = steps
        .iter()
        .map(Step::midi_notes)
        .collect::<Result<Vec<_>, _>>()?;

    let step_len = step_samples(step_length, engine.sample_rate());
    let tail = release_tail_samples(engine);
    let too_long = SequenceError::TooLong {
        steps: resolved.len(),
        loops,
    };
    let total = loops
        .checked_mul(resolved.len())
        .and_then(|n| n.checked_mul(step_len))
        .and_then(|n| n.checked_add(tail))
        .ok_or_else(|| too_long.clone())?;
    debug!(
        "sequencing {} steps x {loops} loops, {step_len} samples/step, {tail} tail",
        resolved.len()
    );

    let mut out = Vec::new();
    out.try_reserve_exact(total).map_err(|_| too_long)?;
    for _ in 0..loops {
        for notes in &resolved {
            for &note in notes {
                engine.note_on(note, Some(step_len));
            }
            engine.render_into(&mut out, step_len);
        }
    }
    engine.render_into(&mut out, tail);

    normalize(&mut out, engine.patch.master_volume());
    Ok(out)
}

/// Scale `buffer` so its peak magnitude equals `target`. Silent buffers are
/// left as they are.
pub fn normalize(buffer: &mut [f64], target: f64) {
    let peak = buffer.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        let gain = target / peak;
        for s in buffer.iter_mut() {
            *s *= gain;
        }
    }
}
