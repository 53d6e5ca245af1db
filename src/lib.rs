pub mod dsp;
pub mod error;
pub mod grid;
pub mod handle;
pub mod params;
pub mod patch;
pub mod preset;

pub use crate::error::{Result, SynthError};
pub use crate::handle::SynthHandle;

use crate::dsp::engine::{EngineConfig, PolyphonicEngine};
use crate::grid::Step;
use crate::preset::PatchSnapshot;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the fmtone-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Render a grid on a fresh default engine, optionally restoring a patch
/// snapshot first.
pub fn render_grid(
    steps: &[Step],
    step_length: f64,
    patch: Option<&PatchSnapshot>,
) -> Result<Vec<f64>> {
    let mut engine = PolyphonicEngine::new(EngineConfig::default());
    if let Some(snapshot) = patch {
        snapshot.apply_to(&mut engine.patch)?;
    }
    Ok(dsp::sequencer::create_sequence(&mut engine, steps, step_length, 1)?)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

type JsRequest = (Vec<Step>, Option<PatchSnapshot>);

fn decode_request(grid: JsValue, patch: JsValue) -> std::result::Result<JsRequest, JsValue> {
    let steps: Vec<Step> = serde_wasm_bindgen::from_value(grid).map_err(js_error)?;
    let patch = if patch.is_undefined() || patch.is_null() {
        None
    } else {
        Some(serde_wasm_bindgen::from_value(patch).map_err(js_error)?)
    };
    Ok((steps, patch))
}

/// WASM-exposed: render a note grid to mono f32 samples at 44.1 kHz.
/// `patch` is an optional patch snapshot object.
#[wasm_bindgen]
pub fn render_grid_samples(
    grid: JsValue,
    step_length: f64,
    patch: JsValue,
) -> std::result::Result<Vec<f32>, JsValue> {
    let (steps, patch) = decode_request(grid, patch)?;
    let samples = render_grid(&steps, step_length, patch.as_ref()).map_err(js_error)?;
    Ok(samples.iter().map(|&s| s as f32).collect())
}

/// WASM-exposed: render a note grid to a 16-bit mono WAV byte array.
#[wasm_bindgen]
pub fn render_grid_wav(
    grid: JsValue,
    step_length: f64,
    patch: JsValue,
) -> std::result::Result<Vec<u8>, JsValue> {
    let (steps, patch) = decode_request(grid, patch)?;
    let samples = render_grid(&steps, step_length, patch.as_ref()).map_err(js_error)?;
    let sample_rate = EngineConfig::default().sample_rate as u32;
    dsp::renderer::encode_wav(&samples, sample_rate).map_err(js_error)
}

/// WASM-exposed: the default patch as a snapshot object.
#[wasm_bindgen]
pub fn default_patch() -> std::result::Result<JsValue, JsValue> {
    let snapshot = PatchSnapshot::from_patch(&patch::PatchParameters::default());
    serde_wasm_bindgen::to_value(&snapshot).map_err(js_error)
}
