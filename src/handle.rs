//! Shared engine handle for an external transport.
//!
//! Every parameter write and every render goes through one lock, so a
//! parameter change never lands halfway through a render. Clones share the
//! same engine and preset store.

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;

use crate::dsp::engine::{EngineConfig, PolyphonicEngine};
use crate::dsp::renderer::encode_wav;
use crate::dsp::sequencer::create_sequence;
use crate::error::{Result, SynthError};
use crate::grid::Step;
use crate::params;
use crate::preset::{PatchSnapshot, PresetStore};

#[derive(Debug, Clone, Default)]
pub struct SynthHandle {
    engine: Arc<Mutex<PolyphonicEngine>>,
    store: PresetStore,
}

impl SynthHandle {
    pub fn new(config: EngineConfig) -> Self {
        SynthHandle::with_store(config, PresetStore::default())
    }

    pub fn with_store(config: EngineConfig, store: PresetStore) -> Self {
        SynthHandle {
            engine: Arc::new(Mutex::new(PolyphonicEngine::new(config))),
            store,
        }
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, PolyphonicEngine>> {
        self.engine.lock().map_err(|_| SynthError::EngineLock)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut PolyphonicEngine) -> T) -> Result<T> {
        let mut engine = self.lock()?;
        Ok(f(&mut engine))
    }

    pub fn set_param(&self, name: &str, value: f64) -> Result<()> {
        let mut engine = self.lock()?;
        params::set_param(&mut engine.patch, name, value)?;
        Ok(())
    }

    pub fn get_param(&self, name: &str) -> Result<f64> {
        let engine = self.lock()?;
        Ok(params::get_param(&engine.patch, name)?)
    }

    pub fn set_lfo_param(&self, index: usize, field: &str, value: Option<f64>) -> Result<()> {
        let mut engine = self.lock()?;
        params::set_lfo_param(&mut engine.patch, index, field, value)?;
        Ok(())
    }

    pub fn set_env_param(&self, field: &str, value: Option<f64>) -> Result<()> {
        let mut engine = self.lock()?;
        params::set_env_param(&mut engine.patch, field, value)?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<PatchSnapshot> {
        let engine = self.lock()?;
        Ok(PatchSnapshot::from_patch(&engine.patch))
    }

    pub fn restore(&self, snapshot: &PatchSnapshot) -> Result<()> {
        let mut engine = self.lock()?;
        snapshot.apply_to(&mut engine.patch)?;
        Ok(())
    }

    pub fn save_preset(&self, name: &str) -> Result<()> {
        let snapshot = self.snapshot()?;
        self.store.save(name, &snapshot)?;
        Ok(())
    }

    pub fn load_preset(&self, name: &str) -> Result<()> {
        let snapshot = self.store.load(name)?;
        self.restore(&snapshot)?;
        info!("preset '{name}' restored");
        Ok(())
    }

    pub fn preset_names(&self) -> Result<Vec<String>> {
        Ok(self.store.names()?)
    }

    /// Render a grid from zeroed operator and LFO phases so the same grid
    /// and patch always give the same samples.
    pub fn render_grid(&self, steps: &[Step], step_length: f64, loops: usize) -> Result<Vec<f64>> {
        let mut engine = self.lock()?;
        engine.reset_phases();
        engine.reset_lfo_phases();
        Ok(create_sequence(&mut engine, steps, step_length, loops)?)
    }

    /// [`render_grid`](Self::render_grid) encoded as 16-bit mono WAV.
    pub fn render_grid_wav(&self, steps: &[Step], step_length: f64, loops: usize) -> Result<Vec<u8>> {
        let samples = self.render_grid(steps, step_length, loops)?;
        let sample_rate = self.lock()?.sample_rate() as u32;
        encode_wav(&samples, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParamError, PresetError, SequenceError};
    use crate::grid::NoteRef;
    use tempfile::tempdir;

    fn grid() -> Vec<Step> {
        vec![Step::Note("C4".into()), Step::Rest, Step::Note(NoteRef::Midi(64))]
    }

    #[test]
    fn clones_share_engine() {
        let handle = SynthHandle::default();
        let other = handle.clone();
        handle.set_param("mix", 0.2).unwrap();
        assert_eq!(other.get_param("mix").unwrap(), 0.2);
    }

    #[test]
    fn errors_are_wrapped() {
        let handle = SynthHandle::default();
        let err = handle.set_param("nope", 1.0).unwrap_err();
        assert!(matches!(err, SynthError::Param(ParamError::UnknownParameter(_))));
        let err = handle.set_lfo_param(9, "rate", Some(1.0)).unwrap_err();
        assert!(matches!(err, SynthError::Param(ParamError::LfoIndexOutOfRange(9))));
    }

    #[test]
    fn renders_are_reproducible() {
        let handle = SynthHandle::default();
        handle.set_lfo_param(1, "dest", Some(0.0)).unwrap();
        handle.set_lfo_param(1, "rate", Some(3.0)).unwrap();
        handle.set_param("level_A", 1.2).unwrap();

        let first = handle.render_grid(&grid(), 0.1, 1).unwrap();
        let second = handle.render_grid(&grid(), 0.1, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejected_render_leaves_handle_usable() {
        let handle = SynthHandle::default();
        for len in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            let err = handle.render_grid(&grid(), len, 1).unwrap_err();
            assert!(matches!(err, SynthError::Sequence(_)), "{len}: {err}");
        }
        let err = handle.render_grid(&grid(), -1.0, 1).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Sequence(SequenceError::InvalidStepLength(_))
        ));

        handle.set_param("mix", 0.3).unwrap();
        assert_eq!(handle.get_param("mix").unwrap(), 0.3);
        let out = handle.render_grid(&grid(), 0.1, 1).unwrap();
        assert_eq!(out.len(), 3 * 4410 + 17640);
    }

    #[test]
    fn render_wav_matches_grid_length() {
        let handle = SynthHandle::default();
        let wav = handle.render_grid_wav(&grid(), 0.1, 1).unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.len(), 3 * 4410 + 17640);
    }

    #[test]
    fn presets_round_trip_through_store() {
        let dir = tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets.json"));
        let handle = SynthHandle::with_store(EngineConfig::default(), store);

        handle.set_param("algorithm", 7.0).unwrap();
        handle.set_env_param("dest", Some(3.0)).unwrap();
        handle.save_preset("seven").unwrap();

        handle.set_param("algorithm", 2.0).unwrap();
        handle.set_env_param("dest", None).unwrap();
        handle.load_preset("seven").unwrap();
        assert_eq!(handle.get_param("algorithm").unwrap(), 7.0);
        assert_eq!(handle.preset_names().unwrap(), vec!["seven"]);

        let err = handle.load_preset("missing").unwrap_err();
        assert!(matches!(err, SynthError::Preset(PresetError::NotFound { .. })));
    }

    #[test]
    fn with_engine_gives_direct_access() {
        let handle = SynthHandle::default();
        let voices = handle.with_engine(|e| e.voices().len()).unwrap();
        assert_eq!(voices, 6);
    }
}
