//! Preset persistence: complete patch snapshots and a JSON file store.
//!
//! A snapshot is an order-independent map built from the parameter schema
//! plus the LFO and modulation-envelope records. The store keeps every
//! preset in one JSON object `{ "name": snapshot, ... }`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ParamError, PresetError};
use crate::params::{PARAMETERS, set_env_param, set_lfo_param, set_param};
use crate::patch::{ExpEnvSpec, LfoSpec, NUM_LFOS, PatchParameters};

/// File used when no explicit store path is given.
pub const DEFAULT_PRESET_FILE: &str = "fmtone_presets.json";

// ── Snapshot ────────────────────────────────────────────────

/// Every patch value by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSnapshot {
    pub params: BTreeMap<String, f64>,
    /// LFO records keyed by 1-based index.
    #[serde(default)]
    pub lfos: BTreeMap<usize, LfoSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_env: Option<ExpEnvSpec>,
}

impl PatchSnapshot {
    pub fn from_patch(patch: &PatchParameters) -> Self {
        PatchSnapshot {
            params: PARAMETERS
                .iter()
                .map(|d| (d.name.to_string(), (d.get)(patch)))
                .collect(),
            lfos: (1..=NUM_LFOS)
                .zip(patch.lfos.iter().cloned())
                .collect(),
            mod_env: Some(patch.mod_env.clone()),
        }
    }

    /// Restore this snapshot onto `patch`.
    ///
    /// Values go through the same validation as individual parameter
    /// writes. Either every value is applied or, on the first rejected
    /// one, nothing is. Names missing from the snapshot keep their current
    /// values.
    pub fn apply_to(&self, patch: &mut PatchParameters) -> Result<(), ParamError> {
        let mut candidate = patch.clone();

        for (name, value) in &self.params {
            set_param(&mut candidate, name, *value)?;
        }
        for (index, lfo) in &self.lfos {
            let dest = lfo.destination.map(|d| d.index() as f64);
            set_lfo_param(&mut candidate, *index, "dest", dest)?;
            set_lfo_param(&mut candidate, *index, "wave", Some(u8::from(lfo.waveform) as f64))?;
            set_lfo_param(&mut candidate, *index, "amount", Some(lfo.amount))?;
            set_lfo_param(&mut candidate, *index, "rate", Some(lfo.frequency))?;
            set_lfo_param(&mut candidate, *index, "smooth", Some(lfo.smooth))?;
        }
        if let Some(env) = &self.mod_env {
            set_env_param(&mut candidate, "dest", env.destination.map(|d| d.index() as f64))?;
            set_env_param(&mut candidate, "amount", Some(env.amount))?;
            set_env_param(&mut candidate, "release", Some(env.release))?;
        }

        *patch = candidate;
        Ok(())
    }
}

// ── Store ───────────────────────────────────────────────────

/// Named snapshots persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl Default for PresetStore {
    fn default() -> Self {
        PresetStore::new(DEFAULT_PRESET_FILE)
    }
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PresetStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, PatchSnapshot>, PresetError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, presets: &BTreeMap<String, PatchSnapshot>) -> Result<(), PresetError> {
        let json = serde_json::to_string_pretty(presets)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn not_found(&self, name: &str) -> PresetError {
        PresetError::NotFound {
            name: name.to_string(),
            path: self.path.display().to_string(),
        }
    }

    /// Store a new preset. Names are trimmed; empty and already used names
    /// are rejected.
    pub fn save(&self, name: &str, snapshot: &PatchSnapshot) -> Result<(), PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let mut presets = self.read_all()?;
        if presets.contains_key(name) {
            return Err(PresetError::AlreadyExists(name.to_string()));
        }
        presets.insert(name.to_string(), snapshot.clone());
        self.write_all(&presets)?;
        info!("saved preset '{name}' to {}", self.path.display());
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<PatchSnapshot, PresetError> {
        let name = name.trim();
        let mut presets = self.read_all()?;
        let snapshot = presets.remove(name).ok_or_else(|| self.not_found(name))?;
        debug!("loaded preset '{name}'");
        Ok(snapshot)
    }

    /// Stored preset names, sorted. Empty when the file does not exist yet.
    pub fn names(&self) -> Result<Vec<String>, PresetError> {
        Ok(self.read_all()?.into_keys().collect())
    }

    pub fn remove(&self, name: &str) -> Result<(), PresetError> {
        let name = name.trim();
        let mut presets = self.read_all()?;
        if presets.remove(name).is_none() {
            return Err(self.not_found(name));
        }
        self.write_all(&presets)?;
        info!("removed preset '{name}'");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{LfoWaveform, ModDestination};
    use tempfile::tempdir;

    fn custom_patch() -> PatchParameters {
        let mut patch = PatchParameters::default();
        patch.set_algorithm(6).unwrap();
        patch.set_mix(0.3);
        patch.b2.set_ratio(3.5);
        patch.a.set_level(2.0);
        patch.set_amp_release(900.0);
        let lfo = patch.lfo_mut(3).unwrap();
        lfo.destination = Some(ModDestination::LevelB2);
        lfo.waveform = LfoWaveform::Triangle;
        lfo.frequency = 4.0;
        patch.mod_env.destination = Some(ModDestination::RatioA);
        patch.mod_env.amount = 1.5;
        patch
    }

    #[test]
    fn snapshot_covers_every_parameter() {
        let snap = PatchSnapshot::from_patch(&PatchParameters::default());
        assert_eq!(snap.params.len(), PARAMETERS.len());
        assert_eq!(snap.lfos.len(), NUM_LFOS);
        assert_eq!(snap.params["algorithm"], 1.0);
        assert_eq!(snap.params["release_amp"], 400.0);
    }

    #[test]
    fn snapshot_restores_patch() {
        let source = custom_patch();
        let snap = PatchSnapshot::from_patch(&source);
        let mut target = PatchParameters::default();
        snap.apply_to(&mut target).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn snapshot_survives_json() {
        let snap = PatchSnapshot::from_patch(&custom_patch());
        let json = serde_json::to_string(&snap).unwrap();
        let back: PatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn bad_snapshot_is_all_or_nothing() {
        let mut snap = PatchSnapshot::from_patch(&custom_patch());
        snap.params.insert("algorithm".into(), 12.0);
        let mut target = PatchParameters::default();
        assert_eq!(
            snap.apply_to(&mut target),
            Err(ParamError::AlgorithmOutOfRange(12.0))
        );
        assert_eq!(target, PatchParameters::default());

        let mut snap = PatchSnapshot::from_patch(&custom_patch());
        snap.lfos.insert(4, LfoSpec::default());
        assert_eq!(
            snap.apply_to(&mut target),
            Err(ParamError::LfoIndexOutOfRange(4))
        );
        assert_eq!(target, PatchParameters::default());
    }

    #[test]
    fn partial_snapshot_keeps_other_values() {
        let snap: PatchSnapshot = serde_json::from_str(r#"{"params": {"mix": 0.9}}"#).unwrap();
        let mut patch = custom_patch();
        snap.apply_to(&mut patch).unwrap();
        assert_eq!(patch.mix(), 0.9);
        assert_eq!(patch.algorithm(), 6);
        assert_eq!(patch.lfos, custom_patch().lfos);
        assert_eq!(patch.mod_env, custom_patch().mod_env);
    }

    #[test]
    fn store_save_load_remove() {
        let dir = tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets.json"));
        assert!(store.names().unwrap().is_empty());

        let snap = PatchSnapshot::from_patch(&custom_patch());
        store.save("bell", &snap).unwrap();
        store.save(" pad ", &PatchSnapshot::from_patch(&PatchParameters::default())).unwrap();
        assert_eq!(store.names().unwrap(), vec!["bell", "pad"]);
        assert_eq!(store.load("bell").unwrap(), snap);

        store.remove("bell").unwrap();
        assert_eq!(store.names().unwrap(), vec!["pad"]);
    }

    #[test]
    fn store_rejects_bad_names() {
        let dir = tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets.json"));
        let snap = PatchSnapshot::from_patch(&PatchParameters::default());

        assert!(matches!(store.save("  ", &snap), Err(PresetError::EmptyName)));
        store.save("lead", &snap).unwrap();
        assert!(matches!(
            store.save("lead", &snap),
            Err(PresetError::AlreadyExists(n)) if n == "lead"
        ));
    }

    #[test]
    fn missing_file_or_name_is_not_found() {
        let dir = tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load("x"), Err(PresetError::NotFound { .. })));
        assert!(matches!(store.remove("x"), Err(PresetError::NotFound { .. })));

        store
            .save("x", &PatchSnapshot::from_patch(&PatchParameters::default()))
            .unwrap();
        assert!(matches!(store.load("y"), Err(PresetError::NotFound { .. })));
    }

    #[test]
    fn malformed_file_reports_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let store = PresetStore::new(path);
        assert!(matches!(store.names(), Err(PresetError::Format(_))));
    }

    #[test]
    fn default_store_path() {
        assert_eq!(PresetStore::default().path(), Path::new(DEFAULT_PRESET_FILE));
    }
}
