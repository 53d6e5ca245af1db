//! Modulation matrix: routes the LFO bank and the exponential-release
//! envelope onto the 13 voice destinations.
//!
//! Each note-on rebinds the matrix. Binding captures the current value of
//! every routed destination as the modulation center; per sample the matrix
//! writes `center + source * amount` back through [`ModulationTarget`].

use log::trace;

use crate::patch::{ModDestination, NUM_LFOS, PatchParameters};

use super::exp_envelope::ExpReleaseEnvelope;
use super::lfo::Lfo;

/// Something whose destinations can be read and overwritten by the matrix.
pub trait ModulationTarget {
    fn modulation_value(&self, destination: ModDestination) -> f64;
    fn apply_modulation(&mut self, destination: ModDestination, value: f64);
}

/// A resolved route from one source to one destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub destination: ModDestination,
    /// Destination value at bind time.
    pub center: f64,
    pub amount: f64,
}

impl Binding {
    fn value(&self, source: f64) -> f64 {
        self.center + source * self.amount
    }
}

#[derive(Debug, Clone)]
pub struct ModulationMatrix {
    lfos: [Lfo; NUM_LFOS],
    lfo_bindings: [Option<Binding>; NUM_LFOS],
    envelope: ExpReleaseEnvelope,
    envelope_binding: Option<Binding>,
}

impl ModulationMatrix {
    pub fn new(sample_rate: f64) -> Self {
        ModulationMatrix {
            lfos: std::array::from_fn(|_| Lfo::new(sample_rate)),
            lfo_bindings: [None; NUM_LFOS],
            envelope: ExpReleaseEnvelope::new(0.1, sample_rate),
            envelope_binding: None,
        }
    }

    /// Resolve the patch's LFO and envelope routes against `target`.
    ///
    /// Slots without a destination in the patch are cleared. LFO phases
    /// are left untouched.
    pub fn bind<T: ModulationTarget>(&mut self, target: &T, patch: &PatchParameters) {
        for ((lfo, binding), spec) in self
            .lfos
            .iter_mut()
            .zip(self.lfo_bindings.iter_mut())
            .zip(patch.lfos.iter())
        {
            *binding = spec.destination.map(|destination| {
                lfo.set_params(spec.frequency, spec.waveform, spec.smooth);
                Binding {
                    destination,
                    center: target.modulation_value(destination),
                    amount: spec.amount,
                }
            });
        }

        let env = &patch.mod_env;
        self.envelope_binding = env.destination.map(|destination| {
            self.envelope.set_release_seconds(env.release);
            Binding {
                destination,
                center: target.modulation_value(destination),
                amount: env.amount,
            }
        });
        trace!(
            "modulation rebound: lfos={:?} env={:?}",
            self.lfo_bindings, self.envelope_binding
        );
    }

    pub fn lfo_binding(&self, slot: usize) -> Option<Binding> {
        self.lfo_bindings.get(slot).copied().flatten()
    }

    pub fn envelope_binding(&self) -> Option<Binding> {
        self.envelope_binding
    }

    /// Restart the modulation envelope. LFOs keep running.
    pub fn on_note_trigger(&mut self) {
        self.envelope.trigger();
    }

    /// Write one sample of modulation into `target`.
    pub fn apply<T: ModulationTarget>(&mut self, target: &mut T) {
        for (lfo, binding) in self.lfos.iter_mut().zip(self.lfo_bindings.iter()) {
            if let Some(binding) = binding {
                target.apply_modulation(binding.destination, binding.value(lfo.next_sample()));
            }
        }
        if let Some(binding) = &self.envelope_binding {
            target.apply_modulation(binding.destination, binding.value(self.envelope.next_sample()));
        }
    }

    /// Step every LFO without writing anything, so phases stay continuous
    /// while the voice is silent.
    pub fn advance_idle(&mut self) {
        for lfo in &mut self.lfos {
            lfo.next_sample();
        }
    }

    pub fn reset_lfo_phases(&mut self) {
        for lfo in &mut self.lfos {
            lfo.set_phase(0.0);
        }
    }

    pub fn lfo(&self, slot: usize) -> Option<&Lfo> {
        self.lfos.get(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::LfoWaveform;
    use approx::assert_abs_diff_eq;

    /// Records the last write per destination.
    #[derive(Default)]
    struct Recorder {
        values: [f64; 13],
        writes: Vec<(ModDestination, f64)>,
    }

    impl ModulationTarget for Recorder {
        fn modulation_value(&self, destination: ModDestination) -> f64 {
            self.values[destination.index()]
        }

        fn apply_modulation(&mut self, destination: ModDestination, value: f64) {
            self.writes.push((destination, value));
        }
    }

    #[test]
    fn unbound_matrix_writes_nothing() {
        let mut matrix = ModulationMatrix::new(44100.0);
        let mut target = Recorder::default();
        matrix.bind(&target, &PatchParameters::default());
        matrix.on_note_trigger();
        for _ in 0..10 {
            matrix.apply(&mut target);
        }
        assert!(target.writes.is_empty());
    }

    #[test]
    fn lfo_writes_center_plus_scaled_source() {
        let mut patch = PatchParameters::default();
        {
            let lfo = patch.lfo_mut(1).unwrap();
            lfo.destination = Some(ModDestination::RatioB1);
            lfo.amount = 0.5;
            lfo.frequency = 11025.0;
            lfo.waveform = LfoWaveform::SawUp;
        }
        let mut target = Recorder::default();
        target.values[ModDestination::RatioB1.index()] = 2.0;

        let mut matrix = ModulationMatrix::new(44100.0);
        matrix.bind(&target, &patch);
        assert_eq!(
            matrix.lfo_binding(0),
            Some(Binding {
                destination: ModDestination::RatioB1,
                center: 2.0,
                amount: 0.5
            })
        );

        for _ in 0..4 {
            matrix.apply(&mut target);
        }
        let got: Vec<f64> = target.writes.iter().map(|w| w.1).collect();
        // saw-up at phases 0, .25, .5, .75
        assert_eq!(got, vec![1.5, 1.75, 2.0, 2.25]);
        assert!(target.writes.iter().all(|w| w.0 == ModDestination::RatioB1));
    }

    #[test]
    fn envelope_decays_from_center_plus_amount() {
        let mut patch = PatchParameters::default();
        patch.mod_env.destination = Some(ModDestination::Mix);
        patch.mod_env.amount = 0.4;
        patch.mod_env.release = 0.01;
        let mut target = Recorder::default();
        target.values[0] = 0.5;

        let mut matrix = ModulationMatrix::new(44100.0);
        matrix.bind(&target, &patch);
        matrix.on_note_trigger();
        matrix.apply(&mut target);
        assert_abs_diff_eq!(target.writes[0].1, 0.9, epsilon = 1e-12);
        for _ in 0..441 {
            matrix.apply(&mut target);
        }
        // past the release the source is silent and the center remains
        assert_abs_diff_eq!(target.writes.last().unwrap().1, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rebinding_clears_stale_slots() {
        let mut patch = PatchParameters::default();
        patch.lfo_mut(2).unwrap().destination = Some(ModDestination::FeedbackC);
        patch.mod_env.destination = Some(ModDestination::LevelA);
        let target = Recorder::default();

        let mut matrix = ModulationMatrix::new(44100.0);
        matrix.bind(&target, &patch);
        assert!(matrix.lfo_binding(1).is_some());
        assert!(matrix.envelope_binding().is_some());

        matrix.bind(&target, &PatchParameters::default());
        assert!(matrix.lfo_binding(1).is_none());
        assert!(matrix.envelope_binding().is_none());
    }

    #[test]
    fn idle_advance_keeps_lfo_phase_running() {
        let mut matrix = ModulationMatrix::new(100.0);
        for _ in 0..10 {
            matrix.advance_idle();
        }
        // default 1 Hz at 100 Hz sample rate
        assert_abs_diff_eq!(matrix.lfo(0).unwrap().phase(), 0.1, epsilon = 1e-9);
        matrix.reset_lfo_phases();
        assert_eq!(matrix.lfo(2).unwrap().phase(), 0.0);
    }
}
