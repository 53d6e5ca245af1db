//! Parameter surface — the flat name → value table an external transport
//! drives, plus the indexed LFO and modulation-envelope fields.
//!
//! Writes are validated before anything is touched: a rejected value leaves
//! the patch exactly as it was.

use log::warn;

use crate::error::ParamError;
use crate::patch::{LfoWaveform, ModDestination, PatchParameters};

/// A named, typed accessor pair over [`PatchParameters`].
pub struct ParamDescriptor {
    pub name: &'static str,
    pub get: fn(&PatchParameters) -> f64,
    pub set: fn(&mut PatchParameters, f64) -> Result<(), ParamError>,
}

impl std::fmt::Debug for ParamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamDescriptor").field("name", &self.name).finish()
    }
}

macro_rules! op_param {
    ($name:literal, $op:ident . $field:ident, $setter:ident) => {
        ParamDescriptor {
            name: $name,
            get: |p| p.$op.$field,
            set: |p, v| {
                p.$op.$setter(v);
                Ok(())
            },
        }
    };
}

macro_rules! global_param {
    ($name:literal, |$p:ident| $get:expr, $setter:ident) => {
        ParamDescriptor {
            name: $name,
            get: |$p| $get,
            set: |p, v| {
                p.$setter(v);
                Ok(())
            },
        }
    };
}

/// Every scalar patch parameter, in schema order.
pub static PARAMETERS: &[ParamDescriptor] = &[
    op_param!("ratio_A", a.ratio, set_ratio),
    op_param!("feedback_A", a.feedback, set_feedback),
    op_param!("level_A", a.level, set_level),
    op_param!("attack_A", a.attack, set_attack),
    op_param!("decay_A", a.decay, set_decay),
    op_param!("sustain_A", a.sustain, set_sustain),
    op_param!("release_A", a.release, set_release),
    op_param!("ratio_B1", b1.ratio, set_ratio),
    op_param!("feedback_B1", b1.feedback, set_feedback),
    op_param!("level_B1", b1.level, set_level),
    op_param!("attack_B1", b1.attack, set_attack),
    op_param!("decay_B1", b1.decay, set_decay),
    op_param!("sustain_B1", b1.sustain, set_sustain),
    op_param!("release_B1", b1.release, set_release),
    op_param!("ratio_B2", b2.ratio, set_ratio),
    op_param!("feedback_B2", b2.feedback, set_feedback),
    op_param!("level_B2", b2.level, set_level),
    op_param!("attack_B2", b2.attack, set_attack),
    op_param!("decay_B2", b2.decay, set_decay),
    op_param!("sustain_B2", b2.sustain, set_sustain),
    op_param!("release_B2", b2.release, set_release),
    op_param!("ratio_C", c.ratio, set_ratio),
    op_param!("feedback_C", c.feedback, set_feedback),
    global_param!("mix", |p| p.mix(), set_mix),
    ParamDescriptor {
        name: "algorithm",
        get: |p| p.algorithm() as f64,
        set: |p, v| {
            if v.fract() != 0.0 || !(1.0..=8.0).contains(&v) {
                return Err(ParamError::AlgorithmOutOfRange(v));
            }
            p.set_algorithm(v as u8)
        },
    },
    global_param!("master_vol", |p| p.master_volume(), set_master_volume),
    global_param!("attack_amp", |p| p.amp.attack, set_amp_attack),
    global_param!("decay_amp", |p| p.amp.decay, set_amp_decay),
    global_param!("sustain_amp", |p| p.amp.sustain, set_amp_sustain),
    global_param!("release_amp", |p| p.amp.release, set_amp_release),
    global_param!("amp", |p| p.amp.amplitude, set_amp_amplitude),
];

pub fn descriptor(name: &str) -> Option<&'static ParamDescriptor> {
    PARAMETERS.iter().find(|d| d.name == name)
}

fn check_finite(name: &str, value: f64) -> Result<f64, ParamError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParamError::NotFinite {
            name: name.to_string(),
        })
    }
}

fn require(name: &str, value: Option<f64>) -> Result<f64, ParamError> {
    let value = value.ok_or_else(|| ParamError::MissingValue(name.to_string()))?;
    check_finite(name, value)
}

pub fn get_param(patch: &PatchParameters, name: &str) -> Result<f64, ParamError> {
    descriptor(name)
        .map(|d| (d.get)(patch))
        .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))
}

/// Set one scalar parameter by name.
pub fn set_param(patch: &mut PatchParameters, name: &str, value: f64) -> Result<(), ParamError> {
    let result = descriptor(name)
        .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))
        .and_then(|d| (d.set)(patch, check_finite(name, value)?));
    if let Err(e) = &result {
        warn!("rejected {name} = {value}: {e}");
    }
    result
}

fn parse_destination(value: Option<f64>) -> Result<Option<ModDestination>, ParamError> {
    match value {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v >= 0.0 => ModDestination::from_index(v as usize)
            .map(Some)
            .ok_or(ParamError::DestinationOutOfRange(v)),
        Some(v) => Err(ParamError::DestinationOutOfRange(v)),
    }
}

fn parse_waveform(value: f64) -> Result<LfoWaveform, ParamError> {
    if value.fract() != 0.0 || !(0.0..=4.0).contains(&value) {
        return Err(ParamError::WaveformOutOfRange(value));
    }
    LfoWaveform::try_from(value as u8)
}

/// Set a field of LFO `index` (1-3): `dest`, `wave`, `amount`, `rate` or
/// `smooth`. Only `dest` accepts `None`, which unbinds the LFO.
pub fn set_lfo_param(
    patch: &mut PatchParameters,
    index: usize,
    field: &str,
    value: Option<f64>,
) -> Result<(), ParamError> {
    // Validate the index before the field so the error names the real problem.
    patch.lfo(index)?;
    let name = format!("{field}_lfo{index}");
    let result = match field {
        "dest" => parse_destination(value).and_then(|d| {
            patch.lfo_mut(index)?.destination = d;
            Ok(())
        }),
        "wave" => require(&name, value).and_then(parse_waveform).and_then(|w| {
            patch.lfo_mut(index)?.waveform = w;
            Ok(())
        }),
        "amount" => require(&name, value).and_then(|v| {
            patch.lfo_mut(index)?.amount = v;
            Ok(())
        }),
        "rate" => require(&name, value).and_then(|v| {
            patch.lfo_mut(index)?.frequency = v.max(0.0);
            Ok(())
        }),
        "smooth" => require(&name, value).and_then(|v| {
            patch.lfo_mut(index)?.smooth = v.clamp(0.0, 1.0);
            Ok(())
        }),
        _ => Err(ParamError::UnknownParameter(name)),
    };
    if let Err(e) = &result {
        warn!("rejected LFO {index} {field} = {value:?}: {e}");
    }
    result
}

/// Set a field of the modulation envelope: `dest`, `amount` or `release`
/// (seconds). Only `dest` accepts `None`.
pub fn set_env_param(
    patch: &mut PatchParameters,
    field: &str,
    value: Option<f64>,
) -> Result<(), ParamError> {
    let name = format!("{field}_env");
    let env = &mut patch.mod_env;
    let result = match field {
        "dest" => parse_destination(value).map(|d| env.destination = d),
        "amount" => require(&name, value).map(|v| env.amount = v),
        "release" => require(&name, value).map(|v| env.release = v.max(0.0)),
        _ => Err(ParamError::UnknownParameter(name)),
    };
    if let Err(e) = &result {
        warn!("rejected envelope {field} = {value:?}: {e}");
    }
    result
}
