//! The eight fixed operator topologies.
//!
//! Every algorithm advances each of the four oscillators exactly once per
//! call and yields two channels `(x, y)` that the voice cross-fades.

use crate::error::ParamError;

use super::operator::Operator;

/// The four operators of a voice.
#[derive(Debug, Clone)]
pub struct Operators {
    pub a: Operator,
    pub b1: Operator,
    pub b2: Operator,
    pub c: Operator,
}

impl Operators {
    pub fn new(sample_rate: f64) -> Self {
        Operators {
            a: Operator::new(sample_rate),
            b1: Operator::new(sample_rate),
            b2: Operator::new(sample_rate),
            c: Operator::new(sample_rate),
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Operator> {
        [&mut self.a, &mut self.b1, &mut self.b2, &mut self.c].into_iter()
    }
}

/// Read a modulator: its audio sample scaled by its own envelope.
fn modulator(op: &mut Operator, fm_input: f64) -> f64 {
    op.next_sample(fm_input) * op.modulation_index()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// B2 → B1 → C, A → C; y taps B1.
    #[default]
    One,
    /// B2 → B1 (y), A → C (x).
    Two,
    /// A → B2 (y); A → B1 and A → C averaged (x).
    Three,
    /// B2 → B1 → A (y) → C (x).
    Four,
    /// B2 → B1, B1 + B2 → A (y) → C (x).
    Five,
    /// A + B2 → B1 (y) and → C (x).
    Six,
    /// Two parallel pairs: B2 → B1 (y) and A → C (x), each averaged with
    /// its modulator's raw output.
    Seven,
    /// B1 alone (y); A → C averaged with B2 (x).
    Eight,
}

impl Algorithm {
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn process(self, ops: &mut Operators) -> (f64, f64) {
        match self {
            Algorithm::One => {
                let b2 = modulator(&mut ops.b2, 0.0);
                let a = modulator(&mut ops.a, 0.0);
                let y = ops.b1.next_sample(b2);
                let b1 = y * ops.b1.modulation_index();
                let x = ops.c.next_sample(b1 + a);
                (x, y)
            }
            Algorithm::Two => {
                let b2 = modulator(&mut ops.b2, 0.0);
                let a = modulator(&mut ops.a, 0.0);
                let y = ops.b1.next_sample(b2);
                let x = ops.c.next_sample(a);
                (x, y)
            }
            Algorithm::Three => {
                let a = modulator(&mut ops.a, 0.0);
                let y = ops.b2.next_sample(a);
                let x = 0.5 * (ops.b1.next_sample(a) + ops.c.next_sample(a));
                (x, y)
            }
            Algorithm::Four => {
                let b2 = modulator(&mut ops.b2, 0.0);
                let b1 = modulator(&mut ops.b1, b2);
                let y = ops.a.next_sample(b1);
                let a = y * ops.a.modulation_index();
                let x = ops.c.next_sample(a);
                (x, y)
            }
            Algorithm::Five => {
                let b2 = modulator(&mut ops.b2, 0.0);
                let b1 = modulator(&mut ops.b1, b2);
                let y = ops.a.next_sample(b1 + b2);
                let a = y * ops.a.modulation_index();
                let x = ops.c.next_sample(a);
                (x, y)
            }
            Algorithm::Six => {
                let b2 = modulator(&mut ops.b2, 0.0);
                let a = modulator(&mut ops.a, 0.0);
                let total = b2 + a;
                let y = ops.b1.next_sample(total);
                let x = ops.c.next_sample(total);
                (x, y)
            }
            Algorithm::Seven => {
                let b2 = ops.b2.next_sample(0.0);
                let b1 = ops.b1.next_sample(b2 * ops.b2.modulation_index());
                let y = 0.5 * (b1 + b2);
                let a = ops.a.next_sample(0.0);
                let c = ops.c.next_sample(a * ops.a.modulation_index());
                let x = 0.5 * (a + c);
                (x, y)
            }
            Algorithm::Eight => {
                let y = ops.b1.next_sample(0.0);
                let b2 = ops.b2.next_sample(0.0);
                let a = modulator(&mut ops.a, 0.0);
                let c = ops.c.next_sample(a);
                let x = 0.5 * (c + b2);
                (x, y)
            }
        }
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = ParamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Algorithm::One),
            2 => Ok(Algorithm::Two),
            3 => Ok(Algorithm::Three),
            4 => Ok(Algorithm::Four),
            5 => Ok(Algorithm::Five),
            6 => Ok(Algorithm::Six),
            7 => Ok(Algorithm::Seven),
            8 => Ok(Algorithm::Eight),
            other => Err(ParamError::AlgorithmOutOfRange(other as f64)),
        }
    }
}
