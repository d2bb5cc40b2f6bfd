use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(vi: f32, vf: f32, span: f32) -> Result<()> {
    if !(vi >= vf && vf >= 0.0) {
        return Err(Error::Config(format!(
            "decay must satisfy `vi >= vf >= 0`, got vi = {vi}, vf = {vf}"
        )));
    }
    if !(span > 0.0) {
        return Err(Error::Config(format!(
            "decay span must be positive, got {span}"
        )));
    }
    Ok(())
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * max(0, (s - t) / s)
///
/// Reaches exactly v<sub>f</sub> at `t = s` and stays there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    vi: f32,
    vf: f32,
    span: f32,
}

impl Linear {
    /// Linear decay from `vi` to `vf` over `span` units of time
    ///
    /// Fails with [`Error::Config`] unless `vi >= vf >= 0` and `span > 0`
    pub fn new(vi: f32, vf: f32, span: f32) -> Result<Self> {
        validate(vi, vf, span)?;
        Ok(Self { vi, vf, span })
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { vi, vf, span } = self;
        vf + (vi - vf) * ((span - t) / span).max(0.0)
    }
}
