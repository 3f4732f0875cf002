use crate::error::DecayError;

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<(), DecayError> {
    ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi < vf))
        .then_some(())
        .ok_or(DecayError::SignMismatch { rate, vi, vf })
}

/// A constant value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
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

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, DecayError> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// Decay from `vi` to `vf` over `horizon` time steps, then hold at `vf`
    pub fn over(vi: f32, vf: f32, horizon: f32) -> Result<Self, DecayError> {
        if horizon <= 0.0 {
            return Err(DecayError::Horizon(horizon));
        }
        Self::new((vi - vf) / horizon, vi, vf)
    }

    /// Decay from `vi` to `vf` over `fraction` of `episodes`, as a training run schedules epsilon
    pub fn over_fraction(vi: f32, vf: f32, episodes: u32, fraction: f32) -> Result<Self, DecayError> {
        let horizon = (episodes as f32 * fraction).floor().max(1.0);
        Self::over(vi, vf, horizon)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        if rate >= 0.0 {
            (vi - rate * t).max(vf)
        } else {
            (vi - rate * t).min(vf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_functional() {
        assert!(validate(1.0, 1.0, 0.0).is_ok());
        assert!(validate(1.0, -1.0, 0.0).is_err());
        assert!(validate(-1.0, 1.0, 0.0).is_err());
        assert!(validate(-1.0, -1.0, 0.0).is_ok());
    }

    #[test]
    fn constant_decay() {
        let x = Constant::new(1.0);
        assert_eq!(x.evaluate(0.0), 1.0);
        assert_eq!(x.evaluate(1.0), 1.0);
    }

    #[test]
    fn linear_decay() {
        let x = Linear::new(0.5, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 1.5);
        assert_eq!(x.evaluate(10.0), 0.5);
    }

    #[test]
    fn linear_decay_over_fraction() {
        let x = Linear::over_fraction(0.4, 0.05, 1000, 0.7).unwrap();
        assert_eq!(x.evaluate(0.0), 0.4, "Starts at the initial value");
        assert!((x.evaluate(350.0) - 0.225).abs() < 1e-5, "Halfway through the horizon");
        assert!((x.evaluate(700.0) - 0.05).abs() < 1e-5, "Reaches the floor at the horizon");
        assert_eq!(x.evaluate(999.0), 0.05, "Holds at the floor afterwards");
    }

    #[test]
    fn linear_decay_rejects_empty_horizon() {
        assert_eq!(Linear::over(1.0, 0.0, 0.0), Err(DecayError::Horizon(0.0)));
    }
}
