//! The effect contract and its concrete implementations.

pub(crate) mod context;
pub(crate) mod explosion;
pub(crate) mod gravity;
pub(crate) mod lifecycle;
pub(crate) mod orbit;
pub(crate) mod reveal;
pub(crate) mod stage;
pub(crate) mod turntable;

use crate::config::model::{EffectConfig, EffectKind};
use crate::effects::context::EffectContext;
use crate::effects::lifecycle::EffectState;
use crate::foundation::error::{FxError, FxResult};

/// Uniform lifecycle every effect implements.
///
/// Calls that the current [`EffectState`] forbids are ignored: they return `false` (or `Ok(false)`)
/// and leave state and outputs untouched. `tick` is driven by the host once per rendered frame with
/// a monotonically increasing time in seconds.
pub trait Effect {
    /// Effect type.
    fn kind(&self) -> EffectKind;

    /// Current lifecycle state.
    fn state(&self) -> EffectState;

    /// Bind collaborators and derive pieces. Fails with [`FxError::MissingCollaborator`] when a
    /// required handle is absent.
    fn init(&mut self, ctx: EffectContext) -> FxResult<()>;

    /// Replace the stored config with a copy of `config`. Takes effect at the next run.
    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()>;

    /// Copy of the stored config.
    fn effect_config(&self) -> EffectConfig;

    /// Called once per run, after the first completed cycle.
    fn set_on_complete(&mut self, callback: Box<dyn FnMut()>);

    /// Start a run (from idle/stopped) or continue one (from paused).
    fn play(&mut self) -> FxResult<bool>;

    /// Freeze a playing run.
    fn pause(&mut self) -> bool;

    /// Continue a paused run.
    fn resume(&mut self) -> bool;

    /// Halt and restore external state captured at setup.
    fn stop(&mut self) -> bool;

    /// Advance to host time `time_secs`.
    fn tick(&mut self, time_secs: f64) -> FxResult<()>;

    /// Restore owned objects and release every handle. Idempotent.
    fn dispose(&mut self);

    /// Effect-specific sub-state for traces, if any.
    fn phase_name(&self) -> Option<&'static str> {
        None
    }
}

/// Build an uninitialized effect for `config`.
pub fn create_effect(config: &EffectConfig) -> Box<dyn Effect> {
    match config {
        EffectConfig::Reveal(c) => Box::new(reveal::RevealEffect::new(c.clone())),
        EffectConfig::Explosion(c) => Box::new(explosion::ExplosionEffect::new(c.clone())),
        EffectConfig::Orbit(c) => Box::new(orbit::OrbitEffect::new(c.clone())),
        EffectConfig::Gravity(c) => Box::new(gravity::GravityEffect::new(c.clone())),
        EffectConfig::Turntable(c) => Box::new(turntable::TurntableEffect::new(c.clone())),
    }
}

pub(crate) fn kind_mismatch(expected: EffectKind, got: &EffectConfig) -> FxError {
    FxError::validation(format!(
        "{} effect cannot take a {} config",
        expected.name(),
        got.kind().name()
    ))
}

/// Validate before motion starts, logging the field errors.
pub(crate) fn checked<T>(kind: EffectKind, result: Result<(), T>) -> FxResult<()>
where
    FxError: From<T>,
{
    result.map_err(|e| {
        let err = FxError::from(e);
        tracing::warn!(effect = kind.name(), error = %err, "invalid config; run not started");
        err
    })
}

/// Fraction of a looped cycle, and whether the run completed a cycle this tick.
///
/// A cycle is `run` seconds of motion followed by `hold` seconds at the final pose.
pub(crate) fn cycle_position(elapsed: f64, run: f64, hold: f64) -> (f64, u64) {
    let period = run + hold.max(0.0);
    if period <= 0.0 {
        return (1.0, 0);
    }
    let cycles = (elapsed / period).floor();
    let within = elapsed - cycles * period;
    let frac = if within >= run { 1.0 } else { within / run };
    (frac, cycles as u64)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/mod.rs"]
mod tests;
