//! Load-based automatic joint breaking.

use crate::config::model::BreakLevel;
use crate::foundation::core::DVec3;

/// Force threshold parameters of one severity level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakThresholds {
    /// Scales `mass × g`.
    pub multiplier: f64,
    /// Lower clamp in newtons.
    pub min_force: f64,
    /// Upper clamp in newtons.
    pub max_force: f64,
}

/// Thresholds for `level`.
pub fn thresholds(level: BreakLevel) -> BreakThresholds {
    match level {
        BreakLevel::Low => BreakThresholds {
            multiplier: 3.0,
            min_force: 5.0,
            max_force: 500.0,
        },
        BreakLevel::Medium => BreakThresholds {
            multiplier: 1.5,
            min_force: 2.0,
            max_force: 250.0,
        },
        BreakLevel::High => BreakThresholds {
            multiplier: 0.75,
            min_force: 1.0,
            max_force: 120.0,
        },
    }
}

/// Force at which a joint between bodies of mean mass `mass` breaks under gravity `g`.
pub fn force_threshold(level: BreakLevel, mass: f64, g: f64) -> f64 {
    let t = thresholds(level);
    (mass.max(0.0) * g.abs() * t.multiplier).clamp(t.min_force, t.max_force)
}

/// Estimated reaction load carried by a joint over one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoadEstimate {
    /// Linear reaction force.
    pub force: f64,
    /// Reaction torque.
    pub torque: f64,
}

impl LoadEstimate {
    /// Whether the load exceeds `threshold` (force) or `threshold × lever` (torque).
    pub fn exceeds(&self, threshold: f64, lever: f64) -> bool {
        self.force > threshold || self.torque > threshold * lever.max(1e-6)
    }
}

/// Estimate joint load from the change of relative velocity across one step.
///
/// The force is the reduced mass times the relative linear acceleration; the torque treats the
/// reduced mass as a point at distance `lever`.
pub fn estimate_load(
    mass_a: f64,
    mass_b: f64,
    lever: f64,
    delta_rel_linvel: DVec3,
    delta_rel_angvel: DVec3,
    dt: f64,
) -> LoadEstimate {
    if dt <= 0.0 || mass_a + mass_b <= 0.0 {
        return LoadEstimate::default();
    }
    let reduced = mass_a * mass_b / (mass_a + mass_b);
    LoadEstimate {
        force: reduced * delta_rel_linvel.length() / dt,
        torque: reduced * lever * lever * delta_rel_angvel.length() / dt,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/breakage.rs"]
mod tests;
