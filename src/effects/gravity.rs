//! Physics collapse, recall and re-bond loop.

use crate::config::model::{EffectConfig, EffectKind, GravityConfig};
use crate::effects::context::EffectContext;
use crate::effects::lifecycle::{EffectState, Lifecycle, Transition};
use crate::effects::stage::Stage;
use crate::effects::{Effect, checked, kind_mismatch};
use crate::foundation::error::FxResult;
use crate::physics::choreography::{ChoreoEvent, ChoreoStats, Phase, PhysicsChoreographer};
use crate::physics::solver::SharedSolver;

/// Drives a [`PhysicsChoreographer`] from the effect lifecycle.
#[derive(Debug)]
pub struct GravityEffect {
    config: GravityConfig,
    life: Lifecycle,
    stage: Option<Stage>,
    solver: Option<SharedSolver>,
    choreo: Option<PhysicsChoreographer>,
}

impl GravityEffect {
    /// Uninitialized effect.
    pub fn new(config: GravityConfig) -> Self {
        Self {
            config,
            life: Lifecycle::new(EffectKind::Gravity),
            stage: None,
            solver: None,
            choreo: None,
        }
    }

    /// Replace the config with a copy of `config`.
    pub fn set_config(&mut self, config: &GravityConfig) {
        self.config = config.clone();
    }

    /// Copy of the config.
    pub fn config(&self) -> GravityConfig {
        self.config.clone()
    }

    /// Current choreography phase, while a run is active.
    pub fn phase(&self) -> Option<Phase> {
        self.choreo.as_ref().map(PhysicsChoreographer::phase)
    }

    /// Choreography counters of the current run.
    pub fn stats(&self) -> Option<ChoreoStats> {
        self.choreo.as_ref().map(PhysicsChoreographer::stats)
    }

    /// The active choreographer.
    pub fn choreographer(&self) -> Option<&PhysicsChoreographer> {
        self.choreo.as_ref()
    }

    fn teardown(&mut self, restore_scene: bool) {
        if let Some(mut choreo) = self.choreo.take() {
            choreo.teardown();
        }
        if restore_scene && let Some(stage) = &self.stage {
            stage.restore();
        }
    }
}

impl Effect for GravityEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Gravity
    }

    fn state(&self) -> EffectState {
        self.life.state()
    }

    fn init(&mut self, ctx: EffectContext) -> FxResult<()> {
        if !self.life.check(Transition::Init) {
            return Ok(());
        }
        let scene = ctx.require_scene()?;
        let solver = ctx.require_solver()?;
        solver.borrow_mut().ensure_loaded()?;
        self.teardown(true);
        self.stage = Some(Stage::derive(scene)?);
        self.solver = Some(solver);
        Ok(())
    }

    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()> {
        match config {
            EffectConfig::Gravity(c) => {
                self.set_config(c);
                Ok(())
            }
            other => Err(kind_mismatch(EffectKind::Gravity, other)),
        }
    }

    fn effect_config(&self) -> EffectConfig {
        EffectConfig::Gravity(self.config())
    }

    fn set_on_complete(&mut self, callback: Box<dyn FnMut()>) {
        self.life.set_on_complete(callback);
    }

    fn play(&mut self) -> FxResult<bool> {
        if !self.life.check(Transition::Play) {
            return Ok(false);
        }
        if self.life.state() == EffectState::Paused {
            self.life.resume();
            return Ok(true);
        }
        checked(EffectKind::Gravity, self.config.validate())?;
        let (Some(stage), Some(solver)) = (self.stage.as_ref(), self.solver.as_ref()) else {
            tracing::info!(effect = "gravity", "play before init ignored");
            return Ok(false);
        };
        let choreo = PhysicsChoreographer::setup(
            &stage.assembly,
            stage.scene.clone(),
            solver.clone(),
            &self.config,
        )?;
        self.choreo = Some(choreo);
        self.life.start();
        Ok(true)
    }

    fn pause(&mut self) -> bool {
        if !self.life.check(Transition::Pause) {
            return false;
        }
        self.life.pause();
        true
    }

    fn resume(&mut self) -> bool {
        if !self.life.check(Transition::Resume) {
            return false;
        }
        self.life.resume();
        true
    }

    fn stop(&mut self) -> bool {
        if !self.life.check(Transition::Stop) {
            return false;
        }
        self.teardown(true);
        self.life.enter(EffectState::Stopped);
        true
    }

    fn tick(&mut self, time_secs: f64) -> FxResult<()> {
        if !self.life.check(Transition::Tick) {
            return Ok(());
        }
        let (_, dt) = self.life.advance(time_secs);
        let Some(choreo) = self.choreo.as_mut() else {
            return Ok(());
        };
        match choreo.tick(dt)? {
            ChoreoEvent::Running => {}
            ChoreoEvent::CycleCompleted => self.life.cycle_completed(),
            ChoreoEvent::Finished => {
                self.teardown(false);
                self.life.finish();
            }
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.life.check(Transition::Dispose) {
            return;
        }
        self.teardown(true);
        self.stage = None;
        self.solver = None;
        self.life.dispose();
    }

    fn phase_name(&self) -> Option<&'static str> {
        self.phase().map(Phase::name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/gravity.rs"]
mod tests;
