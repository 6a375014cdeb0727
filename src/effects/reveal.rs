//! Progressive bottom-up reveal.

use crate::config::model::{EffectConfig, EffectKind, RevealConfig};
use crate::effects::context::EffectContext;
use crate::effects::lifecycle::{EffectState, Lifecycle, Transition};
use crate::effects::stage::Stage;
use crate::effects::{Effect, checked, cycle_position, kind_mismatch};
use crate::foundation::core::{DQuat, DVec3};
use crate::foundation::error::FxResult;
use crate::scene::ordering::piece_order;

const COUNT_EPSILON: f64 = 1e-9;

/// Number of pieces visible at eased progress `frac` out of `total`: `ceil(frac × total)`.
pub fn reveal_count(frac: f64, total: usize) -> usize {
    if frac.is_nan() || frac <= 0.0 {
        return 0;
    }
    let n = (frac.min(1.0) * total as f64 - COUNT_EPSILON).ceil();
    (n.max(0.0) as usize).min(total)
}

#[derive(Clone, Debug)]
struct RevealRun {
    config: RevealConfig,
    order: Vec<usize>,
    center: DVec3,
    shown: Option<usize>,
    cycles: u64,
}

/// Pieces appear lowest-first as eased progress advances, optionally spinning the assembly.
#[derive(Debug)]
pub struct RevealEffect {
    config: RevealConfig,
    life: Lifecycle,
    stage: Option<Stage>,
    run: Option<RevealRun>,
}

impl RevealEffect {
    /// Uninitialized effect.
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            life: Lifecycle::new(EffectKind::Reveal),
            stage: None,
            run: None,
        }
    }

    /// Replace the config with a copy of `config`. A run in progress keeps the config it
    /// started with.
    pub fn set_config(&mut self, config: &RevealConfig) {
        self.config = config.clone();
    }

    /// Copy of the config.
    pub fn config(&self) -> RevealConfig {
        self.config.clone()
    }

    /// Piece ids in reveal order for the current run.
    pub fn order(&self) -> Vec<String> {
        match (&self.stage, &self.run) {
            (Some(stage), Some(run)) => run
                .order
                .iter()
                .map(|&i| stage.assembly.pieces[i].id.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Pieces currently revealed.
    pub fn visible_count(&self) -> usize {
        self.run.as_ref().and_then(|r| r.shown).unwrap_or(0)
    }

    fn apply(&mut self, frac: f64) {
        let (Some(stage), Some(run)) = (self.stage.as_ref(), self.run.as_mut()) else {
            return;
        };
        let eased = run.config.ease.apply(frac);
        let count = reveal_count(eased, run.order.len());
        if run.shown != Some(count) {
            let mut visible = vec![false; run.order.len()];
            for &i in &run.order[..count] {
                visible[i] = true;
            }
            stage.apply_visibility(&visible);
            run.shown = Some(count);
        }
        if run.config.rotation_deg != 0.0 {
            let angle = (run.config.rotation_deg * eased).to_radians();
            stage.rotate_all(run.center, DQuat::from_rotation_y(angle));
        }
    }
}

impl Effect for RevealEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Reveal
    }

    fn state(&self) -> EffectState {
        self.life.state()
    }

    fn init(&mut self, ctx: EffectContext) -> FxResult<()> {
        if !self.life.check(Transition::Init) {
            return Ok(());
        }
        let scene = ctx.require_scene()?;
        if let Some(old) = self.stage.take() {
            old.restore();
        }
        self.stage = Some(Stage::derive(scene)?);
        self.run = None;
        Ok(())
    }

    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()> {
        match config {
            EffectConfig::Reveal(c) => {
                self.set_config(c);
                Ok(())
            }
            other => Err(kind_mismatch(EffectKind::Reveal, other)),
        }
    }

    fn effect_config(&self) -> EffectConfig {
        EffectConfig::Reveal(self.config())
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
        checked(EffectKind::Reveal, self.config.validate())?;
        let Some(stage) = self.stage.as_ref() else {
            tracing::info!(effect = "reveal", "play before init ignored");
            return Ok(false);
        };
        self.run = Some(RevealRun {
            config: self.config.clone(),
            order: piece_order(&stage.assembly.pieces),
            center: stage.assembly.center(),
            shown: None,
            cycles: 0,
        });
        self.apply(0.0);
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
        if let Some(stage) = &self.stage {
            stage.restore();
        }
        self.run = None;
        self.life.enter(EffectState::Stopped);
        true
    }

    fn tick(&mut self, time_secs: f64) -> FxResult<()> {
        if !self.life.check(Transition::Tick) {
            return Ok(());
        }
        let Some(cfg) = self.run.as_ref().map(|r| r.config.clone()) else {
            return Ok(());
        };
        let (elapsed, _) = self.life.advance(time_secs);
        let duration = cfg.duration_sec;
        if !cfg.looped {
            if elapsed >= duration {
                self.apply(1.0);
                self.life.finish();
            } else {
                self.apply(elapsed / duration);
            }
            return Ok(());
        }
        let (frac, cycles) = cycle_position(elapsed, duration, cfg.loop_pause_sec);
        self.apply(frac);
        if let Some(run) = self.run.as_mut()
            && cycles > run.cycles
        {
            run.cycles = cycles;
            self.life.cycle_completed();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.life.check(Transition::Dispose) {
            return;
        }
        if let Some(stage) = self.stage.take() {
            stage.restore();
        }
        self.run = None;
        self.life.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/reveal.rs"]
mod tests;
