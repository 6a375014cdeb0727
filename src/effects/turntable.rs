//! Single eased spin of the assembly or the camera about the vertical axis.

use crate::camera::rig::{CameraPose, SharedCamera, SharedControls};
use crate::config::model::{EffectConfig, EffectKind, TurntableConfig, TurntableMode};
use crate::effects::context::{ControlsGuard, EffectContext};
use crate::effects::lifecycle::{EffectState, Lifecycle, Transition};
use crate::effects::stage::Stage;
use crate::effects::{Effect, checked, cycle_position, kind_mismatch};
use crate::foundation::core::{DQuat, DVec3};
use crate::foundation::error::{FxError, FxResult};

#[derive(Clone, Debug)]
struct TurntableRun {
    config: TurntableConfig,
    center: DVec3,
    camera_start: Option<CameraPose>,
    cycles: u64,
}

/// Spins pieces (object mode) or orbits the camera (camera mode) about the assembly centre.
#[derive(Debug)]
pub struct TurntableEffect {
    config: TurntableConfig,
    life: Lifecycle,
    stage: Option<Stage>,
    camera: Option<SharedCamera>,
    controls: Option<SharedControls>,
    controls_guard: ControlsGuard,
    run: Option<TurntableRun>,
}

impl TurntableEffect {
    /// Uninitialized effect.
    pub fn new(config: TurntableConfig) -> Self {
        Self {
            config,
            life: Lifecycle::new(EffectKind::Turntable),
            stage: None,
            camera: None,
            controls: None,
            controls_guard: ControlsGuard::default(),
            run: None,
        }
    }

    /// Replace the config with a copy of `config`. A run in progress keeps the config it
    /// started with.
    pub fn set_config(&mut self, config: &TurntableConfig) {
        self.config = config.clone();
    }

    /// Copy of the config.
    pub fn config(&self) -> TurntableConfig {
        self.config.clone()
    }

    fn apply(&self, frac: f64) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let angle = (run.config.degrees * run.config.ease.apply(frac)).to_radians();
        let spin = DQuat::from_rotation_y(angle);
        match run.config.mode {
            TurntableMode::Object => {
                if let Some(stage) = &self.stage {
                    stage.rotate_all(run.center, spin);
                }
            }
            TurntableMode::Camera => {
                if let (Some(camera), Some(start)) = (&self.camera, run.camera_start) {
                    let pose = CameraPose {
                        position: run.center + spin * (start.position - run.center),
                        target: run.center,
                        fov: start.fov,
                    };
                    pose.apply_shared(camera, self.controls.as_ref());
                }
            }
        }
    }

    fn end_run(&mut self, restore: bool) {
        if let Some(run) = self.run.take() {
            match run.config.mode {
                TurntableMode::Object => {
                    if restore && let Some(stage) = &self.stage {
                        stage.restore();
                    }
                }
                TurntableMode::Camera => {
                    if restore
                        && let (Some(camera), Some(start)) = (&self.camera, run.camera_start)
                    {
                        start.apply_shared(camera, self.controls.as_ref());
                    }
                }
            }
        }
        self.controls_guard.restore(self.controls.as_ref());
    }
}

impl Effect for TurntableEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Turntable
    }

    fn state(&self) -> EffectState {
        self.life.state()
    }

    fn init(&mut self, ctx: EffectContext) -> FxResult<()> {
        if !self.life.check(Transition::Init) {
            return Ok(());
        }
        let scene = ctx.require_scene()?;
        if self.config.mode == TurntableMode::Camera {
            ctx.require_camera()?;
        }
        if let Some(old) = self.stage.take() {
            old.restore();
        }
        self.stage = Some(Stage::derive(scene)?);
        self.camera = ctx.camera;
        self.controls = ctx.controls;
        self.run = None;
        Ok(())
    }

    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()> {
        match config {
            EffectConfig::Turntable(c) => {
                self.set_config(c);
                Ok(())
            }
            other => Err(kind_mismatch(EffectKind::Turntable, other)),
        }
    }

    fn effect_config(&self) -> EffectConfig {
        EffectConfig::Turntable(self.config())
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
        checked(EffectKind::Turntable, self.config.validate())?;
        let Some(stage) = self.stage.as_ref() else {
            tracing::info!(effect = "turntable", "play before init ignored");
            return Ok(false);
        };
        let center = stage.assembly.center();
        let camera_start = match self.config.mode {
            TurntableMode::Object => None,
            TurntableMode::Camera => {
                let camera = self
                    .camera
                    .as_ref()
                    .ok_or(FxError::MissingCollaborator("camera"))?;
                self.controls_guard.disable(self.controls.as_ref());
                Some(CameraPose::capture(camera, self.controls.as_ref(), center))
            }
        };
        self.run = Some(TurntableRun {
            config: self.config.clone(),
            center,
            camera_start,
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
        self.end_run(true);
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
                self.end_run(false);
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
        self.end_run(true);
        if let Some(stage) = self.stage.take() {
            stage.restore();
        }
        self.camera = None;
        self.controls = None;
        self.life.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/turntable.rs"]
mod tests;
