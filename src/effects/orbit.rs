//! Keyframed constant-speed camera fly-through.

use crate::camera::path::{CameraPath, PathOptions};
use crate::camera::rig::{CameraPose, SharedCamera, SharedControls};
use crate::camera::tween::CameraTween;
use crate::config::model::{EffectConfig, EffectKind, OrbitConfig};
use crate::effects::context::{ControlsGuard, EffectContext};
use crate::effects::lifecycle::{EffectState, Lifecycle, Transition};
use crate::effects::{Effect, checked, kind_mismatch};
use crate::foundation::core::DVec3;
use crate::foundation::error::FxResult;
use crate::scene::piece::Assembly;

#[derive(Clone, Debug)]
struct OrbitRun {
    config: OrbitConfig,
    path: CameraPath,
    cycles: u64,
}

/// Moves the camera along user keyframes at constant speed, holding at each keyframe's pause.
#[derive(Debug)]
pub struct OrbitEffect {
    config: OrbitConfig,
    life: Lifecycle,
    center: DVec3,
    camera: Option<SharedCamera>,
    controls: Option<SharedControls>,
    controls_guard: ControlsGuard,
    run: Option<OrbitRun>,
    original: Option<CameraPose>,
    jump: Option<CameraTween>,
}

impl OrbitEffect {
    /// Uninitialized effect.
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            life: Lifecycle::new(EffectKind::Orbit),
            center: DVec3::ZERO,
            camera: None,
            controls: None,
            controls_guard: ControlsGuard::default(),
            run: None,
            original: None,
            jump: None,
        }
    }

    /// Replace the config with a copy of `config`. A run in progress keeps the config and path
    /// it started with.
    pub fn set_config(&mut self, config: &OrbitConfig) {
        self.config = config.clone();
    }

    /// Copy of the config.
    pub fn config(&self) -> OrbitConfig {
        self.config.clone()
    }

    /// Path built for the current run.
    pub fn path(&self) -> Option<&CameraPath> {
        self.run.as_ref().map(|r| &r.path)
    }

    /// Centre used when the config has no lock target.
    pub fn assembly_center(&self) -> DVec3 {
        self.center
    }

    /// Whether a jump-to-keyframe tween is running.
    pub fn is_jumping(&self) -> bool {
        self.jump.is_some()
    }

    fn lock_center(&self) -> DVec3 {
        self.config.lock_target.unwrap_or(self.center)
    }

    /// Start a short eased move of the camera to keyframe `index`, driven by
    /// [`OrbitEffect::tick_preview`]. Ignored while playing, after dispose, or for unknown
    /// keyframes.
    pub fn jump_to_keyframe(&mut self, index: usize) -> bool {
        let state = self.life.state();
        let Some(camera) = self.camera.as_ref() else {
            return false;
        };
        let Some(kf) = self.config.keyframes.get(index) else {
            tracing::info!(index, "jump to unknown keyframe ignored");
            return false;
        };
        if matches!(state, EffectState::Playing | EffectState::Disposed) {
            tracing::info!(state = state.name(), "jump to keyframe ignored");
            return false;
        }
        let center = self.lock_center();
        let from = CameraPose::capture(camera, self.controls.as_ref(), center);
        let to = CameraPose {
            position: kf.position,
            target: kf.target.unwrap_or(center),
            fov: kf.fov.unwrap_or(from.fov),
        };
        let secs = f64::from(self.config.jump_duration_ms) / 1000.0;
        self.jump = Some(CameraTween::new(from, to, secs));
        true
    }

    /// Advance a pending jump tween to host time `time_secs`. Returns whether it is still running.
    pub fn tick_preview(&mut self, time_secs: f64) -> bool {
        let (Some(tween), Some(camera)) = (self.jump.as_mut(), self.camera.as_ref()) else {
            return false;
        };
        let (pose, done) = tween.sample(time_secs);
        pose.apply_shared(camera, self.controls.as_ref());
        if done {
            self.jump = None;
        }
        !done
    }

    fn apply(&self, t: f64) {
        if let (Some(run), Some(camera)) = (&self.run, &self.camera) {
            run.path.sample(t).apply_shared(camera, self.controls.as_ref());
        }
    }
}

impl Effect for OrbitEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Orbit
    }

    fn state(&self) -> EffectState {
        self.life.state()
    }

    fn init(&mut self, ctx: EffectContext) -> FxResult<()> {
        if !self.life.check(Transition::Init) {
            return Ok(());
        }
        let scene = ctx.require_scene()?;
        let camera = ctx.require_camera()?;
        self.center = Assembly::from_scene(&*scene.borrow())?.center();
        self.camera = Some(camera);
        self.controls = ctx.controls;
        self.run = None;
        self.original = None;
        self.jump = None;
        Ok(())
    }

    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()> {
        match config {
            EffectConfig::Orbit(c) => {
                self.set_config(c);
                Ok(())
            }
            other => Err(kind_mismatch(EffectKind::Orbit, other)),
        }
    }

    fn effect_config(&self) -> EffectConfig {
        EffectConfig::Orbit(self.config())
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
        checked(EffectKind::Orbit, self.config.validate())?;
        let Some(camera) = self.camera.clone() else {
            tracing::info!(effect = "orbit", "play before init ignored");
            return Ok(false);
        };
        let opts = PathOptions {
            duration: self.config.duration_sec,
            looped: self.config.looped,
            samples_per_segment: self.config.samples_per_segment,
            mode: self.config.mode,
            center: self.lock_center(),
            default_fov: camera.borrow().fov(),
        };
        let Some(path) = CameraPath::build(&self.config.keyframes, &opts) else {
            tracing::info!(
                keyframes = self.config.keyframes.len(),
                "orbit needs at least two keyframes; play ignored"
            );
            return Ok(false);
        };
        self.jump = None;
        if self.original.is_none() {
            self.original = Some(CameraPose::capture(
                &camera,
                self.controls.as_ref(),
                self.lock_center(),
            ));
        }
        self.controls_guard.disable(self.controls.as_ref());
        self.run = Some(OrbitRun {
            config: self.config.clone(),
            path,
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
        self.controls_guard.restore(self.controls.as_ref());
        self.life.enter(EffectState::Stopped);
        true
    }

    fn tick(&mut self, time_secs: f64) -> FxResult<()> {
        if !self.life.check(Transition::Tick) {
            return Ok(());
        }
        let Some((duration, looped)) = self
            .run
            .as_ref()
            .map(|r| (r.config.duration_sec, r.config.looped))
        else {
            return Ok(());
        };
        let (elapsed, _) = self.life.advance(time_secs);
        if !looped {
            if elapsed >= duration {
                self.apply(duration);
                self.controls_guard.restore(self.controls.as_ref());
                self.life.finish();
            } else {
                self.apply(elapsed);
            }
            return Ok(());
        }
        let cycles = (elapsed / duration).floor();
        self.apply(elapsed - cycles * duration);
        if let Some(run) = self.run.as_mut()
            && cycles as u64 > run.cycles
        {
            run.cycles = cycles as u64;
            self.life.cycle_completed();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.life.check(Transition::Dispose) {
            return;
        }
        self.jump = None;
        if let (Some(camera), Some(original)) = (&self.camera, self.original.take()) {
            original.apply_shared(camera, self.controls.as_ref());
        }
        self.controls_guard.restore(self.controls.as_ref());
        self.camera = None;
        self.controls = None;
        self.run = None;
        self.life.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/orbit.rs"]
mod tests;
