use crate::camera::rig::{SharedCamera, SharedControls};
use crate::foundation::error::{FxError, FxResult};
use crate::physics::solver::SharedSolver;
use crate::scene::graph::SharedScene;

/// Collaborator handles passed to [`crate::Effect::init`].
///
/// Each effect checks for the handles it cannot run without and fails with
/// [`FxError::MissingCollaborator`] naming the first one absent.
#[derive(Clone, Default)]
pub struct EffectContext {
    /// Render-system scene graph.
    pub scene: Option<SharedScene>,
    /// Perspective camera.
    pub camera: Option<SharedCamera>,
    /// Orbit-style controls attached to the camera.
    pub controls: Option<SharedControls>,
    /// Rigid-body solver.
    pub solver: Option<SharedSolver>,
}

impl std::fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("scene", &self.scene.is_some())
            .field("camera", &self.camera.is_some())
            .field("controls", &self.controls.is_some())
            .field("solver", &self.solver.is_some())
            .finish()
    }
}

impl EffectContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a scene graph.
    pub fn with_scene(mut self, scene: SharedScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Attach a camera.
    pub fn with_camera(mut self, camera: SharedCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Attach camera controls.
    pub fn with_controls(mut self, controls: SharedControls) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Attach a physics solver.
    pub fn with_solver(mut self, solver: SharedSolver) -> Self {
        self.solver = Some(solver);
        self
    }

    pub(crate) fn require_scene(&self) -> FxResult<SharedScene> {
        self.scene
            .clone()
            .ok_or(FxError::MissingCollaborator("scene"))
    }

    pub(crate) fn require_camera(&self) -> FxResult<SharedCamera> {
        self.camera
            .clone()
            .ok_or(FxError::MissingCollaborator("camera"))
    }

    pub(crate) fn require_solver(&self) -> FxResult<SharedSolver> {
        self.solver
            .clone()
            .ok_or(FxError::MissingCollaborator("solver"))
    }
}

/// Controls-enabled flag captured when a run disables user input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlsGuard {
    saved: Option<bool>,
}

impl ControlsGuard {
    /// Disable input, remembering the previous flag. Repeated calls keep the first flag.
    pub(crate) fn disable(&mut self, controls: Option<&SharedControls>) {
        let Some(c) = controls else {
            return;
        };
        let mut c = c.borrow_mut();
        if self.saved.is_none() {
            self.saved = Some(c.enabled());
        }
        c.set_enabled(false);
    }

    /// Put the captured flag back.
    pub(crate) fn restore(&mut self, controls: Option<&SharedControls>) {
        if let (Some(c), Some(enabled)) = (controls, self.saved.take()) {
            c.borrow_mut().set_enabled(enabled);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/context.rs"]
mod tests;
