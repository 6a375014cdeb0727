//! Camera and controls collaborators.

use crate::foundation::core::DVec3;
use std::cell::RefCell;
use std::rc::Rc;

/// Perspective camera surface the host exposes to effects.
pub trait CameraRig {
    /// World position.
    fn position(&self) -> DVec3;
    /// Move the camera.
    fn set_position(&mut self, position: DVec3);
    /// Vertical field of view in degrees.
    fn fov(&self) -> f64;
    /// Set the vertical field of view in degrees.
    fn set_fov(&mut self, fov_deg: f64);
    /// Orient the camera towards `target`.
    fn look_at(&mut self, target: DVec3);
    /// Recompute the projection after fov changes.
    fn update_projection(&mut self);
}

/// Orbit-style interactive controls attached to the camera.
pub trait CameraControls {
    /// Orbit pivot.
    fn target(&self) -> DVec3;
    /// Move the orbit pivot.
    fn set_target(&mut self, target: DVec3);
    /// Whether user input currently drives the camera.
    fn enabled(&self) -> bool;
    /// Enable or disable user input.
    fn set_enabled(&mut self, enabled: bool);
}

impl std::fmt::Debug for dyn CameraRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRig")
            .field("position", &self.position())
            .field("fov", &self.fov())
            .finish()
    }
}

impl std::fmt::Debug for dyn CameraControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraControls")
            .field("target", &self.target())
            .field("enabled", &self.enabled())
            .finish()
    }
}

/// Camera handle shared between the host and the active effect.
pub type SharedCamera = Rc<RefCell<dyn CameraRig>>;
/// Controls handle shared between the host and the active effect.
pub type SharedControls = Rc<RefCell<dyn CameraControls>>;

/// Camera pose as seen by effects: position, look-at point and field of view.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CameraPose {
    /// World position.
    pub position: DVec3,
    /// Look-at point.
    pub target: DVec3,
    /// Vertical field of view in degrees.
    pub fov: f64,
}

impl CameraPose {
    /// Apply this pose to a camera and its controls.
    pub fn apply(&self, camera: &mut dyn CameraRig, controls: Option<&mut dyn CameraControls>) {
        camera.set_position(self.position);
        if (camera.fov() - self.fov).abs() > f64::EPSILON {
            camera.set_fov(self.fov);
            camera.update_projection();
        }
        camera.look_at(self.target);
        if let Some(c) = controls {
            c.set_target(self.target);
        }
    }

    /// [`CameraPose::apply`] through shared handles.
    pub fn apply_shared(&self, camera: &SharedCamera, controls: Option<&SharedControls>) {
        let mut cam = camera.borrow_mut();
        match controls {
            Some(c) => self.apply(&mut *cam, Some(&mut *c.borrow_mut())),
            None => self.apply(&mut *cam, None),
        }
    }

    /// Read the current pose; the look-at point comes from the controls when present.
    pub fn capture(
        camera: &SharedCamera,
        controls: Option<&SharedControls>,
        fallback_target: DVec3,
    ) -> Self {
        let cam = camera.borrow();
        Self {
            position: cam.position(),
            target: controls.map_or(fallback_target, |c| c.borrow().target()),
            fov: cam.fov(),
        }
    }
}

/// In-memory camera for headless previews and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryCamera {
    /// World position.
    pub position: DVec3,
    /// Last look-at point.
    pub target: DVec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    /// Number of projection updates requested.
    pub projection_updates: u32,
}

impl InMemoryCamera {
    /// Camera at `position` looking at `target`.
    pub fn new(position: DVec3, target: DVec3, fov_deg: f64) -> Self {
        Self {
            position,
            target,
            fov_deg,
            projection_updates: 0,
        }
    }
}

impl Default for InMemoryCamera {
    fn default() -> Self {
        Self::new(DVec3::new(0.0, 2.0, 8.0), DVec3::ZERO, 50.0)
    }
}

impl CameraRig for InMemoryCamera {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    fn fov(&self) -> f64 {
        self.fov_deg
    }

    fn set_fov(&mut self, fov_deg: f64) {
        self.fov_deg = fov_deg;
    }

    fn look_at(&mut self, target: DVec3) {
        self.target = target;
    }

    fn update_projection(&mut self) {
        self.projection_updates += 1;
    }
}

/// In-memory orbit controls for headless previews and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryControls {
    /// Orbit pivot.
    pub target: DVec3,
    /// Input enabled flag.
    pub enabled: bool,
}

impl Default for InMemoryControls {
    fn default() -> Self {
        Self {
            target: DVec3::ZERO,
            enabled: true,
        }
    }
}

impl CameraControls for InMemoryControls {
    fn target(&self) -> DVec3 {
        self.target
    }

    fn set_target(&mut self, target: DVec3) {
        self.target = target;
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/rig.rs"]
mod tests;
