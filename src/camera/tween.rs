use crate::animation::ease::Ease;
use crate::camera::rig::CameraPose;
use crate::foundation::math::lerp;

/// Short eased transition between two camera poses, used to jump the preview camera to a
/// keyframe. The clock anchors on the first [`CameraTween::sample`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraTween {
    from: CameraPose,
    to: CameraPose,
    duration: f64,
    start: Option<f64>,
}

impl CameraTween {
    /// Tween from `from` to `to` over `duration_sec`.
    pub fn new(from: CameraPose, to: CameraPose, duration_sec: f64) -> Self {
        Self {
            from,
            to,
            duration: duration_sec.max(0.0),
            start: None,
        }
    }

    /// Destination pose.
    pub fn destination(&self) -> CameraPose {
        self.to
    }

    /// Pose at host time `time_secs` and whether the tween has finished.
    pub fn sample(&mut self, time_secs: f64) -> (CameraPose, bool) {
        let start = *self.start.get_or_insert(time_secs);
        let elapsed = time_secs - start;
        if self.duration <= 0.0 || elapsed >= self.duration {
            return (self.to, true);
        }
        let t = Ease::EaseInOut.apply(elapsed / self.duration);
        let pose = CameraPose {
            position: self.from.position.lerp(self.to.position, t),
            target: self.from.target.lerp(self.to.target, t),
            fov: lerp(self.from.fov, self.to.fov, t),
        };
        (pose, false)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/tween.rs"]
mod tests;
