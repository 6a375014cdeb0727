//! Camera collaborators, keyframed constant-speed paths and preview tweens.

pub(crate) mod path;
pub(crate) mod rig;
pub(crate) mod tween;
