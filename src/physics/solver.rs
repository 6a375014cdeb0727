//! Capability trait over an external rigid-body engine.
//!
//! The choreographer only talks to the engine through [`PhysicsSolver`]; handles are small opaque
//! indices minted by the adapter.

use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::FxResult;
use std::cell::RefCell;
use std::rc::Rc;

/// Rigid body handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Collider handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle(pub u32);

/// Joint handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub u32);

/// Body simulation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated under gravity and contacts.
    Dynamic,
    /// Immovable.
    Fixed,
}

/// Collider geometry in body-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    /// Sphere.
    Ball {
        /// Radius.
        radius: f64,
    },
    /// Capsule between two body-local points.
    Capsule {
        /// First endpoint.
        a: DVec3,
        /// Second endpoint.
        b: DVec3,
        /// Radius.
        radius: f64,
    },
    /// Box.
    Cuboid {
        /// Half extents per axis.
        half_extents: DVec3,
    },
}

impl ColliderShape {
    /// Volume used for density-based mass.
    pub fn volume(&self) -> f64 {
        use std::f64::consts::PI;
        match *self {
            Self::Ball { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            Self::Capsule { a, b, radius } => {
                PI * radius * radius * a.distance(b) + 4.0 / 3.0 * PI * radius.powi(3)
            }
            Self::Cuboid { half_extents } => {
                8.0 * half_extents.x * half_extents.y * half_extents.z
            }
        }
    }
}

/// Collider creation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderDesc {
    /// Geometry.
    pub shape: ColliderShape,
    /// Body-local translation of the shape.
    pub offset: DVec3,
    /// Friction coefficient.
    pub friction: f64,
    /// Restitution coefficient.
    pub restitution: f64,
    /// Mass density.
    pub density: f64,
    /// Report overlaps without generating contacts.
    pub sensor: bool,
}

impl ColliderDesc {
    /// Solid collider with unit density and no offset.
    pub fn new(shape: ColliderShape, friction: f64, restitution: f64) -> Self {
        Self {
            shape,
            offset: DVec3::ZERO,
            friction,
            restitution,
            density: 1.0,
            sensor: false,
        }
    }

    /// Same collider translated to `offset` in body space.
    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Operations the gravity choreography needs from a rigid-body engine.
///
/// Getters return `None` for unknown handles; setters on unknown handles are no-ops.
pub trait PhysicsSolver {
    /// Load or initialize the engine. Called once before the first world is created.
    fn ensure_loaded(&mut self) -> FxResult<()>;
    /// Replace any existing world with an empty one.
    fn create_world(&mut self, gravity: DVec3) -> FxResult<()>;
    /// Drop the world and every handle minted from it.
    fn free_world(&mut self);
    /// Whether a world currently exists.
    fn has_world(&self) -> bool;

    /// World gravity.
    fn gravity(&self) -> DVec3;
    /// Set world gravity.
    fn set_gravity(&mut self, gravity: DVec3);

    /// Create a body at `pose`.
    fn create_body(&mut self, kind: BodyKind, pose: Pose) -> FxResult<BodyHandle>;
    /// Attach a collider to `body`.
    fn create_collider(&mut self, body: BodyHandle, desc: &ColliderDesc)
    -> FxResult<ColliderHandle>;
    /// Lock the current relative transform of `a` and `b`.
    fn create_fixed_joint(&mut self, a: BodyHandle, b: BodyHandle) -> FxResult<JointHandle>;
    /// Remove a joint.
    fn remove_joint(&mut self, joint: JointHandle);

    /// Body translation.
    fn translation(&self, body: BodyHandle) -> Option<DVec3>;
    /// Body rotation.
    fn rotation(&self, body: BodyHandle) -> Option<DQuat>;
    /// Teleport a body.
    fn set_translation(&mut self, body: BodyHandle, translation: DVec3, wake: bool);
    /// Rotate a body in place.
    fn set_rotation(&mut self, body: BodyHandle, rotation: DQuat, wake: bool);
    /// Linear velocity.
    fn linvel(&self, body: BodyHandle) -> Option<DVec3>;
    /// Set linear velocity.
    fn set_linvel(&mut self, body: BodyHandle, linvel: DVec3, wake: bool);
    /// Angular velocity.
    fn angvel(&self, body: BodyHandle) -> Option<DVec3>;
    /// Set angular velocity.
    fn set_angvel(&mut self, body: BodyHandle, angvel: DVec3, wake: bool);
    /// Body mass (zero for fixed bodies).
    fn mass(&self, body: BodyHandle) -> f64;

    /// Whether the body is asleep.
    fn is_sleeping(&self, body: BodyHandle) -> bool;
    /// Put the body to sleep.
    fn sleep(&mut self, body: BodyHandle);
    /// Wake the body.
    fn wake_up(&mut self, body: BodyHandle);
    /// Allow or forbid automatic sleeping.
    fn set_can_sleep(&mut self, body: BodyHandle, can_sleep: bool);

    /// Collider friction.
    fn collider_friction(&self, collider: ColliderHandle) -> Option<f64>;
    /// Set collider friction.
    fn set_collider_friction(&mut self, collider: ColliderHandle, friction: f64);
    /// Whether the collider is a sensor.
    fn is_sensor(&self, collider: ColliderHandle) -> Option<bool>;
    /// Turn a collider into a sensor or back.
    fn set_sensor(&mut self, collider: ColliderHandle, sensor: bool);

    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f64);
}

impl std::fmt::Debug for dyn PhysicsSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsSolver")
            .field("has_world", &self.has_world())
            .finish()
    }
}

/// Solver handle shared between the host and the gravity effect.
pub type SharedSolver = Rc<RefCell<dyn PhysicsSolver>>;
