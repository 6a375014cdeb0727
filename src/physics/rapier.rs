//! [`PhysicsSolver`] over rapier3d.
//!
//! rapier works in `f32`; values are converted at the boundary.

use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::{FxError, FxResult};
use crate::physics::solver::{
    BodyHandle, BodyKind, ColliderDesc, ColliderHandle, ColliderShape, JointHandle, PhysicsSolver,
};
use rapier3d::dynamics::RigidBodyActivation;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, FixedJointBuilder,
    ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager, Isometry,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point, QueryPipeline, Real, RigidBody,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};

fn to_vec(v: DVec3) -> Vector<Real> {
    Vector::new(v.x as Real, v.y as Real, v.z as Real)
}

fn from_vec(v: &Vector<Real>) -> DVec3 {
    DVec3::new(f64::from(v.x), f64::from(v.y), f64::from(v.z))
}

fn to_rot(q: DQuat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        q.w as Real,
        q.x as Real,
        q.y as Real,
        q.z as Real,
    ))
}

fn from_rot(q: &UnitQuaternion<Real>) -> DQuat {
    DQuat::from_xyzw(f64::from(q.i), f64::from(q.j), f64::from(q.k), f64::from(q.w))
}

struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    body_handles: Vec<RigidBodyHandle>,
    collider_handles: Vec<rapier3d::prelude::ColliderHandle>,
    joint_handles: Vec<Option<ImpulseJointHandle>>,
}

impl RapierWorld {
    fn new(gravity: DVec3) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vec(gravity),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            body_handles: Vec::new(),
            collider_handles: Vec::new(),
            joint_handles: Vec::new(),
        }
    }

    fn body(&self, h: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(*self.body_handles.get(h.0 as usize)?)
    }

    fn body_mut(&mut self, h: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(*self.body_handles.get(h.0 as usize)?)
    }

    fn collider(&self, h: ColliderHandle) -> Option<&rapier3d::prelude::Collider> {
        self.colliders.get(*self.collider_handles.get(h.0 as usize)?)
    }

    fn collider_mut(&mut self, h: ColliderHandle) -> Option<&mut rapier3d::prelude::Collider> {
        self.colliders
            .get_mut(*self.collider_handles.get(h.0 as usize)?)
    }

    fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let hooks = ();
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );
    }
}

/// rapier3d-backed solver.
#[derive(Default)]
pub struct RapierSolver {
    world: Option<RapierWorld>,
}

impl std::fmt::Debug for RapierSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapierSolver")
            .field("has_world", &self.world.is_some())
            .finish()
    }
}

impl RapierSolver {
    /// Create a solver without a world.
    pub fn new() -> Self {
        Self::default()
    }

    fn world_mut(&mut self) -> FxResult<&mut RapierWorld> {
        self.world
            .as_mut()
            .ok_or_else(|| FxError::physics("no physics world"))
    }
}

impl PhysicsSolver for RapierSolver {
    fn ensure_loaded(&mut self) -> FxResult<()> {
        Ok(())
    }

    fn create_world(&mut self, gravity: DVec3) -> FxResult<()> {
        self.world = Some(RapierWorld::new(gravity));
        Ok(())
    }

    fn free_world(&mut self) {
        self.world = None;
    }

    fn has_world(&self) -> bool {
        self.world.is_some()
    }

    fn gravity(&self) -> DVec3 {
        self.world
            .as_ref()
            .map_or(DVec3::ZERO, |w| from_vec(&w.gravity))
    }

    fn set_gravity(&mut self, gravity: DVec3) {
        if let Some(w) = self.world.as_mut() {
            w.gravity = to_vec(gravity);
        }
    }

    fn create_body(&mut self, kind: BodyKind, pose: Pose) -> FxResult<BodyHandle> {
        let w = self.world_mut()?;
        let builder = match kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let body = builder
            .translation(to_vec(pose.position))
            .rotation(to_rot(pose.rotation).scaled_axis())
            .build();
        let handle = w.bodies.insert(body);
        w.body_handles.push(handle);
        Ok(BodyHandle((w.body_handles.len() - 1) as u32))
    }

    fn create_collider(
        &mut self,
        body: BodyHandle,
        desc: &ColliderDesc,
    ) -> FxResult<ColliderHandle> {
        let w = self.world_mut()?;
        let parent = *w
            .body_handles
            .get(body.0 as usize)
            .ok_or_else(|| FxError::physics(format!("unknown body {}", body.0)))?;
        let builder = match desc.shape {
            ColliderShape::Ball { radius } => ColliderBuilder::ball(radius as Real),
            ColliderShape::Capsule { a, b, radius } => ColliderBuilder::capsule_from_endpoints(
                Point::from(to_vec(a)),
                Point::from(to_vec(b)),
                radius as Real,
            ),
            ColliderShape::Cuboid { half_extents: h } => {
                ColliderBuilder::cuboid(h.x as Real, h.y as Real, h.z as Real)
            }
        };
        let collider = builder
            .translation(to_vec(desc.offset))
            .friction(desc.friction as Real)
            .restitution(desc.restitution as Real)
            .density(desc.density as Real)
            .sensor(desc.sensor)
            .build();
        let handle = w
            .colliders
            .insert_with_parent(collider, parent, &mut w.bodies);
        w.collider_handles.push(handle);
        Ok(ColliderHandle((w.collider_handles.len() - 1) as u32))
    }

    fn create_fixed_joint(&mut self, a: BodyHandle, b: BodyHandle) -> FxResult<JointHandle> {
        let w = self.world_mut()?;
        let (Some(&ha), Some(&hb)) = (
            w.body_handles.get(a.0 as usize),
            w.body_handles.get(b.0 as usize),
        ) else {
            return Err(FxError::physics("joint references an unknown body"));
        };
        let (Some(ba), Some(bb)) = (w.bodies.get(ha), w.bodies.get(hb)) else {
            return Err(FxError::physics("joint references a removed body"));
        };
        let frame: Isometry<Real> = ba.position().inverse() * bb.position();
        let joint = FixedJointBuilder::new()
            .local_frame1(frame)
            .local_frame2(Isometry::identity())
            .build();
        let handle = w.impulse_joints.insert(ha, hb, joint, true);
        w.joint_handles.push(Some(handle));
        Ok(JointHandle((w.joint_handles.len() - 1) as u32))
    }

    fn remove_joint(&mut self, joint: JointHandle) {
        let Some(w) = self.world.as_mut() else {
            return;
        };
        if let Some(handle) = w
            .joint_handles
            .get_mut(joint.0 as usize)
            .and_then(Option::take)
        {
            w.impulse_joints.remove(handle, true);
        }
    }

    fn translation(&self, body: BodyHandle) -> Option<DVec3> {
        Some(from_vec(self.world.as_ref()?.body(body)?.translation()))
    }

    fn rotation(&self, body: BodyHandle) -> Option<DQuat> {
        Some(from_rot(self.world.as_ref()?.body(body)?.rotation()))
    }

    fn set_translation(&mut self, body: BodyHandle, translation: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.set_translation(to_vec(translation), wake);
        }
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: DQuat, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.set_rotation(to_rot(rotation), wake);
        }
    }

    fn linvel(&self, body: BodyHandle) -> Option<DVec3> {
        Some(from_vec(self.world.as_ref()?.body(body)?.linvel()))
    }

    fn set_linvel(&mut self, body: BodyHandle, linvel: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.set_linvel(to_vec(linvel), wake);
        }
    }

    fn angvel(&self, body: BodyHandle) -> Option<DVec3> {
        Some(from_vec(self.world.as_ref()?.body(body)?.angvel()))
    }

    fn set_angvel(&mut self, body: BodyHandle, angvel: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.set_angvel(to_vec(angvel), wake);
        }
    }

    fn mass(&self, body: BodyHandle) -> f64 {
        self.world
            .as_ref()
            .and_then(|w| w.body(body))
            .filter(|b| b.is_dynamic())
            .map_or(0.0, |b| f64::from(b.mass()))
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.world
            .as_ref()
            .and_then(|w| w.body(body))
            .is_some_and(RigidBody::is_sleeping)
    }

    fn sleep(&mut self, body: BodyHandle) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.sleep();
        }
    }

    fn wake_up(&mut self, body: BodyHandle) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.wake_up(true);
        }
    }

    fn set_can_sleep(&mut self, body: BodyHandle, can_sleep: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            *b.activation_mut() = if can_sleep {
                RigidBodyActivation::active()
            } else {
                RigidBodyActivation::cannot_sleep()
            };
        }
    }

    fn collider_friction(&self, collider: ColliderHandle) -> Option<f64> {
        Some(f64::from(self.world.as_ref()?.collider(collider)?.friction()))
    }

    fn set_collider_friction(&mut self, collider: ColliderHandle, friction: f64) {
        if let Some(c) = self.world.as_mut().and_then(|w| w.collider_mut(collider)) {
            c.set_friction(friction as Real);
        }
    }

    fn is_sensor(&self, collider: ColliderHandle) -> Option<bool> {
        Some(self.world.as_ref()?.collider(collider)?.is_sensor())
    }

    fn set_sensor(&mut self, collider: ColliderHandle, sensor: bool) {
        if let Some(c) = self.world.as_mut().and_then(|w| w.collider_mut(collider)) {
            c.set_sensor(sensor);
        }
    }

    fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if let Some(w) = self.world.as_mut() {
            w.step(dt as Real);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/rapier.rs"]
mod tests;
