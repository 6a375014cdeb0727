//! Deterministic reference solver used for headless previews and tests.
//!
//! Bodies are integrated with semi-implicit Euler at a fixed internal substep. Contacts cover
//! dynamic balls against fixed cuboids and ball against ball; capsule colliders only contribute
//! mass. Fixed joints keep the world-space offset between two bodies captured at creation.
//! Iteration order is always handle order, so identical inputs give bit-identical runs.

use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::{FxError, FxResult};
use crate::physics::solver::{
    BodyHandle, BodyKind, ColliderDesc, ColliderHandle, ColliderShape, JointHandle, PhysicsSolver,
};
use std::collections::HashSet;

const SUBSTEP: f64 = 1.0 / 120.0;
const JOINT_ITERATIONS: usize = 4;
const CONTACT_ITERATIONS: usize = 2;
const CONTACT_SLOP: f64 = 1e-3;
const SLEEP_LINEAR: f64 = 0.05;
const SLEEP_ANGULAR: f64 = 0.05;
const SLEEP_DELAY: f64 = 0.5;

#[derive(Clone, Debug)]
struct Body {
    kind: BodyKind,
    position: DVec3,
    rotation: DQuat,
    linvel: DVec3,
    angvel: DVec3,
    mass: f64,
    sleeping: bool,
    can_sleep: bool,
    still_time: f64,
}

impl Body {
    fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    fn is_active(&self) -> bool {
        self.is_dynamic() && !self.sleeping
    }

    fn effective_mass(&self) -> f64 {
        if self.mass > 0.0 { self.mass } else { 1.0 }
    }

    fn inv_mass(&self) -> f64 {
        if self.is_dynamic() {
            1.0 / self.effective_mass()
        } else {
            0.0
        }
    }

    fn wake(&mut self) {
        if self.is_dynamic() {
            self.sleeping = false;
            self.still_time = 0.0;
        }
    }
}

#[derive(Clone, Debug)]
struct Collider {
    body: usize,
    desc: ColliderDesc,
}

#[derive(Clone, Copy, Debug)]
struct Joint {
    a: usize,
    b: usize,
    rest: DVec3,
}

#[derive(Clone, Debug, Default)]
struct World {
    gravity: DVec3,
    bodies: Vec<Body>,
    colliders: Vec<Collider>,
    joints: Vec<Option<Joint>>,
}

#[derive(Clone, Copy)]
struct Ball {
    body: usize,
    offset: DVec3,
    radius: f64,
    friction: f64,
    restitution: f64,
}

#[derive(Clone, Copy)]
struct StaticBox {
    min: DVec3,
    max: DVec3,
    friction: f64,
    restitution: f64,
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

fn box_push_out(center: DVec3, radius: f64, b: &StaticBox) -> Option<(DVec3, f64)> {
    if !center.is_finite() {
        return None;
    }
    let closest = center.clamp(b.min, b.max);
    let d = center - closest;
    let dist = d.length();
    if dist > 1e-12 {
        return (dist < radius).then(|| (d / dist, radius - dist));
    }
    // Centre inside the box: leave through the nearest face.
    let faces = [
        (b.max.x - center.x, DVec3::X),
        (center.x - b.min.x, DVec3::NEG_X),
        (b.max.y - center.y, DVec3::Y),
        (center.y - b.min.y, DVec3::NEG_Y),
        (b.max.z - center.z, DVec3::Z),
        (center.z - b.min.z, DVec3::NEG_Z),
    ];
    let (depth, normal) = faces
        .into_iter()
        .min_by(|x, y| x.0.total_cmp(&y.0))
        .unwrap_or((0.0, DVec3::Y));
    Some((normal, radius + depth))
}

impl World {
    fn body(&self, h: BodyHandle) -> Option<&Body> {
        self.bodies.get(h.0 as usize)
    }

    fn body_mut(&mut self, h: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(h.0 as usize)
    }

    fn substep(&mut self, h: f64) {
        let g = self.gravity;
        for b in self.bodies.iter_mut().filter(|b| b.is_active()) {
            b.linvel += g * h;
            b.position += b.linvel * h;
            if b.angvel != DVec3::ZERO {
                b.rotation = (DQuat::from_scaled_axis(b.angvel * h) * b.rotation).normalize();
            }
        }

        for _ in 0..JOINT_ITERATIONS {
            for j in self.joints.iter().flatten().copied().collect::<Vec<_>>() {
                self.solve_joint(j);
            }
        }

        let balls = self.balls();
        let boxes = self.static_boxes();
        let jointed: HashSet<(usize, usize)> = self
            .joints
            .iter()
            .flatten()
            .map(|j| (j.a.min(j.b), j.a.max(j.b)))
            .collect();
        for _ in 0..CONTACT_ITERATIONS {
            for ball in &balls {
                for bx in &boxes {
                    self.solve_static_contact(ball, bx);
                }
            }
            for i in 0..balls.len() {
                for k in i + 1..balls.len() {
                    let (x, y) = (balls[i], balls[k]);
                    let key = (x.body.min(y.body), x.body.max(y.body));
                    if x.body == y.body || jointed.contains(&key) {
                        continue;
                    }
                    self.solve_ball_contact(&x, &y);
                }
            }
        }

        for b in self.bodies.iter_mut().filter(|b| b.is_active() && b.can_sleep) {
            if b.linvel.length() < SLEEP_LINEAR && b.angvel.length() < SLEEP_ANGULAR {
                b.still_time += h;
                if b.still_time >= SLEEP_DELAY {
                    b.sleeping = true;
                    b.linvel = DVec3::ZERO;
                    b.angvel = DVec3::ZERO;
                }
            } else {
                b.still_time = 0.0;
            }
        }
    }

    fn solve_joint(&mut self, j: Joint) {
        let (a, b) = pair_mut(&mut self.bodies, j.a, j.b);
        if !a.is_active() && !b.is_active() {
            return;
        }
        if a.is_active() {
            b.wake();
        } else {
            a.wake();
        }
        let (ia, ib) = (a.inv_mass(), b.inv_mass());
        let sum = ia + ib;
        if sum <= 0.0 {
            return;
        }
        let err = (b.position - a.position) - j.rest;
        a.position += err * (ia / sum);
        b.position -= err * (ib / sum);

        let (lin, ang) = if ia == 0.0 {
            (a.linvel, a.angvel)
        } else if ib == 0.0 {
            (b.linvel, b.angvel)
        } else {
            let (ma, mb) = (a.effective_mass(), b.effective_mass());
            (
                (a.linvel * ma + b.linvel * mb) / (ma + mb),
                (a.angvel * ma + b.angvel * mb) / (ma + mb),
            )
        };
        for body in [a, b] {
            if body.is_dynamic() {
                body.linvel = lin;
                body.angvel = ang;
            }
        }
    }

    fn solve_static_contact(&mut self, ball: &Ball, bx: &StaticBox) {
        let body = &mut self.bodies[ball.body];
        if !body.is_active() {
            return;
        }
        let center = body.position + body.rotation * ball.offset;
        let Some((n, depth)) = box_push_out(center, ball.radius, bx) else {
            return;
        };
        body.position += n * depth;
        let vn = body.linvel.dot(n);
        if vn < 0.0 {
            let e = 0.5 * (ball.restitution + bx.restitution);
            let mu = 0.5 * (ball.friction + bx.friction);
            let dvn = -(1.0 + e) * vn;
            let vt = body.linvel - n * vn;
            let vt_len = vt.length();
            body.linvel += n * dvn;
            if vt_len > 0.0 {
                let reduce = (mu * dvn).min(vt_len);
                body.linvel -= vt * (reduce / vt_len);
            }
        }
    }

    fn solve_ball_contact(&mut self, x: &Ball, y: &Ball) {
        let (a, b) = pair_mut(&mut self.bodies, x.body, y.body);
        if !a.is_active() && !b.is_active() {
            return;
        }
        let pa = a.position + a.rotation * x.offset;
        let pb = b.position + b.rotation * y.offset;
        let d = pb - pa;
        let dist = d.length();
        let target = x.radius + y.radius;
        // Also rejects NaN distances.
        if !(dist < target - CONTACT_SLOP) {
            return;
        }
        a.wake();
        b.wake();
        let (ia, ib) = (a.inv_mass(), b.inv_mass());
        let sum = ia + ib;
        if sum <= 0.0 {
            return;
        }
        let n = if dist > 1e-12 { d / dist } else { DVec3::Y };
        let depth = target - dist;
        a.position -= n * (depth * ia / sum);
        b.position += n * (depth * ib / sum);

        let rel = b.linvel - a.linvel;
        let vn = rel.dot(n);
        if vn >= 0.0 {
            return;
        }
        let e = 0.5 * (x.restitution + y.restitution);
        let mu = 0.5 * (x.friction + y.friction);
        let jn = -(1.0 + e) * vn / sum;
        a.linvel -= n * (jn * ia);
        b.linvel += n * (jn * ib);
        let vt = rel - n * vn;
        let vt_len = vt.length();
        if vt_len > 0.0 {
            let jt = (vt_len / sum).min(mu * jn);
            let t = vt / vt_len;
            a.linvel += t * (jt * ia);
            b.linvel -= t * (jt * ib);
        }
    }

    fn balls(&self) -> Vec<Ball> {
        self.colliders
            .iter()
            .filter(|c| !c.desc.sensor && self.bodies[c.body].is_dynamic())
            .filter_map(|c| match c.desc.shape {
                ColliderShape::Ball { radius } => Some(Ball {
                    body: c.body,
                    offset: c.desc.offset,
                    radius,
                    friction: c.desc.friction,
                    restitution: c.desc.restitution,
                }),
                _ => None,
            })
            .collect()
    }

    fn static_boxes(&self) -> Vec<StaticBox> {
        self.colliders
            .iter()
            .filter(|c| !c.desc.sensor && !self.bodies[c.body].is_dynamic())
            .filter_map(|c| match c.desc.shape {
                ColliderShape::Cuboid { half_extents } => {
                    let body = &self.bodies[c.body];
                    let center = body.position + body.rotation * c.desc.offset;
                    Some(StaticBox {
                        min: center - half_extents,
                        max: center + half_extents,
                        friction: c.desc.friction,
                        restitution: c.desc.restitution,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// In-crate [`PhysicsSolver`] adapter.
#[derive(Clone, Debug, Default)]
pub struct PointSolver {
    world: Option<World>,
    loaded: bool,
    load_error: Option<String>,
    steps: u64,
}

impl PointSolver {
    /// Solver that loads successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver whose [`PhysicsSolver::ensure_loaded`] always fails with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            load_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Bodies in the current world.
    pub fn body_count(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.bodies.len())
    }

    /// Live joints in the current world.
    pub fn joint_count(&self) -> usize {
        self.world
            .as_ref()
            .map_or(0, |w| w.joints.iter().flatten().count())
    }

    /// Total `step` calls since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn world_mut(&mut self) -> FxResult<&mut World> {
        self.world
            .as_mut()
            .ok_or_else(|| FxError::physics("no physics world"))
    }
}

impl PhysicsSolver for PointSolver {
    fn ensure_loaded(&mut self) -> FxResult<()> {
        if let Some(reason) = &self.load_error {
            return Err(FxError::engine_unavailable(reason.clone()));
        }
        self.loaded = true;
        Ok(())
    }

    fn create_world(&mut self, gravity: DVec3) -> FxResult<()> {
        if !self.loaded {
            return Err(FxError::engine_unavailable("solver not loaded"));
        }
        self.world = Some(World {
            gravity,
            ..World::default()
        });
        Ok(())
    }

    fn free_world(&mut self) {
        self.world = None;
    }

    fn has_world(&self) -> bool {
        self.world.is_some()
    }

    fn gravity(&self) -> DVec3 {
        self.world.as_ref().map_or(DVec3::ZERO, |w| w.gravity)
    }

    fn set_gravity(&mut self, gravity: DVec3) {
        if let Some(w) = self.world.as_mut() {
            w.gravity = gravity;
        }
    }

    fn create_body(&mut self, kind: BodyKind, pose: Pose) -> FxResult<BodyHandle> {
        if !pose.is_finite() {
            return Err(FxError::physics("body pose must be finite"));
        }
        let w = self.world_mut()?;
        w.bodies.push(Body {
            kind,
            position: pose.position,
            rotation: pose.rotation,
            linvel: DVec3::ZERO,
            angvel: DVec3::ZERO,
            mass: 0.0,
            sleeping: false,
            can_sleep: true,
            still_time: 0.0,
        });
        Ok(BodyHandle((w.bodies.len() - 1) as u32))
    }

    fn create_collider(
        &mut self,
        body: BodyHandle,
        desc: &ColliderDesc,
    ) -> FxResult<ColliderHandle> {
        let w = self.world_mut()?;
        let b = w
            .body_mut(body)
            .ok_or_else(|| FxError::physics(format!("unknown body {}", body.0)))?;
        if b.is_dynamic() {
            b.mass += desc.density.max(0.0) * desc.shape.volume();
        }
        w.colliders.push(Collider {
            body: body.0 as usize,
            desc: *desc,
        });
        Ok(ColliderHandle((w.colliders.len() - 1) as u32))
    }

    fn create_fixed_joint(&mut self, a: BodyHandle, b: BodyHandle) -> FxResult<JointHandle> {
        let w = self.world_mut()?;
        if a == b {
            return Err(FxError::physics("cannot joint a body to itself"));
        }
        let (Some(pa), Some(pb)) = (w.body(a), w.body(b)) else {
            return Err(FxError::physics("joint references an unknown body"));
        };
        let rest = pb.position - pa.position;
        w.joints.push(Some(Joint {
            a: a.0 as usize,
            b: b.0 as usize,
            rest,
        }));
        Ok(JointHandle((w.joints.len() - 1) as u32))
    }

    fn remove_joint(&mut self, joint: JointHandle) {
        if let Some(slot) = self
            .world
            .as_mut()
            .and_then(|w| w.joints.get_mut(joint.0 as usize))
        {
            *slot = None;
        }
    }

    fn translation(&self, body: BodyHandle) -> Option<DVec3> {
        self.world.as_ref()?.body(body).map(|b| b.position)
    }

    fn rotation(&self, body: BodyHandle) -> Option<DQuat> {
        self.world.as_ref()?.body(body).map(|b| b.rotation)
    }

    fn set_translation(&mut self, body: BodyHandle, translation: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.position = translation;
            if wake {
                b.wake();
            }
        }
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: DQuat, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.rotation = rotation.normalize();
            if wake {
                b.wake();
            }
        }
    }

    fn linvel(&self, body: BodyHandle) -> Option<DVec3> {
        self.world.as_ref()?.body(body).map(|b| b.linvel)
    }

    fn set_linvel(&mut self, body: BodyHandle, linvel: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body))
            && b.is_dynamic()
        {
            b.linvel = linvel;
            if wake {
                b.wake();
            }
        }
    }

    fn angvel(&self, body: BodyHandle) -> Option<DVec3> {
        self.world.as_ref()?.body(body).map(|b| b.angvel)
    }

    fn set_angvel(&mut self, body: BodyHandle, angvel: DVec3, wake: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body))
            && b.is_dynamic()
        {
            b.angvel = angvel;
            if wake {
                b.wake();
            }
        }
    }

    fn mass(&self, body: BodyHandle) -> f64 {
        self.world
            .as_ref()
            .and_then(|w| w.body(body))
            .filter(|b| b.is_dynamic())
            .map_or(0.0, Body::effective_mass)
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.world
            .as_ref()
            .and_then(|w| w.body(body))
            .is_some_and(|b| b.sleeping)
    }

    fn sleep(&mut self, body: BodyHandle) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body))
            && b.is_dynamic()
        {
            b.sleeping = true;
            b.linvel = DVec3::ZERO;
            b.angvel = DVec3::ZERO;
        }
    }

    fn wake_up(&mut self, body: BodyHandle) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.wake();
        }
    }

    fn set_can_sleep(&mut self, body: BodyHandle, can_sleep: bool) {
        if let Some(b) = self.world.as_mut().and_then(|w| w.body_mut(body)) {
            b.can_sleep = can_sleep;
            b.still_time = 0.0;
        }
    }

    fn collider_friction(&self, collider: ColliderHandle) -> Option<f64> {
        let w = self.world.as_ref()?;
        w.colliders.get(collider.0 as usize).map(|c| c.desc.friction)
    }

    fn set_collider_friction(&mut self, collider: ColliderHandle, friction: f64) {
        if let Some(c) = self
            .world
            .as_mut()
            .and_then(|w| w.colliders.get_mut(collider.0 as usize))
        {
            c.desc.friction = friction;
        }
    }

    fn is_sensor(&self, collider: ColliderHandle) -> Option<bool> {
        let w = self.world.as_ref()?;
        w.colliders.get(collider.0 as usize).map(|c| c.desc.sensor)
    }

    fn set_sensor(&mut self, collider: ColliderHandle, sensor: bool) {
        if let Some(c) = self
            .world
            .as_mut()
            .and_then(|w| w.colliders.get_mut(collider.0 as usize))
        {
            c.desc.sensor = sensor;
        }
    }

    fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let Some(w) = self.world.as_mut() else {
            return;
        };
        let n = (dt / SUBSTEP).ceil().max(1.0) as usize;
        let h = dt / n as f64;
        for _ in 0..n {
            w.substep(h);
        }
        self.steps += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/point.rs"]
mod tests;
