//! Fall, recall, re-bond loop over a [`PhysicsSolver`].
//!
//! One cycle runs `fall → recall → settleHold → bloom → postBloomDampen → loopHold`. Phase timers
//! accumulate tick deltas and reset at every transition. The solver is stepped once per tick after
//! the phase logic, then every body's pose is copied onto its scene node.

use crate::config::model::{GravityConfig, ReleaseMode};
use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{Lcg, normalize_delta_secs};
use crate::physics::bloom::{BloomQueue, NEIGHBORS_PER_BODY, nearest_pairs};
use crate::physics::breakage::{estimate_load, force_threshold};
use crate::physics::release::StaggeredRelease;
use crate::physics::solver::{
    BodyHandle, BodyKind, ColliderDesc, ColliderHandle, ColliderShape, JointHandle, PhysicsSolver,
    SharedSolver,
};
use crate::scene::graph::{NodeId, SharedScene};
use crate::scene::piece::Assembly;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Body collider friction while recalling.
pub const RECALL_FRICTION: f64 = 0.01;
/// Upward nudge applied at recall entry to break resting contacts.
pub const RECALL_NUDGE: f64 = 1e-3;
/// Spheres of an unbonded piece closer than this multiple of their radii sum are jointed at setup.
pub const TOUCH_FACTOR: f64 = 1.05;
/// Velocity scale applied after every bloom batch.
pub const BLOOM_DAMPING: f64 = 0.6;
/// Velocity scale applied every step of the post-bloom phase.
pub const POST_BLOOM_DAMPING: f64 = 0.2;

const PHASE_EPSILON: f64 = 1e-9;
const GROUND_HALF_THICKNESS: f64 = 0.5;
const WALL_HALF_THICKNESS: f64 = 0.25;

/// Choreography phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Gravity pulls the structure apart.
    Fall,
    /// Bodies are steered back to their assembled positions.
    Recall,
    /// Hold before re-bonding.
    SettleHold,
    /// Joints are recreated in batches.
    Bloom,
    /// Residual motion is damped out.
    PostBloomDampen,
    /// Assembled pose is held with normal physics restored.
    LoopHold,
}

impl Phase {
    /// Stable camelCase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Recall => "recall",
            Self::SettleHold => "settleHold",
            Self::Bloom => "bloom",
            Self::PostBloomDampen => "postBloomDampen",
            Self::LoopHold => "loopHold",
        }
    }
}

/// Counters collected over a choreography run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreoStats {
    /// Completed cycles.
    pub cycles: u32,
    /// Joints created at setup.
    pub setup_joints: usize,
    /// Unique pairs queued for bloom, summed over cycles.
    pub bloom_pairs: usize,
    /// Joints created by bloom, summed over cycles.
    pub bloom_joints: usize,
    /// Joints removed by auto-break.
    pub joints_broken: usize,
    /// Bodies snapped onto their goal at recall end, summed over cycles.
    pub snapped: usize,
    /// Body reads skipped because the solver returned non-finite values.
    pub skipped_non_finite: usize,
}

/// What a tick did to the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoreoEvent {
    /// Nothing notable.
    Running,
    /// A looping cycle ended and the next fall began.
    CycleCompleted,
    /// A non-looping run ended.
    Finished,
}

#[derive(Clone, Copy, Debug)]
struct BodyLink {
    handle: BodyHandle,
    node: NodeId,
    goal: DVec3,
    goal_rotation: DQuat,
}

#[derive(Clone, Copy, Debug)]
struct JointLink {
    handle: JointHandle,
    a: usize,
    b: usize,
    lever: f64,
    threshold: f64,
    prev_rel_linvel: DVec3,
    prev_rel_angvel: DVec3,
}

#[derive(Clone, Copy, Debug)]
struct BondVisual {
    node: NodeId,
    a: (usize, DVec3),
    b: (usize, DVec3),
    rotation: DQuat,
}

#[derive(Clone, Debug)]
struct SavedWorld {
    gravity: DVec3,
    frictions: Vec<(ColliderHandle, f64)>,
    sensors: Vec<(ColliderHandle, bool)>,
}

/// Drives the gravity effect's physics world.
pub struct PhysicsChoreographer {
    config: GravityConfig,
    solver: SharedSolver,
    scene: SharedScene,
    bodies: Vec<BodyLink>,
    body_colliders: Vec<ColliderHandle>,
    boundary_colliders: Vec<ColliderHandle>,
    joints: Vec<JointLink>,
    bonds: Vec<BondVisual>,
    phase: Phase,
    phase_time: f64,
    cycle: u32,
    bloom: Option<BloomQueue>,
    bloom_timer: f64,
    release: Option<StaggeredRelease>,
    saved: Option<SavedWorld>,
    finished: bool,
    stats: ChoreoStats,
}

impl std::fmt::Debug for PhysicsChoreographer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsChoreographer")
            .field("phase", &self.phase)
            .field("phase_time", &self.phase_time)
            .field("cycle", &self.cycle)
            .field("bodies", &self.bodies.len())
            .field("joints", &self.joints.len())
            .field("stats", &self.stats)
            .finish()
    }
}

fn jitter(rng: &mut Lcg, amount: f64) -> DVec3 {
    DVec3::new(rng.next_signed(), rng.next_signed(), rng.next_signed()) * amount
}

fn cuboid(
    solver: &mut dyn PhysicsSolver,
    center: DVec3,
    half: DVec3,
    config: &GravityConfig,
) -> FxResult<ColliderHandle> {
    let body = solver.create_body(BodyKind::Fixed, Pose::from_position(center))?;
    solver.create_collider(
        body,
        &ColliderDesc::new(
            ColliderShape::Cuboid { half_extents: half },
            config.friction,
            config.restitution,
        ),
    )
}

impl PhysicsChoreographer {
    /// Create the world, boundary, bodies and setup joints for `assembly`, and enter the first
    /// fall.
    #[tracing::instrument(skip_all, fields(pieces = assembly.pieces.len(), compound = config.compound))]
    pub fn setup(
        assembly: &Assembly,
        scene: SharedScene,
        solver: SharedSolver,
        config: &GravityConfig,
    ) -> FxResult<Self> {
        let bounds = assembly
            .bounds()
            .ok_or_else(|| FxError::validation("gravity needs at least one piece"))?;
        let solver_rc = Rc::clone(&solver);
        let mut guard = solver_rc.borrow_mut();
        let s: &mut dyn PhysicsSolver = &mut *guard;
        s.create_world(config.gravity_vector())?;

        let center = bounds.center();
        let size = bounds.size();
        let reach = size.x.max(size.z);
        let mut boundary_colliders = vec![cuboid(
            s,
            DVec3::new(center.x, bounds.min.y - GROUND_HALF_THICKNESS, center.z),
            DVec3::new(reach * 2.0 + 10.0, GROUND_HALF_THICKNESS, reach * 2.0 + 10.0),
            config,
        )?];
        if config.walls {
            let margin = reach * 0.5 + 2.0 + WALL_HALF_THICKNESS;
            let half_h = size.y + 4.0;
            let y = bounds.min.y + half_h;
            let span = margin + WALL_HALF_THICKNESS;
            for (offset, half) in [
                (DVec3::X * margin, DVec3::new(WALL_HALF_THICKNESS, half_h, span)),
                (DVec3::NEG_X * margin, DVec3::new(WALL_HALF_THICKNESS, half_h, span)),
                (DVec3::Z * margin, DVec3::new(span, half_h, WALL_HALF_THICKNESS)),
                (DVec3::NEG_Z * margin, DVec3::new(span, half_h, WALL_HALF_THICKNESS)),
            ] {
                let c = DVec3::new(center.x + offset.x, y, center.z + offset.z);
                boundary_colliders.push(cuboid(s, c, half, config)?);
            }
        }

        let mut rng = Lcg::new(config.seed);
        let mut bodies = Vec::new();
        let mut body_colliders = Vec::new();
        // (piece, sphere) -> (body index, offset of the sphere in body space)
        let mut sphere_body: HashMap<(usize, usize), (usize, DVec3)> = HashMap::new();

        for (pi, piece) in assembly.pieces.iter().enumerate() {
            if config.compound {
                let pose = piece.original_pose;
                let handle = s.create_body(
                    BodyKind::Dynamic,
                    Pose::new(pose.position + jitter(&mut rng, config.jitter), pose.rotation),
                )?;
                for (si, sphere) in piece.spheres.iter().enumerate() {
                    let desc = ColliderDesc::new(
                        ColliderShape::Ball {
                            radius: sphere.radius,
                        },
                        config.friction,
                        config.restitution,
                    )
                    .with_offset(sphere.local_offset);
                    body_colliders.push(s.create_collider(handle, &desc)?);
                    sphere_body.insert((pi, si), (bodies.len(), sphere.local_offset));
                }
                for bond in assembly.bonds.iter().filter(|b| b.a.0 == pi && b.b.0 == pi) {
                    let (sa, sb) = (&piece.spheres[bond.a.1], &piece.spheres[bond.b.1]);
                    let desc = ColliderDesc::new(
                        ColliderShape::Capsule {
                            a: sa.local_offset,
                            b: sb.local_offset,
                            radius: sa.radius.min(sb.radius) * 0.35,
                        },
                        config.friction,
                        config.restitution,
                    );
                    body_colliders.push(s.create_collider(handle, &desc)?);
                }
                bodies.push(BodyLink {
                    handle,
                    node: piece.node,
                    goal: pose.position,
                    goal_rotation: pose.rotation,
                });
            } else {
                for (si, (sphere, world)) in piece
                    .spheres
                    .iter()
                    .zip(piece.sphere_world_positions())
                    .enumerate()
                {
                    let rotation = piece.original_pose.rotation;
                    let handle = s.create_body(
                        BodyKind::Dynamic,
                        Pose::new(world + jitter(&mut rng, config.jitter), rotation),
                    )?;
                    let desc = ColliderDesc::new(
                        ColliderShape::Ball {
                            radius: sphere.radius,
                        },
                        config.friction,
                        config.restitution,
                    );
                    body_colliders.push(s.create_collider(handle, &desc)?);
                    sphere_body.insert((pi, si), (bodies.len(), DVec3::ZERO));
                    bodies.push(BodyLink {
                        handle,
                        node: sphere.node,
                        goal: world,
                        goal_rotation: rotation,
                    });
                }
            }
        }

        let scene_ref = scene.borrow();
        let mut bonds = Vec::new();
        for bond in &assembly.bonds {
            let (Some(&a), Some(&b)) = (sphere_body.get(&bond.a), sphere_body.get(&bond.b)) else {
                continue;
            };
            if a.0 == b.0 {
                continue;
            }
            let rotation = scene_ref
                .world_pose(bond.node)
                .map_or(DQuat::IDENTITY, |p| p.rotation);
            bonds.push(BondVisual {
                node: bond.node,
                a,
                b,
                rotation,
            });
        }
        drop(scene_ref);

        let mut this = Self {
            config: config.clone(),
            solver: Rc::clone(&solver),
            scene,
            bodies,
            body_colliders,
            boundary_colliders,
            joints: Vec::new(),
            bonds,
            phase: Phase::Fall,
            phase_time: 0.0,
            cycle: 1,
            bloom: None,
            bloom_timer: 0.0,
            release: None,
            saved: None,
            finished: false,
            stats: ChoreoStats::default(),
        };

        if !config.compound {
            for (a, b) in setup_pairs(assembly, &sphere_body) {
                this.create_joint(s, a, b)?;
            }
            this.stats.setup_joints = this.joints.len();
        }

        if config.release.mode == ReleaseMode::Staggered {
            for b in &this.bodies {
                s.sleep(b.handle);
            }
            this.release = Some(StaggeredRelease::new(
                this.bodies.len(),
                config.release.stagger_percent,
                config.release.stagger_interval_ms,
                config.seed,
            ));
        } else {
            for b in &this.bodies {
                s.wake_up(b.handle);
            }
        }

        tracing::debug!(
            bodies = this.bodies.len(),
            joints = this.joints.len(),
            boundary = this.boundary_colliders.len(),
            "physics world ready"
        );
        Ok(this)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time spent in the current phase.
    pub fn phase_time(&self) -> f64 {
        self.phase_time
    }

    /// 1-based cycle number.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Run counters.
    pub fn stats(&self) -> ChoreoStats {
        self.stats
    }

    /// Whether a non-looping run has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Live joints created by this choreographer.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Body handles in creation order.
    pub fn body_handles(&self) -> Vec<BodyHandle> {
        self.bodies.iter().map(|b| b.handle).collect()
    }

    /// Assembled position each body is recalled to.
    pub fn goals(&self) -> Vec<DVec3> {
        self.bodies.iter().map(|b| b.goal).collect()
    }

    /// Pairs still waiting in the bloom queue.
    pub fn pending_bloom_pairs(&self) -> usize {
        self.bloom.as_ref().map_or(0, BloomQueue::remaining)
    }

    /// Advance by `dt` seconds (milliseconds above 1.0 are converted).
    pub fn tick(&mut self, dt: f64) -> FxResult<ChoreoEvent> {
        let dt = normalize_delta_secs(dt);
        if dt == 0.0 || self.finished {
            return Ok(ChoreoEvent::Running);
        }
        let solver_rc = Rc::clone(&self.solver);
        let mut guard = solver_rc.borrow_mut();
        let s: &mut dyn PhysicsSolver = &mut *guard;
        if !s.has_world() {
            return Err(FxError::physics("physics world was freed"));
        }

        self.phase_time += dt;
        let half = self.config.half_duration();
        let mut event = ChoreoEvent::Running;
        match self.phase {
            Phase::Fall => {
                self.advance_release(s, dt);
                if self.reached(half) {
                    self.enter_recall(s);
                }
            }
            Phase::Recall => {
                if self.reached(half) {
                    self.finish_recall(s);
                    self.enter_settle(s);
                } else {
                    self.drive_recall(s);
                }
            }
            Phase::SettleHold => {
                if self.reached(ms(self.config.settle_hold_ms)) {
                    self.enter_bloom(s)?;
                }
            }
            Phase::Bloom => {
                self.bloom_timer += dt;
                let interval = ms(self.config.bloom_interval_ms);
                while self.bloom_timer + PHASE_EPSILON >= interval
                    && self.bloom.as_ref().is_some_and(|q| !q.is_empty())
                {
                    self.bloom_timer -= interval;
                    self.bloom_batch(s)?;
                }
                if self.bloom.as_ref().is_none_or(BloomQueue::is_empty) {
                    self.enter_post_bloom();
                }
            }
            Phase::PostBloomDampen => {
                self.damp(s, POST_BLOOM_DAMPING);
                if self.reached(ms(self.config.post_bloom_dampen_ms)) {
                    self.enter_loop_hold(s);
                }
            }
            Phase::LoopHold => {
                if self.reached(ms(self.config.loop_hold_ms)) {
                    event = self.finish_cycle(s);
                }
            }
        }

        s.step(dt);
        if self.phase == Phase::Fall && self.config.auto_break.enabled {
            self.check_breakage(s, dt);
        }
        self.sync_visuals(s);
        Ok(event)
    }

    /// Restore gravity, sensors, friction and sleeping, free the world and show bond nodes again.
    pub fn teardown(&mut self) {
        let solver_rc = Rc::clone(&self.solver);
        let mut guard = solver_rc.borrow_mut();
        let s: &mut dyn PhysicsSolver = &mut *guard;
        if s.has_world() {
            self.restore_world(s);
            s.free_world();
        }
        self.joints.clear();
        self.bloom = None;
        self.release = None;
        self.set_bonds_visible(true);
    }

    fn reached(&self, duration: f64) -> bool {
        self.phase_time + PHASE_EPSILON >= duration
    }

    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(
            from = self.phase.name(),
            to = phase.name(),
            cycle = self.cycle,
            after = self.phase_time,
            "gravity phase"
        );
        self.phase = phase;
        self.phase_time = 0.0;
    }

    fn create_joint(&mut self, s: &mut dyn PhysicsSolver, a: usize, b: usize) -> FxResult<()> {
        let (ha, hb) = (self.bodies[a].handle, self.bodies[b].handle);
        let handle = s.create_fixed_joint(ha, hb)?;
        let pa = s.translation(ha).unwrap_or(self.bodies[a].goal);
        let pb = s.translation(hb).unwrap_or(self.bodies[b].goal);
        let mean_mass = 0.5 * (s.mass(ha) + s.mass(hb));
        self.joints.push(JointLink {
            handle,
            a,
            b,
            lever: 0.5 * pa.distance(pb),
            threshold: force_threshold(
                self.config.auto_break.level,
                mean_mass,
                self.config.gravity_magnitude(),
            ),
            prev_rel_linvel: rel(s.linvel(ha), s.linvel(hb)),
            prev_rel_angvel: rel(s.angvel(ha), s.angvel(hb)),
        });
        Ok(())
    }

    fn remove_all_joints(&mut self, s: &mut dyn PhysicsSolver) {
        for j in self.joints.drain(..) {
            s.remove_joint(j.handle);
        }
        self.set_bonds_visible(false);
    }

    fn set_bonds_visible(&self, visible: bool) {
        let mut scene = self.scene.borrow_mut();
        for b in &self.bonds {
            scene.set_visible(b.node, visible);
        }
    }

    fn advance_release(&mut self, s: &mut dyn PhysicsSolver, dt: f64) {
        let Some(release) = self.release.as_mut() else {
            return;
        };
        let bodies = &self.bodies;
        let wake = release.advance(dt, |i| s.is_sleeping(bodies[i].handle));
        for i in wake {
            s.wake_up(self.bodies[i].handle);
        }
        if release.is_done() {
            self.release = None;
        }
    }

    fn enter_fall(&mut self, s: &mut dyn PhysicsSolver) {
        self.remove_all_joints(s);
        for b in &self.bodies {
            s.wake_up(b.handle);
        }
        self.set_phase(Phase::Fall);
    }

    fn enter_recall(&mut self, s: &mut dyn PhysicsSolver) {
        self.remove_all_joints(s);
        self.release = None;
        self.saved = Some(SavedWorld {
            gravity: s.gravity(),
            frictions: self
                .body_colliders
                .iter()
                .filter_map(|&c| Some((c, s.collider_friction(c)?)))
                .collect(),
            sensors: self
                .boundary_colliders
                .iter()
                .filter_map(|&c| Some((c, s.is_sensor(c)?)))
                .collect(),
        });
        s.set_gravity(DVec3::ZERO);
        for &c in &self.boundary_colliders {
            s.set_sensor(c, true);
        }
        for &c in &self.body_colliders {
            s.set_collider_friction(c, RECALL_FRICTION);
        }
        for b in &self.bodies {
            if let Some(p) = s.translation(b.handle).filter(|p| p.is_finite()) {
                s.set_translation(b.handle, p + DVec3::Y * RECALL_NUDGE, true);
            }
            s.set_can_sleep(b.handle, false);
            s.wake_up(b.handle);
        }
        self.set_phase(Phase::Recall);
    }

    fn drive_recall(&mut self, s: &mut dyn PhysicsSolver) {
        let tau = (self.config.recall_tau_fraction * self.config.half_duration()).max(1e-6);
        let max_speed = self.config.recall_max_speed;
        for b in &self.bodies {
            let (Some(p), Some(v)) = (s.translation(b.handle), s.linvel(b.handle)) else {
                continue;
            };
            if !p.is_finite() || !v.is_finite() {
                continue;
            }
            let e = b.goal - p;
            let cmd = (e * (2.0 / tau) - v * (1.0 / tau)).clamp_length_max(max_speed);
            s.set_linvel(b.handle, cmd, true);
            s.set_angvel(b.handle, DVec3::ZERO, true);
        }
    }

    fn finish_recall(&mut self, s: &mut dyn PhysicsSolver) {
        let tol = self.config.settle_tolerance;
        for b in &self.bodies {
            if let Some(p) = s.translation(b.handle)
                && p.is_finite()
                && p.distance(b.goal) <= tol
            {
                s.set_translation(b.handle, b.goal, false);
                s.set_rotation(b.handle, b.goal_rotation, false);
                self.stats.snapped += 1;
            }
            s.set_linvel(b.handle, DVec3::ZERO, false);
            s.set_angvel(b.handle, DVec3::ZERO, false);
        }
    }

    fn enter_settle(&mut self, s: &mut dyn PhysicsSolver) {
        let positions: Vec<DVec3> = self
            .bodies
            .iter()
            .map(|b| {
                s.translation(b.handle)
                    .filter(|p| p.is_finite())
                    .unwrap_or(b.goal)
            })
            .collect();
        let pairs = nearest_pairs(&positions, NEIGHBORS_PER_BODY);
        self.stats.bloom_pairs += pairs.len();
        self.bloom = Some(BloomQueue::new(pairs, self.config.bloom_batch_size));
        self.set_phase(Phase::SettleHold);
    }

    fn enter_bloom(&mut self, s: &mut dyn PhysicsSolver) -> FxResult<()> {
        self.set_phase(Phase::Bloom);
        self.bloom_timer = 0.0;
        self.bloom_batch(s)
    }

    fn bloom_batch(&mut self, s: &mut dyn PhysicsSolver) -> FxResult<()> {
        let batch = self
            .bloom
            .as_mut()
            .map(BloomQueue::next_batch)
            .unwrap_or_default();
        for (a, b) in batch {
            self.create_joint(s, a, b)?;
            self.stats.bloom_joints += 1;
        }
        self.damp(s, BLOOM_DAMPING);
        Ok(())
    }

    fn enter_post_bloom(&mut self) {
        self.set_bonds_visible(true);
        self.set_phase(Phase::PostBloomDampen);
    }

    fn enter_loop_hold(&mut self, s: &mut dyn PhysicsSolver) {
        self.restore_world(s);
        self.set_phase(Phase::LoopHold);
    }

    fn finish_cycle(&mut self, s: &mut dyn PhysicsSolver) -> ChoreoEvent {
        self.stats.cycles += 1;
        if self.config.looped {
            self.cycle += 1;
            self.enter_fall(s);
            ChoreoEvent::CycleCompleted
        } else {
            self.finished = true;
            tracing::debug!(cycles = self.stats.cycles, "gravity run finished");
            ChoreoEvent::Finished
        }
    }

    fn restore_world(&mut self, s: &mut dyn PhysicsSolver) {
        if let Some(saved) = self.saved.take() {
            s.set_gravity(saved.gravity);
            for (c, f) in saved.frictions {
                s.set_collider_friction(c, f);
            }
            for (c, sensor) in saved.sensors {
                s.set_sensor(c, sensor);
            }
        }
        for b in &self.bodies {
            s.set_can_sleep(b.handle, true);
        }
    }

    fn damp(&self, s: &mut dyn PhysicsSolver, factor: f64) {
        for b in &self.bodies {
            if let Some(v) = s.linvel(b.handle) {
                s.set_linvel(b.handle, v * factor, false);
            }
            if let Some(w) = s.angvel(b.handle) {
                s.set_angvel(b.handle, w * factor, false);
            }
        }
    }

    fn check_breakage(&mut self, s: &mut dyn PhysicsSolver, dt: f64) {
        let mut broken = Vec::new();
        for (k, j) in self.joints.iter_mut().enumerate() {
            let (ha, hb) = (self.bodies[j.a].handle, self.bodies[j.b].handle);
            let lin = rel(s.linvel(ha), s.linvel(hb));
            let ang = rel(s.angvel(ha), s.angvel(hb));
            let load = estimate_load(
                s.mass(ha),
                s.mass(hb),
                j.lever,
                lin - j.prev_rel_linvel,
                ang - j.prev_rel_angvel,
                dt,
            );
            j.prev_rel_linvel = lin;
            j.prev_rel_angvel = ang;
            if load.exceeds(j.threshold, j.lever) {
                broken.push(k);
            }
        }
        for k in broken.into_iter().rev() {
            let j = self.joints.remove(k);
            s.remove_joint(j.handle);
            self.stats.joints_broken += 1;
            let mut scene = self.scene.borrow_mut();
            for bond in &self.bonds {
                if (bond.a.0, bond.b.0) == (j.a, j.b) || (bond.a.0, bond.b.0) == (j.b, j.a) {
                    scene.set_visible(bond.node, false);
                }
            }
            tracing::debug!(a = j.a, b = j.b, "joint broke under load");
        }
    }

    fn sync_visuals(&mut self, s: &dyn PhysicsSolver) {
        let mut scene = self.scene.borrow_mut();
        let mut poses: Vec<Option<Pose>> = Vec::with_capacity(self.bodies.len());
        for b in &self.bodies {
            let pose = match (s.translation(b.handle), s.rotation(b.handle)) {
                (Some(t), Some(r)) => Some(Pose::new(t, r)).filter(Pose::is_finite),
                _ => None,
            };
            match pose {
                Some(p) => scene.set_world_pose(b.node, p),
                None => {
                    self.stats.skipped_non_finite += 1;
                    tracing::debug!(body = b.handle.0, "skipped non-finite body pose");
                }
            }
            poses.push(pose);
        }
        for bond in &self.bonds {
            if let (Some(pa), Some(pb)) = (poses[bond.a.0], poses[bond.b.0]) {
                let mid = (pa.transform_point(bond.a.1) + pb.transform_point(bond.b.1)) * 0.5;
                scene.set_world_pose(bond.node, Pose::new(mid, bond.rotation));
            }
        }
    }
}

fn ms(v: u32) -> f64 {
    f64::from(v) / 1000.0
}

fn rel(a: Option<DVec3>, b: Option<DVec3>) -> DVec3 {
    b.unwrap_or_default() - a.unwrap_or_default()
}

/// Body pairs jointed at setup: bonded spheres of the same piece, or touching spheres of pieces
/// that carry no bonds.
fn setup_pairs(
    assembly: &Assembly,
    sphere_body: &HashMap<(usize, usize), (usize, DVec3)>,
) -> Vec<(usize, usize)> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut push = |a: usize, b: usize| {
        if a != b && seen.insert((a.min(b), a.max(b))) {
            out.push((a.min(b), a.max(b)));
        }
    };
    for (pi, piece) in assembly.pieces.iter().enumerate() {
        let bonded: Vec<_> = assembly
            .bonds
            .iter()
            .filter(|b| b.a.0 == pi && b.b.0 == pi)
            .collect();
        if !bonded.is_empty() {
            for bond in bonded {
                if let (Some(a), Some(b)) = (sphere_body.get(&bond.a), sphere_body.get(&bond.b)) {
                    push(a.0, b.0);
                }
            }
            continue;
        }
        let world = piece.sphere_world_positions();
        for i in 0..world.len() {
            for k in i + 1..world.len() {
                let reach = TOUCH_FACTOR * (piece.spheres[i].radius + piece.spheres[k].radius);
                if world[i].distance(world[k]) <= reach
                    && let (Some(a), Some(b)) =
                        (sphere_body.get(&(pi, i)), sphere_body.get(&(pi, k)))
                {
                    push(a.0, b.0);
                }
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/physics/choreography.rs"]
mod tests;
