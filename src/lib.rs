//! spherefx drives cinematic effects over assemblies of bonded spheres.
//!
//! An assembly is a set of rigid pieces, each made of spheres, joined by visual bonds. Effects
//! borrow the host's scene graph, camera and (for gravity) physics world through small traits,
//! animate them from host-supplied timestamps, and put everything back on stop or dispose.
//!
//! # Effects
//!
//! - **Reveal**: pieces appear lowest-first as eased progress advances.
//! - **Explosion**: pieces fly out from the centre and reassemble with a stagger.
//! - **Turntable**: one eased spin of the assembly or of the camera.
//! - **Orbit**: constant-speed camera flight through user keyframes.
//! - **Gravity**: break apart under gravity, recall home, then re-bond in batches.
//!
//! Every effect follows the same lifecycle ([`EffectState`]): `init` with an
//! [`EffectContext`], then `play`, `tick`, `pause`, `resume`, `stop` and `dispose`. Calls that
//! do not fit the current state are ignored and return `false`.
//!
//! # Collaborators
//!
//! - [`SceneGraph`] with [`InMemoryScene`] for headless use.
//! - [`CameraRig`] and [`CameraControls`] with in-memory versions.
//! - [`PhysicsSolver`] with the deterministic [`PointSolver`], and `RapierSolver` behind the
//!   `rapier` feature.
//!
//! Configs are plain serde types ([`EffectConfig`]) validated into field-level
//! [`ConfigErrors`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod camera;
mod config;
mod effects;
mod foundation;
mod physics;
mod scene;

pub use animation::ease::Ease;
pub use camera::path::{
    ArcLengthTable, CameraPath, DEFAULT_SAMPLES_PER_SEGMENT, PathOptions, PathSegment,
};
pub use camera::rig::{
    CameraControls, CameraPose, CameraRig, InMemoryCamera, InMemoryControls, SharedCamera,
    SharedControls,
};
pub use camera::tween::CameraTween;
pub use config::model::{
    AutoBreakConfig, BreakLevel, EffectConfig, EffectKind, ExplosionConfig, GravityConfig,
    GravityPreset, OrbitConfig, OrbitKeyframe, PathMode, ReleaseConfig, ReleaseMode,
    RevealConfig, SCHEMA_VERSION, TurntableConfig, TurntableMode,
};
pub use config::validate::{ConfigError, ConfigErrors, ConfigPathElem};
pub use effects::context::EffectContext;
pub use effects::explosion::{ExplosionEffect, separation};
pub use effects::gravity::GravityEffect;
pub use effects::lifecycle::{EffectState, PlaybackClock, Transition};
pub use effects::orbit::OrbitEffect;
pub use effects::reveal::{RevealEffect, reveal_count};
pub use effects::turntable::TurntableEffect;
pub use effects::{Effect, create_effect};
pub use foundation::core::{Aabb, DQuat, DVec3, Pose};
pub use foundation::error::{FxError, FxResult};
pub use foundation::math::{Lcg, cmp_with_tolerance};
pub use physics::bloom::{BloomBatch, BloomQueue, NEIGHBORS_PER_BODY, nearest_pairs};
pub use physics::breakage::{
    BreakThresholds, LoadEstimate, estimate_load, force_threshold, thresholds,
};
pub use physics::choreography::{
    BLOOM_DAMPING, ChoreoEvent, ChoreoStats, POST_BLOOM_DAMPING, Phase, PhysicsChoreographer,
    RECALL_FRICTION, RECALL_NUDGE, TOUCH_FACTOR,
};
pub use physics::point::PointSolver;
#[cfg(feature = "rapier")]
pub use physics::rapier::RapierSolver;
pub use physics::release::StaggeredRelease;
pub use physics::solver::{
    BodyHandle, BodyKind, ColliderDesc, ColliderHandle, ColliderShape, JointHandle,
    PhysicsSolver, SharedSolver,
};
pub use scene::graph::{NodeId, NodeKind, SceneGraph, SceneNode, SharedScene};
pub use scene::memory::{InMemoryScene, NodeState, PieceDef, SceneDef};
pub use scene::ordering::{ORDER_TOLERANCE, OrderKey, compare_keys, order_keys, piece_order};
pub use scene::piece::{Assembly, BondLink, Piece, PieceSphere, SceneSnapshot};
