use crate::animation::ease::Ease;
use crate::config::validate::{
    ConfigErrors, validate_explosion, validate_gravity, validate_orbit, validate_reveal,
    validate_turntable,
};
use crate::foundation::core::DVec3;
use crate::foundation::error::FxResult;

/// Current `schemaVersion` written by and accepted from serialized configs.
pub const SCHEMA_VERSION: u32 = 1;

/// Identifies a concrete effect type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    /// Progressive bottom-up reveal.
    Reveal,
    /// Outward separation and reassembly.
    Explosion,
    /// Keyframed constant-speed camera path.
    Orbit,
    /// Physics collapse, recall, re-bond loop.
    Gravity,
    /// Single-axis spin of the assembly or camera.
    Turntable,
}

impl EffectKind {
    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Reveal => "reveal",
            Self::Explosion => "explosion",
            Self::Orbit => "orbit",
            Self::Gravity => "gravity",
            Self::Turntable => "turntable",
        }
    }
}

/// Serialized config of any effect, tagged by `effect`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum EffectConfig {
    /// Reveal config.
    Reveal(RevealConfig),
    /// Explosion config.
    Explosion(ExplosionConfig),
    /// Orbit config.
    Orbit(OrbitConfig),
    /// Gravity config.
    Gravity(GravityConfig),
    /// Turntable config.
    Turntable(TurntableConfig),
}

impl EffectConfig {
    /// Parse a tagged config from JSON. Structural problems (unknown easing, wrong types) surface
    /// here; range checks are left to [`EffectConfig::validate`].
    pub fn from_json(s: &str) -> FxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> FxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Effect type this config drives.
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Reveal(_) => EffectKind::Reveal,
            Self::Explosion(_) => EffectKind::Explosion,
            Self::Orbit(_) => EffectKind::Orbit,
            Self::Gravity(_) => EffectKind::Gravity,
            Self::Turntable(_) => EffectKind::Turntable,
        }
    }

    /// Length of one run in seconds.
    pub fn duration_sec(&self) -> f64 {
        match self {
            Self::Reveal(c) => c.duration_sec,
            Self::Explosion(c) => c.duration_sec,
            Self::Orbit(c) => c.duration_sec,
            Self::Gravity(c) => c.duration_sec,
            Self::Turntable(c) => c.duration_sec,
        }
    }

    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        match self {
            Self::Reveal(c) => c.validate(),
            Self::Explosion(c) => c.validate(),
            Self::Orbit(c) => c.validate(),
            Self::Gravity(c) => c.validate(),
            Self::Turntable(c) => c.validate(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Progressive reveal: pieces appear lowest-first as eased progress advances.
pub struct RevealConfig {
    /// Serialized schema version.
    pub schema_version: u32,
    /// Run length in seconds.
    pub duration_sec: f64,
    /// Curve applied to run progress before counting visible pieces.
    pub ease: Ease,
    /// Restart after `loop_pause_sec` when the run ends.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Hold time between loop iterations.
    pub loop_pause_sec: f64,
    /// Total spin of the assembly around the vertical axis over one run.
    pub rotation_deg: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            duration_sec: 5.0,
            ease: Ease::EaseInOut,
            looped: false,
            loop_pause_sec: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl RevealConfig {
    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        validate_reveal(self)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Explosion: pieces fly outward from the assembly centre, then reassemble.
pub struct ExplosionConfig {
    /// Serialized schema version.
    pub schema_version: u32,
    /// Run length in seconds (first half out, second half back).
    pub duration_sec: f64,
    /// Curve applied to each piece's local progress.
    pub ease: Ease,
    /// Outward displacement as a multiple of the piece's offset from the assembly centre.
    pub explosion_factor: f64,
    /// Fraction of each half spent staggering piece start times, in `[0, 1)`.
    pub stagger: f64,
    /// Spin applied to every piece at full separation.
    pub rotation_deg: f64,
    /// Restart after `loop_pause_sec` when the run ends.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Hold time between loop iterations.
    pub loop_pause_sec: f64,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            duration_sec: 4.0,
            ease: Ease::EaseInOut,
            explosion_factor: 1.5,
            stagger: 0.4,
            rotation_deg: 0.0,
            looped: false,
            loop_pause_sec: 0.5,
        }
    }
}

impl ExplosionConfig {
    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        validate_explosion(self)
    }
}

/// What a turntable run rotates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurntableMode {
    /// Spin every piece about the assembly centre.
    #[default]
    Object,
    /// Orbit the camera about the assembly centre.
    Camera,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Turntable: a single eased spin about the vertical axis.
pub struct TurntableConfig {
    /// Serialized schema version.
    pub schema_version: u32,
    /// Run length in seconds.
    pub duration_sec: f64,
    /// Curve applied to run progress.
    pub ease: Ease,
    /// Total spin in degrees (sign selects direction).
    pub degrees: f64,
    /// Rotate the assembly or the camera.
    pub mode: TurntableMode,
    /// Restart after `loop_pause_sec` when the run ends.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Hold time between loop iterations.
    pub loop_pause_sec: f64,
}

impl Default for TurntableConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            duration_sec: 8.0,
            ease: Ease::Linear,
            degrees: 360.0,
            mode: TurntableMode::Object,
            looped: false,
            loop_pause_sec: 0.0,
        }
    }
}

impl TurntableConfig {
    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        validate_turntable(self)
    }
}

/// How camera positions are interpolated between keyframes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathMode {
    /// Straight lines between Cartesian keyframe positions.
    Free,
    /// Spherical interpolation around a fixed centre with monotonic azimuth.
    #[default]
    Locked,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// One user-placed camera keyframe.
pub struct OrbitKeyframe {
    /// Camera position.
    pub position: DVec3,
    /// Look-at point; falls back to the path centre.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DVec3>,
    /// Vertical field of view in degrees; falls back to the camera's fov at play time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
    /// Hold time after arriving at this keyframe.
    #[serde(default)]
    pub pause_sec: f64,
    /// Ease segment-local time on the way to the next keyframe.
    #[serde(default)]
    pub ease_into_next: bool,
}

impl OrbitKeyframe {
    /// Keyframe with only a position.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            target: None,
            fov: None,
            pause_sec: 0.0,
            ease_into_next: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Orbit: constant-speed camera fly-through of user keyframes.
pub struct OrbitConfig {
    /// Serialized schema version.
    pub schema_version: u32,
    /// Total run length in seconds, pauses included.
    pub duration_sec: f64,
    /// Ordered keyframes (at least two are needed to animate).
    pub keyframes: Vec<OrbitKeyframe>,
    /// Append a seam segment from the last keyframe back to the first and repeat.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Position interpolation mode.
    pub mode: PathMode,
    /// Centre for locked mode; defaults to the assembly centre.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_target: Option<DVec3>,
    /// Arc-length table resolution per segment.
    pub samples_per_segment: usize,
    /// Length of the jump-to-keyframe preview tween.
    pub jump_duration_ms: u32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            duration_sec: 12.0,
            keyframes: Vec::new(),
            looped: false,
            mode: PathMode::Locked,
            lock_target: None,
            samples_per_segment: 128,
            jump_duration_ms: 400,
        }
    }
}

impl OrbitConfig {
    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        validate_orbit(self)
    }
}

/// Named gravity strengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GravityPreset {
    /// 9.81 m/s².
    #[default]
    Earth,
    /// 1.62 m/s².
    Moon,
    /// No gravity.
    ZeroG,
    /// `customGravity` m/s².
    Custom,
}

/// How dynamic bodies are released at the start of the first fall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseMode {
    /// Every body is awake from the first step.
    #[default]
    All,
    /// Bodies start asleep and are woken in deterministic batches.
    Staggered,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Release settings for the first fall.
pub struct ReleaseConfig {
    /// All at once or staggered.
    pub mode: ReleaseMode,
    /// Fraction of all bodies woken per release tick, in `(0, 1]`.
    pub stagger_percent: f64,
    /// Cadence of release ticks.
    pub stagger_interval_ms: u32,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            mode: ReleaseMode::All,
            stagger_percent: 0.1,
            stagger_interval_ms: 150,
        }
    }
}

/// Severity of automatic joint breaking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakLevel {
    /// Joints survive large loads.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Joints snap easily.
    High,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Automatic joint breaking under load.
pub struct AutoBreakConfig {
    /// Break joints whose estimated load exceeds the level threshold.
    pub enabled: bool,
    /// Threshold severity.
    pub level: BreakLevel,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Gravity: fall apart, recall, re-bond.
pub struct GravityConfig {
    /// Serialized schema version.
    pub schema_version: u32,
    /// Fall + recall length in seconds; each takes half.
    pub duration_sec: f64,
    /// Gravity strength preset.
    pub gravity: GravityPreset,
    /// Magnitude used by [`GravityPreset::Custom`].
    pub custom_gravity: f64,
    /// Release behaviour for the first fall.
    pub release: ReleaseConfig,
    /// Automatic joint breaking.
    pub auto_break: AutoBreakConfig,
    /// Repeat the cycle indefinitely.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// Seed for setup jitter and release order.
    pub seed: u64,
    /// Maximum setup jitter per axis, in world units.
    pub jitter: f64,
    /// One body per piece instead of one body per sphere.
    pub compound: bool,
    /// Surround the assembly with boundary walls.
    pub walls: bool,
    /// Body collider friction outside of recall.
    pub friction: f64,
    /// Body collider restitution.
    pub restitution: f64,
    /// Recall controller time constant as a fraction of the half-duration.
    pub recall_tau_fraction: f64,
    /// Upper bound on recall command speed.
    pub recall_max_speed: f64,
    /// Bodies within this distance of home snap onto it when recall ends.
    pub settle_tolerance: f64,
    /// Hold after recall before bonding starts.
    pub settle_hold_ms: u32,
    /// Joints created per bloom batch.
    pub bloom_batch_size: usize,
    /// Interval between bloom batches.
    pub bloom_interval_ms: u32,
    /// Settling time after the last bloom batch.
    pub post_bloom_dampen_ms: u32,
    /// Hold in the assembled pose before the next fall.
    pub loop_hold_ms: u32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            duration_sec: 6.0,
            gravity: GravityPreset::Earth,
            custom_gravity: 9.81,
            release: ReleaseConfig::default(),
            auto_break: AutoBreakConfig::default(),
            looped: true,
            seed: 1,
            jitter: 0.002,
            compound: false,
            walls: false,
            friction: 0.6,
            restitution: 0.1,
            recall_tau_fraction: 0.6,
            recall_max_speed: 8.0,
            settle_tolerance: 0.25,
            settle_hold_ms: 400,
            bloom_batch_size: 24,
            bloom_interval_ms: 80,
            post_bloom_dampen_ms: 400,
            loop_hold_ms: 1200,
        }
    }
}

impl GravityConfig {
    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        validate_gravity(self)
    }

    /// Gravity magnitude in m/s² for the configured preset.
    pub fn gravity_magnitude(&self) -> f64 {
        match self.gravity {
            GravityPreset::Earth => 9.81,
            GravityPreset::Moon => 1.62,
            GravityPreset::ZeroG => 0.0,
            GravityPreset::Custom => self.custom_gravity.max(0.0),
        }
    }

    /// Gravity vector (pointing down the Y axis).
    pub fn gravity_vector(&self) -> DVec3 {
        DVec3::new(0.0, -self.gravity_magnitude(), 0.0)
    }

    /// Length of the fall phase, and of the recall phase.
    pub fn half_duration(&self) -> f64 {
        self.duration_sec * 0.5
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
