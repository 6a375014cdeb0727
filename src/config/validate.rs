use crate::config::model::{
    ExplosionConfig, GravityConfig, OrbitConfig, ReleaseMode, RevealConfig, SCHEMA_VERSION,
    TurntableConfig,
};
use std::collections::BTreeMap;
use std::fmt;

/// One element of a config field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPathElem {
    /// Named field.
    Field(&'static str),
    /// Array index.
    Index(usize),
}

/// A single invalid field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Location of the offending field.
    pub path: Vec<ConfigPathElem>,
    /// Human-readable problem description.
    pub message: String,
}

impl ConfigError {
    /// Error at `path`.
    pub fn at(path: &[ConfigPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }

    /// Dotted field path, e.g. `keyframes[1].pauseSec`.
    pub fn field(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[ConfigPathElem]) -> String {
    let mut s = String::new();
    for p in path {
        match *p {
            ConfigPathElem::Field(name) => {
                if !s.is_empty() {
                    s.push('.');
                }
                s.push_str(name);
            }
            ConfigPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

/// Every invalid field found in one config.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigErrors {
    /// Errors in field order.
    pub errors: Vec<ConfigError>,
}

impl ConfigErrors {
    /// Field path → message map for form-style reporting. When a field has several problems the
    /// first one wins.
    pub fn field_messages(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for e in &self.errors {
            out.entry(e.field()).or_insert_with(|| e.message.clone());
        }
        out
    }

    /// Whether `field` has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

struct Checker {
    path: Vec<ConfigPathElem>,
    errors: Vec<ConfigError>,
}

impl Checker {
    fn new() -> Self {
        Self {
            path: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, elem: ConfigPathElem) {
        self.path.push(elem);
    }

    fn pop(&mut self) {
        self.path.pop();
    }

    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.path.push(ConfigPathElem::Field(field));
        self.errors.push(ConfigError::at(&self.path, message));
        self.path.pop();
    }

    fn schema_version(&mut self, v: u32) {
        if v != SCHEMA_VERSION {
            self.fail(
                "schemaVersion",
                format!("schemaVersion must be {SCHEMA_VERSION}"),
            );
        }
    }

    fn positive(&mut self, field: &'static str, v: f64) {
        if !v.is_finite() || v <= 0.0 {
            self.fail(field, "must be finite and > 0");
        }
    }

    fn non_negative(&mut self, field: &'static str, v: f64) {
        if !v.is_finite() || v < 0.0 {
            self.fail(field, "must be finite and >= 0");
        }
    }

    fn finite(&mut self, field: &'static str, v: f64) {
        if !v.is_finite() {
            self.fail(field, "must be finite");
        }
    }

    fn finite_vec(&mut self, field: &'static str, v: glam::DVec3) {
        if !v.is_finite() {
            self.fail(field, "all components must be finite");
        }
    }

    fn finish(self) -> Result<(), ConfigErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigErrors {
                errors: self.errors,
            })
        }
    }
}

pub(crate) fn validate_reveal(cfg: &RevealConfig) -> Result<(), ConfigErrors> {
    let mut c = Checker::new();
    c.schema_version(cfg.schema_version);
    c.positive("durationSec", cfg.duration_sec);
    c.non_negative("loopPauseSec", cfg.loop_pause_sec);
    c.finite("rotationDeg", cfg.rotation_deg);
    c.finish()
}

pub(crate) fn validate_explosion(cfg: &ExplosionConfig) -> Result<(), ConfigErrors> {
    let mut c = Checker::new();
    c.schema_version(cfg.schema_version);
    c.positive("durationSec", cfg.duration_sec);
    c.non_negative("explosionFactor", cfg.explosion_factor);
    if !(0.0..1.0).contains(&cfg.stagger) {
        c.fail("stagger", "must be in [0, 1)");
    }
    c.finite("rotationDeg", cfg.rotation_deg);
    c.non_negative("loopPauseSec", cfg.loop_pause_sec);
    c.finish()
}

pub(crate) fn validate_turntable(cfg: &TurntableConfig) -> Result<(), ConfigErrors> {
    let mut c = Checker::new();
    c.schema_version(cfg.schema_version);
    c.positive("durationSec", cfg.duration_sec);
    c.finite("degrees", cfg.degrees);
    c.non_negative("loopPauseSec", cfg.loop_pause_sec);
    c.finish()
}

pub(crate) fn validate_orbit(cfg: &OrbitConfig) -> Result<(), ConfigErrors> {
    let mut c = Checker::new();
    c.schema_version(cfg.schema_version);
    c.positive("durationSec", cfg.duration_sec);
    if cfg.samples_per_segment < 2 {
        c.fail("samplesPerSegment", "must be >= 2");
    }
    if cfg.jump_duration_ms == 0 {
        c.fail("jumpDurationMs", "must be > 0");
    }
    if let Some(t) = cfg.lock_target {
        c.finite_vec("lockTarget", t);
    }

    c.push(ConfigPathElem::Field("keyframes"));
    for (i, kf) in cfg.keyframes.iter().enumerate() {
        c.push(ConfigPathElem::Index(i));
        c.finite_vec("position", kf.position);
        if let Some(t) = kf.target {
            c.finite_vec("target", t);
        }
        if let Some(fov) = kf.fov
            && !(fov.is_finite() && fov > 0.0 && fov < 180.0)
        {
            c.fail("fov", "must be in (0, 180) degrees");
        }
        c.non_negative("pauseSec", kf.pause_sec);
        c.pop();
    }
    c.pop();

    c.finish()
}

pub(crate) fn validate_gravity(cfg: &GravityConfig) -> Result<(), ConfigErrors> {
    let mut c = Checker::new();
    c.schema_version(cfg.schema_version);
    c.positive("durationSec", cfg.duration_sec);
    c.non_negative("customGravity", cfg.custom_gravity);
    c.non_negative("jitter", cfg.jitter);
    c.non_negative("friction", cfg.friction);
    if !(cfg.restitution.is_finite() && (0.0..=1.0).contains(&cfg.restitution)) {
        c.fail("restitution", "must be in [0, 1]");
    }
    if !(cfg.recall_tau_fraction.is_finite()
        && cfg.recall_tau_fraction > 0.0
        && cfg.recall_tau_fraction <= 1.0)
    {
        c.fail("recallTauFraction", "must be in (0, 1]");
    }
    c.positive("recallMaxSpeed", cfg.recall_max_speed);
    c.non_negative("settleTolerance", cfg.settle_tolerance);
    if cfg.bloom_batch_size == 0 {
        c.fail("bloomBatchSize", "must be >= 1");
    }
    if cfg.bloom_interval_ms == 0 {
        c.fail("bloomIntervalMs", "must be > 0");
    }

    c.push(ConfigPathElem::Field("release"));
    if cfg.release.mode == ReleaseMode::Staggered {
        let p = cfg.release.stagger_percent;
        if !(p.is_finite() && p > 0.0 && p <= 1.0) {
            c.fail("staggerPercent", "must be in (0, 1]");
        }
        if cfg.release.stagger_interval_ms == 0 {
            c.fail("staggerIntervalMs", "must be > 0");
        }
    }
    c.pop();

    c.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/config/validate.rs"]
mod tests;
