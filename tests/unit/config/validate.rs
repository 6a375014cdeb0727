use super::*;
use crate::config::model::{EffectConfig, OrbitKeyframe};
use glam::DVec3;

#[test]
fn reports_every_invalid_field_with_paths() {
    let cfg = OrbitConfig {
        duration_sec: 0.0,
        samples_per_segment: 1,
        keyframes: vec![
            OrbitKeyframe::at(DVec3::ZERO),
            OrbitKeyframe {
                pause_sec: -1.0,
                fov: Some(200.0),
                ..OrbitKeyframe::at(DVec3::new(f64::NAN, 0.0, 0.0))
            },
        ],
        ..OrbitConfig::default()
    };
    let errs = cfg.validate().unwrap_err();
    let map = errs.field_messages();
    assert!(map.contains_key("durationSec"));
    assert!(map.contains_key("samplesPerSegment"));
    assert!(map.contains_key("keyframes[1].position"));
    assert!(map.contains_key("keyframes[1].pauseSec"));
    assert!(map.contains_key("keyframes[1].fov"));
    assert!(!map.contains_key("keyframes[0].position"));
    assert_eq!(errs.errors.len(), 5);
}

#[test]
fn schema_version_mismatch_is_reported() {
    let cfg = RevealConfig {
        schema_version: 99,
        ..RevealConfig::default()
    };
    let errs = cfg.validate().unwrap_err();
    assert!(errs.has_field("schemaVersion"));
    assert!(errs.to_string().contains("schemaVersion must be 1"));
}

#[test]
fn nested_release_fields_are_prefixed() {
    let mut cfg = GravityConfig::default();
    cfg.release.mode = ReleaseMode::Staggered;
    cfg.release.stagger_percent = 0.0;
    cfg.release.stagger_interval_ms = 0;
    cfg.bloom_batch_size = 0;
    let errs = EffectConfig::Gravity(cfg).validate().unwrap_err();
    let map = errs.field_messages();
    assert!(map.contains_key("release.staggerPercent"));
    assert!(map.contains_key("release.staggerIntervalMs"));
    assert!(map.contains_key("bloomBatchSize"));
}

#[test]
fn staggered_fields_are_ignored_when_releasing_all() {
    let mut cfg = GravityConfig::default();
    cfg.release.stagger_percent = -5.0;
    cfg.validate().unwrap();
}

#[test]
fn explosion_stagger_must_leave_room_for_motion() {
    let cfg = ExplosionConfig {
        stagger: 1.0,
        ..ExplosionConfig::default()
    };
    assert!(cfg.validate().unwrap_err().has_field("stagger"));
}

#[test]
fn first_message_wins_per_field() {
    let errs = ConfigErrors {
        errors: vec![
            ConfigError::at(&[ConfigPathElem::Field("a")], "first"),
            ConfigError::at(&[ConfigPathElem::Field("a")], "second"),
        ],
    };
    assert_eq!(errs.field_messages()["a"], "first");
}
