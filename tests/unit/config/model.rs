use super::*;
use crate::config::model::{OrbitKeyframe, PathMode};

#[test]
fn defaults_validate() {
    RevealConfig::default().validate().unwrap();
    ExplosionConfig::default().validate().unwrap();
    TurntableConfig::default().validate().unwrap();
    OrbitConfig::default().validate().unwrap();
    GravityConfig::default().validate().unwrap();
}

#[test]
fn tagged_json_uses_camel_case_and_schema_version() {
    let cfg = EffectConfig::Reveal(RevealConfig {
        looped: true,
        ..RevealConfig::default()
    });
    let v: serde_json::Value = serde_json::from_str(&cfg.to_json().unwrap()).unwrap();
    assert_eq!(v["effect"], "reveal");
    assert_eq!(v["schemaVersion"], 1);
    assert_eq!(v["durationSec"], 5.0);
    assert_eq!(v["loop"], true);
    assert_eq!(v["ease"], "easeInOut");
}

#[test]
fn missing_fields_take_defaults() {
    let cfg = EffectConfig::from_json(r#"{ "effect": "gravity", "durationSec": 8 }"#).unwrap();
    let EffectConfig::Gravity(g) = cfg else {
        panic!("expected gravity config");
    };
    assert_eq!(g.duration_sec, 8.0);
    assert_eq!(g.half_duration(), 4.0);
    assert_eq!(g.bloom_batch_size, 24);
    assert_eq!(g.bloom_interval_ms, 80);
    assert_eq!(g.loop_hold_ms, 1200);
    assert_eq!(g.schema_version, SCHEMA_VERSION);
}

#[test]
fn unknown_easing_is_a_serde_error() {
    let err = EffectConfig::from_json(r#"{ "effect": "reveal", "ease": "wobble" }"#).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn orbit_keyframes_round_trip() {
    let cfg = EffectConfig::Orbit(OrbitConfig {
        keyframes: vec![
            OrbitKeyframe::at(DVec3::new(5.0, 1.0, 0.0)),
            OrbitKeyframe {
                target: Some(DVec3::ZERO),
                fov: Some(40.0),
                pause_sec: 1.5,
                ease_into_next: true,
                ..OrbitKeyframe::at(DVec3::new(0.0, 1.0, 5.0))
            },
        ],
        mode: PathMode::Free,
        ..OrbitConfig::default()
    });
    let back = EffectConfig::from_json(&cfg.to_json().unwrap()).unwrap();
    assert_eq!(back, cfg);
    assert_eq!(back.kind(), EffectKind::Orbit);
}

#[test]
fn gravity_presets_map_to_vectors() {
    let mut g = GravityConfig::default();
    assert_eq!(g.gravity_vector(), DVec3::new(0.0, -9.81, 0.0));
    g.gravity = GravityPreset::Moon;
    assert_eq!(g.gravity_magnitude(), 1.62);
    g.gravity = GravityPreset::ZeroG;
    assert_eq!(g.gravity_magnitude(), 0.0);
    g.gravity = GravityPreset::Custom;
    g.custom_gravity = 3.0;
    assert_eq!(g.gravity_vector(), DVec3::new(0.0, -3.0, 0.0));
}
