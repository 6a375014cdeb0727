use super::*;
use crate::config::model::{GravityConfig, OrbitConfig, RevealConfig};

#[test]
fn create_effect_matches_config_kind() {
    for cfg in [
        EffectConfig::Reveal(RevealConfig::default()),
        EffectConfig::Explosion(Default::default()),
        EffectConfig::Orbit(OrbitConfig::default()),
        EffectConfig::Gravity(GravityConfig::default()),
        EffectConfig::Turntable(Default::default()),
    ] {
        let fx = create_effect(&cfg);
        assert_eq!(fx.kind(), cfg.kind());
        assert_eq!(fx.state(), EffectState::Idle);
        assert_eq!(fx.effect_config(), cfg);
    }
}

#[test]
fn wrong_config_kind_is_rejected() {
    let mut fx = create_effect(&EffectConfig::Gravity(GravityConfig::default()));
    let err = fx
        .set_effect_config(&EffectConfig::Reveal(RevealConfig::default()))
        .unwrap_err();
    assert!(matches!(err, FxError::Validation(_)));
    assert_eq!(fx.kind(), EffectKind::Gravity);
}

#[test]
fn uninitialized_effects_ignore_play() {
    let mut fx = create_effect(&EffectConfig::Reveal(RevealConfig::default()));
    assert!(!fx.play().unwrap());
    assert!(!fx.pause());
    assert!(!fx.resume());
    assert!(!fx.stop());
    fx.tick(1.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);
    assert_eq!(fx.phase_name(), None);
}

#[test]
fn cycle_position_holds_then_wraps() {
    assert_eq!(cycle_position(0.5, 2.0, 1.0), (0.25, 0));
    assert_eq!(cycle_position(2.5, 2.0, 1.0), (1.0, 0));
    assert_eq!(cycle_position(3.0, 2.0, 1.0), (0.0, 1));
    assert_eq!(cycle_position(7.0, 2.0, 1.0), (0.5, 2));
    assert_eq!(cycle_position(1.0, 0.0, 0.0), (1.0, 0));
}
