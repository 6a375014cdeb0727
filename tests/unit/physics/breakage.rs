use super::*;

#[test]
fn levels_scale_and_clamp() {
    assert_eq!(force_threshold(BreakLevel::Medium, 1.0, 9.81), 1.5 * 9.81);
    assert_eq!(force_threshold(BreakLevel::Low, 1000.0, 9.81), 500.0);
    assert_eq!(force_threshold(BreakLevel::High, 0.01, 9.81), 1.0);
    assert_eq!(force_threshold(BreakLevel::Medium, 1.0, 0.0), 2.0);
    assert!(
        force_threshold(BreakLevel::High, 2.0, 9.81) < force_threshold(BreakLevel::Low, 2.0, 9.81)
    );
}

#[test]
fn load_uses_reduced_mass() {
    let est = estimate_load(2.0, 2.0, 0.5, DVec3::new(0.0, 1.0, 0.0), DVec3::ZERO, 0.1);
    assert!((est.force - 10.0).abs() < 1e-12);
    assert_eq!(est.torque, 0.0);
    assert!(est.exceeds(9.0, 0.5));
    assert!(!est.exceeds(11.0, 0.5));
}

#[test]
fn torque_alone_can_break() {
    let est = estimate_load(1.0, 1.0, 1.0, DVec3::ZERO, DVec3::new(0.0, 0.0, 20.0), 0.5);
    assert!((est.torque - 20.0).abs() < 1e-12);
    assert!(est.exceeds(10.0, 1.0));
}

#[test]
fn degenerate_inputs_carry_no_load() {
    assert_eq!(estimate_load(1.0, 1.0, 1.0, DVec3::ONE, DVec3::ONE, 0.0), LoadEstimate::default());
    assert_eq!(estimate_load(0.0, 0.0, 1.0, DVec3::ONE, DVec3::ONE, 0.1), LoadEstimate::default());
}
