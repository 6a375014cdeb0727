use super::*;

fn loaded() -> PointSolver {
    let mut s = PointSolver::new();
    s.ensure_loaded().unwrap();
    s.create_world(DVec3::new(0.0, -9.81, 0.0)).unwrap();
    s
}

fn ground(s: &mut PointSolver) -> ColliderHandle {
    let g = s
        .create_body(BodyKind::Fixed, Pose::from_position(DVec3::new(0.0, -0.5, 0.0)))
        .unwrap();
    s.create_collider(
        g,
        &ColliderDesc::new(
            ColliderShape::Cuboid {
                half_extents: DVec3::new(20.0, 0.5, 20.0),
            },
            0.6,
            0.1,
        ),
    )
    .unwrap()
}

fn ball(s: &mut PointSolver, at: DVec3) -> BodyHandle {
    let b = s.create_body(BodyKind::Dynamic, Pose::from_position(at)).unwrap();
    s.create_collider(b, &ColliderDesc::new(ColliderShape::Ball { radius: 0.5 }, 0.6, 0.1))
        .unwrap();
    b
}

fn run(s: &mut PointSolver, seconds: f64) {
    let steps = (seconds * 60.0).round() as usize;
    for _ in 0..steps {
        s.step(1.0 / 60.0);
    }
}

#[test]
fn unavailable_engine_fails_to_load() {
    let mut s = PointSolver::unavailable("wasm blob missing");
    let err = s.ensure_loaded().unwrap_err();
    assert!(matches!(err, FxError::EngineUnavailable(_)));
    assert!(s.create_world(DVec3::ZERO).is_err());
}

#[test]
fn ball_comes_to_rest_on_ground_and_sleeps() {
    let mut s = loaded();
    ground(&mut s);
    let b = ball(&mut s, DVec3::new(0.0, 2.0, 0.0));
    run(&mut s, 4.0);
    let y = s.translation(b).unwrap().y;
    assert!((y - 0.5).abs() < 0.02, "y = {y}");
    assert!(s.is_sleeping(b));
}

#[test]
fn sensor_ground_lets_bodies_through() {
    let mut s = loaded();
    let g = ground(&mut s);
    s.set_sensor(g, true);
    assert_eq!(s.is_sensor(g), Some(true));
    let b = ball(&mut s, DVec3::new(0.0, 1.0, 0.0));
    run(&mut s, 1.0);
    assert!(s.translation(b).unwrap().y < -1.0);
}

#[test]
fn can_sleep_false_keeps_body_awake() {
    let mut s = loaded();
    ground(&mut s);
    let b = ball(&mut s, DVec3::new(0.0, 0.5, 0.0));
    s.set_can_sleep(b, false);
    run(&mut s, 2.0);
    assert!(!s.is_sleeping(b));
}

#[test]
fn fixed_joint_keeps_offset_until_removed() {
    let mut s = loaded();
    s.set_gravity(DVec3::ZERO);
    let a = ball(&mut s, DVec3::ZERO);
    let b = ball(&mut s, DVec3::new(1.0, 0.0, 0.0));
    let j = s.create_fixed_joint(a, b).unwrap();
    s.set_linvel(a, DVec3::new(0.0, 4.0, 0.0), true);
    run(&mut s, 0.5);
    let offset = s.translation(b).unwrap() - s.translation(a).unwrap();
    assert!((offset - DVec3::X).length() < 1e-9);
    assert!(s.translation(b).unwrap().y > 0.5);

    s.remove_joint(j);
    assert_eq!(s.joint_count(), 0);
    s.set_linvel(a, DVec3::new(0.0, -4.0, 0.0), true);
    s.set_linvel(b, DVec3::ZERO, true);
    run(&mut s, 0.25);
    let offset = s.translation(b).unwrap() - s.translation(a).unwrap();
    assert!(offset.y > 0.9);
}

#[test]
fn joint_to_self_is_rejected() {
    let mut s = loaded();
    let a = ball(&mut s, DVec3::ZERO);
    assert!(matches!(s.create_fixed_joint(a, a), Err(FxError::Physics(_))));
}

#[test]
fn balls_do_not_interpenetrate() {
    let mut s = loaded();
    s.set_gravity(DVec3::ZERO);
    let a = ball(&mut s, DVec3::new(-2.0, 0.0, 0.0));
    let b = ball(&mut s, DVec3::new(2.0, 0.0, 0.0));
    s.set_linvel(a, DVec3::new(3.0, 0.0, 0.0), true);
    s.set_linvel(b, DVec3::new(-3.0, 0.0, 0.0), true);
    for _ in 0..120 {
        s.step(1.0 / 60.0);
        let d = s.translation(a).unwrap().distance(s.translation(b).unwrap());
        assert!(d >= 1.0 - 2e-3, "d = {d}");
    }
    assert!(s.linvel(a).unwrap().x < 0.0);
    assert!(s.linvel(b).unwrap().x > 0.0);
}

#[test]
fn mass_follows_collider_volume() {
    let mut s = loaded();
    let a = ball(&mut s, DVec3::ZERO);
    let expected = 4.0 / 3.0 * std::f64::consts::PI * 0.125;
    assert!((s.mass(a) - expected).abs() < 1e-12);
    let f = s.create_body(BodyKind::Fixed, Pose::IDENTITY).unwrap();
    assert_eq!(s.mass(f), 0.0);
}

#[test]
fn identical_inputs_give_identical_runs() {
    let build = || {
        let mut s = loaded();
        ground(&mut s);
        let bodies: Vec<BodyHandle> = (0..6)
            .map(|i| ball(&mut s, DVec3::new(i as f64 * 0.3, 1.0 + i as f64, 0.1 * i as f64)))
            .collect();
        run(&mut s, 2.0);
        bodies
            .iter()
            .map(|&b| s.translation(b).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(build(), build());
}

#[test]
fn free_world_drops_handles() {
    let mut s = loaded();
    let a = ball(&mut s, DVec3::ZERO);
    s.free_world();
    assert!(!s.has_world());
    assert_eq!(s.translation(a), None);
    assert_eq!(s.body_count(), 0);
    s.step(0.1);
}
