use super::*;

fn world() -> RapierSolver {
    let mut s = RapierSolver::new();
    s.ensure_loaded().unwrap();
    s.create_world(DVec3::new(0.0, -9.81, 0.0)).unwrap();
    s
}

#[test]
fn ball_falls_under_gravity() {
    let mut s = world();
    let b = s
        .create_body(BodyKind::Dynamic, Pose::from_position(DVec3::new(0.0, 5.0, 0.0)))
        .unwrap();
    s.create_collider(b, &ColliderDesc::new(ColliderShape::Ball { radius: 0.5 }, 0.5, 0.0))
        .unwrap();
    for _ in 0..30 {
        s.step(1.0 / 60.0);
    }
    assert!(s.translation(b).unwrap().y < 4.0);
    assert!(s.mass(b) > 0.0);
}

#[test]
fn sensor_and_friction_round_trip() {
    let mut s = world();
    let g = s.create_body(BodyKind::Fixed, Pose::IDENTITY).unwrap();
    let c = s
        .create_collider(
            g,
            &ColliderDesc::new(
                ColliderShape::Cuboid {
                    half_extents: DVec3::new(5.0, 0.5, 5.0),
                },
                0.6,
                0.1,
            ),
        )
        .unwrap();
    s.set_sensor(c, true);
    assert_eq!(s.is_sensor(c), Some(true));
    s.set_collider_friction(c, 0.25);
    assert_eq!(s.collider_friction(c), Some(0.25));
}

#[test]
fn joints_can_be_removed_twice() {
    let mut s = world();
    let a = s.create_body(BodyKind::Dynamic, Pose::IDENTITY).unwrap();
    let b = s
        .create_body(BodyKind::Dynamic, Pose::from_position(DVec3::X))
        .unwrap();
    let j = s.create_fixed_joint(a, b).unwrap();
    s.remove_joint(j);
    s.remove_joint(j);
    s.free_world();
    assert!(!s.has_world());
}
