use super::*;

fn ring(deg: f64, radius: f64) -> DVec3 {
    let a = deg.to_radians();
    DVec3::new(radius * a.cos(), 0.0, radius * a.sin())
}

fn opts(duration: f64, mode: PathMode, looped: bool) -> PathOptions {
    PathOptions {
        duration,
        looped,
        samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
        mode,
        center: DVec3::ZERO,
        default_fov: 50.0,
    }
}

fn assert_close(a: DVec3, b: DVec3, tol: f64) {
    assert!(a.distance(b) <= tol, "{a:?} vs {b:?}");
}

#[test]
fn arc_length_table_inverts_nonuniform_parametrization() {
    let table = ArcLengthTable::build(256, |u| DVec3::new(u * u, 0.0, 0.0));
    assert!((table.length() - 1.0).abs() < 1e-12);
    assert!(table.distances().windows(2).all(|w| w[0] <= w[1]));
    assert!((table.u_at(0.25) - 0.5).abs() < 1e-3);
    assert_eq!(table.u_at(-1.0), 0.0);
    assert_eq!(table.u_at(5.0), 1.0);
}

#[test]
fn fewer_than_two_keyframes_builds_nothing() {
    let o = opts(5.0, PathMode::Locked, false);
    assert!(CameraPath::build(&[], &o).is_none());
    assert!(CameraPath::build(&[OrbitKeyframe::at(ring(0.0, 5.0))], &o).is_none());
}

#[test]
fn pause_holds_exact_keyframe_position() {
    let mut kfs = vec![
        OrbitKeyframe::at(ring(0.0, 5.0)),
        OrbitKeyframe::at(ring(90.0, 5.0)),
        OrbitKeyframe::at(ring(180.0, 5.0)),
    ];
    kfs[1].pause_sec = 2.0;
    let path = CameraPath::build(&kfs, &opts(10.0, PathMode::Locked, false)).unwrap();

    assert!((path.total_pause() - 2.0).abs() < 1e-12);
    let seg = &path.segments()[0];
    assert!((seg.move_duration - 4.0).abs() < 1e-9);
    assert!((seg.pause - 2.0).abs() < 1e-9);

    for t in [4.001, 4.5, 5.0, 5.999] {
        assert_eq!(path.sample(t).position, kfs[1].position, "t = {t}");
    }
    assert!(path.sample(6.5).position.distance(kfs[1].position) > 1e-3);
    assert_eq!(path.sample(10.0).position, kfs[2].position);
}

#[test]
fn timeline_ends_at_duration() {
    for duration in [1.0, 7.5, 30.0] {
        for count in 2..=6 {
            for looped in [false, true] {
                let kfs: Vec<OrbitKeyframe> = (0..count)
                    .map(|i| {
                        let mut k = OrbitKeyframe::at(ring(i as f64 * 50.0, 4.0 + i as f64));
                        k.pause_sec = (i % 3) as f64 * 0.2;
                        k
                    })
                    .collect();
                let path =
                    CameraPath::build(&kfs, &opts(duration, PathMode::Locked, looped)).unwrap();
                assert!(
                    (path.timeline_end() - duration).abs() < 1e-9,
                    "D={duration} n={count} loop={looped}"
                );
                let mut t = 0.0;
                for s in path.segments() {
                    assert!((s.time_start - t).abs() < 1e-9);
                    t = s.time_end();
                }
            }
        }
    }
}

#[test]
fn pauses_longer_than_duration_are_scaled_down() {
    let kfs: Vec<OrbitKeyframe> = (0..3)
        .map(|i| {
            let mut k = OrbitKeyframe::at(ring(i as f64 * 90.0, 5.0));
            k.pause_sec = 5.0;
            k
        })
        .collect();
    let path = CameraPath::build(&kfs, &opts(4.0, PathMode::Locked, false)).unwrap();
    assert_eq!(path.speed(), 0.0);
    assert!((path.timeline_end() - 4.0).abs() < 1e-9);
    assert!(path.segments().iter().all(|s| s.move_duration == 0.0));
}

#[test]
fn speed_is_constant_across_segments() {
    let kfs = vec![
        OrbitKeyframe::at(DVec3::new(5.0, 0.0, 0.0)),
        OrbitKeyframe::at(DVec3::new(0.0, 1.0, 3.0)),
        OrbitKeyframe::at(DVec3::new(-6.0, 2.0, 0.0)),
        OrbitKeyframe::at(DVec3::new(0.0, 0.0, -4.0)),
    ];
    let path = CameraPath::build(&kfs, &opts(8.0, PathMode::Locked, false)).unwrap();
    let expected = path.total_length() / 8.0;
    assert!((path.speed() - expected).abs() < 1e-9);

    let h = 0.1;
    let sub = 20;
    let mut t = 0.0;
    while t + h <= 8.0 {
        let mut dist = 0.0;
        let mut prev = path.sample(t).position;
        for k in 1..=sub {
            let p = path.sample(t + h * k as f64 / sub as f64).position;
            dist += p.distance(prev);
            prev = p;
        }
        let v = dist / h;
        assert!((v / expected - 1.0).abs() < 0.02, "t={t} v={v} expected={expected}");
        t += h;
    }
}

#[test]
fn azimuth_sweeps_monotonically_counter_clockwise() {
    let kfs: Vec<OrbitKeyframe> = [0.0, 90.0, 180.0, 270.0]
        .iter()
        .map(|&d| OrbitKeyframe::at(ring(d, 5.0)))
        .collect();
    let path = CameraPath::build(&kfs, &opts(3.0, PathMode::Locked, false)).unwrap();
    assert_close(path.sample(2.5).position, ring(225.0, 5.0), 1e-3);
    assert_close(path.sample(0.5).position, ring(45.0, 5.0), 1e-3);
}

#[test]
fn azimuth_follows_clockwise_first_turn() {
    let kfs: Vec<OrbitKeyframe> = [0.0, -90.0, 180.0, 90.0]
        .iter()
        .map(|&d| OrbitKeyframe::at(ring(d, 5.0)))
        .collect();
    let path = CameraPath::build(&kfs, &opts(3.0, PathMode::Locked, false)).unwrap();
    assert_close(path.sample(0.5).position, ring(-45.0, 5.0), 1e-3);
    assert_close(path.sample(1.5).position, ring(-135.0, 5.0), 1e-3);
    assert_close(path.sample(2.5).position, ring(135.0, 5.0), 1e-3);
}

#[test]
fn seam_segment_has_no_pause() {
    let mut kfs = vec![
        OrbitKeyframe::at(ring(0.0, 5.0)),
        OrbitKeyframe::at(ring(120.0, 5.0)),
        OrbitKeyframe::at(ring(240.0, 5.0)),
    ];
    kfs[0].pause_sec = 3.0;
    let path = CameraPath::build(&kfs, &opts(6.0, PathMode::Locked, true)).unwrap();
    let seam = path.segments().last().unwrap();
    assert!(seam.seam);
    assert_eq!((seam.from, seam.to), (2, 0));
    assert_eq!(seam.pause, 0.0);
    assert_eq!(path.total_pause(), 0.0);
    assert_eq!(path.segments().len(), 3);
    // The seam keeps sweeping the same way round.
    assert_close(path.sample(5.0).position, ring(300.0, 5.0), 1e-3);
}

#[test]
fn zero_length_segment_takes_no_time() {
    let kfs = vec![
        OrbitKeyframe::at(ring(0.0, 5.0)),
        OrbitKeyframe::at(ring(0.0, 5.0)),
        OrbitKeyframe::at(ring(90.0, 5.0)),
    ];
    let path = CameraPath::build(&kfs, &opts(4.0, PathMode::Locked, false)).unwrap();
    assert_eq!(path.segments()[0].length, 0.0);
    assert_eq!(path.segments()[0].move_duration, 0.0);
    assert!((path.segments()[1].move_duration - 4.0).abs() < 1e-9);
    assert_close(path.sample(0.0).position, ring(0.0, 5.0), 1e-9);
    assert_close(path.sample(2.0).position, ring(45.0, 5.0), 1e-3);
}

#[test]
fn fov_and_target_interpolate_between_keyframes() {
    let mut a = OrbitKeyframe::at(DVec3::new(0.0, 0.0, 5.0));
    a.fov = Some(40.0);
    a.target = Some(DVec3::ZERO);
    let mut b = OrbitKeyframe::at(DVec3::new(4.0, 0.0, 5.0));
    b.fov = Some(60.0);
    b.target = Some(DVec3::new(2.0, 0.0, 0.0));
    let path = CameraPath::build(&[a, b], &opts(2.0, PathMode::Free, false)).unwrap();
    let mid = path.sample(1.0);
    assert!((mid.fov - 50.0).abs() < 1e-6);
    assert_close(mid.target, DVec3::new(1.0, 0.0, 0.0), 1e-6);
    assert_close(mid.position, DVec3::new(2.0, 0.0, 5.0), 1e-6);
}

#[test]
fn missing_fov_and_target_fall_back_to_defaults() {
    let kfs = vec![
        OrbitKeyframe::at(DVec3::new(0.0, 0.0, 5.0)),
        OrbitKeyframe::at(DVec3::new(4.0, 0.0, 5.0)),
    ];
    let mut o = opts(2.0, PathMode::Free, false);
    o.center = DVec3::new(0.0, 1.0, 0.0);
    let path = CameraPath::build(&kfs, &o).unwrap();
    let pose = path.keyframe_pose(1);
    assert_eq!(pose.fov, 50.0);
    assert_eq!(pose.target, DVec3::new(0.0, 1.0, 0.0));
}

#[test]
fn ease_into_next_eases_segment_time() {
    let mut a = OrbitKeyframe::at(DVec3::ZERO);
    a.ease_into_next = true;
    let b = OrbitKeyframe::at(DVec3::new(4.0, 0.0, 0.0));
    let path = CameraPath::build(&[a, b], &opts(2.0, PathMode::Free, false)).unwrap();
    assert!(path.sample(0.5).position.x < 1.0);
    assert!((path.sample(1.0).position.x - 2.0).abs() < 1e-6);
    assert!(path.sample(1.5).position.x > 3.0);
}
