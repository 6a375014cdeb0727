use super::*;
use crate::scene::memory::InMemoryScene;

fn two_piece_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::new();
    let (_, a) = scene.add_piece(
        "A",
        &[DVec3::new(0.0, 0.5, 0.0), DVec3::new(1.0, 0.5, 0.0)],
        0.5,
    );
    scene.add_bond(a[0], a[1]);
    scene.add_piece("B", &[DVec3::new(0.5, 1.5, 0.0)], 0.5);
    scene.add_sphere("loose", DVec3::new(3.0, 0.5, 0.0), 0.25);
    scene
}

#[test]
fn derives_pieces_bounds_and_offsets() {
    let scene = two_piece_scene();
    let asm = Assembly::from_scene(&scene).unwrap();
    assert_eq!(asm.pieces.len(), 3);
    assert_eq!(asm.sphere_count(), 4);

    let a = &asm.pieces[0];
    assert_eq!(a.id, "A");
    assert_eq!(a.bounds.min, DVec3::new(-0.5, 0.0, -0.5));
    assert_eq!(a.bounds.max, DVec3::new(1.5, 1.0, 0.5));
    assert_eq!(a.spheres[1].local_offset, DVec3::new(0.5, 0.0, 0.0));
    assert_eq!(a.centroid(), DVec3::new(0.5, 0.5, 0.0));
}

#[test]
fn orphan_spheres_become_single_sphere_pieces() {
    let scene = two_piece_scene();
    let asm = Assembly::from_scene(&scene).unwrap();
    let loose = asm.pieces.iter().find(|p| p.id == "loose").unwrap();
    assert_eq!(loose.spheres.len(), 1);
    assert_eq!(loose.node, loose.spheres[0].node);
    assert_eq!(loose.bounds.min.y, 0.25);
}

#[test]
fn bonds_resolve_to_piece_and_sphere_indices() {
    let scene = two_piece_scene();
    let asm = Assembly::from_scene(&scene).unwrap();
    assert_eq!(asm.bonds.len(), 1);
    assert_eq!(asm.bonds[0].a, (0, 0));
    assert_eq!(asm.bonds[0].b, (0, 1));
}

#[test]
fn empty_groups_are_skipped() {
    let mut scene = InMemoryScene::new();
    scene.add_piece("empty", &[], 0.5);
    scene.add_piece("A", &[DVec3::ZERO], 0.5);
    let asm = Assembly::from_scene(&scene).unwrap();
    assert_eq!(asm.pieces.len(), 1);
    assert_eq!(asm.pieces[0].id, "A");
}

#[test]
fn restore_poses_undoes_writes() {
    let mut scene = two_piece_scene();
    let asm = Assembly::from_scene(&scene).unwrap();
    let before = scene.snapshot();
    scene.set_world_pose(asm.pieces[0].node, Pose::from_position(DVec3::splat(9.0)));
    scene.set_world_pose(asm.pieces[2].node, Pose::from_position(DVec3::splat(-9.0)));
    asm.restore_poses(&mut scene);
    for (b, a) in before.iter().zip(scene.snapshot()) {
        assert!((b.pose.position - a.pose.position).length() < 1e-12, "{}", b.name);
    }
}

#[test]
fn snapshot_restores_pose_visibility_and_opacity() {
    let mut scene = two_piece_scene();
    let asm = Assembly::from_scene(&scene).unwrap();
    let snap = SceneSnapshot::capture(&asm, &scene);
    // 3 piece nodes (A, B, loose), 3 grouped spheres (two in A, one in B), 1 bond.
    assert_eq!(snap.len(), 7);

    let before = scene.snapshot();
    let a = asm.pieces[0].node;
    scene.set_world_pose(a, Pose::from_position(DVec3::new(9.0, 9.0, 9.0)));
    scene.set_visible(asm.pieces[1].node, false);
    scene.set_opacity(asm.bonds[0].node, 0.2);
    assert_ne!(scene.snapshot(), before);

    snap.restore(&mut scene);
    assert_eq!(scene.snapshot(), before);
}
