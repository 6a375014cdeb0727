use super::*;
use crate::scene::graph::SceneGraph;
use crate::scene::memory::InMemoryScene;
use std::cell::RefCell;
use std::rc::Rc;

fn two_pieces() -> Rc<RefCell<InMemoryScene>> {
    let mut scene = InMemoryScene::new();
    scene.add_piece("high", &[DVec3::new(1.0, 2.5, 0.0)], 0.5);
    scene.add_piece("low", &[DVec3::new(-1.0, 0.5, 0.0)], 0.5);
    Rc::new(RefCell::new(scene))
}

fn config() -> ExplosionConfig {
    ExplosionConfig {
        duration_sec: 4.0,
        ease: Ease::Linear,
        explosion_factor: 2.0,
        stagger: 0.5,
        ..ExplosionConfig::default()
    }
}

fn position(scene: &InMemoryScene, name: &str) -> DVec3 {
    let id = scene.find(name).unwrap();
    scene.world_pose(id).unwrap().position
}

fn close(a: DVec3, b: DVec3) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn separation_is_out_then_back() {
    for rank in 0..3 {
        assert_eq!(separation(0.0, rank, rank, 3, 0.4, Ease::EaseInOut), 0.0);
        assert_eq!(separation(0.5, rank, 2 - rank, 3, 0.4, Ease::EaseInOut), 1.0);
        assert_eq!(separation(1.0, rank, rank, 3, 0.4, Ease::EaseInOut), 0.0);
    }
    // Rank 0 leaves before rank 2.
    let early = separation(0.15, 0, 0, 3, 0.4, Ease::Linear);
    let late = separation(0.15, 2, 0, 3, 0.4, Ease::Linear);
    assert!(early > late, "{early} vs {late}");
    // Rank 0 returns before rank 2.
    let first = separation(0.7, 0, 0, 3, 0.4, Ease::Linear);
    let last = separation(0.7, 0, 2, 3, 0.4, Ease::Linear);
    assert!(first < last, "{first} vs {last}");
}

#[test]
fn top_piece_leaves_first_and_everything_returns() {
    let scene = two_pieces();
    let mut fx = ExplosionEffect::new(config());
    fx.init(EffectContext::new().with_scene(scene.clone()))
        .unwrap();
    fx.play().unwrap();
    fx.tick(0.0).unwrap();

    fx.tick(1.0).unwrap();
    {
        let s = scene.borrow();
        assert!(close(position(&s, "high"), DVec3::new(3.0, 4.5, 0.0)));
        assert!(close(position(&s, "low"), DVec3::new(-1.0, 0.5, 0.0)));
    }

    fx.tick(2.0).unwrap();
    {
        let s = scene.borrow();
        assert!(close(position(&s, "high"), DVec3::new(3.0, 4.5, 0.0)));
        assert!(close(position(&s, "low"), DVec3::new(-3.0, -1.5, 0.0)));
    }

    // Second half: the low piece is home first.
    fx.tick(3.0).unwrap();
    {
        let s = scene.borrow();
        assert!(close(position(&s, "low"), DVec3::new(-1.0, 0.5, 0.0)));
        assert!(close(position(&s, "high"), DVec3::new(3.0, 4.5, 0.0)));
    }

    fx.tick(4.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);
    let s = scene.borrow();
    assert!(close(position(&s, "high"), DVec3::new(1.0, 2.5, 0.0)));
    assert!(close(position(&s, "low"), DVec3::new(-1.0, 0.5, 0.0)));
}

#[test]
fn spin_rotates_pieces_about_their_centroid() {
    let scene = two_pieces();
    let mut fx = ExplosionEffect::new(ExplosionConfig {
        rotation_deg: 90.0,
        stagger: 0.0,
        ..config()
    });
    fx.init(EffectContext::new().with_scene(scene.clone()))
        .unwrap();
    fx.play().unwrap();
    fx.tick(0.0).unwrap();
    fx.tick(2.0).unwrap();
    let s = scene.borrow();
    let id = s.find("high").unwrap();
    let pose = s.world_pose(id).unwrap();
    let expected = DQuat::from_rotation_y(90f64.to_radians());
    assert!(pose.rotation.angle_between(expected) < 1e-9);
    assert!(close(pose.position, DVec3::new(3.0, 4.5, 0.0)));
}

#[test]
fn stop_puts_pieces_back() {
    let scene = two_pieces();
    let before = scene.borrow().snapshot();
    let mut fx = ExplosionEffect::new(config());
    fx.init(EffectContext::new().with_scene(scene.clone()))
        .unwrap();
    fx.play().unwrap();
    fx.tick(0.0).unwrap();
    fx.tick(1.5).unwrap();
    assert!(fx.stop());
    assert_eq!(scene.borrow().snapshot(), before);
}

#[test]
fn set_config_of_config_is_identity() {
    let mut fx = ExplosionEffect::new(config());
    let once = fx.config();
    fx.set_config(&fx.config());
    assert_eq!(fx.config(), once);
}

#[test]
fn running_explosion_ignores_config_changes() {
    let scene = two_pieces();
    let mut fx = ExplosionEffect::new(config());
    fx.init(EffectContext::new().with_scene(scene.clone()))
        .unwrap();
    fx.play().unwrap();
    fx.tick(0.0).unwrap();
    fx.tick(1.0).unwrap();

    fx.set_config(&ExplosionConfig {
        duration_sec: 8.0,
        stagger: 0.0,
        rotation_deg: 180.0,
        ..config()
    });
    fx.tick(2.0).unwrap();
    {
        let s = scene.borrow();
        assert!(close(position(&s, "high"), DVec3::new(3.0, 4.5, 0.0)));
        assert!(close(position(&s, "low"), DVec3::new(-3.0, -1.5, 0.0)));
        let id = s.find("high").unwrap();
        assert!(s.world_pose(id).unwrap().rotation.angle_between(DQuat::IDENTITY) < 1e-9);
    }
    fx.tick(4.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);

    // The next run picks up the new duration.
    fx.play().unwrap();
    fx.tick(10.0).unwrap();
    fx.tick(14.0).unwrap();
    assert_eq!(fx.state(), EffectState::Playing);
    fx.tick(18.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);
}
