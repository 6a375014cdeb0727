use super::*;
use crate::camera::rig::{CameraControls, CameraRig, InMemoryCamera, InMemoryControls};
use crate::config::model::{OrbitKeyframe, PathMode};
use crate::foundation::error::FxError;
use crate::scene::memory::InMemoryScene;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Rig {
    camera: Rc<RefCell<InMemoryCamera>>,
    controls: Rc<RefCell<InMemoryControls>>,
    ctx: EffectContext,
}

fn rig() -> Rig {
    let mut scene = InMemoryScene::new();
    scene.add_piece("only", &[DVec3::new(0.0, 1.0, 0.0)], 0.5);
    let camera = Rc::new(RefCell::new(InMemoryCamera::new(
        DVec3::new(0.0, 1.0, 10.0),
        DVec3::new(0.0, 1.0, 0.0),
        50.0,
    )));
    let controls = Rc::new(RefCell::new(InMemoryControls::default()));
    let ctx = EffectContext::new()
        .with_scene(Rc::new(RefCell::new(scene)))
        .with_camera(camera.clone())
        .with_controls(controls.clone());
    Rig {
        camera,
        controls,
        ctx,
    }
}

fn line(looped: bool) -> OrbitConfig {
    OrbitConfig {
        duration_sec: 4.0,
        looped,
        mode: PathMode::Free,
        keyframes: vec![
            OrbitKeyframe::at(DVec3::new(0.0, 1.0, 5.0)),
            OrbitKeyframe::at(DVec3::new(4.0, 1.0, 5.0)),
        ],
        ..OrbitConfig::default()
    }
}

#[test]
fn fewer_than_two_keyframes_is_a_no_op() {
    let r = rig();
    let mut cfg = line(false);
    cfg.keyframes.truncate(1);
    let mut fx = OrbitEffect::new(cfg);
    fx.init(r.ctx.clone()).unwrap();
    assert!(!fx.play().unwrap());
    assert_eq!(fx.state(), EffectState::Idle);
    assert!(r.controls.borrow().enabled());
    assert_eq!(r.camera.borrow().position(), DVec3::new(0.0, 1.0, 10.0));
}

#[test]
fn runs_along_the_path_with_controls_disabled() {
    let r = rig();
    let mut fx = OrbitEffect::new(line(false));
    fx.init(r.ctx.clone()).unwrap();
    assert_eq!(fx.assembly_center(), DVec3::new(0.0, 1.0, 0.0));
    assert!(fx.play().unwrap());
    assert!(!r.controls.borrow().enabled());

    fx.tick(1.0).unwrap();
    fx.tick(3.0).unwrap();
    let p = r.camera.borrow().position();
    assert!(p.distance(DVec3::new(2.0, 1.0, 5.0)) < 1e-6, "{p}");
    assert_eq!(r.controls.borrow().target(), DVec3::new(0.0, 1.0, 0.0));

    fx.tick(5.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);
    assert_eq!(r.camera.borrow().position(), DVec3::new(4.0, 1.0, 5.0));
    assert!(r.controls.borrow().enabled());
}

#[test]
fn looping_reports_completion_once() {
    let r = rig();
    let mut fx = OrbitEffect::new(line(true));
    let done = Rc::new(Cell::new(0));
    let d = done.clone();
    fx.set_on_complete(Box::new(move || d.set(d.get() + 1)));
    fx.init(r.ctx.clone()).unwrap();
    fx.play().unwrap();
    for i in 0..=120 {
        fx.tick(f64::from(i) * 0.1).unwrap();
    }
    assert_eq!(fx.state(), EffectState::Playing);
    assert_eq!(done.get(), 1);
    assert!(fx.path().unwrap().segments().last().unwrap().seam);
}

#[test]
fn jump_tweens_to_a_keyframe_when_not_playing() {
    let r = rig();
    let mut fx = OrbitEffect::new(OrbitConfig {
        jump_duration_ms: 400,
        ..line(false)
    });
    fx.init(r.ctx.clone()).unwrap();
    assert!(!fx.jump_to_keyframe(7));
    assert!(fx.jump_to_keyframe(1));
    assert!(fx.is_jumping());
    assert!(fx.tick_preview(10.0));
    assert!(fx.tick_preview(10.2));
    let mid = r.camera.borrow().position();
    assert!(mid.distance(DVec3::new(2.0, 1.0, 7.5)) < 1e-9, "{mid}");
    assert!(!fx.tick_preview(10.4));
    assert_eq!(r.camera.borrow().position(), DVec3::new(4.0, 1.0, 5.0));
    assert!(!fx.is_jumping());

    fx.play().unwrap();
    assert!(!fx.jump_to_keyframe(0));
}

#[test]
fn dispose_cancels_the_jump_and_restores_the_camera() {
    let r = rig();
    let mut fx = OrbitEffect::new(line(false));
    fx.init(r.ctx.clone()).unwrap();
    fx.play().unwrap();
    fx.tick(0.0).unwrap();
    fx.tick(1.0).unwrap();
    fx.stop();
    assert!(fx.jump_to_keyframe(1));
    fx.dispose();
    assert!(!fx.tick_preview(1.0));
    assert_eq!(r.camera.borrow().position(), DVec3::new(0.0, 1.0, 10.0));
    assert!(r.controls.borrow().enabled());
    fx.dispose();
    assert_eq!(fx.state(), EffectState::Disposed);
}

#[test]
fn init_requires_scene_and_camera() {
    let mut fx = OrbitEffect::new(line(false));
    let scene_only =
        EffectContext::new().with_scene(Rc::new(RefCell::new(InMemoryScene::new())));
    assert!(matches!(
        fx.init(scene_only),
        Err(FxError::MissingCollaborator("camera"))
    ));
}

#[test]
fn set_config_of_config_is_identity() {
    let mut fx = OrbitEffect::new(line(true));
    let once = fx.config();
    fx.set_config(&fx.config());
    assert_eq!(fx.config(), once);
}

#[test]
fn running_orbit_keeps_its_duration_after_set_config() {
    let r = rig();
    let mut fx = OrbitEffect::new(line(false));
    fx.init(r.ctx.clone()).unwrap();
    fx.play().unwrap();
    fx.tick(1.0).unwrap();

    fx.set_config(&OrbitConfig {
        duration_sec: 20.0,
        ..line(true)
    });
    fx.tick(3.0).unwrap();
    let p = r.camera.borrow().position();
    assert!(p.distance(DVec3::new(2.0, 1.0, 5.0)) < 1e-6, "{p}");

    fx.tick(5.0).unwrap();
    assert_eq!(fx.state(), EffectState::Idle);
    assert_eq!(r.camera.borrow().position(), DVec3::new(4.0, 1.0, 5.0));
    assert!(r.controls.borrow().enabled());

    // The next run is looped and five times slower.
    fx.play().unwrap();
    fx.tick(10.0).unwrap();
    fx.tick(15.0).unwrap();
    assert_eq!(fx.state(), EffectState::Playing);
    assert!(fx.path().unwrap().segments().last().unwrap().seam);
    assert!(!r.controls.borrow().enabled());
}
