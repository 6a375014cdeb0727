use super::*;
use std::cell::Cell;
use std::rc::Rc;

const ALL: [EffectState; 5] = [
    EffectState::Idle,
    EffectState::Playing,
    EffectState::Paused,
    EffectState::Stopped,
    EffectState::Disposed,
];

#[test]
fn guard_table_matches_the_state_machine() {
    let legal = |s: EffectState| -> Vec<Transition> {
        [
            Transition::Init,
            Transition::Play,
            Transition::Pause,
            Transition::Resume,
            Transition::Stop,
            Transition::Tick,
            Transition::Dispose,
        ]
        .into_iter()
        .filter(|t| s.allows(*t))
        .collect()
    };
    assert_eq!(
        legal(EffectState::Idle),
        vec![Transition::Init, Transition::Play, Transition::Dispose]
    );
    assert_eq!(
        legal(EffectState::Playing),
        vec![
            Transition::Pause,
            Transition::Stop,
            Transition::Tick,
            Transition::Dispose
        ]
    );
    assert_eq!(
        legal(EffectState::Paused),
        vec![
            Transition::Play,
            Transition::Resume,
            Transition::Stop,
            Transition::Dispose
        ]
    );
    assert_eq!(
        legal(EffectState::Stopped),
        vec![Transition::Init, Transition::Play, Transition::Dispose]
    );
    assert!(legal(EffectState::Disposed).is_empty());
}

#[test]
fn only_playing_ticks() {
    for s in ALL {
        assert_eq!(s.allows(Transition::Tick), s == EffectState::Playing, "{s:?}");
    }
}

#[test]
fn clock_anchors_on_first_advance() {
    let mut c = PlaybackClock::default();
    assert_eq!(c.advance(100.0), (0.0, 0.0));
    let (e, d) = c.advance(100.5);
    assert!((e - 0.5).abs() < 1e-12);
    assert!((d - 0.5).abs() < 1e-12);
}

#[test]
fn clock_excludes_paused_span() {
    let mut c = PlaybackClock::default();
    c.advance(0.0);
    c.advance(1.0);
    c.suspend();
    // Host time keeps running while paused.
    let (e, d) = c.advance(11.0);
    assert_eq!((e, d), (1.0, 0.0));
    let (e, d) = c.advance(11.25);
    assert!((e - 1.25).abs() < 1e-12);
    assert!((d - 0.25).abs() < 1e-12);
}

#[test]
fn clock_ignores_non_finite_and_backwards_time() {
    let mut c = PlaybackClock::default();
    c.advance(5.0);
    c.advance(6.0);
    assert_eq!(c.advance(f64::NAN), (1.0, 0.0));
    assert_eq!(c.advance(4.0), (1.0, 0.0));
}

#[test]
fn completion_fires_once_per_run() {
    let fired = Rc::new(Cell::new(0));
    let mut life = Lifecycle::new(EffectKind::Reveal);
    let f = fired.clone();
    life.set_on_complete(Box::new(move || f.set(f.get() + 1)));

    life.start();
    life.cycle_completed();
    life.cycle_completed();
    assert_eq!(fired.get(), 1);
    assert_eq!(life.state(), EffectState::Playing);

    life.start();
    life.finish();
    assert_eq!(fired.get(), 2);
    assert_eq!(life.state(), EffectState::Idle);
}

#[test]
fn dispose_drops_the_callback() {
    let fired = Rc::new(Cell::new(0));
    let mut life = Lifecycle::new(EffectKind::Orbit);
    let f = fired.clone();
    life.set_on_complete(Box::new(move || f.set(f.get() + 1)));
    life.dispose();
    life.cycle_completed();
    assert_eq!(fired.get(), 0);
    assert!(!life.check(Transition::Dispose));
}
