//! Shared effect state machine, transition guards and the pause-aware playback clock.

use crate::config::model::EffectKind;

/// Lifecycle state of an effect instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectState {
    /// Ready to play; also entered when a non-looping run completes.
    #[default]
    Idle,
    /// Advancing on every tick.
    Playing,
    /// Frozen; the clock excludes the paused span.
    Paused,
    /// Halted by the caller; external state restored.
    Stopped,
    /// Terminal.
    Disposed,
}

/// A lifecycle call subject to a guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// `init(ctx)`.
    Init,
    /// `play()`.
    Play,
    /// `pause()`.
    Pause,
    /// `resume()`.
    Resume,
    /// `stop()`.
    Stop,
    /// `tick(time)`.
    Tick,
    /// `dispose()`.
    Dispose,
}

impl Transition {
    /// Method name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Tick => "tick",
            Self::Dispose => "dispose",
        }
    }
}

impl EffectState {
    /// Guard predicate: whether `transition` is legal from this state.
    pub fn allows(self, transition: Transition) -> bool {
        use EffectState::*;
        match transition {
            Transition::Init => matches!(self, Idle | Stopped),
            Transition::Play => matches!(self, Idle | Stopped | Paused),
            Transition::Pause => self == Playing,
            Transition::Resume => self == Paused,
            Transition::Stop => matches!(self, Playing | Paused),
            Transition::Tick => self == Playing,
            Transition::Dispose => self != Disposed,
        }
    }

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Disposed => "disposed",
        }
    }
}

/// Elapsed run time derived from host timestamps.
///
/// The first [`PlaybackClock::advance`] after a restart or resume anchors the clock, so paused
/// spans never count and no wall clock is read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackClock {
    banked: f64,
    anchor: Option<f64>,
    elapsed: f64,
}

impl PlaybackClock {
    /// Reset to zero; the next advance anchors.
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    /// Freeze at the last observed elapsed time.
    pub fn suspend(&mut self) {
        self.banked = self.elapsed;
        self.anchor = None;
    }

    /// Advance to host time `time_secs`; returns `(elapsed, delta since last advance)`.
    pub fn advance(&mut self, time_secs: f64) -> (f64, f64) {
        if !time_secs.is_finite() {
            return (self.elapsed, 0.0);
        }
        let anchor = *self.anchor.get_or_insert(time_secs);
        let elapsed = (self.banked + (time_secs - anchor)).max(self.elapsed);
        let delta = elapsed - self.elapsed;
        self.elapsed = elapsed;
        (elapsed, delta)
    }

    /// Last observed elapsed time.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// State, clock and completion callback shared by every concrete effect.
pub(crate) struct Lifecycle {
    kind: EffectKind,
    state: EffectState,
    clock: PlaybackClock,
    on_complete: Option<Box<dyn FnMut()>>,
    completions: u32,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("has_on_complete", &self.on_complete.is_some())
            .field("completions", &self.completions)
            .finish()
    }
}

impl Lifecycle {
    pub(crate) fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            state: EffectState::Idle,
            clock: PlaybackClock::default(),
            on_complete: None,
            completions: 0,
        }
    }

    pub(crate) fn state(&self) -> EffectState {
        self.state
    }

    /// Check the guard, logging rejected calls.
    pub(crate) fn check(&self, transition: Transition) -> bool {
        let ok = self.state.allows(transition);
        if !ok && transition != Transition::Tick {
            tracing::info!(
                effect = self.kind.name(),
                state = self.state.name(),
                call = transition.name(),
                "ignored lifecycle call"
            );
        }
        ok
    }

    pub(crate) fn enter(&mut self, state: EffectState) {
        if state != self.state {
            tracing::debug!(
                effect = self.kind.name(),
                from = self.state.name(),
                to = state.name(),
                "effect state"
            );
        }
        self.state = state;
    }

    /// Enter `Playing` from a fresh run.
    pub(crate) fn start(&mut self) {
        self.clock.restart();
        self.completions = 0;
        self.enter(EffectState::Playing);
    }

    pub(crate) fn pause(&mut self) {
        self.clock.suspend();
        self.enter(EffectState::Paused);
    }

    /// Leave `Paused`; the next tick re-anchors the clock.
    pub(crate) fn resume(&mut self) {
        self.enter(EffectState::Playing);
    }

    pub(crate) fn advance(&mut self, time_secs: f64) -> (f64, f64) {
        self.clock.advance(time_secs)
    }

    pub(crate) fn set_on_complete(&mut self, callback: Box<dyn FnMut()>) {
        self.on_complete = Some(callback);
    }

    /// Fire the completion callback for the first completed cycle of a run.
    pub(crate) fn cycle_completed(&mut self) {
        self.completions += 1;
        if self.completions == 1 {
            tracing::info!(effect = self.kind.name(), "effect completed");
            if let Some(cb) = self.on_complete.as_mut() {
                cb();
            }
        }
    }

    /// Natural end of a non-looping run.
    pub(crate) fn finish(&mut self) {
        self.cycle_completed();
        self.enter(EffectState::Idle);
    }

    pub(crate) fn dispose(&mut self) {
        self.on_complete = None;
        self.enter(EffectState::Disposed);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/lifecycle.rs"]
mod tests;
