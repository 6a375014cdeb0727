//! Outward separation and staggered reassembly.

use crate::animation::ease::Ease;
use crate::config::model::{EffectConfig, EffectKind, ExplosionConfig};
use crate::effects::context::EffectContext;
use crate::effects::lifecycle::{EffectState, Lifecycle, Transition};
use crate::effects::stage::Stage;
use crate::effects::{Effect, checked, cycle_position, kind_mismatch};
use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::FxResult;
use crate::scene::ordering::piece_order;

/// Separation amount in `[0, 1]` for one piece at run fraction `frac`.
///
/// The first half moves pieces out in `leave_rank` order, the second half brings them back in
/// `return_rank` order. Each piece's start is staggered across `stagger` of its half.
pub fn separation(
    frac: f64,
    leave_rank: usize,
    return_rank: usize,
    count: usize,
    stagger: f64,
    ease: Ease,
) -> f64 {
    let frac = frac.clamp(0.0, 1.0);
    let window = stagger.clamp(0.0, 0.999);
    let slot = |rank: usize| -> f64 {
        if count <= 1 {
            0.0
        } else {
            window * rank as f64 / (count - 1) as f64
        }
    };
    let local =
        |t: f64, rank: usize| -> f64 { ((t - slot(rank)) / (1.0 - window)).clamp(0.0, 1.0) };
    if frac < 0.5 {
        ease.apply(local(frac * 2.0, leave_rank))
    } else {
        1.0 - ease.apply(local(frac * 2.0 - 1.0, return_rank))
    }
}

#[derive(Clone, Debug)]
struct ExplosionRun {
    config: ExplosionConfig,
    /// Per piece: rank when leaving (top first) and when returning (bottom first).
    ranks: Vec<(usize, usize)>,
    offsets: Vec<DVec3>,
    centroids: Vec<DVec3>,
    cycles: u64,
}

/// Pieces fly outward from the assembly centre, then reassemble.
#[derive(Debug)]
pub struct ExplosionEffect {
    config: ExplosionConfig,
    life: Lifecycle,
    stage: Option<Stage>,
    run: Option<ExplosionRun>,
}

impl ExplosionEffect {
    /// Uninitialized effect.
    pub fn new(config: ExplosionConfig) -> Self {
        Self {
            config,
            life: Lifecycle::new(EffectKind::Explosion),
            stage: None,
            run: None,
        }
    }

    /// Replace the config with a copy of `config`. A run in progress keeps the config it
    /// started with.
    pub fn set_config(&mut self, config: &ExplosionConfig) {
        self.config = config.clone();
    }

    /// Copy of the config.
    pub fn config(&self) -> ExplosionConfig {
        self.config.clone()
    }

    fn apply(&self, frac: f64) {
        let (Some(stage), Some(run)) = (self.stage.as_ref(), self.run.as_ref()) else {
            return;
        };
        let count = run.ranks.len();
        for (i, piece) in stage.assembly.pieces.iter().enumerate() {
            let (leave, back) = run.ranks[i];
            let amount = separation(
                frac,
                leave,
                back,
                count,
                run.config.stagger,
                run.config.ease,
            );
            let spin = DQuat::from_rotation_y((run.config.rotation_deg * amount).to_radians());
            let pose = piece.original_pose.rotated_about(run.centroids[i], spin);
            stage.set_piece_pose(
                i,
                Pose::new(pose.position + run.offsets[i] * amount, pose.rotation),
            );
        }
    }
}

impl Effect for ExplosionEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Explosion
    }

    fn state(&self) -> EffectState {
        self.life.state()
    }

    fn init(&mut self, ctx: EffectContext) -> FxResult<()> {
        if !self.life.check(Transition::Init) {
            return Ok(());
        }
        let scene = ctx.require_scene()?;
        if let Some(old) = self.stage.take() {
            old.restore();
        }
        self.stage = Some(Stage::derive(scene)?);
        self.run = None;
        Ok(())
    }

    fn set_effect_config(&mut self, config: &EffectConfig) -> FxResult<()> {
        match config {
            EffectConfig::Explosion(c) => {
                self.set_config(c);
                Ok(())
            }
            other => Err(kind_mismatch(EffectKind::Explosion, other)),
        }
    }

    fn effect_config(&self) -> EffectConfig {
        EffectConfig::Explosion(self.config())
    }

    fn set_on_complete(&mut self, callback: Box<dyn FnMut()>) {
        self.life.set_on_complete(callback);
    }

    fn play(&mut self) -> FxResult<bool> {
        if !self.life.check(Transition::Play) {
            return Ok(false);
        }
        if self.life.state() == EffectState::Paused {
            self.life.resume();
            return Ok(true);
        }
        checked(EffectKind::Explosion, self.config.validate())?;
        let Some(stage) = self.stage.as_ref() else {
            tracing::info!(effect = "explosion", "play before init ignored");
            return Ok(false);
        };
        let pieces = &stage.assembly.pieces;
        let order = piece_order(pieces);
        let n = order.len();
        let mut ranks = vec![(0, 0); n];
        for (rank, &i) in order.iter().enumerate() {
            ranks[i] = (n - 1 - rank, rank);
        }
        let center = stage.assembly.center();
        let centroids: Vec<DVec3> = pieces.iter().map(|p| p.centroid()).collect();
        let offsets = centroids
            .iter()
            .map(|c| (*c - center) * self.config.explosion_factor)
            .collect();
        self.run = Some(ExplosionRun {
            config: self.config.clone(),
            ranks,
            offsets,
            centroids,
            cycles: 0,
        });
        self.apply(0.0);
        self.life.start();
        Ok(true)
    }

    fn pause(&mut self) -> bool {
        if !self.life.check(Transition::Pause) {
            return false;
        }
        self.life.pause();
        true
    }

    fn resume(&mut self) -> bool {
        if !self.life.check(Transition::Resume) {
            return false;
        }
        self.life.resume();
        true
    }

    fn stop(&mut self) -> bool {
        if !self.life.check(Transition::Stop) {
            return false;
        }
        if let Some(stage) = &self.stage {
            stage.restore();
        }
        self.run = None;
        self.life.enter(EffectState::Stopped);
        true
    }

    fn tick(&mut self, time_secs: f64) -> FxResult<()> {
        if !self.life.check(Transition::Tick) {
            return Ok(());
        }
        let Some(cfg) = self.run.as_ref().map(|r| r.config.clone()) else {
            return Ok(());
        };
        let (elapsed, _) = self.life.advance(time_secs);
        let duration = cfg.duration_sec;
        if !cfg.looped {
            if elapsed >= duration {
                self.apply(1.0);
                self.life.finish();
            } else {
                self.apply(elapsed / duration);
            }
            return Ok(());
        }
        let (frac, cycles) = cycle_position(elapsed, duration, cfg.loop_pause_sec);
        self.apply(frac);
        if let Some(run) = self.run.as_mut()
            && cycles > run.cycles
        {
            run.cycles = cycles;
            self.life.cycle_completed();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.life.check(Transition::Dispose) {
            return;
        }
        if let Some(stage) = self.stage.take() {
            stage.restore();
        }
        self.run = None;
        self.life.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/explosion.rs"]
mod tests;
