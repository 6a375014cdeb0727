use crate::foundation::math::Lcg;

/// Wakes sleeping bodies in deterministic batches.
///
/// The order is a seeded Fisher-Yates shuffle of the body indices. Every tick of the cadence wakes
/// `ceil(percent × total)` bodies that are still asleep; bodies already woken by contacts are
/// skipped without counting towards the batch.
#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredRelease {
    order: Vec<usize>,
    cursor: usize,
    per_tick: usize,
    interval: f64,
    timer: f64,
    started: bool,
}

impl StaggeredRelease {
    /// Plan the release of `count` bodies.
    pub fn new(count: usize, percent: f64, interval_ms: u32, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..count).collect();
        let mut rng = Lcg::new(seed);
        for i in (1..order.len()).rev() {
            let j = rng.next_index(i + 1);
            order.swap(i, j);
        }
        let per_tick = ((percent.clamp(0.0, 1.0) * count as f64).ceil() as usize).max(1);
        Self {
            order,
            cursor: 0,
            per_tick,
            interval: f64::from(interval_ms) / 1000.0,
            timer: 0.0,
            started: false,
        }
    }

    /// Release order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Bodies woken per cadence tick.
    pub fn per_tick(&self) -> usize {
        self.per_tick
    }

    /// Whether every body has been considered.
    pub fn is_done(&self) -> bool {
        self.cursor >= self.order.len()
    }

    /// Advance by `dt` seconds and return the bodies to wake now. The first call releases a batch
    /// immediately.
    pub fn advance(&mut self, dt: f64, is_sleeping: impl Fn(usize) -> bool) -> Vec<usize> {
        let mut ticks = 0;
        if !self.started {
            self.started = true;
            ticks += 1;
        } else {
            self.timer += dt.max(0.0);
        }
        while self.interval > 0.0 && self.timer + 1e-9 >= self.interval {
            self.timer -= self.interval;
            ticks += 1;
        }
        if self.interval <= 0.0 && self.started {
            ticks = ticks.max(1);
        }

        let mut out = Vec::new();
        for _ in 0..ticks {
            let mut woken = 0;
            while woken < self.per_tick && !self.is_done() {
                let body = self.order[self.cursor];
                self.cursor += 1;
                if is_sleeping(body) {
                    out.push(body);
                    woken += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/release.rs"]
mod tests;
