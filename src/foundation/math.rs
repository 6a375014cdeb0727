use std::cmp::Ordering;

/// 32-bit linear-congruential generator (Numerical Recipes constants).
///
/// Used wherever effects need reproducible pseudo-randomness: setup jitter and staggered release
/// order. The sequence only depends on the seed.
#[derive(Clone, Copy, Debug)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const MUL: u32 = 1_664_525;
    const INC: u32 = 1_013_904_223;

    /// Seed a new generator.
    pub fn new(seed: u64) -> Self {
        // Fold the high bits in so distinct 64-bit seeds rarely collide.
        Self {
            state: (seed as u32) ^ ((seed >> 32) as u32),
        }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(Self::MUL).wrapping_add(Self::INC);
        self.state
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Next value in `[-1, 1)`.
    pub fn next_signed(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// Next index in `0..len`. `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

/// Compare two floats, treating values within `tol` of each other as equal.
pub fn cmp_with_tolerance(a: f64, b: f64, tol: f64) -> Ordering {
    if (a - b).abs() <= tol {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Normalize host-provided frame delta to seconds.
///
/// Deltas above one second are assumed to be milliseconds.
pub(crate) fn normalize_delta_secs(dt: f64) -> f64 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    if dt > 1.0 { dt / 1000.0 } else { dt }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
