//! Constant-speed camera paths through sparse keyframes.
//!
//! Each segment (consecutive keyframe pair, plus the seam segment back to the first keyframe when
//! looping) is sampled into an [`ArcLengthTable`]. A global timeline assigns every segment a
//! movement window proportional to its length and a hold window equal to its destination
//! keyframe's pause; sampling converts segment-local time into distance and inverts the table.

use crate::animation::ease::Ease;
use crate::camera::rig::CameraPose;
use crate::config::model::{OrbitKeyframe, PathMode};
use crate::foundation::core::DVec3;
use crate::foundation::math::lerp;
use std::f64::consts::{PI, TAU};

/// Default arc-length table resolution per segment.
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 128;

/// Cumulative distance samples `s[]` aligned with the parametric coordinates `u[]` that produced
/// them. `s` is non-decreasing and starts at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcLengthTable {
    s: Vec<f64>,
    u: Vec<f64>,
}

impl ArcLengthTable {
    /// Sample `eval` at `samples` evenly spaced `u` in `[0, 1]` (at least two).
    pub fn build(samples: usize, mut eval: impl FnMut(f64) -> DVec3) -> Self {
        let n = samples.max(2);
        let mut s = Vec::with_capacity(n);
        let mut u = Vec::with_capacity(n);
        let mut prev = eval(0.0);
        let mut acc = 0.0;
        s.push(0.0);
        u.push(0.0);
        for i in 1..n {
            let ui = i as f64 / (n - 1) as f64;
            let p = eval(ui);
            acc += p.distance(prev);
            prev = p;
            s.push(acc);
            u.push(ui);
        }
        Self { s, u }
    }

    /// Total sampled length.
    pub fn length(&self) -> f64 {
        self.s.last().copied().unwrap_or(0.0)
    }

    /// Cumulative distances.
    pub fn distances(&self) -> &[f64] {
        &self.s
    }

    /// Parametric coordinate at which the cumulative distance reaches `distance`.
    ///
    /// Binary search for the bracketing samples, then linear interpolation between them.
    pub fn u_at(&self, distance: f64) -> f64 {
        let len = self.length();
        if len <= 0.0 {
            return 0.0;
        }
        let d = distance.clamp(0.0, len);
        let hi = self.s.partition_point(|&x| x < d);
        if hi == 0 {
            return self.u[0];
        }
        let hi = hi.min(self.s.len() - 1);
        let lo = hi - 1;
        let span = self.s[hi] - self.s[lo];
        if span <= 0.0 {
            return self.u[hi];
        }
        lerp(self.u[lo], self.u[hi], (d - self.s[lo]) / span)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Spherical {
    radius: f64,
    azimuth: f64,
    polar: f64,
}

impl Spherical {
    fn from_offset(v: DVec3) -> Self {
        let radius = v.length();
        let polar = if radius > 0.0 {
            (v.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
        Self {
            radius,
            azimuth: v.z.atan2(v.x),
            polar,
        }
    }

    fn to_offset(self) -> DVec3 {
        let sp = self.polar.sin();
        DVec3::new(
            self.radius * sp * self.azimuth.cos(),
            self.radius * self.polar.cos(),
            self.radius * sp * self.azimuth.sin(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Geometry {
    Free {
        a: DVec3,
        b: DVec3,
    },
    Locked {
        center: DVec3,
        a: Spherical,
        b: Spherical,
    },
}

impl Geometry {
    fn eval(&self, u: f64) -> DVec3 {
        match *self {
            Self::Free { a, b } => a.lerp(b, u),
            Self::Locked { center, a, b } => {
                let s = Spherical {
                    radius: lerp(a.radius, b.radius, u),
                    azimuth: lerp(a.azimuth, b.azimuth, u),
                    polar: lerp(a.polar, b.polar, u),
                };
                center + s.to_offset()
            }
        }
    }
}

/// One segment of a [`CameraPath`] with its slot on the global timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    /// Source keyframe index.
    pub from: usize,
    /// Destination keyframe index.
    pub to: usize,
    /// Whether this is the synthetic last→first segment.
    pub seam: bool,
    /// Arc-length lookup.
    pub table: ArcLengthTable,
    /// Sampled length.
    pub length: f64,
    /// Timeline start of the movement window.
    pub time_start: f64,
    /// Movement window length.
    pub move_duration: f64,
    /// Hold at the destination after moving.
    pub pause: f64,
    ease_into: bool,
    geometry: Geometry,
}

impl PathSegment {
    /// Timeline end of the hold window.
    pub fn time_end(&self) -> f64 {
        self.time_start + self.move_duration + self.pause
    }
}

/// Inputs for [`CameraPath::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct PathOptions {
    /// Total timeline length in seconds.
    pub duration: f64,
    /// Add the seam segment.
    pub looped: bool,
    /// Arc-length samples per segment.
    pub samples_per_segment: usize,
    /// Interpolation mode.
    pub mode: PathMode,
    /// Locked-mode centre and default look-at point.
    pub center: DVec3,
    /// Field of view used for keyframes without one.
    pub default_fov: f64,
}

/// Sampled camera trajectory with a constant-speed timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPath {
    keyframes: Vec<OrbitKeyframe>,
    segments: Vec<PathSegment>,
    total_length: f64,
    total_pause: f64,
    speed: f64,
    duration: f64,
    center: DVec3,
    default_fov: f64,
}

fn wrap_pi(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI { w + TAU } else { w }
}

/// Unwrapped azimuths for each keyframe plus the seam target, sweeping in the direction of the
/// first segment's shortest turn.
fn unwrap_azimuths(raw: &[f64]) -> (Vec<f64>, f64) {
    let dir = if raw.len() >= 2 && wrap_pi(raw[1] - raw[0]) < 0.0 {
        -1.0
    } else {
        1.0
    };
    let step = |from: f64, to: f64| -> f64 {
        let d = to - from;
        if dir > 0.0 {
            d.rem_euclid(TAU)
        } else {
            -(-d).rem_euclid(TAU)
        }
    };
    let mut out = Vec::with_capacity(raw.len());
    for (i, &a) in raw.iter().enumerate() {
        if i == 0 {
            out.push(a);
        } else {
            let prev = out[i - 1];
            out.push(prev + step(raw[i - 1], a));
        }
    }
    let last = out.last().copied().unwrap_or(0.0);
    let seam = last + step(raw.last().copied().unwrap_or(0.0), raw.first().copied().unwrap_or(0.0));
    (out, seam)
}

impl CameraPath {
    /// Build segments, arc-length tables and the timeline. Returns `None` with fewer than two
    /// keyframes.
    #[tracing::instrument(skip(keyframes), fields(keyframes = keyframes.len()))]
    pub fn build(keyframes: &[OrbitKeyframe], opts: &PathOptions) -> Option<Self> {
        if keyframes.len() < 2 {
            return None;
        }
        let n = keyframes.len();
        let mut pairs: Vec<(usize, usize, bool)> = (0..n - 1).map(|i| (i, i + 1, false)).collect();
        if opts.looped {
            pairs.push((n - 1, 0, true));
        }

        let (azimuths, seam_azimuth) = match opts.mode {
            PathMode::Locked => {
                let raw: Vec<f64> = keyframes
                    .iter()
                    .map(|k| Spherical::from_offset(k.position - opts.center).azimuth)
                    .collect();
                unwrap_azimuths(&raw)
            }
            PathMode::Free => (Vec::new(), 0.0),
        };

        let mut segments = Vec::with_capacity(pairs.len());
        for (from, to, seam) in pairs {
            let a = keyframes[from].position;
            let b = keyframes[to].position;
            let geometry = match opts.mode {
                PathMode::Free => Geometry::Free { a, b },
                PathMode::Locked => {
                    let mut sa = Spherical::from_offset(a - opts.center);
                    let mut sb = Spherical::from_offset(b - opts.center);
                    sa.azimuth = azimuths[from];
                    sb.azimuth = if seam { seam_azimuth } else { azimuths[to] };
                    Geometry::Locked {
                        center: opts.center,
                        a: sa,
                        b: sb,
                    }
                }
            };
            let table = ArcLengthTable::build(opts.samples_per_segment, |u| geometry.eval(u));
            segments.push(PathSegment {
                from,
                to,
                seam,
                length: table.length(),
                table,
                time_start: 0.0,
                move_duration: 0.0,
                pause: if seam {
                    0.0
                } else {
                    keyframes[to].pause_sec.max(0.0)
                },
                ease_into: keyframes[from].ease_into_next,
                geometry,
            });
        }

        let duration = opts.duration.max(0.0);
        let total_length: f64 = segments.iter().map(|s| s.length).sum();
        let total_pause: f64 = segments.iter().map(|s| s.pause).sum();
        let move_time = duration - total_pause;
        let speed = if move_time > 0.0 && total_length > 0.0 {
            total_length / move_time
        } else {
            0.0
        };
        for s in &mut segments {
            s.move_duration = if speed > 0.0 { s.length / speed } else { 0.0 };
        }
        redistribute_drift(&mut segments, duration);

        let mut t = 0.0;
        for s in &mut segments {
            s.time_start = t;
            t += s.move_duration + s.pause;
        }

        Some(Self {
            keyframes: keyframes.to_vec(),
            segments,
            total_length,
            total_pause,
            speed,
            duration,
            center: opts.center,
            default_fov: opts.default_fov,
        })
    }

    /// Segments in timeline order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Sum of segment lengths.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Sum of destination pauses (seam excluded), before drift redistribution.
    pub fn total_pause(&self) -> f64 {
        self.total_pause
    }

    /// Constant traversal speed in world units per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Configured duration.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// End of the last segment's hold window.
    pub fn timeline_end(&self) -> f64 {
        self.segments.last().map_or(0.0, PathSegment::time_end)
    }

    /// Exact pose at keyframe `i` (clamped to the last keyframe).
    pub fn keyframe_pose(&self, i: usize) -> CameraPose {
        let k = &self.keyframes[i.min(self.keyframes.len() - 1)];
        CameraPose {
            position: k.position,
            target: k.target.unwrap_or(self.center),
            fov: k.fov.unwrap_or(self.default_fov),
        }
    }

    /// Camera pose at timeline time `t` (clamped to `[0, duration]`).
    pub fn sample(&self, t: f64) -> CameraPose {
        let t = if t.is_finite() {
            t.clamp(0.0, self.duration)
        } else {
            0.0
        };
        let idx = if t >= self.duration {
            self.segments.len()
        } else {
            self.segments.partition_point(|s| s.time_end() <= t)
        };
        let Some(seg) = self.segments.get(idx) else {
            return self
                .segments
                .last()
                .map_or_else(|| self.keyframe_pose(0), |s| self.keyframe_pose(s.to));
        };

        let local = t - seg.time_start;
        if local >= seg.move_duration {
            return self.keyframe_pose(seg.to);
        }

        let mut frac = local / seg.move_duration;
        if seg.ease_into {
            frac = Ease::EaseInOut.apply(frac);
        }
        let u = seg.table.u_at(frac * seg.length);
        let a = self.keyframe_pose(seg.from);
        let b = self.keyframe_pose(seg.to);
        CameraPose {
            position: seg.geometry.eval(u),
            target: a.target.lerp(b.target, u),
            fov: lerp(a.fov, b.fov, u),
        }
    }
}

/// Spread the gap between the laid-out timeline and `duration` across segments in proportion to
/// their movement windows, or to their pauses when nothing moves.
fn redistribute_drift(segments: &mut [PathSegment], duration: f64) {
    let laid: f64 = segments.iter().map(|s| s.move_duration + s.pause).sum();
    let drift = duration - laid;
    if drift == 0.0 || segments.is_empty() {
        return;
    }
    let total_move: f64 = segments.iter().map(|s| s.move_duration).sum();
    let total_pause: f64 = segments.iter().map(|s| s.pause).sum();
    if total_move > 0.0 {
        for s in segments.iter_mut() {
            s.move_duration = (s.move_duration + drift * s.move_duration / total_move).max(0.0);
        }
    } else if total_pause > 0.0 {
        for s in segments.iter_mut() {
            s.pause = (s.pause + drift * s.pause / total_pause).max(0.0);
        }
    } else {
        let share = drift / segments.len() as f64;
        for s in segments.iter_mut() {
            s.pause = (s.pause + share).max(0.0);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/path.rs"]
mod tests;
