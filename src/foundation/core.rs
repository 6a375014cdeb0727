pub use glam::{DQuat, DVec3};

/// World-space rigid transform (translation + rotation, no scale).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// World translation.
    pub position: DVec3,
    /// World rotation.
    pub rotation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Pure translation.
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            rotation: DQuat::IDENTITY,
        }
    }

    /// Build a pose from parts.
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Map a point from this pose's local space into world space.
    pub fn transform_point(&self, local: DVec3) -> DVec3 {
        self.position + self.rotation * local
    }

    /// Map a world-space point into this pose's local space.
    pub fn inverse_transform_point(&self, world: DVec3) -> DVec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// `self * child`: compose a child's local pose onto this (parent) pose.
    pub fn mul_pose(&self, child: &Pose) -> Pose {
        Pose {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    /// Pose of `world` expressed relative to this (parent) pose.
    pub fn relative(&self, world: &Pose) -> Pose {
        let inv = self.rotation.inverse();
        Pose {
            position: inv * (world.position - self.position),
            rotation: (inv * world.rotation).normalize(),
        }
    }

    /// Rotate this pose about `pivot` by `rotation` (applied in world space).
    pub fn rotated_about(&self, pivot: DVec3, rotation: DQuat) -> Pose {
        Pose {
            position: pivot + rotation * (self.position - pivot),
            rotation: (rotation * self.rotation).normalize(),
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// Box enclosing a set of spheres of the given radius. Returns `None` when `centers` is empty.
    pub fn from_spheres(centers: &[DVec3], radius: f64) -> Option<Self> {
        let (first, rest) = centers.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for c in rest {
            min = min.min(*c);
            max = max.max(*c);
        }
        let r = DVec3::splat(radius.max(0.0));
        Some(Self {
            min: min - r,
            max: max + r,
        })
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Box centre.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extents along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}
