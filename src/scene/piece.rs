use crate::foundation::core::{Aabb, DVec3, Pose};
use crate::foundation::error::{FxError, FxResult};
use crate::scene::graph::{NodeId, NodeKind, SceneGraph};
use std::collections::HashMap;

/// A sphere member of a [`Piece`], stored relative to the piece transform.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceSphere {
    /// Scene node of the sphere mesh.
    pub node: NodeId,
    /// Offset from the piece origin in piece-local space.
    pub local_offset: DVec3,
    /// Sphere radius.
    pub radius: f64,
}

/// A rigid group of bonded spheres that moves as one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    /// Stable identifier (the group node's name).
    pub id: String,
    /// Node whose transform moves the whole piece.
    pub node: NodeId,
    /// Member spheres.
    pub spheres: Vec<PieceSphere>,
    /// Assembled transform captured at derivation time.
    pub original_pose: Pose,
    /// World-space bounds in the assembled pose.
    pub bounds: Aabb,
}

impl Piece {
    /// Sphere centres in the assembled pose.
    pub fn sphere_world_positions(&self) -> Vec<DVec3> {
        self.spheres_at(&self.original_pose)
    }

    /// Sphere centres if the piece were placed at `pose`.
    pub fn spheres_at(&self, pose: &Pose) -> Vec<DVec3> {
        self.spheres
            .iter()
            .map(|s| pose.transform_point(s.local_offset))
            .collect()
    }

    /// Mean sphere centre in the assembled pose.
    pub fn centroid(&self) -> DVec3 {
        let pts = self.sphere_world_positions();
        if pts.is_empty() {
            return self.original_pose.position;
        }
        pts.iter().copied().sum::<DVec3>() / pts.len() as f64
    }
}

/// A bond node between two spheres, resolved to piece/sphere indices.
#[derive(Clone, Debug, PartialEq)]
pub struct BondLink {
    /// Bond mesh node.
    pub node: NodeId,
    /// `(piece index, sphere index)` of the first endpoint.
    pub a: (usize, usize),
    /// `(piece index, sphere index)` of the second endpoint.
    pub b: (usize, usize),
}

/// Pieces and bonds derived once from a scene graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assembly {
    /// Pieces in scene order.
    pub pieces: Vec<Piece>,
    /// Bonds whose endpoints both resolved to known spheres.
    pub bonds: Vec<BondLink>,
}

impl Assembly {
    /// Classify the scene's nodes once and build pieces from them.
    ///
    /// Spheres under a piece group join that group; spheres without one become single-sphere
    /// pieces. Piece groups without spheres are skipped.
    #[tracing::instrument(skip(scene))]
    pub fn from_scene(scene: &dyn SceneGraph) -> FxResult<Self> {
        let nodes = scene.nodes();
        let kinds: HashMap<NodeId, NodeKind> = nodes.iter().map(|n| (n.id, n.kind)).collect();

        let mut pieces: Vec<Piece> = Vec::new();
        let mut piece_of_group: HashMap<NodeId, usize> = HashMap::new();
        let mut sphere_index: HashMap<NodeId, (usize, usize)> = HashMap::new();
        let mut pending_bonds = Vec::new();

        for n in &nodes {
            if n.kind == NodeKind::PieceGroup {
                let pose = scene.world_pose(n.id).ok_or_else(|| {
                    FxError::validation(format!("piece group '{}' has no transform", n.name))
                })?;
                piece_of_group.insert(n.id, pieces.len());
                pieces.push(Piece {
                    id: n.name.clone(),
                    node: n.id,
                    spheres: Vec::new(),
                    original_pose: pose,
                    bounds: Aabb {
                        min: pose.position,
                        max: pose.position,
                    },
                });
            }
        }

        for n in &nodes {
            match n.kind {
                NodeKind::Sphere { radius } => {
                    let world = scene.world_pose(n.id).ok_or_else(|| {
                        FxError::validation(format!("sphere '{}' has no transform", n.name))
                    })?;
                    let group = n
                        .parent
                        .filter(|p| kinds.get(p) == Some(&NodeKind::PieceGroup))
                        .and_then(|p| piece_of_group.get(&p).copied());
                    let pi = match group {
                        Some(pi) => pi,
                        None => {
                            pieces.push(Piece {
                                id: n.name.clone(),
                                node: n.id,
                                spheres: Vec::new(),
                                original_pose: world,
                                bounds: Aabb {
                                    min: world.position,
                                    max: world.position,
                                },
                            });
                            pieces.len() - 1
                        }
                    };
                    let piece = &mut pieces[pi];
                    sphere_index.insert(n.id, (pi, piece.spheres.len()));
                    piece.spheres.push(PieceSphere {
                        node: n.id,
                        local_offset: piece.original_pose.inverse_transform_point(world.position),
                        radius,
                    });
                }
                NodeKind::Bond { a, b } => pending_bonds.push((n.id, a, b)),
                NodeKind::PieceGroup => {}
            }
        }

        let before = pieces.len();
        pieces.retain(|p| !p.spheres.is_empty());
        if pieces.len() != before {
            tracing::debug!(skipped = before - pieces.len(), "skipped empty piece groups");
            // Indices shifted; rebuild the sphere lookup.
            sphere_index.clear();
            for (pi, p) in pieces.iter().enumerate() {
                for (si, s) in p.spheres.iter().enumerate() {
                    sphere_index.insert(s.node, (pi, si));
                }
            }
        }

        for p in &mut pieces {
            let radius = p.spheres.iter().map(|s| s.radius).fold(0.0, f64::max);
            if let Some(bounds) = Aabb::from_spheres(&p.sphere_world_positions(), radius) {
                p.bounds = bounds;
            }
        }

        let bonds = pending_bonds
            .into_iter()
            .filter_map(|(node, a, b)| {
                Some(BondLink {
                    node,
                    a: *sphere_index.get(&a)?,
                    b: *sphere_index.get(&b)?,
                })
            })
            .collect();

        Ok(Self { pieces, bonds })
    }

    /// Bounds of every piece in the assembled pose.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut it = self.pieces.iter().map(|p| p.bounds);
        let first = it.next()?;
        Some(it.fold(first, |acc, b| acc.union(&b)))
    }

    /// Mean of all sphere centres in the assembled pose.
    pub fn center(&self) -> DVec3 {
        let mut sum = DVec3::ZERO;
        let mut n = 0usize;
        for p in &self.pieces {
            for c in p.sphere_world_positions() {
                sum += c;
                n += 1;
            }
        }
        if n == 0 { DVec3::ZERO } else { sum / n as f64 }
    }

    /// Total number of spheres.
    pub fn sphere_count(&self) -> usize {
        self.pieces.iter().map(|p| p.spheres.len()).sum()
    }

    /// Put every piece back at its assembled transform.
    pub fn restore_poses(&self, scene: &mut dyn SceneGraph) {
        for p in &self.pieces {
            scene.set_world_pose(p.node, p.original_pose);
            for s in &p.spheres {
                if s.node != p.node {
                    scene.set_world_pose(s.node, p.original_pose.mul_pose(&Pose::from_position(s.local_offset)));
                }
            }
        }
    }
}

/// Pose, visibility and opacity of every node an [`Assembly`] owns, captured before an effect
/// writes to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneSnapshot {
    entries: Vec<NodeSnapshot>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct NodeSnapshot {
    node: NodeId,
    pose: Option<Pose>,
    visible: bool,
    opacity: f64,
}

impl SceneSnapshot {
    /// Capture piece nodes, then sphere nodes, then bond nodes.
    pub fn capture(assembly: &Assembly, scene: &dyn SceneGraph) -> Self {
        let mut nodes: Vec<NodeId> = assembly.pieces.iter().map(|p| p.node).collect();
        for p in &assembly.pieces {
            nodes.extend(p.spheres.iter().map(|s| s.node).filter(|n| *n != p.node));
        }
        nodes.extend(assembly.bonds.iter().map(|b| b.node));
        let entries = nodes
            .into_iter()
            .map(|node| NodeSnapshot {
                node,
                pose: scene.world_pose(node),
                visible: scene.is_visible(node),
                opacity: scene.opacity(node),
            })
            .collect();
        Self { entries }
    }

    /// Write every captured value back, parents first.
    pub fn restore(&self, scene: &mut dyn SceneGraph) {
        for e in &self.entries {
            if let Some(pose) = e.pose {
                scene.set_world_pose(e.node, pose);
            }
            scene.set_visible(e.node, e.visible);
            scene.set_opacity(e.node, e.opacity);
        }
    }

    /// Number of captured nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/piece.rs"]
mod tests;
