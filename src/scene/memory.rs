use crate::foundation::core::{DVec3, Pose};
use crate::foundation::error::{FxError, FxResult};
use crate::scene::graph::{NodeId, NodeKind, SceneGraph, SceneNode};

/// Serializable scene description: pieces made of bonded spheres.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDef {
    /// Pieces in host order.
    pub pieces: Vec<PieceDef>,
}

/// One piece of a [`SceneDef`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceDef {
    /// Stable piece identifier.
    pub id: String,
    /// Sphere centres in world space.
    pub spheres: Vec<DVec3>,
    /// Sphere radius.
    #[serde(default = "PieceDef::default_radius")]
    pub radius: f64,
    /// Bonded sphere index pairs within this piece.
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
}

impl PieceDef {
    fn default_radius() -> f64 {
        0.5
    }
}

/// Per-node state captured for traces and tests.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    /// Node name.
    pub name: String,
    /// World pose.
    pub pose: Pose,
    /// Visibility flag.
    pub visible: bool,
    /// Material opacity.
    pub opacity: f64,
}

#[derive(Clone, Debug)]
struct MemNode {
    node: SceneNode,
    local: Pose,
    visible: bool,
    opacity: f64,
}

/// In-memory scene graph for headless previews and tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryScene {
    nodes: Vec<MemNode>,
}

impl InMemoryScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a serialized description.
    pub fn from_def(def: &SceneDef) -> FxResult<Self> {
        let mut scene = Self::new();
        for (pi, piece) in def.pieces.iter().enumerate() {
            if piece.spheres.is_empty() {
                return Err(FxError::validation(format!(
                    "pieces[{pi}] '{}' has no spheres",
                    piece.id
                )));
            }
            if !(piece.radius.is_finite() && piece.radius > 0.0) {
                return Err(FxError::validation(format!(
                    "pieces[{pi}] radius must be finite and > 0"
                )));
            }
            let (_, spheres) = scene.add_piece(&piece.id, &piece.spheres, piece.radius);
            for &[a, b] in &piece.bonds {
                let (Some(&na), Some(&nb)) = (spheres.get(a), spheres.get(b)) else {
                    return Err(FxError::validation(format!(
                        "pieces[{pi}] bond [{a}, {b}] is out of range"
                    )));
                };
                scene.add_bond(na, nb);
            }
        }
        Ok(scene)
    }

    /// Parse a [`SceneDef`] from JSON and build it.
    pub fn from_json(s: &str) -> FxResult<Self> {
        let def: SceneDef = serde_json::from_str(s)?;
        Self::from_def(&def)
    }

    fn push(&mut self, name: String, kind: NodeKind, parent: Option<NodeId>, local: Pose) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MemNode {
            node: SceneNode {
                id,
                name,
                kind,
                parent,
            },
            local,
            visible: true,
            opacity: 1.0,
        });
        id
    }

    /// Add a piece group positioned at the centroid of `centers`, with one sphere child per centre.
    /// Returns the group id and the sphere ids in input order.
    pub fn add_piece(&mut self, name: &str, centers: &[DVec3], radius: f64) -> (NodeId, Vec<NodeId>) {
        let centroid = if centers.is_empty() {
            DVec3::ZERO
        } else {
            centers.iter().copied().sum::<DVec3>() / centers.len() as f64
        };
        let group = self.push(
            name.to_owned(),
            NodeKind::PieceGroup,
            None,
            Pose::from_position(centroid),
        );
        let spheres = centers
            .iter()
            .enumerate()
            .map(|(i, c)| {
                self.push(
                    format!("{name}/s{i}"),
                    NodeKind::Sphere { radius },
                    Some(group),
                    Pose::from_position(*c - centroid),
                )
            })
            .collect();
        (group, spheres)
    }

    /// Add a free-standing sphere with no piece group.
    pub fn add_sphere(&mut self, name: &str, center: DVec3, radius: f64) -> NodeId {
        self.push(
            name.to_owned(),
            NodeKind::Sphere { radius },
            None,
            Pose::from_position(center),
        )
    }

    /// Add a bond between two spheres, parented like sphere `a` and placed at the midpoint.
    pub fn add_bond(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let parent = self.node(a).and_then(|n| n.node.parent);
        let pa = self.world_pose(a).map(|p| p.position).unwrap_or_default();
        let pb = self.world_pose(b).map(|p| p.position).unwrap_or_default();
        let mid = Pose::from_position((pa + pb) * 0.5);
        let local = match parent.and_then(|p| self.world_pose(p)) {
            Some(parent_world) => parent_world.relative(&mid),
            None => mid,
        };
        self.push(format!("bond/{}-{}", a.0, b.0), NodeKind::Bond { a, b }, parent, local)
    }

    /// Look up a node id by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.node.name == name)
            .map(|n| n.node.id)
    }

    /// Direct children of `id`.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.node.parent == Some(id))
            .map(|n| n.node.id)
            .collect()
    }

    /// Snapshot of every node's externally visible state.
    pub fn snapshot(&self) -> Vec<NodeState> {
        self.nodes
            .iter()
            .map(|n| NodeState {
                name: n.node.name.clone(),
                pose: self.world_pose(n.node.id).unwrap_or_default(),
                visible: n.visible,
                opacity: n.opacity,
            })
            .collect()
    }

    fn node(&self, id: NodeId) -> Option<&MemNode> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut MemNode> {
        self.nodes.get_mut(id.0 as usize)
    }
}

impl SceneGraph for InMemoryScene {
    fn nodes(&self) -> Vec<SceneNode> {
        self.nodes.iter().map(|n| n.node.clone()).collect()
    }

    fn world_pose(&self, id: NodeId) -> Option<Pose> {
        let n = self.node(id)?;
        match n.node.parent {
            Some(p) => Some(self.world_pose(p)?.mul_pose(&n.local)),
            None => Some(n.local),
        }
    }

    fn set_world_pose(&mut self, id: NodeId, pose: Pose) {
        let Some(parent) = self.node(id).map(|n| n.node.parent) else {
            return;
        };
        let local = match parent.and_then(|p| self.world_pose(p)) {
            Some(parent_world) => parent_world.relative(&pose),
            None => pose,
        };
        if let Some(n) = self.node_mut(id) {
            n.local = local;
        }
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.visible)
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_mut(id) {
            n.visible = visible;
        }
    }

    fn opacity(&self, id: NodeId) -> f64 {
        self.node(id).map_or(0.0, |n| n.opacity)
    }

    fn set_opacity(&mut self, id: NodeId, opacity: f64) {
        if let Some(n) = self.node_mut(id) {
            n.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/memory.rs"]
mod tests;
