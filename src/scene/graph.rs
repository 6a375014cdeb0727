use crate::foundation::core::Pose;
use std::cell::RefCell;
use std::rc::Rc;

/// Identity of a node in the host's mesh graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

/// Render-system node classification, decided once when an effect derives its pieces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    /// Group node whose sphere children move together.
    PieceGroup,
    /// One sphere mesh.
    Sphere {
        /// Sphere radius in world units.
        radius: f64,
    },
    /// Visual connector between two spheres.
    Bond {
        /// First sphere.
        a: NodeId,
        /// Second sphere.
        b: NodeId,
    },
}

/// Node metadata reported by the render system.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Node identity.
    pub id: NodeId,
    /// Stable, host-assigned name (piece groups use it as the piece identifier).
    pub name: String,
    /// Classification.
    pub kind: NodeKind,
    /// Parent node, if any.
    pub parent: Option<NodeId>,
}

/// Read/write surface over the host's mesh graph.
///
/// Effects never construct scene content; they only read the classified node list once and write
/// per-frame poses, visibility and opacity. Unknown ids are ignored by setters and read as
/// `None`/defaults by getters.
pub trait SceneGraph {
    /// Every node, parents before children.
    fn nodes(&self) -> Vec<SceneNode>;
    /// World transform of a node.
    fn world_pose(&self, id: NodeId) -> Option<Pose>;
    /// Set the world transform of a node (children follow).
    fn set_world_pose(&mut self, id: NodeId, pose: Pose);
    /// Node visibility flag.
    fn is_visible(&self, id: NodeId) -> bool;
    /// Set node visibility.
    fn set_visible(&mut self, id: NodeId, visible: bool);
    /// Material opacity in `[0, 1]`.
    fn opacity(&self, id: NodeId) -> f64;
    /// Set material opacity.
    fn set_opacity(&mut self, id: NodeId, opacity: f64);
}

/// Scene handle shared between the host and the active effect.
pub type SharedScene = Rc<RefCell<dyn SceneGraph>>;
