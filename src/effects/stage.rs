use crate::foundation::core::{DQuat, DVec3, Pose};
use crate::foundation::error::FxResult;
use crate::scene::graph::SharedScene;
use crate::scene::piece::{Assembly, SceneSnapshot};

/// Scene handle plus the assembly derived from it at `init`.
pub(crate) struct Stage {
    pub(crate) scene: SharedScene,
    pub(crate) assembly: Assembly,
    snapshot: SceneSnapshot,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("pieces", &self.assembly.pieces.len())
            .field("bonds", &self.assembly.bonds.len())
            .field("snapshot", &self.snapshot.len())
            .finish()
    }
}

impl Stage {
    /// Classify the scene once and capture the nodes' current state.
    pub(crate) fn derive(scene: SharedScene) -> FxResult<Self> {
        let (assembly, snapshot) = {
            let s = scene.borrow();
            let assembly = Assembly::from_scene(&*s)?;
            let snapshot = SceneSnapshot::capture(&assembly, &*s);
            (assembly, snapshot)
        };
        Ok(Self {
            scene,
            assembly,
            snapshot,
        })
    }

    pub(crate) fn restore(&self) {
        self.snapshot.restore(&mut *self.scene.borrow_mut());
    }

    /// Place every piece at its assembled pose transformed about `pivot`.
    pub(crate) fn rotate_all(&self, pivot: DVec3, rotation: DQuat) {
        let mut scene = self.scene.borrow_mut();
        for p in &self.assembly.pieces {
            scene.set_world_pose(p.node, p.original_pose.rotated_about(pivot, rotation));
        }
    }

    /// Show or hide pieces; a bond is shown only when both of its pieces are.
    pub(crate) fn apply_visibility(&self, visible: &[bool]) {
        let mut scene = self.scene.borrow_mut();
        for (p, &v) in self.assembly.pieces.iter().zip(visible) {
            scene.set_visible(p.node, v);
            for s in p.spheres.iter().filter(|s| s.node != p.node) {
                scene.set_visible(s.node, v);
            }
        }
        for b in &self.assembly.bonds {
            let shown = visible.get(b.a.0).copied().unwrap_or(true)
                && visible.get(b.b.0).copied().unwrap_or(true);
            scene.set_visible(b.node, shown);
        }
    }

    pub(crate) fn set_piece_pose(&self, piece: usize, pose: Pose) {
        if let Some(p) = self.assembly.pieces.get(piece) {
            self.scene.borrow_mut().set_world_pose(p.node, pose);
        }
    }
}
