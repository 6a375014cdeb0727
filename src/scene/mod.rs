//! Render-system collaborator seam and the piece model derived from it.

pub(crate) mod graph;
pub(crate) mod memory;
pub(crate) mod ordering;
pub(crate) mod piece;
