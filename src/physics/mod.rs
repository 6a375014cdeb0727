//! Physics collaborators and the gravity choreography built on them.

pub(crate) mod bloom;
pub(crate) mod breakage;
pub(crate) mod choreography;
pub(crate) mod point;
#[cfg(feature = "rapier")]
pub(crate) mod rapier;
pub(crate) mod release;
pub(crate) mod solver;
