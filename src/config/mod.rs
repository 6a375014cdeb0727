//! Serializable effect configs and their validation.

pub(crate) mod model;
pub(crate) mod validate;
