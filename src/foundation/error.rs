use crate::config::validate::ConfigErrors;

/// Convenience result type used across spherefx.
pub type FxResult<T> = Result<T, FxError>;

/// Top-level error taxonomy used by effect APIs.
///
/// Invalid lifecycle transitions are deliberately absent: they are reported as `false` returns,
/// never as errors.
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// Invalid user-provided data outside of an effect config (scene definitions, handles).
    #[error("validation error: {0}")]
    Validation(String),

    /// One or more effect config fields are out of range or malformed.
    #[error("invalid config:\n{0}")]
    Config(ConfigErrors),

    /// `init` was called without a collaborator the effect cannot run without.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The external physics engine could not be loaded or initialized.
    #[error("physics engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Errors reported by the physics solver adapter.
    #[error("physics error: {0}")]
    Physics(String),

    /// Errors when serializing or deserializing configs and scene definitions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Build a [`FxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FxError::Physics`] value.
    pub fn physics(msg: impl Into<String>) -> Self {
        Self::Physics(msg.into())
    }

    /// Build a [`FxError::EngineUnavailable`] value.
    pub fn engine_unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Build a [`FxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Config field errors, when this is a [`FxError::Config`].
    pub fn config_errors(&self) -> Option<&ConfigErrors> {
        match self {
            Self::Config(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ConfigErrors> for FxError {
    fn from(errors: ConfigErrors) -> Self {
        Self::Config(errors)
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
