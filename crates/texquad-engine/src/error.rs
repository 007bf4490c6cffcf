use thiserror::Error;

use crate::shader::StageKind;

/// Failure taxonomy shared by every render target.
///
/// None of these are retried. The caller decides how to surface them; the
/// runtime logs them and leaves the affected target halted.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The host could not provide a GPU adapter, device or surface.
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    /// A stage was rejected by the shader front-end or validator.
    #[error("failed to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: StageKind, log: String },

    /// The stage pair could not be linked into a program.
    #[error("failed to link shader program:\n{log}")]
    ShaderLink { log: String },

    /// Retrieval or decode of an asset failed, or its pixels cannot be uploaded.
    #[error("failed to load asset `{source_name}`: {reason}")]
    AssetLoad { source_name: String, reason: String },
}

impl RenderError {
    pub(crate) fn asset(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn link(log: impl Into<String>) -> Self {
        Self::ShaderLink { log: log.into() }
    }
}
