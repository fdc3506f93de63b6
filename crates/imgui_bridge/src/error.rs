//! Crate-wide error type

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::execute::RecordError;
use crate::mesh::MeshError;
use crate::renderer::RendererError;
use crate::translate::TranslateError;

/// Any error the bridge can report
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// Context management failed
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// Mesh rebuild failed
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// Translation failed
    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    /// Renderer failed
    #[error("renderer error: {0}")]
    Renderer(#[from] RendererError),

    /// Command replay failed
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Configuration could not be loaded or saved
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
