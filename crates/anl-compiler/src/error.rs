//! Pipeline error types.

use std::path::PathBuf;

use anl_codegen::CodegenError;
use anl_types::GraphError;
use thiserror::Error;

/// Errors raised while turning a kernel document into C++.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The document is not valid JSON, or does not match the schema.
    #[error("malformed kernel document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but its graph is inconsistent.
    #[error("invalid kernel graph: {0}")]
    Graph(#[from] GraphError),

    /// Lowering failed.
    #[error("code generation failed: {0}")]
    Codegen(#[from] CodegenError),

    /// Reading the input or writing the output failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The skeleton has no splice marker.
    #[error("skeleton is missing the '{0}' marker")]
    MissingMarker(&'static str),
}

/// Pipeline result type alias.
pub type CompileResult<T> = Result<T, CompileError>;
