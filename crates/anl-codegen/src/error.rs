//! Codegen error types.

use anl_types::{NodeId, Opcode};
use thiserror::Error;

/// Errors that abort a lowering session.
///
/// Every variant names the node that failed, so a caller can point at the
/// offending instruction instead of at generated text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// A node's operand count does not match what its lowering consumes.
    #[error("node {node} ({opcode}): expected {expected} operands, found {found}")]
    Structural {
        node: NodeId,
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// The opcode has no scalar lowering.
    #[error("node {node}: opcode {opcode} is not supported by the C++ backend")]
    UnsupportedOpcode { node: NodeId, opcode: Opcode },

    /// A template names more operand placeholders than operands were supplied.
    #[error("node {node} ({opcode}): template needs {placeholders} operands, only {operands} supplied")]
    ArgumentIndex {
        node: NodeId,
        opcode: Opcode,
        placeholders: usize,
        operands: usize,
    },

    /// An operand refers to a node outside the graph.
    #[error("node {node} references missing operand {operand}")]
    InvalidOperand { node: NodeId, operand: NodeId },

    /// The root is not a node of the graph.
    #[error("root {root} is out of range for a graph of {len} nodes")]
    InvalidRoot { root: NodeId, len: usize },

    /// Lowering recursed deeper than the configured limit.
    #[error("node {node}: lowering depth limit of {limit} exceeded")]
    DepthLimitExceeded { node: NodeId, limit: u32 },

    /// A `NamedInput` node names an input absent from the input table.
    #[error("node {node}: named input '{name}' is not declared")]
    UndeclaredNamedInput { node: NodeId, name: String },

    /// A named input cannot be spelled as a C++ identifier.
    #[error("named input '{name}' is not a valid C++ identifier")]
    InvalidIdentifier { name: String },
}

impl CodegenError {
    /// The node the error is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Structural { node, .. }
            | Self::UnsupportedOpcode { node, .. }
            | Self::ArgumentIndex { node, .. }
            | Self::InvalidOperand { node, .. }
            | Self::DepthLimitExceeded { node, .. }
            | Self::UndeclaredNamedInput { node, .. } => Some(*node),
            Self::InvalidRoot { root, .. } => Some(*root),
            Self::InvalidIdentifier { .. } => None,
        }
    }
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
