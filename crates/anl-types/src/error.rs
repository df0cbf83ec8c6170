//! Validation errors for instruction graphs and kernel documents.

use thiserror::Error;

use crate::graph::NodeId;

/// A structural defect in an instruction graph or kernel document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// An operand refers to the node itself or to a node defined after it.
    #[error("node {node} references operand {operand}, which is not defined before it")]
    ForwardReference { node: NodeId, operand: NodeId },

    /// The document root lies outside the node list.
    #[error("root {root} is out of range for a graph of {len} nodes")]
    RootOutOfRange { root: NodeId, len: usize },

    /// A `NamedInput` node carries no name.
    #[error("named input node {node} has no name")]
    MissingName { node: NodeId },

    /// A `NamedInput` node names an input missing from the input table.
    #[error("named input node {node} refers to undeclared input '{name}'")]
    UndeclaredNamedInput { node: NodeId, name: String },
}

/// Result alias for graph validation.
pub type GraphResult<T> = Result<T, GraphError>;
