//! The instruction graph: an arena of immutable nodes addressed by index.
//!
//! Operands are plain [`NodeId`] indices into the same arena, so a node shared
//! by several parents is stored once. A well-formed graph only references
//! nodes defined earlier, which makes it acyclic by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GraphError, GraphResult};
use crate::opcode::Opcode;

// ══════════════════════════════════════════════════════════════════════════════
// NodeId
// ══════════════════════════════════════════════════════════════════════════════

/// Index of a node in an [`InstructionGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// InstructionNode
// ══════════════════════════════════════════════════════════════════════════════

/// One vertex of the instruction graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionNode {
    pub opcode: Opcode,
    /// Operand references, in storage order.
    #[serde(default)]
    pub operands: Vec<NodeId>,
    /// Literal payload of `Constant`, `Seed` and `Nop`.
    #[serde(default)]
    pub value: f64,
    /// Input name of `NamedInput`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl InstructionNode {
    /// A node with operands and no payload.
    pub fn new(opcode: Opcode, operands: Vec<NodeId>) -> Self {
        Self {
            opcode,
            operands,
            value: 0.0,
            name: None,
        }
    }

    /// A `Constant` node.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            ..Self::new(Opcode::Constant, Vec::new())
        }
    }

    /// A `Seed` node.
    pub fn seed(value: u32) -> Self {
        Self {
            value: f64::from(value),
            ..Self::new(Opcode::Seed, Vec::new())
        }
    }

    /// A `NamedInput` node reading `name`.
    pub fn named_input(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Opcode::NamedInput, Vec::new())
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// InstructionGraph
// ══════════════════════════════════════════════════════════════════════════════

/// Ordered collection of instruction nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionGraph {
    nodes: Vec<InstructionNode>,
}

impl InstructionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing node list.
    pub fn from_nodes(nodes: Vec<InstructionNode>) -> Self {
        Self { nodes }
    }

    /// Append a node and return its id.
    pub fn push(&mut self, node: InstructionNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&InstructionNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[InstructionNode] {
        &self.nodes
    }

    /// Iterate `(id, node)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &InstructionNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Check that every operand references an earlier node and that every
    /// `NamedInput` carries a name.
    pub fn validate(&self) -> GraphResult<()> {
        for (id, node) in self.iter() {
            for &operand in &node.operands {
                if operand >= id {
                    return Err(GraphError::ForwardReference { node: id, operand });
                }
            }
            if node.opcode == Opcode::NamedInput && node.name.is_none() {
                return Err(GraphError::MissingName { node: id });
            }
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Named inputs
// ══════════════════════════════════════════════════════════════════════════════

/// A named kernel input and its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedInputDefault {
    pub name: String,
    pub default: f64,
}

/// Ordered name → default-value table of named inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedInputTable {
    entries: Vec<NamedInputDefault>,
}

impl NamedInputTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, or update its default if already declared.
    /// Declaration order is preserved.
    pub fn insert(&mut self, name: impl Into<String>, default: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.default = default,
            None => self.entries.push(NamedInputDefault { name, default }),
        }
    }

    /// Default value of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedInputDefault> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// KernelDocument
// ══════════════════════════════════════════════════════════════════════════════

/// Serialized form of one lowering session's input, as handed over by a
/// front end: the graph, the root to emit and the named-input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelDocument {
    pub nodes: InstructionGraph,
    pub root: NodeId,
    #[serde(default)]
    pub named_inputs: NamedInputTable,
}

impl KernelDocument {
    /// Parse a document from JSON.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Compact JSON rendering, stable for a given document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Validate the graph, the root and every named-input reference.
    pub fn validate(&self) -> GraphResult<()> {
        self.nodes.validate()?;
        if self.nodes.get(self.root).is_none() {
            return Err(GraphError::RootOutOfRange {
                root: self.root,
                len: self.nodes.len(),
            });
        }
        for (id, node) in self.nodes.iter() {
            if let Some(name) = &node.name {
                if node.opcode == Opcode::NamedInput && !self.named_inputs.contains(name) {
                    return Err(GraphError::UndeclaredNamedInput {
                        node: id,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_graph() -> InstructionGraph {
        let mut g = InstructionGraph::new();
        let a = g.push(InstructionNode::constant(2.0));
        let b = g.push(InstructionNode::constant(3.0));
        g.push(InstructionNode::new(Opcode::Add, vec![a, b]));
        g
    }

    #[test]
    fn test_push_assigns_sequential_ids() {
        let g = add_graph();
        assert_eq!(g.len(), 3);
        assert_eq!(g.get(NodeId(2)).map(|n| n.opcode), Some(Opcode::Add));
        assert!(g.get(NodeId(3)).is_none());
    }

    #[test]
    fn test_validate_accepts_backward_references() {
        assert_eq!(add_graph().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_self_reference() {
        let mut g = InstructionGraph::new();
        g.push(InstructionNode::new(Opcode::Abs, vec![NodeId(0)]));
        assert_eq!(
            g.validate(),
            Err(GraphError::ForwardReference {
                node: NodeId(0),
                operand: NodeId(0)
            })
        );
    }

    #[test]
    fn test_validate_rejects_nameless_input() {
        let mut g = InstructionGraph::new();
        g.push(InstructionNode::new(Opcode::NamedInput, vec![]));
        assert_eq!(g.validate(), Err(GraphError::MissingName { node: NodeId(0) }));
    }

    #[test]
    fn test_named_input_table_keeps_order_and_updates() {
        let mut t = NamedInputTable::new();
        t.insert("b", 1.0);
        t.insert("a", 2.0);
        t.insert("b", 3.0);
        let names: Vec<_> = t.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(t.get("b"), Some(3.0));
        assert!(!t.contains("c"));
    }

    #[test]
    fn test_document_json_round_trip() {
        let mut inputs = NamedInputTable::new();
        inputs.insert("freq", 0.5);
        let mut nodes = add_graph();
        nodes.push(InstructionNode::named_input("freq"));
        let doc = KernelDocument {
            nodes,
            root: NodeId(2),
            named_inputs: inputs,
        };
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"opcode\":\"Add\""));
        let back = KernelDocument::from_json(&json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.validate(), Ok(()));
    }

    #[test]
    fn test_document_rejects_bad_root_and_inputs() {
        let doc = KernelDocument {
            nodes: add_graph(),
            root: NodeId(7),
            named_inputs: NamedInputTable::new(),
        };
        assert_eq!(
            doc.validate(),
            Err(GraphError::RootOutOfRange {
                root: NodeId(7),
                len: 3
            })
        );

        let mut nodes = InstructionGraph::new();
        nodes.push(InstructionNode::named_input("missing"));
        let doc = KernelDocument {
            nodes,
            root: NodeId(0),
            named_inputs: NamedInputTable::new(),
        };
        assert!(matches!(
            doc.validate(),
            Err(GraphError::UndeclaredNamedInput { .. })
        ));
    }

    #[test]
    fn test_document_defaults_missing_fields() {
        let json = r#"{"nodes":[{"opcode":"Constant","value":1.5}],"root":0}"#;
        let doc = KernelDocument::from_json(json).unwrap();
        assert!(doc.named_inputs.is_empty());
        assert!(doc.nodes.nodes()[0].operands.is_empty());
        assert_eq!(doc.nodes.nodes()[0].value, 1.5);
    }
}
