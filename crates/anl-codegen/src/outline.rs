//! Function outlining.
//!
//! Subtrees referenced by a `Select` can be reached through several branches
//! of a select chain. Instead of inlining the subtree at every branch, it is
//! emitted once as a lambda and called by name. Each function takes the
//! point to evaluate at as a parameter, so one record serves every call site
//! whatever its domain frame.

use anl_types::{InstructionGraph, NodeId, Opcode};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::BASE_POINT;

/// One outlined function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub node: NodeId,
    pub name: String,
    /// Full lambda definition, tab-indented for the evaluation function.
    pub body: String,
}

impl FunctionRecord {
    fn new(node: NodeId, expression: &str) -> Self {
        let name = function_name(node);
        let body = format!(
            "\tconst auto {name} = [&](const Point& {BASE_POINT}, const auto& NamedInput, bool* CacheIsValid, double* Cache) -> double\n\t{{\n\t\treturn {expression};\n\t}};"
        );
        Self { node, name, body }
    }
}

/// Name of the function outlined for `node`.
pub fn function_name(node: NodeId) -> String {
    format!("ANL_Function_{node}")
}

/// Call expression for the function of `node` evaluated at `point`.
pub fn call_expression(node: NodeId, point: &str) -> String {
    format!(
        "{}({point}, NamedInput, CacheIsValid, Cache)",
        function_name(node)
    )
}

/// Opcodes that are never outlined, whoever references them.
fn is_outlinable(opcode: Opcode) -> bool {
    !matches!(
        opcode,
        Opcode::Nop
            | Opcode::Seed
            | Opcode::Constant
            | Opcode::NamedInput
            | Opcode::DX
            | Opcode::DY
            | Opcode::DZ
            | Opcode::DW
            | Opcode::DU
            | Opcode::DV
            | Opcode::X
            | Opcode::Y
            | Opcode::Z
            | Opcode::W
            | Opcode::U
            | Opcode::V
            | Opcode::ValueBasis
            | Opcode::GradientBasis
            | Opcode::SimplexBasis
    )
}

/// Per-session record store.
#[derive(Debug, Default)]
pub struct FunctionOutliner {
    select_operands: HashSet<NodeId>,
    records: Vec<FunctionRecord>,
    by_node: HashMap<NodeId, usize>,
}

impl FunctionOutliner {
    /// Index every node that appears as an operand of some `Select`.
    pub fn new(graph: &InstructionGraph) -> Self {
        let select_operands = graph
            .iter()
            .filter(|(_, node)| node.opcode == Opcode::Select)
            .flat_map(|(_, node)| node.operands.iter().copied())
            .collect();
        Self {
            select_operands,
            ..Self::default()
        }
    }

    pub fn is_function_candidate(&self, node: NodeId, opcode: Opcode) -> bool {
        is_outlinable(opcode) && self.select_operands.contains(&node)
    }

    pub fn record(&self, node: NodeId) -> Option<&FunctionRecord> {
        self.by_node.get(&node).map(|&i| &self.records[i])
    }

    /// Append the record for `node`. Must be called after its body has been
    /// lowered, so nested records come first.
    pub fn register(&mut self, node: NodeId, expression: &str) -> &FunctionRecord {
        let record = FunctionRecord::new(node, expression);
        log::debug!("outlined node {node} as {}", record.name);
        self.by_node.insert(node, self.records.len());
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FunctionRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anl_types::KernelBuilder;

    #[test]
    fn test_select_operands_become_candidates() {
        let mut b = KernelBuilder::new();
        let low = b.constant(0.0);
        let x = b.coordinate(anl_types::Axis::X);
        let high = b.unary(Opcode::Abs, x);
        let t = b.constant(0.5);
        let f = b.constant(0.0);
        let sel = b.select(low, high, x, t, f);
        let outliner = FunctionOutliner::new(b.graph());

        assert!(outliner.is_function_candidate(high, Opcode::Abs));
        assert!(!outliner.is_function_candidate(low, Opcode::Constant));
        assert!(!outliner.is_function_candidate(x, Opcode::X));
        assert!(!outliner.is_function_candidate(sel, Opcode::Select));
    }

    #[test]
    fn test_basis_opcodes_never_outlined() {
        assert!(!is_outlinable(Opcode::GradientBasis));
        assert!(!is_outlinable(Opcode::DZ));
        assert!(is_outlinable(Opcode::CellularBasis));
        assert!(is_outlinable(Opcode::Select));
    }

    #[test]
    fn test_register_once_per_node() {
        let mut outliner = FunctionOutliner::default();
        assert!(outliner.record(NodeId(3)).is_none());
        let record = outliner.register(NodeId(3), "1.0");
        assert_eq!(record.name, "ANL_Function_3");
        assert!(record.body.contains("return 1.0;"));
        assert_eq!(outliner.record(NodeId(3)).map(|r| r.node), Some(NodeId(3)));
        assert_eq!(outliner.len(), 1);
    }

    #[test]
    fn test_call_expression() {
        assert_eq!(
            call_expression(NodeId(7), "Point(EvalPoint)"),
            "ANL_Function_7(Point(EvalPoint), NamedInput, CacheIsValid, Cache)"
        );
    }
}
