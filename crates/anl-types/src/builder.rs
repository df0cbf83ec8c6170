//! Programmatic kernel construction.
//!
//! [`KernelBuilder`] appends nodes in dependency order, so every graph it
//! produces passes [`InstructionGraph::validate`]. Used by tests and by front
//! ends that build kernels directly instead of going through JSON.

use crate::graph::{InstructionGraph, InstructionNode, KernelDocument, NamedInputTable, NodeId};
use crate::opcode::{Axis, Opcode};

/// Incremental builder for an instruction graph and its named inputs.
#[derive(Debug, Clone, Default)]
pub struct KernelBuilder {
    graph: InstructionGraph,
    inputs: NamedInputTable,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw instruction.
    pub fn instruction(&mut self, opcode: Opcode, operands: &[NodeId]) -> NodeId {
        self.graph
            .push(InstructionNode::new(opcode, operands.to_vec()))
    }

    // ── Literals & inputs ─────────────────────────────────────────────────

    pub fn constant(&mut self, value: f64) -> NodeId {
        self.graph.push(InstructionNode::constant(value))
    }

    pub fn seed(&mut self, value: u32) -> NodeId {
        self.graph.push(InstructionNode::seed(value))
    }

    /// Declare a named input with a default value and reference it.
    pub fn named_input(&mut self, name: &str, default: f64) -> NodeId {
        self.inputs.insert(name, default);
        self.graph.push(InstructionNode::named_input(name))
    }

    // ── Noise bases ───────────────────────────────────────────────────────

    pub fn value_basis(&mut self, interpolation: NodeId, seed: NodeId) -> NodeId {
        self.instruction(Opcode::ValueBasis, &[interpolation, seed])
    }

    pub fn gradient_basis(&mut self, interpolation: NodeId, seed: NodeId) -> NodeId {
        self.instruction(Opcode::GradientBasis, &[interpolation, seed])
    }

    pub fn simplex_basis(&mut self, seed: NodeId) -> NodeId {
        self.instruction(Opcode::SimplexBasis, &[seed])
    }

    /// Cellular basis with distance metric, four F coefficients, four D
    /// coefficients and a seed.
    pub fn cellular_basis(
        &mut self,
        distance: NodeId,
        f: [NodeId; 4],
        d: [NodeId; 4],
        seed: NodeId,
    ) -> NodeId {
        let operands = [
            distance, f[0], f[1], f[2], f[3], d[0], d[1], d[2], d[3], seed,
        ];
        self.instruction(Opcode::CellularBasis, &operands)
    }

    // ── Arithmetic ────────────────────────────────────────────────────────

    pub fn add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Add, &[a, b])
    }

    pub fn subtract(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Subtract, &[a, b])
    }

    pub fn multiply(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Multiply, &[a, b])
    }

    pub fn divide(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Divide, &[a, b])
    }

    pub fn max(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Max, &[a, b])
    }

    pub fn min(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Min, &[a, b])
    }

    pub fn pow(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.instruction(Opcode::Pow, &[a, b])
    }

    /// Single-operand math (`Abs`, `Cos`, `Sin`, `Tan`, `ACos`, `ASin`, `ATan`).
    pub fn unary(&mut self, opcode: Opcode, source: NodeId) -> NodeId {
        self.instruction(opcode, &[source])
    }

    pub fn bias(&mut self, source: NodeId, amount: NodeId) -> NodeId {
        self.instruction(Opcode::Bias, &[source, amount])
    }

    pub fn gain(&mut self, source: NodeId, amount: NodeId) -> NodeId {
        self.instruction(Opcode::Gain, &[source, amount])
    }

    pub fn tiers(&mut self, source: NodeId, steps: NodeId) -> NodeId {
        self.instruction(Opcode::Tiers, &[source, steps])
    }

    pub fn smooth_tiers(&mut self, source: NodeId, steps: NodeId) -> NodeId {
        self.instruction(Opcode::SmoothTiers, &[source, steps])
    }

    // ── Domain transforms ─────────────────────────────────────────────────

    pub fn scale_domain(&mut self, source: NodeId, scale: NodeId) -> NodeId {
        self.instruction(Opcode::ScaleDomain, &[source, scale])
    }

    pub fn scale_axis(&mut self, axis: Axis, source: NodeId, scale: NodeId) -> NodeId {
        self.instruction(Opcode::scale(axis), &[source, scale])
    }

    pub fn translate_domain(&mut self, source: NodeId, offset: NodeId) -> NodeId {
        self.instruction(Opcode::TranslateDomain, &[source, offset])
    }

    pub fn translate_axis(&mut self, axis: Axis, source: NodeId, offset: NodeId) -> NodeId {
        self.instruction(Opcode::translate(axis), &[source, offset])
    }

    pub fn rotate_domain(
        &mut self,
        source: NodeId,
        angle: NodeId,
        ax: NodeId,
        ay: NodeId,
        az: NodeId,
    ) -> NodeId {
        self.instruction(Opcode::RotateDomain, &[source, angle, ax, ay, az])
    }

    // ── Blending ──────────────────────────────────────────────────────────

    pub fn blend(&mut self, low: NodeId, high: NodeId, control: NodeId) -> NodeId {
        self.instruction(Opcode::Blend, &[low, high, control])
    }

    pub fn select(
        &mut self,
        low: NodeId,
        high: NodeId,
        control: NodeId,
        threshold: NodeId,
        falloff: NodeId,
    ) -> NodeId {
        self.instruction(Opcode::Select, &[low, high, control, threshold, falloff])
    }

    // ── Coordinates, derivatives, shaping ─────────────────────────────────

    pub fn coordinate(&mut self, axis: Axis) -> NodeId {
        self.instruction(Opcode::coordinate(axis), &[])
    }

    pub fn derivative(&mut self, axis: Axis, source: NodeId, spacing: NodeId) -> NodeId {
        self.instruction(Opcode::derivative(axis), &[source, spacing])
    }

    pub fn sigmoid(&mut self, source: NodeId, center: NodeId, ramp: NodeId) -> NodeId {
        self.instruction(Opcode::Sigmoid, &[source, center, ramp])
    }

    pub fn radial(&mut self) -> NodeId {
        self.instruction(Opcode::Radial, &[])
    }

    pub fn clamp(&mut self, source: NodeId, low: NodeId, high: NodeId) -> NodeId {
        self.instruction(Opcode::Clamp, &[source, low, high])
    }

    pub fn hex_tile(&mut self, seed: NodeId) -> NodeId {
        self.instruction(Opcode::HexTile, &[seed])
    }

    pub fn hex_bump(&mut self) -> NodeId {
        self.instruction(Opcode::HexBump, &[])
    }

    pub fn grayscale(&mut self, source: NodeId) -> NodeId {
        self.instruction(Opcode::Grayscale, &[source])
    }

    // ── Results ───────────────────────────────────────────────────────────

    pub fn graph(&self) -> &InstructionGraph {
        &self.graph
    }

    pub fn inputs(&self) -> &NamedInputTable {
        &self.inputs
    }

    /// Consume the builder, returning the graph and its named inputs.
    pub fn finish(self) -> (InstructionGraph, NamedInputTable) {
        (self.graph, self.inputs)
    }

    /// Consume the builder into a kernel document rooted at `root`.
    pub fn document(self, root: NodeId) -> KernelDocument {
        KernelDocument {
            nodes: self.graph,
            root,
            named_inputs: self.inputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_valid_document() {
        let mut b = KernelBuilder::new();
        let interp = b.constant(3.0);
        let seed = b.seed(7);
        let g = b.gradient_basis(interp, seed);
        let freq = b.named_input("frequency", 2.0);
        let scaled = b.scale_domain(g, freq);
        let x = b.coordinate(Axis::X);
        let root = b.add(scaled, x);
        let doc = b.document(root);
        assert_eq!(doc.validate(), Ok(()));
        assert_eq!(doc.named_inputs.get("frequency"), Some(2.0));
        assert_eq!(doc.nodes.len(), 7);
    }

    #[test]
    fn test_cellular_operand_order() {
        let mut b = KernelBuilder::new();
        let ids: Vec<NodeId> = (0..10).map(|i| b.constant(f64::from(i))).collect();
        let cell = b.cellular_basis(
            ids[0],
            [ids[1], ids[2], ids[3], ids[4]],
            [ids[5], ids[6], ids[7], ids[8]],
            ids[9],
        );
        let node = b.graph().get(cell).unwrap();
        assert_eq!(node.operands, ids);
        assert_eq!(node.operands.len(), Opcode::CellularBasis.arity());
    }
}
