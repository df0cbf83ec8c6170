//! Memoization slots.
//!
//! Expensive, side-effect-free opcodes get a slot in the per-evaluation
//! `Cache` array the first time they are referenced; every reference then
//! goes through a guard that computes the value once and reuses it.
//!
//! A slot is only valid for the domain frame it was assigned under. A node
//! reached again under another frame (the offset evaluation of a derivative,
//! or a subtree shared by two transforms) is emitted without the guard.
//! Outlined function bodies run at whatever point their caller passes, so
//! inside them only values that do not depend on the point are memoized.

use anl_types::{InstructionGraph, NodeId, Opcode};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::FramePath;

/// Opcodes worth memoizing.
pub fn is_cache_candidate(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::ValueBasis
            | Opcode::GradientBasis
            | Opcode::SimplexBasis
            | Opcode::CellularBasis
            | Opcode::Bias
            | Opcode::Gain
            | Opcode::Pow
            | Opcode::Cos
            | Opcode::Sin
            | Opcode::Tan
            | Opcode::ACos
            | Opcode::ASin
            | Opcode::ATan
            | Opcode::SmoothTiers
            | Opcode::Sigmoid
            | Opcode::HexTile
            | Opcode::HexBump
    )
}

/// Opcodes that read the current point directly.
fn reads_point(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::ValueBasis
            | Opcode::GradientBasis
            | Opcode::SimplexBasis
            | Opcode::CellularBasis
            | Opcode::X
            | Opcode::Y
            | Opcode::Z
            | Opcode::W
            | Opcode::U
            | Opcode::V
            | Opcode::Radial
            | Opcode::HexTile
            | Opcode::HexBump
    )
}

/// For every node, whether its value can change with the evaluation point.
///
/// Operands that are not strictly earlier in the graph are treated as
/// point-dependent.
pub fn point_dependence(graph: &InstructionGraph) -> Vec<bool> {
    let mut varies: Vec<bool> = Vec::with_capacity(graph.len());
    for (id, node) in graph.iter() {
        let v = reads_point(node.opcode)
            || node
                .operands
                .iter()
                .any(|op| op.index() >= id.index() || varies[op.index()]);
        varies.push(v);
    }
    varies
}

/// A slot assigned to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSlot {
    pub index: u32,
    pub node: NodeId,
    /// Frame the slot's value is computed in.
    pub frame: FramePath,
}

/// Per-session slot allocator.
#[derive(Debug, Default)]
pub struct CacheAssigner {
    slots: Vec<CacheSlot>,
    by_node: HashMap<NodeId, usize>,
    varies: Vec<bool>,
}

impl CacheAssigner {
    pub fn new(graph: &InstructionGraph) -> Self {
        Self {
            varies: point_dependence(graph),
            ..Self::default()
        }
    }

    /// Whether `node`'s value can change with the evaluation point.
    pub fn is_point_dependent(&self, node: NodeId) -> bool {
        self.varies.get(node.index()).copied().unwrap_or(true)
    }

    /// Slot for `node` evaluated under `frame`, or `None` when the reference
    /// must not be memoized.
    ///
    /// `frame` is `None` inside an outlined function body, where the point is
    /// the caller's. Point-independent nodes always get their slot, keyed to
    /// the root frame. Returns `None` when the node already owns a slot for a
    /// different frame.
    pub fn assign_or_get(&mut self, node: NodeId, frame: Option<&FramePath>) -> Option<u32> {
        let root = FramePath::root();
        let frame = if self.is_point_dependent(node) {
            frame?
        } else {
            &root
        };
        if let Some(&i) = self.by_node.get(&node) {
            let slot = &self.slots[i];
            return (slot.frame == *frame).then_some(slot.index);
        }
        let index = self.slots.len() as u32;
        log::debug!("cache slot {index} assigned to node {node} at frame {frame}");
        self.by_node.insert(node, self.slots.len());
        self.slots.push(CacheSlot {
            index,
            node,
            frame: frame.clone(),
        });
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[CacheSlot] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<CacheSlot> {
        self.slots
    }
}

/// Wrap `expression` in the memo guard for `slot`.
pub fn memo_guard(slot: u32, expression: &str) -> String {
    format!(
        "(CacheIsValid[{slot}] ? Cache[{slot}] : (Cache[{slot}] = ({expression}), CacheIsValid[{slot}] = true, Cache[{slot}]))"
    )
}
