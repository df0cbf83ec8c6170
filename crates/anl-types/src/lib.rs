//! Shared types for the ANL transpiler.
//!
//! This crate defines the instruction graph a noise kernel is expressed as,
//! the opcode set, the serialized kernel document exchanged with front ends,
//! and the validation errors for all of them.

mod builder;
mod error;
mod graph;
pub mod opcode;

pub use builder::KernelBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{
    InstructionGraph, InstructionNode, KernelDocument, NamedInputDefault, NamedInputTable, NodeId,
};
pub use opcode::{Axis, Opcode};
