//! ANL reference evaluators.
//!
//! Two independent ways of computing a kernel's value at a point:
//!
//! - [`GraphEvaluator`] walks the instruction graph directly
//! - [`TargetProgram`] interprets the C++ body the code generator emitted
//!
//! Both share [`Point`], the helper math and a [`NoiseBasis`], so for any
//! well-formed graph they must agree exactly. The test suites use that
//! agreement as the end-to-end check on generated code.

pub mod basis;
pub mod error;
pub mod graph_eval;
pub mod math;
pub mod point;
pub mod target;

pub use basis::{AnalyticBasis, NoiseBasis};
pub use error::{EvalError, EvalResult};
pub use graph_eval::GraphEvaluator;
pub use point::Point;
pub use target::TargetProgram;
