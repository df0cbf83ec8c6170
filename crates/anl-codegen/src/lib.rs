//! ANL C++ code generator: lowers an instruction graph to C++ source blocks.
//!
//! # Architecture
//!
//! A [`Session`] walks the graph depth-first from the root. Each opcode maps
//! to a text template over its operands; operand substitution goes through
//! one rule that decides, per reference, whether to
//!
//! - call an outlined function (subtrees referenced by a `Select`),
//! - wrap the value in a memo guard (expensive opcodes), or
//! - inline the operand's lowering.
//!
//! Domain transforms push a frame describing the transformed point; the
//! innermost frame is what a `^` placeholder expands to.
//!
//! ## Output
//!
//! [`generate`] returns an [`Emission`] holding four blocks spliced into the
//! evaluation function, in order:
//! - outlined function lambdas, callees before callers
//! - cache storage sized to the slot count, cleared per evaluation
//! - the `NamedInput` struct with default values
//! - `double FinalResult = <root expression>;`

pub mod cache;
pub mod domain;
pub mod emit;
pub mod error;
pub mod literal;
pub mod lower;
pub mod outline;
pub mod template;

pub use cache::{is_cache_candidate, CacheSlot};
pub use domain::{DomainStack, FramePath};
pub use emit::{generate, CodegenOptions, EmittedBlocks, Emission, DEFAULT_MAX_DEPTH};
pub use error::{CodegenError, CodegenResult};
pub use literal::render_number;
pub use lower::Session;
pub use outline::{function_name, FunctionRecord};
