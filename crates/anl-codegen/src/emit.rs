//! Emission assembly.
//!
//! Drives one lowering session from the root and lays the results out as the
//! four text blocks spliced into the evaluation function: outlined functions,
//! cache storage, named-input defaults and the final assignment.

use anl_types::{InstructionGraph, NamedInputTable, NodeId};
use serde::{Deserialize, Serialize};

use crate::cache::CacheSlot;
use crate::error::{CodegenError, CodegenResult};
use crate::literal::render_number;
use crate::lower::Session;
use crate::outline::FunctionRecord;

/// Default recursion limit for [`CodegenOptions`].
pub const DEFAULT_MAX_DEPTH: u32 = 512;

/// Tuning knobs for a lowering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Maximum nesting of `lower` calls before the session fails.
    pub max_depth: u32,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The four generated blocks, in splice order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedBlocks {
    pub functions: String,
    pub cache: String,
    pub named_inputs: String,
    pub expression: String,
}

impl EmittedBlocks {
    /// The blocks joined in order, one per line group, empty blocks skipped.
    pub fn concat(&self) -> String {
        let mut out = String::new();
        for block in [
            &self.functions,
            &self.cache,
            &self.named_inputs,
            &self.expression,
        ] {
            if !block.is_empty() {
                out.push_str(block);
                out.push('\n');
            }
        }
        out
    }
}

/// Everything a lowering session produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emission {
    pub root_expression: String,
    pub cache_slots: Vec<CacheSlot>,
    pub functions: Vec<FunctionRecord>,
    pub blocks: EmittedBlocks,
}

/// Lower `root` of `graph` and assemble the emitted blocks.
///
/// # Errors
///
/// Any [`CodegenError`] raised while lowering aborts the session; no partial
/// output is returned.
pub fn generate(
    graph: &InstructionGraph,
    root: NodeId,
    inputs: &NamedInputTable,
    options: &CodegenOptions,
) -> CodegenResult<Emission> {
    if graph.get(root).is_none() {
        return Err(CodegenError::InvalidRoot {
            root,
            len: graph.len(),
        });
    }
    for input in inputs.iter() {
        validate_identifier(&input.name)?;
    }

    let mut session = Session::new(graph, inputs, *options);
    let root_expression = session.lower(root)?;
    let (cache_slots, functions) = session.finish();
    log::info!(
        "lowered root {root}: {} nodes, {} cache slots, {} functions",
        graph.len(),
        cache_slots.len(),
        functions.len()
    );

    let blocks = EmittedBlocks {
        functions: functions_block(&functions),
        cache: cache_block(cache_slots.len()),
        named_inputs: named_inputs_block(inputs),
        expression: format!("\tdouble FinalResult = {root_expression};"),
    };
    Ok(Emission {
        root_expression,
        cache_slots,
        functions,
        blocks,
    })
}

// ── Blocks ───────────────────────────────────────────────────────────────────

fn functions_block(functions: &[FunctionRecord]) -> String {
    functions
        .iter()
        .map(|f| f.body.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn cache_block(slots: usize) -> String {
    [
        format!("\tstd::array<bool, {slots}> CacheIsValidStorage{{}};"),
        format!("\tstd::array<double, {slots}> CacheStorage{{}};"),
        "\tbool* CacheIsValid = CacheIsValidStorage.data();".to_string(),
        "\tdouble* Cache = CacheStorage.data();".to_string(),
        format!("\tfor (std::size_t i = 0; i < {slots}; ++i)"),
        "\t\tCacheIsValid[i] = false;".to_string(),
    ]
    .join("\n")
}

fn named_inputs_block(inputs: &NamedInputTable) -> String {
    let mut out = String::from("\tstruct\n\t{\n");
    for input in inputs.iter() {
        out.push_str(&format!(
            "\t\tdouble {} = {};\n",
            input.name,
            render_number(input.default)
        ));
    }
    out.push_str("\t} NamedInput;");
    out
}

// ── Identifiers ──────────────────────────────────────────────────────────────

const RESERVED: &[&str] = &[
    "auto", "bool", "break", "case", "char", "class", "const", "continue", "default", "delete",
    "do", "double", "else", "enum", "false", "float", "for", "if", "int", "long", "new",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "this", "true",
    "typedef", "union", "unsigned", "void", "while",
];

fn validate_identifier(name: &str) -> CodegenResult<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if head_ok && tail_ok && !RESERVED.contains(&name) {
        Ok(())
    } else {
        Err(CodegenError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
