//! ANL transpiler: orchestrates the full pipeline.
//!
//! ```text
//! kernel JSON → KernelDocument → validation → lowering → skeleton splice → .cpp
//! ```
//!
//! The output starts with a generated-file header naming the SHA-256 of the
//! kernel document, so the same kernel always produces byte-identical C++.

pub mod error;
pub mod skeleton;

use anl_codegen::{generate, CodegenOptions, Emission};
use anl_types::KernelDocument;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use error::{CompileError, CompileResult};

/// Pipeline settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspileOptions {
    pub codegen: CodegenOptions,
    /// Emit only the generated blocks, without header or skeleton.
    pub blocks_only: bool,
}

/// Result of a successful transpile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranspileOutput {
    /// The C++ text to write out.
    pub source: String,
    /// `sha256:<hex>` of the kernel document's compact JSON.
    pub document_hash: String,
    pub emission: Emission,
}

/// Parse a kernel document from JSON and transpile it.
pub fn transpile_json(json: &str, options: &TranspileOptions) -> CompileResult<TranspileOutput> {
    let doc = KernelDocument::from_json(json)?;
    transpile(&doc, options)
}

/// Transpile a kernel document to C++.
pub fn transpile(doc: &KernelDocument, options: &TranspileOptions) -> CompileResult<TranspileOutput> {
    doc.validate()?;
    log::info!(
        "validated kernel: {} nodes, root {}, {} named inputs",
        doc.nodes.len(),
        doc.root,
        doc.named_inputs.len()
    );

    let emission = generate(&doc.nodes, doc.root, &doc.named_inputs, &options.codegen)?;
    let document_hash = document_hash(doc)?;
    let blocks = emission.blocks.concat();

    let source = if options.blocks_only {
        blocks
    } else {
        let mut out = header(&document_hash);
        out.push_str(&skeleton::splice(&blocks)?);
        out
    };
    log::info!("emitted {} bytes for {document_hash}", source.len());

    Ok(TranspileOutput {
        source,
        document_hash,
        emission,
    })
}

/// `sha256:<hex>` of the document's compact JSON.
pub fn document_hash(doc: &KernelDocument) -> CompileResult<String> {
    let json = doc.to_json()?;
    Ok(format!("sha256:{:x}", Sha256::digest(json.as_bytes())))
}

fn header(document_hash: &str) -> String {
    format!("// Generated file - Do not edit. Generated by anlc from kernel {document_hash}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anl_types::KernelBuilder;

    fn add_document() -> KernelDocument {
        let mut b = KernelBuilder::new();
        let two = b.constant(2.0);
        let three = b.constant(3.0);
        let add = b.add(two, three);
        b.document(add)
    }

    #[test]
    fn test_hash_format() {
        let hash = document_hash(&add_document()).unwrap();
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_header_first_line() {
        let out = transpile(&add_document(), &TranspileOptions::default()).unwrap();
        let first = out.source.lines().next().unwrap();
        assert_eq!(
            first,
            format!(
                "// Generated file - Do not edit. Generated by anlc from kernel {}",
                out.document_hash
            )
        );
    }

    #[test]
    fn test_blocks_only_has_no_skeleton() {
        let options = TranspileOptions {
            blocks_only: true,
            ..TranspileOptions::default()
        };
        let out = transpile(&add_document(), &options).unwrap();
        assert!(!out.source.contains("struct Point"));
        assert!(out.source.ends_with("\tdouble FinalResult = (2.0 + 3.0);\n"));
    }
}
