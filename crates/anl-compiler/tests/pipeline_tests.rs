//! End-to-end pipeline tests.
//!
//! Tests verify the full pipeline: kernel JSON → validation → lowering →
//! skeleton splice, plus determinism of the output and error reporting for
//! each failing stage.

use anl_codegen::CodegenError;
use anl_compiler::{
    document_hash, skeleton, transpile, transpile_json, CompileError, TranspileOptions,
};
use anl_eval::{AnalyticBasis, GraphEvaluator, Point, TargetProgram};
use anl_types::{Axis, GraphError, KernelBuilder, KernelDocument, NodeId, Opcode};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Kernel documents
// ══════════════════════════════════════════════════════════════════════════════

/// Add(2, 3).
const ADD_KERNEL: &str = r#"{
  "nodes": [
    { "opcode": "Constant", "value": 2.0 },
    { "opcode": "Constant", "value": 3.0 },
    { "opcode": "Add", "operands": [0, 1] }
  ],
  "root": 2
}"#;

/// Scaled gradient noise selected against a named-input threshold.
const TERRAIN_KERNEL: &str = r#"{
  "nodes": [
    { "opcode": "Constant", "value": 3.0 },
    { "opcode": "Seed", "value": 17 },
    { "opcode": "GradientBasis", "operands": [0, 1] },
    { "opcode": "NamedInput", "name": "Frequency" },
    { "opcode": "ScaleDomain", "operands": [2, 3] },
    { "opcode": "Y" },
    { "opcode": "NamedInput", "name": "Threshold" },
    { "opcode": "Constant", "value": 0.1 },
    { "opcode": "Constant", "value": -1.0 },
    { "opcode": "Select", "operands": [4, 8, 5, 6, 7] },
    { "opcode": "Constant", "value": 0.5 },
    { "opcode": "Blend", "operands": [9, 2, 10] }
  ],
  "root": 11,
  "named_inputs": [
    { "name": "Frequency", "default": 4.0 },
    { "name": "Threshold", "default": 0.25 }
  ]
}"#;

fn blocks_only() -> TranspileOptions {
    TranspileOptions {
        blocks_only: true,
        ..TranspileOptions::default()
    }
}

fn rich_document() -> KernelDocument {
    let mut b = KernelBuilder::new();
    let interp = b.constant(3.0);
    let seed = b.seed(5);
    let grad = b.gradient_basis(interp, seed);
    let simplex = b.simplex_basis(seed);
    let x = b.coordinate(Axis::X);
    let threshold = b.named_input("Threshold", 0.1);
    let falloff = b.constant(0.2);
    let sel = b.select(grad, simplex, x, threshold, falloff);
    let spacing = b.constant(0.01);
    let dx = b.derivative(Axis::X, sel, spacing);
    let angle = b.constant(0.4);
    let axis = b.constant(1.0);
    let rotated = b.rotate_domain(sel, angle, axis, axis, axis);
    let sum = b.add(dx, rotated);
    b.document(sum)
}

// ══════════════════════════════════════════════════════════════════════════════
// 1. Full-file output
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn add_kernel_produces_complete_file() {
    let out = transpile_json(ADD_KERNEL, &TranspileOptions::default()).unwrap();
    assert!(out.source.starts_with("// Generated file - Do not edit."));
    assert!(out.source.contains("struct Point"));
    assert!(out.source.contains("\tdouble FinalResult = (2.0 + 3.0);\n"));
    assert!(!out.source.contains(skeleton::CODE_MARKER));
    assert!(out.emission.cache_slots.is_empty());
    assert!(out.emission.functions.is_empty());
}

#[test]
fn blocks_appear_in_order_inside_evaluate() {
    let out = transpile_json(TERRAIN_KERNEL, &TranspileOptions::default()).unwrap();
    let body_start = out.source.find("double ANL_CPP_Evaluate").unwrap();
    let body = &out.source[body_start..];
    let lambda = body.find("const auto ANL_Function_").unwrap();
    let cache = body.find("std::array<bool,").unwrap();
    let inputs = body.find("} NamedInput;").unwrap();
    let result = body.find("double FinalResult =").unwrap();
    assert!(lambda < cache && cache < inputs && inputs < result);
    assert!(body.contains("\t\tdouble Frequency = 4.0;\n"));
    assert!(body.contains("\t\tdouble Threshold = 0.25;\n"));
}

#[test]
fn blocks_only_matches_emission() {
    let out = transpile_json(TERRAIN_KERNEL, &blocks_only()).unwrap();
    assert_eq!(out.source, out.emission.blocks.concat());
}

// ══════════════════════════════════════════════════════════════════════════════
// 2. Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn output_is_byte_identical_across_runs() {
    let first = transpile_json(TERRAIN_KERNEL, &TranspileOptions::default()).unwrap();
    for _ in 0..5 {
        let again = transpile_json(TERRAIN_KERNEL, &TranspileOptions::default()).unwrap();
        assert_eq!(again.source, first.source);
        assert_eq!(again.document_hash, first.document_hash);
    }
}

#[test]
fn hash_ignores_json_formatting() {
    let pretty = KernelDocument::from_json(ADD_KERNEL).unwrap();
    let compact = KernelDocument::from_json(&pretty.to_json().unwrap()).unwrap();
    assert_eq!(document_hash(&pretty).unwrap(), document_hash(&compact).unwrap());
}

#[test]
fn different_kernels_have_different_hashes() {
    let add = transpile_json(ADD_KERNEL, &TranspileOptions::default()).unwrap();
    let terrain = transpile_json(TERRAIN_KERNEL, &TranspileOptions::default()).unwrap();
    assert_ne!(add.document_hash, terrain.document_hash);
}

#[test]
fn output_serializes_to_json() {
    let out = transpile_json(ADD_KERNEL, &blocks_only()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["document_hash"], out.document_hash.as_str());
    assert_eq!(json["emission"]["root_expression"], "(2.0 + 3.0)");
}

// ══════════════════════════════════════════════════════════════════════════════
// 3. Semantics of the emitted body
// ══════════════════════════════════════════════════════════════════════════════

fn assert_emitted_matches_graph(doc: &KernelDocument) {
    let out = transpile(doc, &blocks_only()).unwrap();
    let program = TargetProgram::parse(&out.source).unwrap();
    let evaluator = GraphEvaluator::new(&doc.nodes, &doc.named_inputs, &AnalyticBasis);
    for p in [
        Point::new_2d(0.25, 0.5),
        Point::new_2d(-1.0, 2.0),
        Point::new_3d(0.3, -0.7, 1.1),
    ] {
        let expected = evaluator.eval(doc.root, p).unwrap();
        let actual = program.run(p, &AnalyticBasis).unwrap();
        assert_eq!(actual.to_bits(), expected.to_bits(), "at {p:?}");
    }
}

#[test]
fn terrain_kernel_round_trips() {
    assert_emitted_matches_graph(&KernelDocument::from_json(TERRAIN_KERNEL).unwrap());
}

#[test]
fn derivative_and_rotation_round_trip() {
    assert_emitted_matches_graph(&rich_document());
}

#[test]
fn add_kernel_evaluates_to_five() {
    let out = transpile_json(ADD_KERNEL, &blocks_only()).unwrap();
    let program = TargetProgram::parse(&out.source).unwrap();
    assert_eq!(program.run(Point::new_2d(0.5, 0.5), &AnalyticBasis), Ok(5.0));
}

// ══════════════════════════════════════════════════════════════════════════════
// 4. Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn malformed_json_is_reported() {
    let err = transpile_json("{ \"nodes\": [", &TranspileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Json(_)), "{err}");
}

#[test]
fn unknown_opcode_is_a_json_error() {
    let json = r#"{"nodes":[{"opcode":"Teleport"}],"root":0}"#;
    let err = transpile_json(json, &TranspileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Json(_)), "{err}");
}

#[test]
fn forward_reference_is_a_graph_error() {
    let json = r#"{"nodes":[{"opcode":"Abs","operands":[1]},{"opcode":"Constant"}],"root":0}"#;
    let err = transpile_json(json, &TranspileOptions::default()).unwrap_err();
    match err {
        CompileError::Graph(GraphError::ForwardReference { node, operand }) => {
            assert_eq!((node, operand), (NodeId(0), NodeId(1)));
        }
        other => panic!("expected forward reference, got {other}"),
    }
}

#[test]
fn undeclared_input_is_a_graph_error() {
    let json = r#"{"nodes":[{"opcode":"NamedInput","name":"Octaves"}],"root":0}"#;
    let err = transpile_json(json, &TranspileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Graph(GraphError::UndeclaredNamedInput { .. })
    ));
}

#[test]
fn color_opcode_is_a_codegen_error() {
    let mut b = KernelBuilder::new();
    let color = b.instruction(Opcode::Color, &[]);
    let doc = b.document(color);
    let err = transpile(&doc, &TranspileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Codegen(CodegenError::UnsupportedOpcode {
            node: NodeId(0),
            opcode: Opcode::Color
        })
    ));
    assert!(err.to_string().contains("node 0"));
}

#[test]
fn depth_limit_is_a_codegen_error() {
    let mut b = KernelBuilder::new();
    let mut top = b.constant(1.0);
    for _ in 0..20 {
        top = b.unary(Opcode::Abs, top);
    }
    let doc = b.document(top);
    let mut options = TranspileOptions::default();
    options.codegen.max_depth = 8;
    let err = transpile(&doc, &options).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Codegen(CodegenError::DepthLimitExceeded { limit: 8, .. })
    ));
}
