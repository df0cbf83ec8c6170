//! Lowering engine.
//!
//! Turns one node of the instruction graph into a C++ expression. Every
//! opcode maps to a template over its operands; operands are substituted
//! through [`Session::resolve`], which applies function outlining and cache
//! memoization before recursing.

use anl_types::{Axis, InstructionGraph, InstructionNode, NamedInputTable, NodeId, Opcode};
use std::ops::{Deref, DerefMut};

use crate::cache::{self, CacheAssigner, CacheSlot};
use crate::domain::DomainStack;
use crate::emit::CodegenOptions;
use crate::error::{CodegenError, CodegenResult};
use crate::literal::render_number;
use crate::outline::{self, FunctionOutliner, FunctionRecord};
use crate::template::{Segment, Template};

// ── Templates ────────────────────────────────────────────────────────────────

const VALUE_BASIS: &str = "ValueBasis(^,(int)~,(unsigned int)~)";
const GRADIENT_BASIS: &str = "GradientBasis(^,(int)~,(unsigned int)~)";
const SIMPLEX_BASIS: &str = "SimplexBasis(^,(unsigned int)~)";
const CELLULAR_BASIS: &str = "CellularBasis(^,(unsigned int)~,~,~,~,~,~,~,~,~,(unsigned int)~)";
const BIAS: &str = "bias(std::max(0.0,std::min(1.0,~)), std::max(0.0,std::min(1.0,~)))";
const GAIN: &str = "gain(std::max(0.0,std::min(1.0,~)), std::max(0.0,std::min(1.0,~)))";
const TIERS: &str = "(std::floor(~ * (double)((int)~)) / (double)((int)~))";
const BLEND: &str = "(~ + (~ - ~) * ~)";
const SIGMOID: &str = "(1.0 / (1.0 + std::exp(-~ * (~ - ~))))";
const CLAMP: &str = "std::max(~, std::min(~, ~))";

/// Three-way select. Operand order: falloff, control, threshold, falloff,
/// low, control, threshold, falloff, high, low, high, control, threshold,
/// falloff, control, threshold, low, high.
const SELECT: &str = concat!(
    "((/*falloff*/~ > 0.0) ?\n",
    "\t\t((/*control*/~ < (/*threshold*/~ - /*falloff*/~)) ? /*low*/(~) :\n",
    "\t\t((/*control*/~ > (/*threshold*/~ + /*falloff*/~)) ? /*high*/(~) :\n",
    "\t\tSelect_Blend(~,~,~,~,~))) :\n",
    "\t\t((/*control*/~ < /*threshold*/~) ? /*low*/(~) : /*high*/(~)))",
);

// ══════════════════════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════════════════════

/// All mutable state of one lowering run.
///
/// A session borrows the graph and the named-input table; it owns the domain
/// stack, the cache assigner and the function outliner.
pub struct Session<'g> {
    graph: &'g InstructionGraph,
    inputs: &'g NamedInputTable,
    options: CodegenOptions,
    domain: DomainStack,
    cache: CacheAssigner,
    outliner: FunctionOutliner,
    /// Lowering an outlined function body, whose point is the caller's.
    in_body: bool,
    depth: u32,
}

impl<'g> Session<'g> {
    pub fn new(
        graph: &'g InstructionGraph,
        inputs: &'g NamedInputTable,
        options: CodegenOptions,
    ) -> Self {
        Self {
            graph,
            inputs,
            options,
            domain: DomainStack::default(),
            cache: CacheAssigner::new(graph),
            outliner: FunctionOutliner::new(graph),
            in_body: false,
            depth: 0,
        }
    }

    /// Lower `id` in the current domain frame.
    pub fn lower(&mut self, id: NodeId) -> CodegenResult<String> {
        let node = self.node(id)?;
        if self.depth >= self.options.max_depth {
            return Err(CodegenError::DepthLimitExceeded {
                node: id,
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = self.lower_node(id, node);
        self.depth -= 1;
        result
    }

    /// Number of frames on the domain stack (1 between top-level calls).
    pub fn domain_depth(&self) -> usize {
        self.domain.depth()
    }

    pub fn cache_slots(&self) -> &[CacheSlot] {
        self.cache.slots()
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        self.outliner.records()
    }

    /// Consume the session into its slot and function lists.
    pub fn finish(self) -> (Vec<CacheSlot>, Vec<FunctionRecord>) {
        (self.cache.into_slots(), self.outliner.into_records())
    }

    fn node(&self, id: NodeId) -> CodegenResult<&'g InstructionNode> {
        let graph = self.graph;
        graph.get(id).ok_or(CodegenError::InvalidRoot {
            root: id,
            len: graph.len(),
        })
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn lower_node(&mut self, id: NodeId, node: &'g InstructionNode) -> CodegenResult<String> {
        let opcode = node.opcode;
        self.check_operands(id, node)?;
        let ops = node.operands.as_slice();

        match opcode {
            // ── Literals & inputs ─────────────────────────────────────────
            Opcode::Nop | Opcode::Seed | Opcode::Constant => Ok(render_number(node.value)),
            Opcode::NamedInput => self.named_input(id, node),

            // ── Noise bases ───────────────────────────────────────────────
            Opcode::ValueBasis => self.fill(id, opcode, VALUE_BASIS, ops),
            Opcode::GradientBasis => self.fill(id, opcode, GRADIENT_BASIS, ops),
            Opcode::SimplexBasis => self.fill(id, opcode, SIMPLEX_BASIS, ops),
            Opcode::CellularBasis => self.fill(id, opcode, CELLULAR_BASIS, ops),

            // ── Arithmetic ────────────────────────────────────────────────
            Opcode::Add => self.fill(id, opcode, "(~ + ~)", ops),
            Opcode::Subtract => self.fill(id, opcode, "(~ - ~)", ops),
            Opcode::Multiply => self.fill(id, opcode, "(~ * ~)", ops),
            Opcode::Divide => self.fill(id, opcode, "(~ / ~)", ops),
            Opcode::Bias => self.fill(id, opcode, BIAS, &[ops[1], ops[0]]),
            Opcode::Gain => self.fill(id, opcode, GAIN, &[ops[1], ops[0]]),
            Opcode::Max => self.fill(id, opcode, "std::max(~,~)", ops),
            Opcode::Min => self.fill(id, opcode, "std::min(~,~)", ops),
            Opcode::Abs => self.fill(id, opcode, "std::abs(~)", ops),
            Opcode::Pow => self.fill(id, opcode, "std::pow(~,~)", ops),
            Opcode::Cos => self.fill(id, opcode, "std::cos(~)", ops),
            Opcode::Sin => self.fill(id, opcode, "std::sin(~)", ops),
            Opcode::Tan => self.fill(id, opcode, "std::tan(~)", ops),
            Opcode::ACos => self.fill(id, opcode, "std::acos(~)", ops),
            Opcode::ASin => self.fill(id, opcode, "std::asin(~)", ops),
            Opcode::ATan => self.fill(id, opcode, "std::atan(~)", ops),
            Opcode::Tiers => self.fill(id, opcode, TIERS, &[ops[0], ops[1], ops[1]]),
            Opcode::SmoothTiers => self.fill(id, opcode, "SmoothTiers(~,~)", ops),

            // ── Domain transforms ─────────────────────────────────────────
            Opcode::ScaleDomain => self.transform(id, opcode, "(^.Scale(~))", ops),
            Opcode::ScaleX
            | Opcode::ScaleY
            | Opcode::ScaleZ
            | Opcode::ScaleW
            | Opcode::ScaleU
            | Opcode::ScaleV => {
                let axis = opcode.scaled_axis().unwrap_or(Axis::X);
                let frame = format!("(^.Scale{}(~))", axis.suffix());
                self.transform(id, opcode, &frame, ops)
            }
            Opcode::TranslateX
            | Opcode::TranslateY
            | Opcode::TranslateZ
            | Opcode::TranslateW
            | Opcode::TranslateU
            | Opcode::TranslateV => {
                let axis = opcode.translated_axis().unwrap_or(Axis::X);
                let frame = format!("(^.Translate{}(~))", axis.suffix());
                self.transform(id, opcode, &frame, ops)
            }
            Opcode::TranslateDomain => self.transform(id, opcode, "(^.Translate(~))", ops),
            Opcode::RotateDomain => self.transform(id, opcode, "RotateDomain(^,~,~,~,~)", ops),

            // ── Blending ──────────────────────────────────────────────────
            Opcode::Blend => self.fill(id, opcode, BLEND, &[ops[0], ops[1], ops[0], ops[2]]),
            Opcode::Select => {
                let [low, high, control, threshold, falloff] = [ops[0], ops[1], ops[2], ops[3], ops[4]];
                let order = [
                    falloff, control, threshold, falloff, low, control, threshold, falloff, high,
                    low, high, control, threshold, falloff, control, threshold, low, high,
                ];
                self.fill(id, opcode, SELECT, &order)
            }

            // ── Coordinates & derivatives ─────────────────────────────────
            Opcode::X | Opcode::Y | Opcode::Z | Opcode::W | Opcode::U | Opcode::V => {
                let axis = opcode.coordinate_axis().unwrap_or(Axis::X);
                self.fill(id, opcode, &format!("(^.{})", axis.field()), ops)
            }
            Opcode::DX | Opcode::DY | Opcode::DZ | Opcode::DW | Opcode::DU | Opcode::DV => {
                let axis = opcode.derivative_axis().unwrap_or(Axis::X);
                self.derivative(id, opcode, axis, ops[0], ops[1])
            }

            // ── Shaping ───────────────────────────────────────────────────
            Opcode::Sigmoid => self.fill(id, opcode, SIGMOID, &[ops[2], ops[0], ops[1]]),
            Opcode::Radial => self.fill(id, opcode, "(^.Length())", ops),
            Opcode::Clamp => self.fill(id, opcode, CLAMP, &[ops[1], ops[2], ops[0]]),
            Opcode::HexTile => self.fill(id, opcode, "HexTile(^,(unsigned int)~)", ops),
            Opcode::HexBump => self.fill(id, opcode, "HexBump(^)", ops),

            // ── Color ─────────────────────────────────────────────────────
            Opcode::Grayscale => self.fill(id, opcode, "~", ops),
            Opcode::Color
            | Opcode::ExtractRed
            | Opcode::ExtractGreen
            | Opcode::ExtractBlue
            | Opcode::ExtractAlpha
            | Opcode::CombineRGBA => Err(CodegenError::UnsupportedOpcode { node: id, opcode }),
        }
    }

    /// Operand count matches the opcode and every operand is in the graph.
    fn check_operands(&self, id: NodeId, node: &InstructionNode) -> CodegenResult<()> {
        let expected = node.opcode.arity();
        if node.operands.len() != expected {
            return Err(CodegenError::Structural {
                node: id,
                opcode: node.opcode,
                expected,
                found: node.operands.len(),
            });
        }
        match node
            .operands
            .iter()
            .find(|operand| operand.index() >= self.graph.len())
        {
            Some(&operand) => Err(CodegenError::InvalidOperand { node: id, operand }),
            None => Ok(()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Substitution
    // ══════════════════════════════════════════════════════════════════════

    /// Expand `template` with `operands` resolved in placeholder order.
    fn fill(
        &mut self,
        id: NodeId,
        opcode: Opcode,
        template: &str,
        operands: &[NodeId],
    ) -> CodegenResult<String> {
        let template = Template::parse(template);
        let placeholders = template.placeholders();
        if placeholders > operands.len() {
            return Err(CodegenError::ArgumentIndex {
                node: id,
                opcode,
                placeholders,
                operands: operands.len(),
            });
        }
        if placeholders < operands.len() {
            return Err(CodegenError::Structural {
                node: id,
                opcode,
                expected: placeholders,
                found: operands.len(),
            });
        }

        let mut out = String::new();
        for segment in template.segments() {
            match *segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Operand(i) => {
                    let text = self.resolve(operands[i])?;
                    out.push_str(&text);
                }
                Segment::Point => out.push_str(&self.domain.current()),
            }
        }
        Ok(out)
    }

    /// Text for an operand reference: a call to its outlined function or its
    /// inline lowering, wrapped in a memo guard when it owns a slot here.
    fn resolve(&mut self, id: NodeId) -> CodegenResult<String> {
        let node = self.node(id)?;
        let slot = if cache::is_cache_candidate(node.opcode) {
            let frame = if self.in_body {
                None
            } else {
                Some(self.domain.path())
            };
            self.cache.assign_or_get(id, frame)
        } else {
            None
        };

        let text = if self.outliner.is_function_candidate(id, node.opcode) {
            self.call_outlined(id)?
        } else {
            self.lower(id)?
        };

        Ok(match slot {
            Some(slot) => cache::memo_guard(slot, &text),
            None => text,
        })
    }

    /// Call the function outlined for `id` at the current point, lowering its
    /// body on first use.
    fn call_outlined(&mut self, id: NodeId) -> CodegenResult<String> {
        if self.outliner.record(id).is_none() {
            let body = {
                let mut scope = BodyScope::enter(self);
                scope.lower(id)?
            };
            self.outliner.register(id, &body);
        }
        Ok(outline::call_expression(id, &self.domain.current()))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Domain frames
    // ══════════════════════════════════════════════════════════════════════

    /// Lower `ops[0]` in the frame built from `frame_template` over the
    /// remaining operands.
    fn transform(
        &mut self,
        id: NodeId,
        opcode: Opcode,
        frame_template: &str,
        ops: &[NodeId],
    ) -> CodegenResult<String> {
        let (source, params) = match ops.split_first() {
            Some(split) => split,
            None => {
                return Err(CodegenError::Structural {
                    node: id,
                    opcode,
                    expected: opcode.arity(),
                    found: 0,
                })
            }
        };
        let frame = self.fill(id, opcode, frame_template, params)?;
        let mut scope = FrameScope::enter(self, id, frame);
        scope.resolve(*source)
    }

    /// Forward difference of `value` along `axis` with step `spacing`.
    fn derivative(
        &mut self,
        id: NodeId,
        opcode: Opcode,
        axis: Axis,
        value: NodeId,
        spacing: NodeId,
    ) -> CodegenResult<String> {
        let here = self.resolve(value)?;

        let mut offset = ["0.0"; 6];
        offset[axis.index()] = "~";
        let frame_template = format!("(^ + Point({}))", offset.join(","));
        let frame = self.fill(id, opcode, &frame_template, &[spacing])?;
        let there = {
            let mut scope = FrameScope::enter(self, id, frame);
            scope.resolve(value)?
        };

        let step = self.resolve(spacing)?;
        Ok(format!("(({here} - {there}) / {step})"))
    }

    fn named_input(&mut self, id: NodeId, node: &InstructionNode) -> CodegenResult<String> {
        match &node.name {
            Some(name) if self.inputs.contains(name) => Ok(format!("NamedInput.{name}")),
            name => Err(CodegenError::UndeclaredNamedInput {
                node: id,
                name: name.clone().unwrap_or_default(),
            }),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scope guards
// ══════════════════════════════════════════════════════════════════════════════

/// Holds a pushed domain frame; pops it when dropped.
struct FrameScope<'s, 'g> {
    session: &'s mut Session<'g>,
}

impl<'s, 'g> FrameScope<'s, 'g> {
    fn enter(session: &'s mut Session<'g>, origin: NodeId, text: String) -> Self {
        session.domain.push(origin, text);
        Self { session }
    }
}

impl Drop for FrameScope<'_, '_> {
    fn drop(&mut self) {
        self.session.domain.pop();
    }
}

impl<'g> Deref for FrameScope<'_, 'g> {
    type Target = Session<'g>;

    fn deref(&self) -> &Session<'g> {
        self.session
    }
}

impl<'g> DerefMut for FrameScope<'_, 'g> {
    fn deref_mut(&mut self) -> &mut Session<'g> {
        self.session
    }
}

/// Swaps in a fresh domain stack rooted at the function parameter for the
/// duration of a function body; restores the caller's state when dropped.
struct BodyScope<'s, 'g> {
    session: &'s mut Session<'g>,
    saved: Option<DomainStack>,
    was_in_body: bool,
}

impl<'s, 'g> BodyScope<'s, 'g> {
    fn enter(session: &'s mut Session<'g>) -> Self {
        let saved = std::mem::take(&mut session.domain);
        let was_in_body = std::mem::replace(&mut session.in_body, true);
        Self {
            session,
            saved: Some(saved),
            was_in_body,
        }
    }
}

impl Drop for BodyScope<'_, '_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.session.domain = saved;
        }
        self.session.in_body = self.was_in_body;
    }
}

impl<'g> Deref for BodyScope<'_, 'g> {
    type Target = Session<'g>;

    fn deref(&self) -> &Session<'g> {
        self.session
    }
}

impl<'g> DerefMut for BodyScope<'_, 'g> {
    fn deref_mut(&mut self) -> &mut Session<'g> {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anl_types::KernelBuilder;

    fn lower_root(b: &KernelBuilder, root: NodeId) -> CodegenResult<String> {
        let mut session = Session::new(b.graph(), b.inputs(), CodegenOptions::default());
        let text = session.lower(root);
        assert_eq!(session.domain_depth(), 1);
        text
    }

    #[test]
    fn test_constant() {
        let mut b = KernelBuilder::new();
        let c = b.constant(2.5);
        assert_eq!(lower_root(&b, c).unwrap(), "2.5");
    }

    #[test]
    fn test_bias_operands_are_reordered() {
        let mut b = KernelBuilder::new();
        let src = b.constant(0.25);
        let amount = b.constant(0.75);
        let bias = b.bias(src, amount);
        assert_eq!(
            lower_root(&b, bias).unwrap(),
            "bias(std::max(0.0,std::min(1.0,0.75)), std::max(0.0,std::min(1.0,0.25)))"
        );
    }

    #[test]
    fn test_tiers_repeats_steps() {
        let mut b = KernelBuilder::new();
        let x = b.coordinate(Axis::X);
        let steps = b.constant(4.0);
        let t = b.tiers(x, steps);
        assert_eq!(
            lower_root(&b, t).unwrap(),
            "(std::floor((Point(EvalPoint).x) * (double)((int)4.0)) / (double)((int)4.0))"
        );
    }

    #[test]
    fn test_scale_axis_frame() {
        let mut b = KernelBuilder::new();
        let y = b.coordinate(Axis::Y);
        let s = b.constant(3.0);
        let scaled = b.scale_axis(Axis::Y, y, s);
        assert_eq!(
            lower_root(&b, scaled).unwrap(),
            "((Point(EvalPoint).ScaleY(3.0)).y)"
        );
    }

    #[test]
    fn test_nested_frames_use_inner_text() {
        let mut b = KernelBuilder::new();
        let r = b.radial();
        let off = b.constant(1.0);
        let moved = b.translate_domain(r, off);
        let s = b.constant(2.0);
        let root = b.scale_domain(moved, s);
        assert_eq!(
            lower_root(&b, root).unwrap(),
            "(((Point(EvalPoint).Scale(2.0)).Translate(1.0)).Length())"
        );
    }

    #[test]
    fn test_clamp_and_sigmoid_orders() {
        let mut b = KernelBuilder::new();
        let v = b.constant(0.5);
        let lo = b.constant(0.0);
        let hi = b.constant(1.0);
        let clamp = b.clamp(v, lo, hi);
        assert_eq!(
            lower_root(&b, clamp).unwrap(),
            "std::max(0.0, std::min(1.0, 0.5))"
        );

        let center = b.constant(0.1);
        let ramp = b.constant(8.0);
        let sig = b.sigmoid(v, center, ramp);
        assert_eq!(
            lower_root(&b, sig).unwrap(),
            "(1.0 / (1.0 + std::exp(-8.0 * (0.5 - 0.1))))"
        );
    }

    #[test]
    fn test_negative_literal_after_minus() {
        let mut b = KernelBuilder::new();
        let a = b.constant(1.0);
        let n = b.constant(-2.0);
        let sub = b.subtract(a, n);
        assert_eq!(lower_root(&b, sub).unwrap(), "(1.0 - (-2.0))");
    }

    #[test]
    fn test_grayscale_passes_through() {
        let mut b = KernelBuilder::new();
        let c = b.constant(0.3);
        let g = b.grayscale(c);
        assert_eq!(lower_root(&b, g).unwrap(), "0.3");
    }

    #[test]
    fn test_color_is_unsupported() {
        let mut b = KernelBuilder::new();
        let c = b.instruction(Opcode::Color, &[]);
        assert_eq!(
            lower_root(&b, c),
            Err(CodegenError::UnsupportedOpcode {
                node: c,
                opcode: Opcode::Color
            })
        );
    }

    #[test]
    fn test_every_color_opcode_is_unsupported() {
        let mut b = KernelBuilder::new();
        let c = b.constant(0.5);
        for opcode in [
            Opcode::Color,
            Opcode::ExtractRed,
            Opcode::ExtractGreen,
            Opcode::ExtractBlue,
            Opcode::ExtractAlpha,
            Opcode::CombineRGBA,
        ] {
            let operands = vec![c; opcode.arity()];
            let node = b.instruction(opcode, &operands);
            let mut session = Session::new(b.graph(), b.inputs(), CodegenOptions::default());
            assert_eq!(
                session.lower(node),
                Err(CodegenError::UnsupportedOpcode { node, opcode })
            );
        }
    }

    #[test]
    fn test_arity_mismatch_is_structural() {
        let mut b = KernelBuilder::new();
        let a = b.constant(1.0);
        let add = b.instruction(Opcode::Add, &[a]);
        assert_eq!(
            lower_root(&b, add),
            Err(CodegenError::Structural {
                node: add,
                opcode: Opcode::Add,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_template_with_too_many_placeholders() {
        let mut b = KernelBuilder::new();
        let a = b.constant(1.0);
        let mut session = Session::new(b.graph(), b.inputs(), CodegenOptions::default());
        assert_eq!(
            session.fill(a, Opcode::Add, "(~ + ~)", &[a]),
            Err(CodegenError::ArgumentIndex {
                node: a,
                opcode: Opcode::Add,
                placeholders: 2,
                operands: 1
            })
        );
    }

    #[test]
    fn test_frame_popped_on_error() {
        let mut b = KernelBuilder::new();
        let bad = b.instruction(Opcode::ExtractRed, &[]);
        let s = b.constant(2.0);
        let scaled = b.scale_domain(bad, s);
        let mut session = Session::new(b.graph(), b.inputs(), CodegenOptions::default());
        assert!(session.lower(scaled).is_err());
        assert_eq!(session.domain_depth(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut b = KernelBuilder::new();
        let mut node = b.constant(1.0);
        for _ in 0..10 {
            node = b.unary(Opcode::Abs, node);
        }
        let options = CodegenOptions { max_depth: 4 };
        let mut session = Session::new(b.graph(), b.inputs(), options);
        assert!(matches!(
            session.lower(node),
            Err(CodegenError::DepthLimitExceeded { limit: 4, .. })
        ));
    }
}
