//! Direct interpreter for instruction graphs.
//!
//! Computes what a kernel means at a point, independently of any generated
//! text. Used as the reference the emitted C++ is checked against.

use anl_types::{Axis, InstructionGraph, NamedInputTable, NodeId, Opcode};

use crate::basis::NoiseBasis;
use crate::error::{EvalError, EvalResult};
use crate::math::{self, clamp01, cpp_max, cpp_min, to_int, to_uint};
use crate::point::Point;

/// Evaluates graph nodes against a noise basis.
pub struct GraphEvaluator<'a> {
    graph: &'a InstructionGraph,
    inputs: &'a NamedInputTable,
    basis: &'a dyn NoiseBasis,
}

impl<'a> GraphEvaluator<'a> {
    pub fn new(
        graph: &'a InstructionGraph,
        inputs: &'a NamedInputTable,
        basis: &'a dyn NoiseBasis,
    ) -> Self {
        Self {
            graph,
            inputs,
            basis,
        }
    }

    /// Value of `id` at `p`.
    pub fn eval(&self, id: NodeId, p: Point) -> EvalResult<f64> {
        let node = self
            .graph
            .get(id)
            .ok_or_else(|| EvalError::InvalidGraph(format!("node {id} does not exist")))?;
        let opcode = node.opcode;
        if node.operands.len() != opcode.arity() {
            return Err(EvalError::InvalidGraph(format!(
                "node {id} ({opcode}) has {} operands, expected {}",
                node.operands.len(),
                opcode.arity()
            )));
        }
        let ops = &node.operands;
        let arg = |i: usize| self.eval(ops[i], p);

        let value = match opcode {
            // ── Literals & inputs ─────────────────────────────────────────
            Opcode::Nop | Opcode::Seed | Opcode::Constant => node.value,
            Opcode::NamedInput => {
                let name = node.name.as_deref().unwrap_or_default();
                self.inputs
                    .get(name)
                    .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))?
            }

            // ── Noise bases ───────────────────────────────────────────────
            Opcode::ValueBasis => self.basis.value(&p, to_int(arg(0)?), to_uint(arg(1)?)),
            Opcode::GradientBasis => self.basis.gradient(&p, to_int(arg(0)?), to_uint(arg(1)?)),
            Opcode::SimplexBasis => self.basis.simplex(&p, to_uint(arg(0)?)),
            Opcode::CellularBasis => {
                let distance = to_uint(arg(0)?);
                let f = [arg(1)?, arg(2)?, arg(3)?, arg(4)?];
                let d = [arg(5)?, arg(6)?, arg(7)?, arg(8)?];
                self.basis.cellular(&p, distance, f, d, to_uint(arg(9)?))
            }

            // ── Arithmetic ────────────────────────────────────────────────
            Opcode::Add => arg(0)? + arg(1)?,
            Opcode::Subtract => arg(0)? - arg(1)?,
            Opcode::Multiply => arg(0)? * arg(1)?,
            Opcode::Divide => arg(0)? / arg(1)?,
            Opcode::Bias => math::bias(clamp01(arg(1)?), clamp01(arg(0)?)),
            Opcode::Gain => math::gain(clamp01(arg(1)?), clamp01(arg(0)?)),
            Opcode::Max => cpp_max(arg(0)?, arg(1)?),
            Opcode::Min => cpp_min(arg(0)?, arg(1)?),
            Opcode::Abs => arg(0)?.abs(),
            Opcode::Pow => arg(0)?.powf(arg(1)?),
            Opcode::Cos => arg(0)?.cos(),
            Opcode::Sin => arg(0)?.sin(),
            Opcode::Tan => arg(0)?.tan(),
            Opcode::ACos => arg(0)?.acos(),
            Opcode::ASin => arg(0)?.asin(),
            Opcode::ATan => arg(0)?.atan(),
            Opcode::Tiers => {
                let steps = f64::from(to_int(arg(1)?));
                (arg(0)? * steps).floor() / steps
            }
            Opcode::SmoothTiers => math::smooth_tiers(arg(0)?, to_int(arg(1)?)),

            // ── Domain transforms ─────────────────────────────────────────
            Opcode::ScaleDomain => self.eval(ops[0], p.scale(arg(1)?))?,
            Opcode::ScaleX
            | Opcode::ScaleY
            | Opcode::ScaleZ
            | Opcode::ScaleW
            | Opcode::ScaleU
            | Opcode::ScaleV => {
                let axis = opcode.scaled_axis().unwrap_or(Axis::X);
                self.eval(ops[0], p.scale_axis(axis, arg(1)?))?
            }
            Opcode::TranslateX
            | Opcode::TranslateY
            | Opcode::TranslateZ
            | Opcode::TranslateW
            | Opcode::TranslateU
            | Opcode::TranslateV => {
                let axis = opcode.translated_axis().unwrap_or(Axis::X);
                self.eval(ops[0], p.translate_axis(axis, arg(1)?))?
            }
            Opcode::TranslateDomain => self.eval(ops[0], p.translate(arg(1)?))?,
            Opcode::RotateDomain => {
                let rotated = p.rotate(arg(1)?, arg(2)?, arg(3)?, arg(4)?);
                self.eval(ops[0], rotated)?
            }

            // ── Blending ──────────────────────────────────────────────────
            Opcode::Blend => {
                let low = arg(0)?;
                low + (arg(1)? - low) * arg(2)?
            }
            Opcode::Select => math::select(arg(0)?, arg(1)?, arg(2)?, arg(3)?, arg(4)?),

            // ── Coordinates & derivatives ─────────────────────────────────
            Opcode::X | Opcode::Y | Opcode::Z | Opcode::W | Opcode::U | Opcode::V => {
                p.get(opcode.coordinate_axis().unwrap_or(Axis::X))
            }
            Opcode::DX | Opcode::DY | Opcode::DZ | Opcode::DW | Opcode::DU | Opcode::DV => {
                let axis = opcode.derivative_axis().unwrap_or(Axis::X);
                let spacing = arg(1)?;
                let here = arg(0)?;
                let there = self.eval(ops[0], p + Point::offset(axis, spacing))?;
                (here - there) / spacing
            }

            // ── Shaping ───────────────────────────────────────────────────
            Opcode::Sigmoid => 1.0 / (1.0 + (-arg(2)? * (arg(0)? - arg(1)?)).exp()),
            Opcode::Radial => p.length(),
            Opcode::Clamp => cpp_max(arg(1)?, cpp_min(arg(2)?, arg(0)?)),
            Opcode::HexTile => self.basis.hex_tile(&p, to_uint(arg(0)?)),
            Opcode::HexBump => self.basis.hex_bump(&p),

            // ── Color ─────────────────────────────────────────────────────
            Opcode::Grayscale => arg(0)?,
            Opcode::Color
            | Opcode::ExtractRed
            | Opcode::ExtractGreen
            | Opcode::ExtractBlue
            | Opcode::ExtractAlpha
            | Opcode::CombineRGBA => {
                return Err(EvalError::InvalidGraph(format!(
                    "node {id}: {opcode} has no scalar value"
                )))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::AnalyticBasis;
    use anl_types::KernelBuilder;

    fn eval_at(b: &KernelBuilder, root: NodeId, p: Point) -> f64 {
        GraphEvaluator::new(b.graph(), b.inputs(), &AnalyticBasis)
            .eval(root, p)
            .unwrap()
    }

    #[test]
    fn test_add_constants() {
        let mut b = KernelBuilder::new();
        let two = b.constant(2.0);
        let three = b.constant(3.0);
        let add = b.add(two, three);
        assert_eq!(eval_at(&b, add, Point::new_2d(0.0, 0.0)), 5.0);
    }

    #[test]
    fn test_scale_domain_reaches_source() {
        let mut b = KernelBuilder::new();
        let x = b.coordinate(Axis::X);
        let s = b.named_input("Frequency", 4.0);
        let scaled = b.scale_domain(x, s);
        assert_eq!(eval_at(&b, scaled, Point::new_2d(0.5, 1.0)), 2.0);
    }

    #[test]
    fn test_derivative_of_linear_function() {
        let mut b = KernelBuilder::new();
        let y = b.coordinate(Axis::Y);
        let three = b.constant(3.0);
        let f = b.multiply(y, three);
        let h = b.constant(0.25);
        let dy = b.derivative(Axis::Y, f, h);
        assert_eq!(eval_at(&b, dy, Point::new_2d(0.0, 1.0)), -3.0);
    }

    #[test]
    fn test_color_has_no_scalar_value() {
        let mut b = KernelBuilder::new();
        let c = b.instruction(Opcode::Color, &[]);
        let result = GraphEvaluator::new(b.graph(), b.inputs(), &AnalyticBasis)
            .eval(c, Point::default());
        assert!(matches!(result, Err(EvalError::InvalidGraph(_))));
    }
}
