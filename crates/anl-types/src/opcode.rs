//! Instruction opcodes and coordinate axes.
//!
//! [`Opcode`] is the closed set of instruction kinds a noise kernel can
//! contain. Each opcode has a fixed operand count ([`Opcode::arity`]); scalar
//! payloads (literal values, input names) live on the node itself.

use serde::{Deserialize, Serialize};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Axis
// ══════════════════════════════════════════════════════════════════════════════

/// One of the six coordinate axes of an evaluation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    W,
    U,
    V,
}

impl Axis {
    /// All axes in component order.
    pub const ALL: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::W, Axis::U, Axis::V];

    /// Component index (x = 0 … v = 5).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::W => 3,
            Axis::U => 4,
            Axis::V => 5,
        }
    }

    /// Lower-case component name, as used for point fields.
    pub fn field(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::W => "w",
            Axis::U => "u",
            Axis::V => "v",
        }
    }

    /// Upper-case suffix, as used in method names (`ScaleX`, `TranslateU`).
    pub fn suffix(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::W => "W",
            Axis::U => "U",
            Axis::V => "V",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Opcode
// ══════════════════════════════════════════════════════════════════════════════

/// Every instruction kind of the noise kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ── Literals & inputs ─────────────────────────────────────
    Nop,
    Seed,
    Constant,
    NamedInput,

    // ── Noise bases ───────────────────────────────────────────
    ValueBasis,
    GradientBasis,
    SimplexBasis,
    CellularBasis,

    // ── Arithmetic ────────────────────────────────────────────
    Add,
    Subtract,
    Multiply,
    Divide,
    Bias,
    Gain,
    Max,
    Min,
    Abs,
    Pow,
    Cos,
    Sin,
    Tan,
    ACos,
    ASin,
    ATan,
    Tiers,
    SmoothTiers,

    // ── Domain transforms ─────────────────────────────────────
    ScaleDomain,
    ScaleX,
    ScaleY,
    ScaleZ,
    ScaleW,
    ScaleU,
    ScaleV,
    TranslateX,
    TranslateY,
    TranslateZ,
    TranslateW,
    TranslateU,
    TranslateV,
    TranslateDomain,
    RotateDomain,

    // ── Blending ──────────────────────────────────────────────
    Blend,
    Select,

    // ── Coordinates & derivatives ─────────────────────────────
    X,
    Y,
    Z,
    W,
    U,
    V,
    DX,
    DY,
    DZ,
    DW,
    DU,
    DV,

    // ── Shaping ───────────────────────────────────────────────
    Sigmoid,
    Radial,
    Clamp,
    HexTile,
    HexBump,

    // ── Color ─────────────────────────────────────────────────
    Color,
    ExtractRed,
    ExtractGreen,
    ExtractBlue,
    ExtractAlpha,
    Grayscale,
    CombineRGBA,
}

impl Opcode {
    /// Every opcode, in declaration order.
    pub const ALL: [Opcode; 67] = [
        Opcode::Nop,
        Opcode::Seed,
        Opcode::Constant,
        Opcode::NamedInput,
        Opcode::ValueBasis,
        Opcode::GradientBasis,
        Opcode::SimplexBasis,
        Opcode::CellularBasis,
        Opcode::Add,
        Opcode::Subtract,
        Opcode::Multiply,
        Opcode::Divide,
        Opcode::Bias,
        Opcode::Gain,
        Opcode::Max,
        Opcode::Min,
        Opcode::Abs,
        Opcode::Pow,
        Opcode::Cos,
        Opcode::Sin,
        Opcode::Tan,
        Opcode::ACos,
        Opcode::ASin,
        Opcode::ATan,
        Opcode::Tiers,
        Opcode::SmoothTiers,
        Opcode::ScaleDomain,
        Opcode::ScaleX,
        Opcode::ScaleY,
        Opcode::ScaleZ,
        Opcode::ScaleW,
        Opcode::ScaleU,
        Opcode::ScaleV,
        Opcode::TranslateX,
        Opcode::TranslateY,
        Opcode::TranslateZ,
        Opcode::TranslateW,
        Opcode::TranslateU,
        Opcode::TranslateV,
        Opcode::TranslateDomain,
        Opcode::RotateDomain,
        Opcode::Blend,
        Opcode::Select,
        Opcode::X,
        Opcode::Y,
        Opcode::Z,
        Opcode::W,
        Opcode::U,
        Opcode::V,
        Opcode::DX,
        Opcode::DY,
        Opcode::DZ,
        Opcode::DW,
        Opcode::DU,
        Opcode::DV,
        Opcode::Sigmoid,
        Opcode::Radial,
        Opcode::Clamp,
        Opcode::HexTile,
        Opcode::HexBump,
        Opcode::Color,
        Opcode::ExtractRed,
        Opcode::ExtractGreen,
        Opcode::ExtractBlue,
        Opcode::ExtractAlpha,
        Opcode::Grayscale,
        Opcode::CombineRGBA,
    ];

    /// Number of operands an instruction of this kind carries.
    pub fn arity(self) -> usize {
        use Opcode::*;
        match self {
            Nop | Seed | Constant | NamedInput => 0,
            X | Y | Z | W | U | V | Radial | HexBump | Color => 0,
            SimplexBasis | HexTile => 1,
            Abs | Cos | Sin | Tan | ACos | ASin | ATan => 1,
            ExtractRed | ExtractGreen | ExtractBlue | ExtractAlpha | Grayscale => 1,
            ValueBasis | GradientBasis => 2,
            Add | Subtract | Multiply | Divide | Bias | Gain | Max | Min | Pow => 2,
            Tiers | SmoothTiers => 2,
            ScaleDomain | ScaleX | ScaleY | ScaleZ | ScaleW | ScaleU | ScaleV => 2,
            TranslateX | TranslateY | TranslateZ | TranslateW | TranslateU | TranslateV => 2,
            TranslateDomain => 2,
            DX | DY | DZ | DW | DU | DV => 2,
            Blend | Sigmoid | Clamp => 3,
            CombineRGBA => 4,
            RotateDomain | Select => 5,
            CellularBasis => 10,
        }
    }

    /// `true` for opcodes that carry a literal value payload.
    pub fn is_literal(self) -> bool {
        matches!(self, Opcode::Nop | Opcode::Seed | Opcode::Constant)
    }

    /// `true` for opcodes that evaluate their first operand at a derived point.
    pub fn is_domain_transform(self) -> bool {
        self.scaled_axis().is_some()
            || self.translated_axis().is_some()
            || matches!(
                self,
                Opcode::ScaleDomain | Opcode::TranslateDomain | Opcode::RotateDomain
            )
    }

    /// Axis of a per-axis scale (`ScaleX` … `ScaleV`).
    pub fn scaled_axis(self) -> Option<Axis> {
        match self {
            Opcode::ScaleX => Some(Axis::X),
            Opcode::ScaleY => Some(Axis::Y),
            Opcode::ScaleZ => Some(Axis::Z),
            Opcode::ScaleW => Some(Axis::W),
            Opcode::ScaleU => Some(Axis::U),
            Opcode::ScaleV => Some(Axis::V),
            _ => None,
        }
    }

    /// Axis of a per-axis translation (`TranslateX` … `TranslateV`).
    pub fn translated_axis(self) -> Option<Axis> {
        match self {
            Opcode::TranslateX => Some(Axis::X),
            Opcode::TranslateY => Some(Axis::Y),
            Opcode::TranslateZ => Some(Axis::Z),
            Opcode::TranslateW => Some(Axis::W),
            Opcode::TranslateU => Some(Axis::U),
            Opcode::TranslateV => Some(Axis::V),
            _ => None,
        }
    }

    /// Axis read by a coordinate accessor (`X` … `V`).
    pub fn coordinate_axis(self) -> Option<Axis> {
        match self {
            Opcode::X => Some(Axis::X),
            Opcode::Y => Some(Axis::Y),
            Opcode::Z => Some(Axis::Z),
            Opcode::W => Some(Axis::W),
            Opcode::U => Some(Axis::U),
            Opcode::V => Some(Axis::V),
            _ => None,
        }
    }

    /// Axis of a finite-difference derivative (`DX` … `DV`).
    pub fn derivative_axis(self) -> Option<Axis> {
        match self {
            Opcode::DX => Some(Axis::X),
            Opcode::DY => Some(Axis::Y),
            Opcode::DZ => Some(Axis::Z),
            Opcode::DW => Some(Axis::W),
            Opcode::DU => Some(Axis::U),
            Opcode::DV => Some(Axis::V),
            _ => None,
        }
    }

    /// Per-axis scale opcode for `axis`.
    pub fn scale(axis: Axis) -> Opcode {
        match axis {
            Axis::X => Opcode::ScaleX,
            Axis::Y => Opcode::ScaleY,
            Axis::Z => Opcode::ScaleZ,
            Axis::W => Opcode::ScaleW,
            Axis::U => Opcode::ScaleU,
            Axis::V => Opcode::ScaleV,
        }
    }

    /// Per-axis translation opcode for `axis`.
    pub fn translate(axis: Axis) -> Opcode {
        match axis {
            Axis::X => Opcode::TranslateX,
            Axis::Y => Opcode::TranslateY,
            Axis::Z => Opcode::TranslateZ,
            Axis::W => Opcode::TranslateW,
            Axis::U => Opcode::TranslateU,
            Axis::V => Opcode::TranslateV,
        }
    }

    /// Coordinate accessor opcode for `axis`.
    pub fn coordinate(axis: Axis) -> Opcode {
        match axis {
            Axis::X => Opcode::X,
            Axis::Y => Opcode::Y,
            Axis::Z => Opcode::Z,
            Axis::W => Opcode::W,
            Axis::U => Opcode::U,
            Axis::V => Opcode::V,
        }
    }

    /// Finite-difference derivative opcode for `axis`.
    pub fn derivative(axis: Axis) -> Opcode {
        match axis {
            Axis::X => Opcode::DX,
            Axis::Y => Opcode::DY,
            Axis::Z => Opcode::DZ,
            Axis::W => Opcode::DW,
            Axis::U => Opcode::DU,
            Axis::V => Opcode::DV,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_complete_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for op in Opcode::ALL {
            assert!(seen.insert(op), "duplicate {op}");
        }
        assert_eq!(seen.len(), 67);
    }

    #[test]
    fn test_axis_constructors_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Opcode::scale(axis).scaled_axis(), Some(axis));
            assert_eq!(Opcode::translate(axis).translated_axis(), Some(axis));
            assert_eq!(Opcode::coordinate(axis).coordinate_axis(), Some(axis));
            assert_eq!(Opcode::derivative(axis).derivative_axis(), Some(axis));
        }
    }

    #[test]
    fn test_domain_transforms() {
        assert!(Opcode::ScaleDomain.is_domain_transform());
        assert!(Opcode::TranslateW.is_domain_transform());
        assert!(Opcode::RotateDomain.is_domain_transform());
        assert!(!Opcode::DX.is_domain_transform());
        assert!(!Opcode::Select.is_domain_transform());
    }

    #[test]
    fn test_arity_samples() {
        assert_eq!(Opcode::Constant.arity(), 0);
        assert_eq!(Opcode::Select.arity(), 5);
        assert_eq!(Opcode::CellularBasis.arity(), 10);
        assert_eq!(Opcode::RotateDomain.arity(), 5);
        assert_eq!(Opcode::Sigmoid.arity(), 3);
    }

    #[test]
    fn test_serde_tag_is_variant_name() {
        let json = serde_json::to_string(&Opcode::GradientBasis).unwrap();
        assert_eq!(json, "\"GradientBasis\"");
        let back: Opcode = serde_json::from_str("\"ACos\"").unwrap();
        assert_eq!(back, Opcode::ACos);
    }

    #[test]
    fn test_axis_display() {
        assert_eq!(Axis::W.to_string(), "w");
        assert_eq!(Axis::U.suffix(), "U");
        assert_eq!(Axis::V.index(), 5);
    }
}
