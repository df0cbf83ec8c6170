//! Noise basis functions.
//!
//! Both evaluators call the basis through [`NoiseBasis`], so a kernel can be
//! checked end to end without the real noise library. [`AnalyticBasis`] is a
//! deterministic closed-form stand-in: smooth, seed-dependent and cheap.

use crate::point::Point;

/// The basis functions generated code calls by name.
pub trait NoiseBasis {
    fn value(&self, p: &Point, interpolation: i32, seed: u32) -> f64;

    fn gradient(&self, p: &Point, interpolation: i32, seed: u32) -> f64;

    fn simplex(&self, p: &Point, seed: u32) -> f64;

    /// Cellular basis: `f` weights the four nearest feature values, `d` the
    /// four nearest distances.
    fn cellular(&self, p: &Point, distance: u32, f: [f64; 4], d: [f64; 4], seed: u32) -> f64;

    fn hex_tile(&self, p: &Point, seed: u32) -> f64;

    fn hex_bump(&self, p: &Point) -> f64;
}

/// Closed-form stand-in basis.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticBasis;

/// Components read by a basis for the point's dimension count.
fn components(p: &Point) -> Vec<f64> {
    match p.dimensions {
        2 => vec![p.x, p.y],
        3 => vec![p.x, p.y, p.z],
        4 => vec![p.x, p.y, p.z, p.w],
        _ => vec![p.x, p.y, p.z, p.w, p.u, p.v],
    }
}

fn seed_phase(seed: u32) -> f64 {
    f64::from(seed % 1021) * 0.618_033_988_75
}

/// Weighted phase sum over the active components.
fn phase(p: &Point, weights: &[f64; 6], seed: u32) -> f64 {
    components(p)
        .iter()
        .zip(weights)
        .map(|(c, w)| c * w)
        .sum::<f64>()
        + seed_phase(seed)
}

impl NoiseBasis for AnalyticBasis {
    fn value(&self, p: &Point, interpolation: i32, seed: u32) -> f64 {
        let a = phase(p, &[1.3, 0.7, 0.5, 0.3, 0.2, 0.1], seed);
        a.sin() * (1.0 + 0.1 * f64::from(interpolation.clamp(0, 3))) / 1.3
    }

    fn gradient(&self, p: &Point, interpolation: i32, seed: u32) -> f64 {
        let a = phase(p, &[0.9, 1.1, 0.6, 0.4, 0.3, 0.2], seed);
        let b = phase(p, &[-0.4, 0.8, 1.2, 0.1, 0.5, 0.7], seed.wrapping_add(17));
        (a.cos() * b.sin()) * (1.0 - 0.05 * f64::from(interpolation.clamp(0, 3)))
    }

    fn simplex(&self, p: &Point, seed: u32) -> f64 {
        let a = phase(p, &[1.7, -0.6, 0.9, 0.2, 0.4, 0.3], seed);
        (a.sin() + 0.5 * (2.0 * a).cos()) / 1.5
    }

    fn cellular(&self, p: &Point, distance: u32, f: [f64; 4], d: [f64; 4], seed: u32) -> f64 {
        let a = phase(p, &[0.5, 0.5, 0.5, 0.5, 0.5, 0.5], seed);
        let metric = f64::from(distance % 4) * 0.25;
        (0..4)
            .map(|i| {
                let k = i as f64 + 1.0;
                let feature = ((a * k) + metric).sin().abs();
                let dist = ((a / k) - metric).cos().abs();
                f[i] * feature + d[i] * dist
            })
            .sum()
    }

    fn hex_tile(&self, p: &Point, seed: u32) -> f64 {
        let cell = p.x.floor() * 12.9898 + p.y.floor() * 78.233 + seed_phase(seed);
        let h = (cell.sin() * 43_758.545_3).fract();
        h.abs()
    }

    fn hex_bump(&self, p: &Point) -> f64 {
        (p.x * std::f64::consts::PI).cos() * (p.y * std::f64::consts::PI).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let b = AnalyticBasis;
        let p = Point::new_2d(0.3, -1.2);
        assert_eq!(b.gradient(&p, 3, 7), b.gradient(&p, 3, 7));
        assert_ne!(b.gradient(&p, 3, 7), b.gradient(&p, 3, 8));
    }

    #[test]
    fn test_dimensions_select_components() {
        let b = AnalyticBasis;
        let flat = Point::new_2d(0.3, 0.4);
        let lifted = Point { z: 9.0, ..flat };
        assert_eq!(b.value(&flat, 1, 3), b.value(&lifted, 1, 3));
        let full = Point::new(0.3, 0.4, 0.0, 0.0, 0.0, 0.0);
        let full_lifted = Point { z: 9.0, ..full };
        assert_ne!(b.value(&full, 1, 3), b.value(&full_lifted, 1, 3));
    }

    #[test]
    fn test_hex_tile_in_unit_range() {
        let b = AnalyticBasis;
        for i in 0..20 {
            let v = b.hex_tile(&Point::new_2d(f64::from(i) * 0.37, 1.5), 5);
            assert!((0.0..1.0).contains(&v), "{v}");
        }
    }
}
