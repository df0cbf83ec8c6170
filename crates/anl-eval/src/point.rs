//! Evaluation points.
//!
//! Mirrors the `Point` type of the generated C++ exactly, including the
//! dimension-dependent behavior of whole-domain scale and translate, so that
//! both evaluators see bit-identical coordinates.

use anl_types::Axis;
use std::ops::Add;

/// A six-component evaluation point.
///
/// `dimensions` selects how many components whole-domain transforms touch:
/// 2, 3 and 4 affect the leading components; any other value affects all six.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub u: f64,
    pub v: f64,
    pub dimensions: i32,
}

impl Point {
    /// Six-component point with `dimensions == 0`.
    pub fn new(x: f64, y: f64, z: f64, w: f64, u: f64, v: f64) -> Self {
        Self {
            x,
            y,
            z,
            w,
            u,
            v,
            dimensions: 0,
        }
    }

    /// A 2D sample point, as built by the 2D entry point.
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self {
            dimensions: 2,
            ..Self::new(x, y, 0.0, 0.0, 0.0, 0.0)
        }
    }

    /// A 3D sample point, as built by the 3D entry point.
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            dimensions: 3,
            ..Self::new(x, y, z, 0.0, 0.0, 0.0)
        }
    }

    /// Unit offset of `amount` along `axis`.
    pub fn offset(axis: Axis, amount: f64) -> Self {
        let mut p = Self::default();
        p.set(axis, amount);
        p
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::W => self.w,
            Axis::U => self.u,
            Axis::V => self.v,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
            Axis::W => self.w = value,
            Axis::U => self.u = value,
            Axis::V => self.v = value,
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x
            + self.y * self.y
            + self.z * self.z
            + self.w * self.w
            + self.u * self.u
            + self.v * self.v)
            .sqrt()
    }

    /// Axes touched by whole-domain transforms.
    fn active_axes(&self) -> &'static [Axis] {
        match self.dimensions {
            2 => &Axis::ALL[..2],
            3 => &Axis::ALL[..3],
            4 => &Axis::ALL[..4],
            _ => &Axis::ALL,
        }
    }

    /// Scale the active components; inactive ones are zeroed.
    pub fn scale(&self, factor: f64) -> Self {
        let mut p = Self {
            dimensions: self.dimensions,
            ..Self::default()
        };
        for &axis in self.active_axes() {
            p.set(axis, self.get(axis) * factor);
        }
        p
    }

    /// Translate the active components; inactive ones are kept.
    pub fn translate(&self, offset: f64) -> Self {
        let mut p = *self;
        for &axis in self.active_axes() {
            p.set(axis, self.get(axis) + offset);
        }
        p
    }

    pub fn scale_axis(mut self, axis: Axis, factor: f64) -> Self {
        self.set(axis, self.get(axis) * factor);
        self
    }

    pub fn translate_axis(mut self, axis: Axis, offset: f64) -> Self {
        self.set(axis, self.get(axis) + offset);
        self
    }

    /// Rotate x/y/z by `angle` around the axis `(ax, ay, az)`.
    pub fn rotate(mut self, angle: f64, ax: f64, ay: f64, az: f64) -> Self {
        let len = (ax * ax + ay * ay + az * az).sqrt();
        let (ax, ay, az) = (ax / len, ay / len, az / len);
        let c = angle.cos();
        let s = angle.sin();
        let t = 1.0 - c;

        let m00 = 1.0 + t * (ax * ax - 1.0);
        let m10 = -az * s + t * ax * ay;
        let m20 = ay * s + t * ax * az;
        let m01 = az * s + t * ax * ay;
        let m11 = 1.0 + t * (ay * ay - 1.0);
        let m21 = -ax * s + t * ay * az;
        let m02 = -ay * s + t * ax * az;
        let m12 = ax * s + t * ay * az;
        let m22 = 1.0 + t * (az * az - 1.0);

        let nx = (m00 * self.x) + (m10 * self.y) + (m20 * self.z);
        let ny = (m01 * self.x) + (m11 * self.y) + (m21 * self.z);
        let nz = (m02 * self.x) + (m12 * self.y) + (m22 * self.z);
        self.x = nx;
        self.y = ny;
        self.z = nz;
        self
    }
}

/// Component-wise sum; keeps the left operand's dimensions.
impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            w: self.w + rhs.w,
            u: self.u + rhs.u,
            v: self.v + rhs.v,
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_2d_zeroes_tail() {
        let p = Point {
            z: 5.0,
            ..Point::new_2d(1.0, 2.0)
        };
        let s = p.scale(3.0);
        assert_eq!((s.x, s.y, s.z), (3.0, 6.0, 0.0));
        assert_eq!(s.dimensions, 2);
    }

    #[test]
    fn test_translate_3d_keeps_tail() {
        let p = Point {
            w: 7.0,
            ..Point::new_3d(1.0, 2.0, 3.0)
        };
        let t = p.translate(1.0);
        assert_eq!((t.x, t.y, t.z, t.w), (2.0, 3.0, 4.0, 7.0));
    }

    #[test]
    fn test_default_dimensions_touch_all() {
        let p = Point::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).scale(2.0);
        assert_eq!(p.v, 2.0);
        assert_eq!(p.u, 2.0);
    }

    #[test]
    fn test_axis_ops() {
        let p = Point::new_2d(1.0, 2.0)
            .scale_axis(Axis::Y, 4.0)
            .translate_axis(Axis::X, 0.5);
        assert_eq!((p.x, p.y), (1.5, 8.0));
        assert_eq!(Point::offset(Axis::W, 0.1).w, 0.1);
    }

    #[test]
    fn test_add_keeps_left_dimensions() {
        let p = Point::new_3d(1.0, 1.0, 1.0) + Point::offset(Axis::Z, 0.5);
        assert_eq!(p.z, 1.5);
        assert_eq!(p.dimensions, 3);
    }

    #[test]
    fn test_rotate_quarter_turn_about_z() {
        let p = Point::new_3d(1.0, 0.0, 0.0).rotate(std::f64::consts::FRAC_PI_2, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y.abs() - 1.0).abs() < 1e-12);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_length() {
        assert_eq!(Point::new_2d(3.0, 4.0).length(), 5.0);
    }
}
