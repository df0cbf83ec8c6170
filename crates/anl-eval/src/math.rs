//! Scalar helpers shared by both evaluators.
//!
//! Each helper reproduces the C++ function of the same name (or the
//! standard-library behavior) the generated code calls, so the graph
//! interpreter and the target interpreter agree bit for bit.

/// `std::max` for doubles: returns `a` unless `a < b`.
pub fn cpp_max(a: f64, b: f64) -> f64 {
    if a < b {
        b
    } else {
        a
    }
}

/// `std::min` for doubles: returns `a` unless `b < a`.
pub fn cpp_min(a: f64, b: f64) -> f64 {
    if b < a {
        b
    } else {
        a
    }
}

/// Clamp into `[0, 1]` the way the emitted `bias`/`gain` arguments do.
pub fn clamp01(t: f64) -> f64 {
    cpp_max(0.0, cpp_min(1.0, t))
}

/// `(int)value` conversion, truncating toward zero.
pub fn to_int(value: f64) -> i32 {
    value as i32
}

/// `(unsigned int)value` conversion; negative values wrap.
pub fn to_uint(value: f64) -> u32 {
    if value >= 0.0 {
        value as u32
    } else {
        (value as i64) as u32
    }
}

pub fn bias(b: f64, t: f64) -> f64 {
    t.powf(b.ln() / 0.5f64.ln())
}

pub fn gain(g: f64, t: f64) -> f64 {
    if t < 0.5 {
        bias(1.0 - g, 2.0 * t) / 2.0
    } else {
        1.0 - bias(1.0 - g, 2.0 - 2.0 * t) / 2.0
    }
}

pub fn quintic_blend(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Quantize `value` into `steps` levels with quintic easing between them.
pub fn smooth_tiers(value: f64, steps: i32) -> f64 {
    let steps = f64::from(steps - 1);
    let mut tb = (value * steps).floor();
    let mut tt = tb + 1.0;
    let t = quintic_blend(value * steps - tb);
    tb /= steps;
    tt /= steps;
    tb + t * (tt - tb)
}

/// Blend between `low` and `high` across `threshold ± falloff`.
pub fn select_blend(low: f64, high: f64, control: f64, threshold: f64, falloff: f64) -> f64 {
    let lower = threshold - falloff;
    let upper = threshold + falloff;
    let blend = quintic_blend((control - lower) / (upper - lower));
    low + (high - low) * blend
}

/// Full three-way select.
pub fn select(low: f64, high: f64, control: f64, threshold: f64, falloff: f64) -> f64 {
    if falloff > 0.0 {
        if control < threshold - falloff {
            low
        } else if control > threshold + falloff {
            high
        } else {
            select_blend(low, high, control, threshold, falloff)
        }
    } else if control < threshold {
        low
    } else {
        high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_midpoint_is_identity() {
        assert!((bias(0.5, 0.3) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_gain_is_symmetric() {
        let g = 0.7;
        assert!((gain(g, 0.25) + gain(g, 0.75) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_quintic_blend_endpoints() {
        assert_eq!(quintic_blend(0.0), 0.0);
        assert_eq!(quintic_blend(1.0), 1.0);
        assert_eq!(quintic_blend(0.5), 0.5);
    }

    #[test]
    fn test_select_regions() {
        assert_eq!(select(1.0, 2.0, 0.0, 0.5, 0.1), 1.0);
        assert_eq!(select(1.0, 2.0, 0.9, 0.5, 0.1), 2.0);
        assert!((select(1.0, 2.0, 0.5, 0.5, 0.1) - 1.5).abs() < 1e-9);
        assert_eq!(select(1.0, 2.0, 0.5, 0.5, 0.0), 2.0);
    }

    #[test]
    fn test_smooth_tiers_hits_levels() {
        assert_eq!(smooth_tiers(0.0, 5), 0.0);
        assert_eq!(smooth_tiers(0.5, 5), 0.5);
    }

    #[test]
    fn test_casts() {
        assert_eq!(to_int(-2.7), -2);
        assert_eq!(to_uint(7.9), 7);
        assert_eq!(to_uint(-1.0), u32::MAX);
    }

    #[test]
    fn test_min_max_nan_order() {
        assert!(cpp_max(f64::NAN, 1.0).is_nan());
        assert_eq!(cpp_max(1.0, f64::NAN), 1.0);
        assert_eq!(cpp_min(1.0, f64::NAN), 1.0);
    }
}
