//! Numeric literal rendering.
//!
//! Literals are written as the shortest decimal string that parses back to
//! the same `f64` bits. The text always carries a decimal point or an exponent
//! so C++ reads it as a `double`, never as an `int`.

/// Render `value` as a C++ `double` literal.
///
/// Negative values are parenthesized so they can be substituted after a
/// unary or binary minus (`-~`, `~ - ~`) without forming `--`.
pub fn render_number(value: f64) -> String {
    if value.is_nan() {
        return "std::numeric_limits<double>::quiet_NaN()".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "std::numeric_limits<double>::infinity()".to_string()
        } else {
            "(-std::numeric_limits<double>::infinity())".to_string()
        };
    }
    // `{:?}` is the shortest round-trip form and always includes `.` or `e`.
    let text = format!("{value:?}");
    if value.is_sign_negative() {
        format!("({text})")
    } else {
        text
    }
}
