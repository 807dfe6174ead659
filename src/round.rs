//! Rounding helpers for approximate floating point comparisons in tests.

fn pow10(n: i32) -> f64 {
    if n >= 0 {
        10f64.powi(n)
    } else {
        1.0 / 10f64.powi(-n)
    }
}

/// Rounds `x` to `digits` places after the decimal point.
///
/// Useful around zero, where the number of significant digits is not well
/// defined. Infinities pass through unchanged.
pub fn round_fixed(x: f64, digits: i32) -> f64 {
    let f = pow10(digits);
    (x * f).round() / f
}

/// Rounds `x` to `places` significant decimal digits. Infinities pass through unchanged.
pub fn round(x: f64, places: i32) -> f64 {
    if x.is_infinite() {
        return x;
    }
    let mut order = if x == 0.0 { 0 } else { x.abs().log10() as i32 };
    if order >= 0 {
        order += 1;
    }
    let f = pow10(places - order);
    (x * f).round() / f
}

/// Applies [`round`] to every element, preserving order
pub fn round_slice(values: &[f64], places: i32) -> Vec<f64> {
    values.iter().map(|&x| round(x, places)).collect()
}

/// Applies [`round_fixed`] to every element, preserving order
pub fn round_fixed_slice(values: &[f64], places: i32) -> Vec<f64> {
    values.iter().map(|&x| round_fixed(x, places)).collect()
}
