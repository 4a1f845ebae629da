/// Clamp `value` into `[min, max]` and rescale linearly to `[0, 100]`.
/// With `inverse`, lower raw values score higher.
///
/// Always finite: NaN is treated as `min`, and a degenerate band scores 0
/// (100 when inverted).
pub fn normalize(value: f64, min: f64, max: f64, inverse: bool) -> f64 {
    let score = if max > min {
        let v = if value.is_nan() { min } else { value };
        (v.clamp(min, max) - min) / (max - min) * 100.0
    } else {
        0.0
    };
    if inverse {
        100.0 - score
    } else {
        score
    }
}

/// Round to one decimal place, the precision every published score uses.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
