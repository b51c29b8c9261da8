/// Format a number for display.
///
/// Whole numbers print without a fractional part; everything else uses the
/// shortest representation that round-trips.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n == 0.0 {
        // also covers -0
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}
