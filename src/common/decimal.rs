/// Formats `f` with exactly `digits` places after the decimal point.
pub fn format_decimal(f: f64, digits: usize) -> String {
    format!("{:.*}", digits, f)
}

/// Drops trailing zeros after the decimal point, then the point itself if nothing follows it.
pub fn trim_trailing_zeros(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

/// Formats `f` like `%.{precision}g`: `precision` significant digits, scientific notation
/// for very small or very large exponents, and no trailing zeros.
pub fn format_significant(f: f64, precision: usize) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf".to_string() } else { "-Inf".to_string() };
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }

    let precision = precision.max(1);
    // let the formatter do the rounding, then read the exponent back
    let sci = format!("{:.*e}", precision - 1, f);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{}e{}{:02}",
            trim_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        );
    }

    let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
    let fixed = format!("{:.*}", decimals, f);
    trim_trailing_zeros(&fixed).to_string()
}
