//! Deterministic deparse-style rendering of R values.
//!
//! Used for two things: the expected/actual columns of failure reports,
//! and the `IgnoreOutputFormatting` comparison policy, where only the
//! printed representation has to match, not the raw binary value.
//!
//! Doubles follow R's `as.character` rule: up to 15 significant digits,
//! scientific notation when the exponent falls outside the fixed-notation
//! window, trailing zeros trimmed.

use crate::value::{is_na_real, Complex, Logical, RData, RValue};

/// Significant digits for double rendering, matching R's %.15g default.
const DOUBLE_SIG_DIGITS: usize = 15;

/// Render a value, attributes included, as a deterministic single line.
pub fn render(value: &RValue) -> String {
    let base = render_data(&value.data);
    if value.attrs.is_empty() {
        return base;
    }
    let attrs: Vec<String> = value
        .attrs
        .iter()
        .map(|(name, v)| format!("{} = {}", name, render(v)))
        .collect();
    format!("structure({}, {})", base, attrs.join(", "))
}

fn render_data(data: &RData) -> String {
    match data {
        RData::Null => "NULL".to_string(),
        RData::Logical(v) => render_vector(v, |e| {
            match e {
                Logical::True => "TRUE",
                Logical::False => "FALSE",
                Logical::Na => "NA",
            }
            .to_string()
        }),
        RData::Int(v) => render_vector(v, |e| match e {
            Some(n) => format!("{}L", n),
            None => "NA".to_string(),
        }),
        RData::Double(v) => render_vector(v, |e| format_double(*e)),
        RData::Complex(v) => render_vector(v, format_complex),
        RData::Character(v) => render_vector(v, |e| match e {
            Some(s) => quote_string(s),
            None => "NA".to_string(),
        }),
        RData::Raw(v) => render_vector(v, |e| format!("{:02x}", e)),
        RData::List(v) => {
            let elems: Vec<String> = v.iter().map(render).collect();
            format!("list({})", elems.join(", "))
        }
        RData::Closure(c) => format!("<closure #{}>", c.0),
    }
}

fn render_vector<T>(elems: &[T], f: impl Fn(&T) -> String) -> String {
    match elems.len() {
        0 => "c()".to_string(),
        1 => f(&elems[0]),
        _ => {
            let parts: Vec<String> = elems.iter().map(f).collect();
            format!("c({})", parts.join(", "))
        }
    }
}

/// Escape and quote a string the way deparse does.
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Format a double at up to 15 significant digits, with R's fixed vs
/// scientific choice. NA, NaN and the infinities render as their tokens.
pub fn format_double(x: f64) -> String {
    if is_na_real(x) {
        return "NA".to_string();
    }
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    format_g(x, DOUBLE_SIG_DIGITS)
}

/// Format a complex scalar as R prints it, e.g. `1-2i`.
pub fn format_complex(z: &Complex) -> String {
    if z.is_na() {
        return "NA".to_string();
    }
    let re = format_double(z.re);
    if z.im < 0.0 || (z.im == 0.0 && z.im.is_sign_negative()) {
        format!("{}-{}i", re, format_double(-z.im))
    } else {
        format!("{}+{}i", re, format_double(z.im))
    }
}

/// %g-style formatting: fixed notation while the decimal exponent is in
/// `[-4, sig)`, scientific otherwise, trailing zeros trimmed either way.
fn format_g(x: f64, sig: usize) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    let exponent = x.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= sig as i32 {
        format_scientific(x, sig)
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        let fixed = format!("{:.*}", decimals, x);
        trim_trailing_zeros(&fixed)
    }
}

fn format_scientific(x: f64, sig: usize) -> String {
    // Rust renders "1.5e2"; R wants "1.5e+02".
    let raw = format!("{:.*e}", sig - 1, x);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let mantissa = trim_trailing_zeros(mantissa);
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::na_real;

    #[test]
    fn test_double_tokens() {
        assert_eq!(format_double(na_real()), "NA");
        assert_eq!(format_double(f64::NAN), "NaN");
        assert_eq!(format_double(f64::INFINITY), "Inf");
        assert_eq!(format_double(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_double_fixed_notation() {
        assert_eq!(format_double(1.0), "1");
        assert_eq!(format_double(2.5), "2.5");
        assert_eq!(format_double(-0.125), "-0.125");
        assert_eq!(format_double(0.3), "0.3");
        // 0.1 + 0.2 rounds back to 0.3 at 15 significant digits.
        assert_eq!(format_double(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_double_scientific_notation() {
        assert_eq!(format_double(1e-20), "1e-20");
        assert_eq!(format_double(1.5e20), "1.5e+20");
        assert_eq!(format_double(0.00001), "1e-05");
    }

    #[test]
    fn test_render_vectors() {
        assert_eq!(render(&RValue::int(vec![Some(1), None])), "c(1L, NA)");
        assert_eq!(render(&RValue::int1(5)), "5L");
        assert_eq!(render(&RValue::logical1(None)), "NA");
        assert_eq!(render(&RValue::string("a\"b")), "\"a\\\"b\"");
        assert_eq!(render(&RValue::complex1(1.0, -2.0)), "1-2i");
        assert_eq!(render(&RValue::null()), "NULL");
    }

    #[test]
    fn test_render_structure_wrapper() {
        let v = RValue::int(vec![Some(1), Some(2)])
            .with_attr("dim", RValue::int(vec![Some(1), Some(2)]))
            .unwrap();
        assert_eq!(render(&v), "structure(c(1L, 2L), dim = c(1L, 2L))");
    }

    #[test]
    fn test_render_nested_list() {
        let v = RValue::list(vec![RValue::int1(1), RValue::strings(&["a", "b"])]);
        assert_eq!(render(&v), "list(1L, c(\"a\", \"b\"))");
    }
}
