//! Type promotion and coercion between the atomic vector types.

use crate::condition::EvalError;
use crate::eval::{CallArgs, EvalContext};
use crate::format::{format_complex, format_double};
use crate::value::{is_na_real, na_real, Complex, Logical, RData, RType, RValue};

/// Promotion rank for `c()` and binding: logical < integer < double <
/// complex < character, with list absorbing everything. Raw only
/// combines with raw.
fn rank(t: RType) -> Option<u8> {
    match t {
        RType::Logical => Some(0),
        RType::Integer => Some(1),
        RType::Double => Some(2),
        RType::Complex => Some(3),
        RType::Character => Some(4),
        RType::List => Some(5),
        _ => None,
    }
}

/// The common type a set of values promotes to, NULLs ignored.
pub fn common_type(ctx: &EvalContext, values: &[RValue]) -> Result<RType, EvalError> {
    let present: Vec<RType> = values
        .iter()
        .map(RValue::rtype)
        .filter(|t| *t != RType::Null)
        .collect();
    if present.is_empty() {
        return Ok(RType::Null);
    }
    if present.iter().all(|t| *t == RType::Raw) {
        return Ok(RType::Raw);
    }
    let mut widest = (0u8, RType::Logical);
    for t in &present {
        let Some(r) = rank(*t) else {
            return Err(ctx.error(format!(
                "cannot combine a '{}' value with other types",
                t.name()
            )));
        };
        if r > widest.0 {
            widest = (r, *t);
        }
    }
    Ok(widest.1)
}

/// Coerce one value's payload to the target type. Attributes are not
/// carried over; callers decide what survives.
pub fn coerce_vector(ctx: &EvalContext, value: &RValue, to: RType) -> Result<RData, EvalError> {
    if value.rtype() == to {
        return Ok(value.data.clone());
    }
    match to {
        RType::List => Ok(RData::List(unlist_elements(value))),
        RType::Character => Ok(RData::Character(to_character(ctx, value)?)),
        RType::Complex => Ok(RData::Complex(to_complex(ctx, value)?)),
        RType::Double => Ok(RData::Double(to_double(ctx, value)?)),
        RType::Integer => Ok(RData::Int(to_integer(ctx, value)?)),
        RType::Logical => Ok(RData::Logical(to_logical(ctx, value)?)),
        _ => Err(ctx.error(format!(
            "cannot coerce type '{}' to '{}'",
            value.rtype().name(),
            to.name()
        ))),
    }
}

fn unlist_elements(value: &RValue) -> Vec<RValue> {
    match &value.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v.iter().map(|e| RValue::logical(vec![*e])).collect(),
        RData::Int(v) => v.iter().map(|e| RValue::int(vec![*e])).collect(),
        RData::Double(v) => v.iter().map(|e| RValue::dbl1(*e)).collect(),
        RData::Complex(v) => v.iter().map(|z| RValue::complex(vec![*z])).collect(),
        RData::Character(v) => v.iter().map(|e| RValue::character(vec![e.clone()])).collect(),
        RData::Raw(v) => v.iter().map(|b| RValue::raw(vec![*b])).collect(),
        RData::List(v) => v.clone(),
        RData::Closure(_) => vec![value.clone()],
    }
}

fn to_character(
    ctx: &EvalContext,
    value: &RValue,
) -> Result<Vec<Option<String>>, EvalError> {
    let out = match &value.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v
            .iter()
            .map(|e| e.as_option().map(|b| if b { "TRUE" } else { "FALSE" }.to_string()))
            .collect(),
        RData::Int(v) => v.iter().map(|e| e.map(|n| n.to_string())).collect(),
        RData::Double(v) => v
            .iter()
            .map(|x| {
                if is_na_real(*x) {
                    None
                } else {
                    Some(format_double(*x))
                }
            })
            .collect(),
        RData::Complex(v) => v
            .iter()
            .map(|z| if z.is_na() { None } else { Some(format_complex(z)) })
            .collect(),
        RData::Raw(v) => v.iter().map(|b| Some(format!("{:02x}", b))).collect(),
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to character",
                value.rtype().name()
            )))
        }
    };
    Ok(out)
}

fn to_complex(ctx: &EvalContext, value: &RValue) -> Result<Vec<Complex>, EvalError> {
    let na = Complex::new(na_real(), na_real());
    let out = match &value.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v
            .iter()
            .map(|e| match e.as_option() {
                Some(b) => Complex::new(if b { 1.0 } else { 0.0 }, 0.0),
                None => na,
            })
            .collect(),
        RData::Int(v) => v
            .iter()
            .map(|e| match e {
                Some(n) => Complex::new(*n as f64, 0.0),
                None => na,
            })
            .collect(),
        RData::Double(v) => v
            .iter()
            .map(|x| {
                if is_na_real(*x) {
                    na
                } else {
                    Complex::new(*x, 0.0)
                }
            })
            .collect(),
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to complex",
                value.rtype().name()
            )))
        }
    };
    Ok(out)
}

fn to_double(ctx: &EvalContext, value: &RValue) -> Result<Vec<f64>, EvalError> {
    let out = match &value.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v
            .iter()
            .map(|e| match e.as_option() {
                Some(b) => {
                    if b {
                        1.0
                    } else {
                        0.0
                    }
                }
                None => na_real(),
            })
            .collect(),
        RData::Int(v) => v
            .iter()
            .map(|e| match e {
                Some(n) => *n as f64,
                None => na_real(),
            })
            .collect(),
        RData::Character(v) => v
            .iter()
            .map(|e| parse_double(e.as_deref()))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| ctx.error("NAs introduced by coercion"))?,
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to double",
                value.rtype().name()
            )))
        }
    };
    Ok(out)
}

// String-to-double without the warn-and-NA path; the fixtures never
// rely on malformed numeric strings.
fn parse_double(s: Option<&str>) -> Option<f64> {
    match s {
        None => Some(na_real()),
        Some(s) => s.trim().parse::<f64>().ok(),
    }
}

fn to_integer(ctx: &EvalContext, value: &RValue) -> Result<Vec<Option<i32>>, EvalError> {
    let out = match &value.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v
            .iter()
            .map(|e| e.as_option().map(|b| i32::from(b)))
            .collect(),
        RData::Double(v) => v
            .iter()
            .map(|x| {
                if is_na_real(*x) || x.is_nan() {
                    None
                } else {
                    // Truncation toward zero, as as.integer does.
                    Some(x.trunc() as i32)
                }
            })
            .collect(),
        RData::Character(v) => v
            .iter()
            .map(|e| match e {
                None => None,
                Some(s) => s.trim().parse::<i32>().ok(),
            })
            .collect(),
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to integer",
                value.rtype().name()
            )))
        }
    };
    Ok(out)
}

fn to_logical(ctx: &EvalContext, value: &RValue) -> Result<Vec<Logical>, EvalError> {
    let out = match &value.data {
        RData::Null => Vec::new(),
        RData::Int(v) => v
            .iter()
            .map(|e| Logical::from_option(e.map(|n| n != 0)))
            .collect(),
        RData::Double(v) => v
            .iter()
            .map(|x| {
                if is_na_real(*x) || x.is_nan() {
                    Logical::Na
                } else {
                    Logical::from_option(Some(*x != 0.0))
                }
            })
            .collect(),
        RData::Character(v) => v
            .iter()
            .map(|e| match e.as_deref() {
                Some("TRUE") | Some("true") | Some("T") => Logical::True,
                Some("FALSE") | Some("false") | Some("F") => Logical::False,
                _ => Logical::Na,
            })
            .collect(),
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to logical",
                value.rtype().name()
            )))
        }
    };
    Ok(out)
}

// ==================== c() ====================

/// Concatenate values with type promotion, dropping NULLs and all
/// attributes except element names.
pub fn concat(
    ctx: &mut EvalContext,
    values: &[RValue],
    names: &[Option<String>],
) -> Result<RValue, EvalError> {
    let target = common_type(ctx, values)?;
    if target == RType::Null {
        return Ok(RValue::null());
    }

    let mut pieces = Vec::with_capacity(values.len());
    for value in values {
        if value.is_null() {
            pieces.push(RData::Null);
        } else {
            pieces.push(coerce_vector(ctx, value, target)?);
        }
    }

    let out = match target {
        RType::Logical => RValue::logical(collect(&pieces, |d| match d {
            RData::Logical(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Integer => RValue::int(collect(&pieces, |d| match d {
            RData::Int(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Double => RValue::dbl(collect(&pieces, |d| match d {
            RData::Double(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Complex => RValue::complex(collect(&pieces, |d| match d {
            RData::Complex(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Character => RValue::character(collect(&pieces, |d| match d {
            RData::Character(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Raw => RValue::raw(collect(&pieces, |d| match d {
            RData::Raw(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::List => RValue::list(collect(&pieces, |d| match d {
            RData::List(v) => v.clone(),
            _ => Vec::new(),
        })),
        RType::Null | RType::Closure => unreachable!(),
    };

    attach_concat_names(out, values, names)
}

fn collect<T>(pieces: &[RData], extract: impl Fn(&RData) -> Vec<T>) -> Vec<T> {
    pieces.iter().flat_map(|p| extract(p)).collect()
}

/// Element names from named call arguments: a named scalar contributes
/// its name, a named vector of length n contributes `name1..namen`.
fn attach_concat_names(
    out: RValue,
    values: &[RValue],
    names: &[Option<String>],
) -> Result<RValue, EvalError> {
    if names.iter().all(|n| n.is_none()) {
        return Ok(out);
    }
    let mut element_names = Vec::with_capacity(out.len());
    for (value, name) in values.iter().zip(names) {
        let len = value.len();
        match name {
            None => element_names.extend(std::iter::repeat_n(Some(String::new()), len)),
            Some(n) if len == 1 => element_names.push(Some(n.clone())),
            Some(n) => {
                element_names.extend((1..=len).map(|i| Some(format!("{}{}", n, i))));
            }
        }
    }
    out.with_attr("names", RValue::character(element_names))
        .map_err(|e| EvalError::runtime(e.to_string()))
}

// ==================== builtins ====================

pub fn as_character(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    coerce_vector(ctx, x, RType::Character).map(RValue::new)
}

pub fn as_integer(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    coerce_vector(ctx, x, RType::Integer).map(RValue::new)
}

pub fn as_double(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    coerce_vector(ctx, x, RType::Double).map(RValue::new)
}

pub fn as_raw(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let out = match &x.data {
        RData::Raw(v) => v.clone(),
        RData::Int(v) => v
            .iter()
            .map(|e| match e {
                Some(n) if (0..=255).contains(n) => Ok(*n as u8),
                _ => Err(ctx.error("out-of-range values treated as 0 in coercion to raw")),
            })
            .collect::<Result<Vec<u8>, EvalError>>()?,
        _ => {
            return Err(ctx.error(format!(
                "cannot coerce type '{}' to raw",
                x.rtype().name()
            )))
        }
    };
    Ok(RValue::raw(out))
}

/// `as.vector(x)` strips attributes; a `mode` argument additionally
/// coerces the payload.
pub fn as_vector(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let data = match args.get(1, "mode") {
        None => x.data.clone(),
        Some(mode) => {
            let mode = crate::eval::scalar_string(ctx, mode)?;
            let to = match mode.as_str() {
                "character" => RType::Character,
                "complex" => RType::Complex,
                "double" | "numeric" => RType::Double,
                "integer" => RType::Integer,
                "logical" => RType::Logical,
                "list" => RType::List,
                "any" => return Ok(RValue::new(x.data.clone())),
                _ => return Err(ctx.error(format!("invalid 'mode' argument: '{}'", mode))),
            };
            coerce_vector(ctx, x, to)?
        }
    };
    Ok(RValue::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::runner::ExternalEvaluator;

    fn eval_ok(src: &str) -> RValue {
        Evaluator::new()
            .evaluate(src)
            .payload
            .unwrap_or_else(|e| panic!("eval failed: {}", e))
    }

    #[test]
    fn test_c_promotes_int_and_double() {
        assert_eq!(eval_ok("c(1L, 2.5)"), RValue::dbl(vec![1.0, 2.5]));
    }

    #[test]
    fn test_c_drops_null() {
        assert_eq!(eval_ok("c(NULL, 1L, NULL)"), RValue::int1(1));
        assert!(eval_ok("c(NULL, NULL)").is_null());
    }

    #[test]
    fn test_c_list_absorbs_atomics() {
        let v = eval_ok("c(list(1L), 'x')");
        assert_eq!(
            v,
            RValue::list(vec![RValue::int1(1), RValue::string("x")])
        );
    }

    #[test]
    fn test_c_names_expand_over_vectors() {
        let v = eval_ok("c(a = 1L, b = 2:3)");
        let names = v.attr("names").unwrap();
        assert_eq!(
            names.data,
            RData::Character(vec![
                Some("a".to_string()),
                Some("b1".to_string()),
                Some("b2".to_string())
            ])
        );
    }

    #[test]
    fn test_as_character_double_uses_15_significant_digits() {
        // 0.1 + 0.2 in binary; 15 significant digits hide the residue.
        assert_eq!(
            eval_ok("as.character(0.30000000000000004)"),
            RValue::string("0.3")
        );
    }

    #[test]
    fn test_as_character_preserves_na_as_na_character() {
        assert_eq!(
            eval_ok("as.character(NA_real_)"),
            RValue::character(vec![None])
        );
    }

    #[test]
    fn test_as_character_nan_and_inf_tokens() {
        assert_eq!(eval_ok("as.character(NaN)"), RValue::string("NaN"));
        assert_eq!(eval_ok("as.character(Inf)"), RValue::string("Inf"));
    }

    #[test]
    fn test_as_character_drops_attributes() {
        let v = eval_ok("as.character(structure(1:2, class = 'zzz'))");
        assert!(v.attrs.is_empty());
        assert_eq!(v, RValue::strings(&["1", "2"]));
    }

    #[test]
    fn test_as_integer_truncates_toward_zero() {
        assert_eq!(eval_ok("as.integer(-2.7)"), RValue::int1(-2));
    }

    #[test]
    fn test_raw_only_combines_with_raw() {
        let err = Evaluator::new()
            .evaluate("c(as.raw(1L), 1L)")
            .payload
            .unwrap_err();
        assert!(err.message.contains("cannot combine"));
    }
}
