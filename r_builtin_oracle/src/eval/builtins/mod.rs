//! Builtin function table for the fixture evaluator.

mod bind;
mod classes;
mod coerce;
mod dedup;
mod pattern;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::condition::EvalError;
use crate::eval::{flag, scalar_i32, scalar_string, CallArgs, EvalContext};
use crate::value::{Complex, RData, RValue};

pub use coerce::{coerce_vector, common_type, concat};

pub type BuiltinFn = crate::dispatch::MethodFn;

static BUILTINS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, BuiltinFn> = HashMap::new();
    table.insert("list", list);
    table.insert("c", c);
    table.insert("structure", structure);
    table.insert("length", length);
    table.insert("rep", rep);
    table.insert("names", names);
    table.insert("attr", attr);
    table.insert("attributes", attributes);
    table.insert("warning", warning);
    table.insert("complex", complex);
    table.insert("anyDuplicated", dedup::any_duplicated);
    table.insert("duplicated", dedup::duplicated);
    table.insert("as.character", coerce::as_character);
    table.insert("as.integer", coerce::as_integer);
    table.insert("as.double", coerce::as_double);
    table.insert("as.vector", coerce::as_vector);
    table.insert("as.raw", coerce::as_raw);
    table.insert("cbind", bind::cbind);
    table.insert("rbind", bind::rbind);
    table.insert("class", classes::class);
    table.insert("oldClass", classes::old_class);
    table.insert("inherits", classes::inherits);
    table.insert("typeof", classes::typeof_);
    table.insert("gsub", pattern::gsub);
    table.insert("sub", pattern::sub);
    table.insert("nchar", pattern::nchar);
    table
});

pub fn lookup(name: &str) -> Option<BuiltinFn> {
    BUILTINS.get(name).copied()
}

// ==================== construction ====================

fn list(_ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let value = RValue::list(args.values.clone());
    attach_element_names(value, &args.names)
}

/// Set a `names` attribute when at least one element is named, with ""
/// standing in for unnamed elements, as `list(a = 1, 2)` does.
fn attach_element_names(
    value: RValue,
    names: &[Option<String>],
) -> Result<RValue, EvalError> {
    if names.iter().all(|n| n.is_none()) {
        return Ok(value);
    }
    let names: Vec<Option<String>> = names
        .iter()
        .map(|n| Some(n.clone().unwrap_or_default()))
        .collect();
    value
        .with_attr("names", RValue::character(names))
        .map_err(|e| EvalError::runtime(e.to_string()))
}

fn c(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    concat(ctx, &args.values, &args.names)
}

fn structure(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let mut value = args.required(ctx, 0, ".Data")?.clone();
    for (name, attr_value) in args.names.iter().zip(&args.values) {
        let Some(name) = name else { continue };
        // `structure(x, .Names = ...)` is the deparsed spelling of names.
        let key = if name == ".Names" { "names" } else { name.as_str() };
        value = value
            .with_attr(key, attr_value.clone())
            .map_err(|e| ctx.error(e.to_string()))?;
    }
    Ok(value)
}

fn complex(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let length_out = match args.get(0, "length.out") {
        Some(v) => scalar_i32(ctx, v)?.max(0) as usize,
        None => 0,
    };
    Ok(RValue::complex(vec![Complex::new(0.0, 0.0); length_out]))
}

// ==================== inspection ====================

fn length(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    Ok(RValue::int1(x.len() as i32))
}

fn names(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    Ok(x.attr("names").cloned().unwrap_or_else(RValue::null))
}

fn attr(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let which = scalar_string(ctx, args.required(ctx, 1, "which")?)?;
    Ok(x.attr(&which).cloned().unwrap_or_else(RValue::null))
}

fn attributes(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    if x.attrs.is_empty() {
        return Ok(RValue::null());
    }
    let mut values = Vec::new();
    let mut names = Vec::new();
    for (name, value) in x.attrs.iter() {
        names.push(Some(name.to_string()));
        values.push(value.clone());
    }
    attach_element_names(RValue::list(values), &names)
}

// ==================== misc ====================

fn rep(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let times = scalar_i32(ctx, args.required(ctx, 1, "times")?)?;
    if times < 0 {
        return Err(ctx.error("invalid 'times' argument"));
    }
    let times = times as usize;
    let data = match &x.data {
        RData::Null => RData::Null,
        RData::Logical(v) => RData::Logical(repeat(v, times)),
        RData::Int(v) => RData::Int(repeat(v, times)),
        RData::Double(v) => RData::Double(repeat(v, times)),
        RData::Complex(v) => RData::Complex(repeat(v, times)),
        RData::Character(v) => RData::Character(repeat(v, times)),
        RData::Raw(v) => RData::Raw(repeat(v, times)),
        RData::List(v) => RData::List(repeat(v, times)),
        RData::Closure(_) => return Err(ctx.error("attempt to replicate an object of type 'closure'")),
    };
    Ok(RValue::new(data))
}

fn repeat<T: Clone>(elems: &[T], times: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(elems.len() * times);
    for _ in 0..times {
        out.extend_from_slice(elems);
    }
    out
}

fn warning(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let message = scalar_string(ctx, args.required(ctx, 0, "message")?)?;
    // `warning(call. = FALSE)` drops the call context from the record.
    let with_call = flag(ctx, args, 1, "call.", true)?;
    if with_call {
        ctx.warn(message.clone());
    } else {
        ctx.conditions
            .push(crate::condition::Condition::warning(message.clone(), None));
    }
    Ok(RValue::string(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::runner::ExternalEvaluator;
    use crate::value::Logical;

    fn eval_ok(src: &str) -> RValue {
        Evaluator::new()
            .evaluate(src)
            .payload
            .unwrap_or_else(|e| panic!("eval failed: {}", e))
    }

    #[test]
    fn test_list_names_attribute() {
        let v = eval_ok("list(a = 1L, 2L)");
        let names = v.attr("names").unwrap();
        assert_eq!(
            names.data,
            RData::Character(vec![Some("a".to_string()), Some("".to_string())])
        );
    }

    #[test]
    fn test_structure_sets_class_and_dim() {
        let v = eval_ok("structure(1:6, dim = c(2L, 3L))");
        assert_eq!(v.dim(), Some(vec![2, 3]));
        assert_eq!(v.class_vector(), vec!["matrix", "array"]);
    }

    #[test]
    fn test_structure_dot_names() {
        let v = eval_ok("structure(1:2, .Names = c('a', 'b'))");
        assert!(v.attr("names").is_some());
    }

    #[test]
    fn test_complex_length_out() {
        let v = eval_ok("complex(length.out = 3L)");
        assert_eq!(v.data, RData::Complex(vec![Complex::new(0.0, 0.0); 3]));
    }

    #[test]
    fn test_rep() {
        let v = eval_ok("rep(c(TRUE, NA), 2L)");
        assert_eq!(
            v.data,
            RData::Logical(vec![Logical::True, Logical::Na, Logical::True, Logical::Na])
        );
    }

    #[test]
    fn test_warning_records_condition_and_returns_message() {
        let result = Evaluator::new().evaluate("warning('watch out')");
        assert_eq!(result.payload.unwrap(), RValue::string("watch out"));
        assert_eq!(result.conditions.len(), 1);
        assert_eq!(result.conditions[0].message, "watch out");
    }

    #[test]
    fn test_attributes_of_plain_vector_is_null() {
        assert!(eval_ok("attributes(1:3)").is_null());
    }
}
