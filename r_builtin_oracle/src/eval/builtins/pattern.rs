//! `gsub` / `sub` / `nchar`.
//!
//! Patterns compile through the `regex` crate. Replacement text uses R's
//! backreference spelling (`\1`), translated to `${1}` before handing it
//! to the engine; a literal `$` in the replacement is escaped the other
//! way.

use regex::{Regex, RegexBuilder};

use crate::condition::EvalError;
use crate::eval::{flag, scalar_string, CallArgs, EvalContext};
use crate::value::{RData, RType, RValue};

use super::coerce::coerce_vector;

pub fn gsub(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    substitute(ctx, args, true)
}

pub fn sub(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    substitute(ctx, args, false)
}

fn substitute(ctx: &mut EvalContext, args: &CallArgs, global: bool) -> Result<RValue, EvalError> {
    let pattern = scalar_string(ctx, args.required(ctx, 0, "pattern")?)?;
    let replacement = scalar_string(ctx, args.required(ctx, 1, "replacement")?)?;
    let x = args.required(ctx, 2, "x")?.clone();
    let ignore_case = flag(ctx, args, 3, "ignore.case", false)?;
    let fixed = flag(ctx, args, 5, "fixed", false)?;

    let RData::Character(elems) = coerce_vector(ctx, &x, RType::Character)? else {
        return Err(ctx.error("invalid 'x' argument"));
    };

    let out: Vec<Option<String>> = if fixed {
        elems
            .iter()
            .map(|e| {
                e.as_ref().map(|s| {
                    if global {
                        s.replace(&pattern, &replacement)
                    } else {
                        s.replacen(&pattern, &replacement, 1)
                    }
                })
            })
            .collect()
    } else {
        let re = compile(ctx, &pattern, ignore_case)?;
        let replacement = translate_replacement(&replacement);
        elems
            .iter()
            .map(|e| {
                e.as_ref().map(|s| {
                    if global {
                        re.replace_all(s, replacement.as_str()).into_owned()
                    } else {
                        re.replace(s, replacement.as_str()).into_owned()
                    }
                })
            })
            .collect()
    };
    Ok(RValue::character(out))
}

fn compile(ctx: &EvalContext, pattern: &str, ignore_case: bool) -> Result<Regex, EvalError> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| ctx.error(format!("invalid regular expression '{}': {}", pattern, e)))
}

/// `\1`..`\9` become `${1}`..`${9}`, `\\` becomes `\`, and a bare `$`
/// is escaped so the engine treats it literally.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek() {
                Some(d @ '1'..='9') => {
                    out.push_str("${");
                    out.push(*d);
                    out.push('}');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            _ => out.push(ch),
        }
    }
    out
}

/// `nchar(x)`: character counts, NA elements stay NA. Non-character
/// input is coerced first.
pub fn nchar(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?.clone();
    let RData::Character(elems) = coerce_vector(ctx, &x, RType::Character)? else {
        return Err(ctx.error("invalid 'x' argument"));
    };
    Ok(RValue::int(
        elems
            .iter()
            .map(|e| e.as_ref().map(|s| s.chars().count() as i32))
            .collect(),
    ))
}
