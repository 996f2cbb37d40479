//! `anyDuplicated` and `duplicated` over atomic vectors.
//!
//! Element identity here is NA-aware and value-based: every NA of a type
//! matches every other NA of that type, NaN matches NaN (but not NA),
//! and -0.0 matches 0.0. Hashing doubles therefore goes through a
//! normalized bit pattern rather than the raw f64.

use std::collections::HashSet;

use crate::condition::EvalError;
use crate::eval::{flag, CallArgs, EvalContext};
use crate::value::{is_na_real, Logical, RData, RValue};

/// Hashable identity of one vector element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ElemKey {
    Log(Logical),
    Int(Option<i32>),
    Dbl(DblKey),
    Cplx(DblKey, DblKey),
    Str(Option<String>),
    Raw(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DblKey {
    Na,
    Nan,
    Bits(u64),
}

impl DblKey {
    fn of(x: f64) -> Self {
        if is_na_real(x) {
            DblKey::Na
        } else if x.is_nan() {
            DblKey::Nan
        } else if x == 0.0 {
            // fold -0.0 into 0.0
            DblKey::Bits(0.0f64.to_bits())
        } else {
            DblKey::Bits(x.to_bits())
        }
    }
}

fn elem_keys(ctx: &EvalContext, x: &RValue) -> Result<Vec<ElemKey>, EvalError> {
    let keys = match &x.data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v.iter().map(|e| ElemKey::Log(*e)).collect(),
        RData::Int(v) => v.iter().map(|e| ElemKey::Int(*e)).collect(),
        RData::Double(v) => v.iter().map(|e| ElemKey::Dbl(DblKey::of(*e))).collect(),
        RData::Complex(v) => v
            .iter()
            .map(|z| ElemKey::Cplx(DblKey::of(z.re), DblKey::of(z.im)))
            .collect(),
        RData::Character(v) => v.iter().map(|e| ElemKey::Str(e.clone())).collect(),
        RData::Raw(v) => v.iter().map(|b| ElemKey::Raw(*b)).collect(),
        _ => {
            return Err(ctx.error(format!(
                "duplicated() applies only to vectors, not '{}'",
                x.rtype().name()
            )))
        }
    };
    Ok(keys)
}

/// The `incomparables` argument: FALSE means none, otherwise a vector
/// whose elements never count as duplicates of anything.
fn incomparable_set(
    ctx: &EvalContext,
    args: &CallArgs,
) -> Result<HashSet<ElemKey>, EvalError> {
    match args.get(1, "incomparables") {
        None => Ok(HashSet::new()),
        Some(v) => match &v.data {
            RData::Logical(elems) if elems.as_slice() == [Logical::False] => {
                Ok(HashSet::new())
            }
            _ => Ok(elem_keys(ctx, v)?.into_iter().collect()),
        },
    }
}

/// Marks, per element, whether an equal element occurred earlier (or
/// later with `fromLast`).
fn duplicate_marks(
    keys: &[ElemKey],
    incomparables: &HashSet<ElemKey>,
    from_last: bool,
) -> Vec<bool> {
    let mut marks = vec![false; keys.len()];
    let mut seen: HashSet<&ElemKey> = HashSet::with_capacity(keys.len());
    let order: Box<dyn Iterator<Item = usize>> = if from_last {
        Box::new((0..keys.len()).rev())
    } else {
        Box::new(0..keys.len())
    };
    for i in order {
        let key = &keys[i];
        if incomparables.contains(key) {
            continue;
        }
        if !seen.insert(key) {
            marks[i] = true;
        }
    }
    marks
}

/// `anyDuplicated(x, incomparables, fromLast)`: 1-based index of the
/// first duplicate in the scan direction, or 0 when there is none.
pub fn any_duplicated(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?.clone();
    let keys = elem_keys(ctx, &x)?;
    let incomparables = incomparable_set(ctx, args)?;
    let from_last = flag(ctx, args, 2, "fromLast", false)?;

    let marks = duplicate_marks(&keys, &incomparables, from_last);
    let hit = if from_last {
        marks.iter().rposition(|m| *m)
    } else {
        marks.iter().position(|m| *m)
    };
    Ok(RValue::int1(hit.map(|i| i as i32 + 1).unwrap_or(0)))
}

/// `duplicated(x, incomparables, fromLast)`: logical vector of marks.
pub fn duplicated(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?.clone();
    let keys = elem_keys(ctx, &x)?;
    let incomparables = incomparable_set(ctx, args)?;
    let from_last = flag(ctx, args, 2, "fromLast", false)?;

    let marks = duplicate_marks(&keys, &incomparables, from_last);
    Ok(RValue::logical(
        marks
            .into_iter()
            .map(|m| Logical::from_option(Some(m)))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::runner::ExternalEvaluator;
    use crate::value::na_real;

    fn eval_ok(src: &str) -> RValue {
        Evaluator::new()
            .evaluate(src)
            .payload
            .unwrap_or_else(|e| panic!("eval failed: {}", e))
    }

    #[test]
    fn test_any_duplicated_first_hit_one_based() {
        assert_eq!(
            eval_ok(".Internal(anyDuplicated(c(1L, 2L, 1L, 2L), FALSE, FALSE))"),
            RValue::int1(3)
        );
    }

    #[test]
    fn test_any_duplicated_none_is_zero() {
        assert_eq!(
            eval_ok(".Internal(anyDuplicated(c('a', 'b'), FALSE, FALSE))"),
            RValue::int1(0)
        );
    }

    #[test]
    fn test_any_duplicated_from_last_scans_backwards() {
        // Backwards scan: element 2 (value 1) repeats an element seen
        // later, and it is the last such position.
        assert_eq!(
            eval_ok(".Internal(anyDuplicated(c(1L, 1L, 2L, 2L), FALSE, TRUE))"),
            RValue::int1(3)
        );
    }

    #[test]
    fn test_na_matches_na_but_not_nan() {
        let marks = duplicate_marks(
            &[
                ElemKey::Dbl(DblKey::of(na_real())),
                ElemKey::Dbl(DblKey::of(f64::NAN)),
                ElemKey::Dbl(DblKey::of(na_real())),
                ElemKey::Dbl(DblKey::of(f64::NAN)),
            ],
            &HashSet::new(),
            false,
        );
        assert_eq!(marks, vec![false, false, true, true]);
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(
            eval_ok(".Internal(anyDuplicated(c(0, -0), FALSE, FALSE))"),
            RValue::int1(2)
        );
    }

    #[test]
    fn test_incomparables_excluded() {
        assert_eq!(
            eval_ok(".Internal(anyDuplicated(c(1L, 1L, 2L, 2L), 1L, FALSE))"),
            RValue::int1(4)
        );
    }

    #[test]
    fn test_duplicated_marks() {
        assert_eq!(
            eval_ok("duplicated(c('x', 'y', 'x'))"),
            RValue::logical(vec![Logical::False, Logical::False, Logical::True])
        );
    }

    #[test]
    fn test_list_input_rejected() {
        let err = Evaluator::new()
            .evaluate("duplicated(list(1L))")
            .payload
            .unwrap_err();
        assert!(err.message.contains("applies only to vectors"));
    }
}
