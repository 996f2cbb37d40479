//! `class`, `oldClass`, `inherits`, `typeof`.

use crate::condition::EvalError;
use crate::eval::{flag, CallArgs, EvalContext};
use crate::value::{RData, RValue};

/// `class(x)`: explicit class attribute if present, implicit class
/// otherwise (never NULL).
pub fn class(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let classes = x.class_vector();
    Ok(RValue::character(
        classes.into_iter().map(Some).collect(),
    ))
}

/// `oldClass(x)`: the explicit class attribute or NULL, never the
/// implicit class.
pub fn old_class(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    Ok(x.attr("class").cloned().unwrap_or_else(RValue::null))
}

/// `inherits(x, what, which)`: membership of `what` in the class vector.
/// With `which = TRUE` the result is an integer vector of match
/// positions (0 for no match), else a logical scalar.
pub fn inherits(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    let what = args.required(ctx, 1, "what")?;
    let RData::Character(what) = &what.data else {
        return Err(ctx.error("'what' must be a character vector"));
    };
    let which = flag(ctx, args, 2, "which", false)?;

    let classes = x.class_vector();
    if which {
        let positions: Vec<Option<i32>> = what
            .iter()
            .map(|w| {
                let pos = w
                    .as_deref()
                    .and_then(|w| classes.iter().position(|c| c == w));
                Some(pos.map(|p| p as i32 + 1).unwrap_or(0))
            })
            .collect();
        Ok(RValue::int(positions))
    } else {
        let hit = what
            .iter()
            .flatten()
            .any(|w| classes.iter().any(|c| c == w));
        Ok(RValue::logical1(Some(hit)))
    }
}

pub fn typeof_(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let x = args.required(ctx, 0, "x")?;
    Ok(RValue::string(x.rtype().name()))
}

#[cfg(test)]
mod tests {
    use crate::eval::Evaluator;
    use crate::runner::ExternalEvaluator;
    use crate::value::RValue;

    fn eval_ok(src: &str) -> RValue {
        Evaluator::new()
            .evaluate(src)
            .payload
            .unwrap_or_else(|e| panic!("eval failed: {}", e))
    }

    #[test]
    fn test_class_of_plain_double_is_numeric() {
        assert_eq!(eval_ok("class(1.5)"), RValue::string("numeric"));
    }

    #[test]
    fn test_class_of_matrix_is_matrix_array() {
        assert_eq!(
            eval_ok("class(structure(1:4, dim = c(2L, 2L)))"),
            RValue::strings(&["matrix", "array"])
        );
    }

    #[test]
    fn test_class_of_empty_complex_vector() {
        assert_eq!(eval_ok("class(complex(0L))"), RValue::string("complex"));
    }

    #[test]
    fn test_explicit_class_wins() {
        assert_eq!(
            eval_ok("class(structure(1L, class = c('a', 'b')))"),
            RValue::strings(&["a", "b"])
        );
    }

    #[test]
    fn test_old_class_is_null_without_attribute() {
        assert!(eval_ok("oldClass(1:3)").is_null());
    }

    #[test]
    fn test_inherits_logical() {
        assert_eq!(
            eval_ok("inherits(structure(1L, class = c('a', 'b')), 'b')"),
            RValue::logical1(Some(true))
        );
        assert_eq!(
            eval_ok("inherits(1L, 'character')"),
            RValue::logical1(Some(false))
        );
    }

    #[test]
    fn test_inherits_which_gives_match_positions() {
        assert_eq!(
            eval_ok("inherits(structure(1L, class = c('a', 'b')), c('b', 'z', 'a'), which = TRUE)"),
            RValue::int(vec![Some(2), Some(0), Some(1)])
        );
    }

    #[test]
    fn test_typeof_reports_storage_type() {
        assert_eq!(eval_ok("typeof(1.5)"), RValue::string("double"));
        assert_eq!(
            eval_ok("typeof(structure(1L, class = 'zzz'))"),
            RValue::string("integer")
        );
    }
}
