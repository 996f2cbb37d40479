//! Structural comparison of evaluation results under a laxity policy.
//!
//! The comparator decides whether a reference result and a candidate
//! result are equivalent. Strictness is the default: exact error message
//! match, bitwise-meaningful double comparison with NA and NaN kept
//! apart, class vector order significant. Each laxity relaxes exactly one
//! aspect.

use crate::condition::{Condition, ConditionKind, EvalResult};
use crate::format::render;
use crate::value::{is_na_real, Complex, RData, RValue};

/// Comparison laxities, spelled `Output.<Laxity>` in fixture annotations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Laxity {
    /// Full strictness.
    Exact,
    /// Only the rendered representation must match, not the raw value.
    IgnoreOutputFormatting,
    /// Warning call contexts and texts may differ; counts must match.
    IgnoreWarningContext,
    /// Any error matches any error, message and context ignored.
    IgnoreErrorContext,
    /// Same relaxation as `IgnoreErrorContext`; kept as a distinct
    /// annotation because fixtures distinguish the two intents.
    IgnoreErrorMessage,
    /// Both sides must error; nothing else is checked.
    ContainsError,
    /// Both sides must signal at least one warning; values still compared.
    ContainsWarning,
}

/// Reasons a case is marked ignored, spelled `Ignored.<Reason>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum IgnoredReason {
    /// The reference evaluator itself is defective on this input.
    ReferenceError,
    /// Documented, accepted divergence.
    ImplementationError,
    /// Divergence in call-stack-sensitive introspection.
    WrongCaller,
    /// The candidate lacks the feature entirely (missing coverage).
    Unimplemented,
    /// Untriaged divergence; surfaced distinctly so it gets revisited.
    Unknown,
}

/// Per-case comparison policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum CasePolicy {
    Exact,
    Lax(Laxity),
    Ignored(IgnoredReason),
}

impl CasePolicy {
    /// The laxity the comparator runs under. Ignored cases compare
    /// exactly when run anyway, so a newly-fixed case is detected.
    pub fn laxity(&self) -> Laxity {
        match self {
            CasePolicy::Exact | CasePolicy::Ignored(_) => Laxity::Exact,
            CasePolicy::Lax(l) => *l,
        }
    }

    pub fn ignored_reason(&self) -> Option<IgnoredReason> {
        match self {
            CasePolicy::Ignored(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Where and how two results diverged, rendered for triage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diff {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Diff {
    fn new(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// The comparator verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareOutcome {
    Match,
    Mismatch(Diff),
}

impl CompareOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, CompareOutcome::Match)
    }
}

/// Compare a reference result against a candidate result.
pub fn compare(expected: &EvalResult, actual: &EvalResult, laxity: Laxity) -> CompareOutcome {
    match (&expected.payload, &actual.payload) {
        (Err(e), Err(a)) => {
            let errors_equivalent = matches!(
                laxity,
                Laxity::IgnoreErrorContext | Laxity::IgnoreErrorMessage | Laxity::ContainsError
            ) || e.message == a.message;
            if !errors_equivalent {
                return CompareOutcome::Mismatch(Diff::new(
                    "error",
                    e.message.clone(),
                    a.message.clone(),
                ));
            }
            CompareOutcome::Match
        }
        // One-sided error is always a failure regardless of policy.
        (Ok(v), Err(a)) => CompareOutcome::Mismatch(Diff::new(
            "result",
            render(v),
            format!("<error: {}>", a.message),
        )),
        (Err(e), Ok(a)) => CompareOutcome::Mismatch(Diff::new(
            "result",
            format!("<error: {}>", e.message),
            render(a),
        )),
        (Ok(e), Ok(a)) => {
            if laxity == Laxity::ContainsError {
                return CompareOutcome::Mismatch(Diff::new(
                    "result",
                    "<an error>",
                    render(a),
                ));
            }
            if let CompareOutcome::Mismatch(diff) = compare_value("$", e, a, laxity) {
                return CompareOutcome::Mismatch(diff);
            }
            compare_conditions(&expected.conditions, &actual.conditions, laxity)
        }
    }
}

fn compare_conditions(
    expected: &[Condition],
    actual: &[Condition],
    laxity: Laxity,
) -> CompareOutcome {
    match laxity {
        Laxity::ContainsWarning => {
            let has = |conds: &[Condition]| {
                conds.iter().any(|c| c.kind == ConditionKind::Warning)
            };
            if has(expected) && has(actual) {
                CompareOutcome::Match
            } else {
                CompareOutcome::Mismatch(Diff::new(
                    "conditions",
                    format!("{} warning(s)", expected.len()),
                    format!("{} warning(s)", actual.len()),
                ))
            }
        }
        Laxity::IgnoreWarningContext => {
            if expected.len() == actual.len() {
                CompareOutcome::Match
            } else {
                CompareOutcome::Mismatch(Diff::new(
                    "conditions",
                    format!("{} condition(s)", expected.len()),
                    format!("{} condition(s)", actual.len()),
                ))
            }
        }
        _ => {
            if expected == actual {
                CompareOutcome::Match
            } else {
                CompareOutcome::Mismatch(Diff::new(
                    "conditions",
                    render_conditions(expected),
                    render_conditions(actual),
                ))
            }
        }
    }
}

fn render_conditions(conds: &[Condition]) -> String {
    if conds.is_empty() {
        return "<none>".to_string();
    }
    let parts: Vec<String> = conds
        .iter()
        .map(|c| match &c.call {
            Some(call) => format!("{:?} in {}: {}", c.kind, call, c.message),
            None => format!("{:?}: {}", c.kind, c.message),
        })
        .collect();
    parts.join("; ")
}

fn compare_value(path: &str, expected: &RValue, actual: &RValue, laxity: Laxity) -> CompareOutcome {
    if laxity == Laxity::IgnoreOutputFormatting {
        let (e, a) = (render(expected), render(actual));
        return if e == a {
            CompareOutcome::Match
        } else {
            CompareOutcome::Mismatch(Diff::new(path, e, a))
        };
    }

    if expected.rtype() != actual.rtype() {
        return CompareOutcome::Mismatch(Diff::new(
            &format!("{}:typeof", path),
            expected.rtype().name(),
            actual.rtype().name(),
        ));
    }

    if let CompareOutcome::Mismatch(diff) = compare_data(path, expected, actual, laxity) {
        return CompareOutcome::Mismatch(diff);
    }

    compare_attributes(path, expected, actual, laxity)
}

fn compare_data(path: &str, expected: &RValue, actual: &RValue, laxity: Laxity) -> CompareOutcome {
    let equal = match (&expected.data, &actual.data) {
        (RData::Null, RData::Null) => true,
        (RData::Logical(e), RData::Logical(a)) => e == a,
        (RData::Int(e), RData::Int(a)) => e == a,
        (RData::Double(e), RData::Double(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(x, y)| double_equal(*x, *y))
        }
        (RData::Complex(e), RData::Complex(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(x, y)| complex_equal(x, y))
        }
        (RData::Character(e), RData::Character(a)) => e == a,
        (RData::Raw(e), RData::Raw(a)) => e == a,
        (RData::List(e), RData::List(a)) => {
            // Lists recurse element-wise in index order; extra or missing
            // trailing elements make them unequal, never padded.
            if e.len() != a.len() {
                return CompareOutcome::Mismatch(Diff::new(
                    &format!("{}:length", path),
                    e.len().to_string(),
                    a.len().to_string(),
                ));
            }
            for (i, (ev, av)) in e.iter().zip(a).enumerate() {
                let child = format!("{}[[{}]]", path, i + 1);
                if let CompareOutcome::Mismatch(diff) = compare_value(&child, ev, av, laxity) {
                    return CompareOutcome::Mismatch(diff);
                }
            }
            true
        }
        (RData::Closure(e), RData::Closure(a)) => e == a,
        _ => false,
    };

    if equal {
        CompareOutcome::Match
    } else {
        CompareOutcome::Mismatch(Diff::new(path, render(expected), render(actual)))
    }
}

/// Tri-state double equality: NA equals only NA, NaN equals only NaN,
/// everything else compares by value. An `is_nan` test alone would
/// conflate the first two states.
fn double_equal(x: f64, y: f64) -> bool {
    match (is_na_real(x), is_na_real(y)) {
        (true, true) => return true,
        (false, false) => {}
        _ => return false,
    }
    match (x.is_nan(), y.is_nan()) {
        (true, true) => true,
        (false, false) => x == y,
        _ => false,
    }
}

fn complex_equal(x: &Complex, y: &Complex) -> bool {
    double_equal(x.re, y.re) && double_equal(x.im, y.im)
}

fn compare_attributes(
    path: &str,
    expected: &RValue,
    actual: &RValue,
    laxity: Laxity,
) -> CompareOutcome {
    // Attribute sets compare as maps (insertion order is irrelevant),
    // but each attribute value compares structurally, so the element
    // order of a class vector stays significant.
    let expected_names = expected.attrs.names_sorted();
    let actual_names = actual.attrs.names_sorted();
    if expected_names != actual_names {
        return CompareOutcome::Mismatch(Diff::new(
            &format!("{}:attributes", path),
            expected_names.join(", "),
            actual_names.join(", "),
        ));
    }
    for (name, ev) in expected.attrs.iter() {
        let av = actual.attrs.get(name).expect("attribute sets match");
        let child = format!("{}:attr({})", path, name);
        if let CompareOutcome::Mismatch(diff) = compare_value(&child, ev, av, laxity) {
            return CompareOutcome::Mismatch(diff);
        }
    }
    CompareOutcome::Match
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, EvalError, EvalResult};
    use crate::value::na_real;

    fn val(v: RValue) -> EvalResult {
        EvalResult::value(v)
    }

    #[test]
    fn test_na_never_equals_nan() {
        let na = val(RValue::dbl1(na_real()));
        let nan = val(RValue::dbl1(f64::NAN));
        assert!(!compare(&na, &nan, Laxity::Exact).is_match());
        assert!(compare(&nan, &val(RValue::dbl1(f64::NAN)), Laxity::Exact).is_match());
        assert!(compare(&na, &val(RValue::dbl1(na_real())), Laxity::Exact).is_match());
    }

    #[test]
    fn test_class_order_matters() {
        let ab = val(RValue::int1(10).with_class(&["foo", "bar"]));
        let ba = val(RValue::int1(10).with_class(&["bar", "foo"]));
        let outcome = compare(&ab, &ba, Laxity::Exact);
        let CompareOutcome::Mismatch(diff) = outcome else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.path, "$:attr(class)");
    }

    #[test]
    fn test_type_tag_mismatch() {
        let int = val(RValue::int1(1));
        let dbl = val(RValue::dbl1(1.0));
        let CompareOutcome::Mismatch(diff) = compare(&int, &dbl, Laxity::Exact) else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.path, "$:typeof");
        assert_eq!(diff.expected, "integer");
        assert_eq!(diff.actual, "double");
    }

    #[test]
    fn test_error_laxity_round_trip() {
        let a = EvalResult::error(EvalError::runtime("msg A"));
        let b = EvalResult::error(EvalError::runtime("msg B"));
        assert!(!compare(&a, &b, Laxity::Exact).is_match());
        assert!(compare(&a, &b, Laxity::IgnoreErrorContext).is_match());
        assert!(compare(&a, &b, Laxity::IgnoreErrorMessage).is_match());
        // Value vs error stays a failure even under error laxity.
        let v = val(RValue::int1(1));
        assert!(!compare(&a, &v, Laxity::IgnoreErrorContext).is_match());
        assert!(!compare(&v, &a, Laxity::IgnoreErrorContext).is_match());
    }

    #[test]
    fn test_contains_error_requires_both_errors() {
        let e = EvalResult::error(EvalError::runtime("anything"));
        let v = val(RValue::null());
        assert!(compare(&e, &e, Laxity::ContainsError).is_match());
        assert!(!compare(&e, &v, Laxity::ContainsError).is_match());
    }

    #[test]
    fn test_list_recursion_no_padding() {
        let short = val(RValue::list(vec![RValue::int1(1)]));
        let long = val(RValue::list(vec![RValue::int1(1), RValue::int1(2)]));
        let CompareOutcome::Mismatch(diff) = compare(&short, &long, Laxity::Exact) else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.path, "$:length");
    }

    #[test]
    fn test_nested_list_diff_path() {
        let e = val(RValue::list(vec![RValue::list(vec![RValue::int1(1)])]));
        let a = val(RValue::list(vec![RValue::list(vec![RValue::int1(2)])]));
        let CompareOutcome::Mismatch(diff) = compare(&e, &a, Laxity::Exact) else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.path, "$[[1]][[1]]");
    }

    #[test]
    fn test_warning_context_laxity() {
        let mut e = val(RValue::int1(1));
        e.conditions = vec![Condition::warning("recycled", Some("cbind(x, y)".into()))];
        let mut a = val(RValue::int1(1));
        a.conditions = vec![Condition::warning("recycled", None)];
        assert!(!compare(&e, &a, Laxity::Exact).is_match());
        assert!(compare(&e, &a, Laxity::IgnoreWarningContext).is_match());
    }

    #[test]
    fn test_contains_warning() {
        let mut e = val(RValue::int1(1));
        e.conditions = vec![Condition::warning("w1", None)];
        let mut a = val(RValue::int1(1));
        a.conditions = vec![Condition::warning("other text", None)];
        assert!(compare(&e, &a, Laxity::ContainsWarning).is_match());
        let bare = val(RValue::int1(1));
        assert!(!compare(&e, &bare, Laxity::ContainsWarning).is_match());
    }

    #[test]
    fn test_output_formatting_laxity() {
        // Same printed representation, different binary: 0.1 + 0.2 vs 0.3.
        let e = val(RValue::dbl1(0.1 + 0.2));
        let a = val(RValue::dbl1(0.3));
        assert!(!compare(&e, &a, Laxity::Exact).is_match());
        assert!(compare(&e, &a, Laxity::IgnoreOutputFormatting).is_match());
    }

    #[test]
    fn test_attribute_insertion_order_irrelevant() {
        let e = val(
            RValue::int(vec![Some(1), Some(2)])
                .with_attr("names", RValue::strings(&["a", "b"]))
                .unwrap()
                .with_class(&["k"]),
        );
        let a = val(
            RValue::int(vec![Some(1), Some(2)])
                .with_class(&["k"])
                .with_attr("names", RValue::strings(&["a", "b"]))
                .unwrap(),
        );
        assert!(compare(&e, &a, Laxity::Exact).is_match());
    }

    #[test]
    fn test_closure_identity() {
        let a = val(RValue::closure(1));
        let b = val(RValue::closure(2));
        assert!(compare(&a, &val(RValue::closure(1)), Laxity::Exact).is_match());
        assert!(!compare(&a, &b, Laxity::Exact).is_match());
    }
}
