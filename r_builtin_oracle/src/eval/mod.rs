//! Built-in evaluator for the fixture sublanguage.
//!
//! This is NOT an R interpreter. It evaluates exactly the shape the
//! fixtures use — literal preludes, `list`/`c`/`structure` construction,
//! `argv[[i]]` indexing, and the builtin cluster under test — against a
//! clean environment per case. It serves as the oracle's reference side
//! and as a convenient candidate double in tests.

pub mod builtins;

use std::collections::HashMap;

use r_builtin_oracle_parser::{parse, Arg, Expr};

use crate::condition::{Condition, ConditionKind, EvalError, EvalResult};
use crate::dispatch::{DispatchTable, MethodFn};
use crate::frame::CallStack;
use crate::runner::ExternalEvaluator;
use crate::value::{na_real, RData, RValue};

/// Evaluated call arguments with their argument names.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub values: Vec<RValue>,
    pub names: Vec<Option<String>>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Option<String>, value: RValue) {
        self.names.push(name);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Match an argument by name first, then by position among the
    /// unnamed arguments (R's positional matching skips named ones).
    pub fn get(&self, position: usize, name: &str) -> Option<&RValue> {
        if let Some(i) = self
            .names
            .iter()
            .position(|n| n.as_deref() == Some(name))
        {
            return Some(&self.values[i]);
        }
        self.positional(position)
    }

    /// The `position`-th unnamed argument (0-based).
    pub fn positional(&self, position: usize) -> Option<&RValue> {
        self.names
            .iter()
            .zip(&self.values)
            .filter(|(n, _)| n.is_none())
            .map(|(_, v)| v)
            .nth(position)
    }

    pub fn required(
        &self,
        ctx: &EvalContext,
        position: usize,
        name: &str,
    ) -> Result<&RValue, EvalError> {
        self.get(position, name)
            .ok_or_else(|| ctx.error(format!("argument \"{}\" is missing, with no default", name)))
    }
}

/// Mutable evaluation state: environment, method table, call stack and
/// the accumulated condition stack.
#[derive(Debug, Default)]
pub struct EvalContext {
    pub env: HashMap<String, RValue>,
    pub dispatch: DispatchTable,
    pub frames: CallStack,
    pub conditions: Vec<Condition>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal a warning with the innermost call as context.
    pub fn warn(&mut self, message: impl Into<String>) {
        let call = self.frames.innermost().map(|f| f.call.clone());
        self.conditions.push(Condition::warning(message, call));
    }

    /// Signal a message condition.
    pub fn message(&mut self, message: impl Into<String>) {
        let call = self.frames.innermost().map(|f| f.call.clone());
        self.conditions.push(Condition {
            kind: ConditionKind::Message,
            message: message.into(),
            call,
        });
    }

    /// Build a runtime error with the innermost call as context.
    pub fn error(&self, message: impl Into<String>) -> EvalError {
        let message = message.into();
        match self.frames.innermost() {
            Some(frame) => EvalError::runtime(format!("Error in {}: {}", frame.call, message)),
            None => EvalError::runtime(format!("Error: {}", message)),
        }
    }
}

/// The fixture evaluator.
#[derive(Debug, Default)]
pub struct Evaluator {
    ctx: EvalContext,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context_mut(&mut self) -> &mut EvalContext {
        &mut self.ctx
    }

    /// Scoped S3 method registration: the fixture `assign(...); f();
    /// rm(...)` pattern as an explicit push/pop around `body`.
    pub fn with_method<R>(
        &mut self,
        generic: &str,
        class: &str,
        method: MethodFn,
        body: impl FnOnce(&mut Evaluator) -> R,
    ) -> R {
        let previous = self.ctx.dispatch.register(generic, class, method);
        let out = body(self);
        match previous {
            Some(prev) => {
                self.ctx.dispatch.register(generic, class, prev);
            }
            None => {
                self.ctx.dispatch.remove(generic, class);
            }
        }
        out
    }
}

impl ExternalEvaluator for Evaluator {
    fn evaluate(&mut self, source: &str) -> EvalResult {
        let program = match parse(source) {
            Ok(p) => p,
            Err(e) => return EvalResult::error(EvalError::parse(e.to_string())),
        };
        let mut last = RValue::null();
        for stmt in &program.stmts {
            match eval_expr(&mut self.ctx, stmt) {
                Ok(v) => last = v,
                Err(e) => {
                    let conditions = std::mem::take(&mut self.ctx.conditions);
                    return EvalResult::error(e).with_conditions(conditions);
                }
            }
        }
        let conditions = std::mem::take(&mut self.ctx.conditions);
        EvalResult::value(last).with_conditions(conditions)
    }

    fn reset(&mut self) {
        self.ctx = EvalContext::new();
    }
}

// ==================== expression evaluation ====================

pub fn eval_expr(ctx: &mut EvalContext, expr: &Expr) -> Result<RValue, EvalError> {
    match expr {
        Expr::Null => Ok(RValue::null()),
        Expr::Logical(v) => Ok(RValue::logical1(*v)),
        Expr::Int(v) => Ok(RValue::int(vec![*v])),
        Expr::Double(v) => Ok(RValue::dbl1(*v)),
        Expr::NaReal => Ok(RValue::dbl1(na_real())),
        Expr::Str(s) => Ok(RValue::string(s.clone())),
        Expr::NaCharacter => Ok(RValue::character(vec![None])),
        Expr::Complex { re, im } => Ok(RValue::complex1(*re, *im)),
        Expr::Ident(name) => ctx
            .env
            .get(name)
            .cloned()
            .ok_or_else(|| ctx.error(format!("object '{}' not found", name))),
        Expr::Assign { name, value } => {
            let v = eval_expr(ctx, value)?;
            ctx.env.insert(name.clone(), v.clone());
            Ok(v)
        }
        Expr::Neg(operand) => {
            let v = eval_expr(ctx, operand)?;
            negate(ctx, v)
        }
        Expr::Range { start, end } => {
            let lo_value = eval_expr(ctx, start)?;
            let hi_value = eval_expr(ctx, end)?;
            let lo = scalar_i32(ctx, &lo_value)?;
            let hi = scalar_i32(ctx, &hi_value)?;
            let seq: Vec<Option<i32>> = if lo <= hi {
                (lo..=hi).map(Some).collect()
            } else {
                (hi..=lo).rev().map(Some).collect()
            };
            Ok(RValue::int(seq))
        }
        Expr::Index { target, index } => {
            let target = eval_expr(ctx, target)?;
            let index = eval_expr(ctx, index)?;
            let n = scalar_i32(ctx, &index)?;
            extract_element(ctx, &target, n)
        }
        Expr::Call { name, args } => eval_call(ctx, name, args),
    }
}

fn eval_call(ctx: &mut EvalContext, name: &str, args: &[Arg]) -> Result<RValue, EvalError> {
    // `.Internal(f(...))` evaluates the inner call directly, bypassing
    // nothing in this evaluator (there is no generic layer to bypass),
    // but the fixture syntax must be accepted.
    if name == ".Internal" {
        let [inner] = args else {
            return Err(ctx.error(".Internal called with the wrong number of arguments"));
        };
        let Expr::Call {
            name: inner_name,
            args: inner_args,
        } = &inner.value
        else {
            return Err(ctx.error(".Internal called with an invalid argument"));
        };
        return eval_call(ctx, inner_name, inner_args);
    }

    let call_text = deparse_call(name, args);
    let mut call_args = CallArgs::new();
    for arg in args {
        let value = eval_expr(ctx, &arg.value)?;
        call_args.push(arg.name.clone(), value);
    }

    if name == "do.call" {
        return eval_do_call(ctx, &call_args);
    }

    invoke_function(ctx, name, &call_args, &call_text)
}

fn eval_do_call(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    let fname = scalar_string(ctx, args.required(ctx, 0, "what")?)?;
    let list = args.required(ctx, 1, "args")?;
    let RData::List(elems) = &list.data else {
        return Err(ctx.error("second argument must be a list"));
    };
    let elem_names = list_element_names(list);
    let mut call_args = CallArgs::new();
    for (i, elem) in elems.iter().enumerate() {
        call_args.push(elem_names.get(i).cloned().flatten(), elem.clone());
    }
    let call_text = format!("do.call(\"{}\", ...)", fname);
    invoke_function(ctx, &fname, &call_args, &call_text)
}

/// Names of a list's elements from its `names` attribute, empty strings
/// treated as unnamed.
fn list_element_names(list: &RValue) -> Vec<Option<String>> {
    match list.attr("names").map(|n| &n.data) {
        Some(RData::Character(names)) => names
            .iter()
            .map(|n| n.clone().filter(|s| !s.is_empty()))
            .collect(),
        _ => vec![None; list.len()],
    }
}

/// Resolve and invoke a function: S3 dispatch on the first argument's
/// explicit class first, then the builtin table.
pub fn invoke_function(
    ctx: &mut EvalContext,
    name: &str,
    args: &CallArgs,
    call_text: &str,
) -> Result<RValue, EvalError> {
    let method = args
        .values
        .first()
        .filter(|receiver| receiver.attr("class").is_some())
        .and_then(|receiver| ctx.dispatch.lookup(name, &receiver.class_vector()));

    let function = match method {
        Some(m) => m,
        None => builtins::lookup(name)
            .ok_or_else(|| ctx.error(format!("could not find function \"{}\"", name)))?,
    };

    ctx.frames.push(call_text);
    let result = function(ctx, args);
    ctx.frames.pop();
    result
}

fn negate(ctx: &mut EvalContext, v: RValue) -> Result<RValue, EvalError> {
    match v.data {
        RData::Int(elems) => Ok(RValue::int(
            elems.iter().map(|e| e.map(|n| -n)).collect(),
        )),
        RData::Double(elems) => Ok(RValue::dbl(
            elems
                .iter()
                .map(|e| if crate::value::is_na_real(*e) { *e } else { -e })
                .collect(),
        )),
        RData::Complex(elems) => Ok(RValue::complex(
            elems
                .iter()
                .map(|z| crate::value::Complex::new(-z.re, -z.im))
                .collect(),
        )),
        RData::Logical(elems) => Ok(RValue::int(
            elems
                .iter()
                .map(|e| e.as_option().map(|b| if b { -1 } else { 0 }))
                .collect(),
        )),
        _ => Err(ctx.error("invalid argument to unary operator")),
    }
}

/// `[[`-extract one element from a list or atomic vector, 1-based.
fn extract_element(ctx: &EvalContext, target: &RValue, index: i32) -> Result<RValue, EvalError> {
    if index < 1 {
        return Err(ctx.error("subscript out of bounds"));
    }
    let i = (index - 1) as usize;
    match &target.data {
        RData::List(elems) => elems
            .get(i)
            .cloned()
            .ok_or_else(|| ctx.error("subscript out of bounds")),
        RData::Logical(v) => one(ctx, v, i).map(|e| RValue::logical(vec![e])),
        RData::Int(v) => one(ctx, v, i).map(|e| RValue::int(vec![e])),
        RData::Double(v) => one(ctx, v, i).map(|e| RValue::dbl(vec![e])),
        RData::Complex(v) => one(ctx, v, i).map(|e| RValue::complex(vec![e])),
        RData::Character(v) => one(ctx, v, i).map(|e| RValue::character(vec![e])),
        RData::Raw(v) => one(ctx, v, i).map(|e| RValue::raw(vec![e])),
        _ => Err(ctx.error("subsettable object required")),
    }
}

fn one<T: Clone>(ctx: &EvalContext, elems: &[T], i: usize) -> Result<T, EvalError> {
    elems
        .get(i)
        .cloned()
        .ok_or_else(|| ctx.error("subscript out of bounds"))
}

// ==================== scalar coercions ====================

pub fn scalar_i32(ctx: &EvalContext, v: &RValue) -> Result<i32, EvalError> {
    match &v.data {
        RData::Int(elems) => match elems.as_slice() {
            [Some(n)] => Ok(*n),
            _ => Err(ctx.error("expected a single non-NA integer")),
        },
        RData::Double(elems) => match elems.as_slice() {
            [x] if x.is_finite() => Ok(*x as i32),
            _ => Err(ctx.error("expected a single finite number")),
        },
        _ => Err(ctx.error("expected a number")),
    }
}

pub fn scalar_string(ctx: &EvalContext, v: &RValue) -> Result<String, EvalError> {
    match &v.data {
        RData::Character(elems) => match elems.as_slice() {
            [Some(s)] => Ok(s.clone()),
            _ => Err(ctx.error("expected a single non-NA string")),
        },
        _ => Err(ctx.error("expected a character string")),
    }
}

pub fn scalar_bool(ctx: &EvalContext, v: &RValue) -> Result<bool, EvalError> {
    match &v.data {
        RData::Logical(elems) => match elems.as_slice() {
            [e] => e
                .as_option()
                .ok_or_else(|| ctx.error("missing value where TRUE/FALSE needed")),
            _ => Err(ctx.error("argument is not interpretable as logical")),
        },
        RData::Int(elems) => match elems.as_slice() {
            [Some(n)] => Ok(*n != 0),
            _ => Err(ctx.error("argument is not interpretable as logical")),
        },
        _ => Err(ctx.error("argument is not interpretable as logical")),
    }
}

/// An optional logical flag argument with a default.
pub fn flag(
    ctx: &EvalContext,
    args: &CallArgs,
    position: usize,
    name: &str,
    default: bool,
) -> Result<bool, EvalError> {
    match args.get(position, name) {
        Some(v) => scalar_bool(ctx, v),
        None => Ok(default),
    }
}

// ==================== deparse ====================

/// Reconstruct call text for frame records and error contexts.
fn deparse_call(name: &str, args: &[Arg]) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|arg| match &arg.name {
            Some(n) => format!("{} = {}", n, deparse_expr(&arg.value)),
            None => deparse_expr(&arg.value),
        })
        .collect();
    format!("{}({})", name, parts.join(", "))
}

fn deparse_expr(expr: &Expr) -> String {
    match expr {
        Expr::Null => "NULL".to_string(),
        Expr::Logical(Some(true)) => "TRUE".to_string(),
        Expr::Logical(Some(false)) => "FALSE".to_string(),
        Expr::Logical(None) => "NA".to_string(),
        Expr::Int(Some(n)) => format!("{}L", n),
        Expr::Int(None) => "NA_integer_".to_string(),
        Expr::Double(v) if v.is_nan() => "NaN".to_string(),
        Expr::Double(v) if v.is_infinite() => {
            if *v > 0.0 { "Inf" } else { "-Inf" }.to_string()
        }
        Expr::Double(v) => format!("{}", v),
        Expr::NaReal => "NA_real_".to_string(),
        Expr::Str(s) => format!("{:?}", s),
        Expr::NaCharacter => "NA_character_".to_string(),
        Expr::Complex { im, .. } => format!("{}i", im),
        Expr::Ident(name) => name.clone(),
        Expr::Call { name, args } => deparse_call(name, args),
        Expr::Index { target, index } => {
            format!("{}[[{}]]", deparse_expr(target), deparse_expr(index))
        }
        Expr::Range { start, end } => {
            format!("{}:{}", deparse_expr(start), deparse_expr(end))
        }
        Expr::Neg(operand) => format!("-{}", deparse_expr(operand)),
        Expr::Assign { name, value } => format!("{} <- {}", name, deparse_expr(value)),
    }
}
