//! AST for the fixture sublanguage.
//!
//! The tree is deliberately small: fixtures are an `argv <- list(...)`
//! prelude followed by one trailing call expression, with literal values,
//! `[[` indexing, `:` ranges and nothing else.

/// One parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `NULL`
    Null,
    /// `TRUE`, `FALSE`, `NA`
    Logical(Option<bool>),
    /// `7`, `7L`, `NA_integer_`
    Int(Option<i32>),
    /// `2.5`, `1e-3`, `Inf`, `NaN`
    Double(f64),
    /// `NA_real_` — distinct from `NaN`, which is an ordinary `Double`
    NaReal,
    /// String literal, already unescaped
    Str(String),
    /// `NA_character_`
    NaCharacter,
    /// Imaginary literal: `2i` is `Complex { re: 0.0, im: 2.0 }`
    Complex { re: f64, im: f64 },
    /// Bare name reference
    Ident(String),
    /// `f(a, b = 2)`
    Call { name: String, args: Vec<Arg> },
    /// `argv[[1]]`
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `1:3`
    Range { start: Box<Expr>, end: Box<Expr> },
    /// Unary minus
    Neg(Box<Expr>),
    /// `name <- value`
    Assign { name: String, value: Box<Expr> },
}

/// A call argument, optionally named (`fromLast = TRUE`).
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// An ordered sequence of statements; the last one is the case's result
/// expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Expr>,
}
