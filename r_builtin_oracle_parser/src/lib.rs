//! r_builtin_oracle_parser
//!
//! Pure Rust parser for the R fixture sublanguage used by the builtin
//! conformance oracle: `argv <- list(...)` preludes, literal values with
//! per-type NA sentinels, calls with positional and named arguments,
//! `[[` indexing and `:` ranges.
//!
//! # Example
//!
//! ```
//! use r_builtin_oracle_parser::{parse, Expr};
//!
//! let program = parse("argv <- list(1L, 2L); .Internal(anyDuplicated(argv[[1]], FALSE))").unwrap();
//! assert_eq!(program.stmts.len(), 2);
//! assert!(matches!(program.stmts[0], Expr::Assign { .. }));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

// Re-exports
pub use ast::{Arg, Expr, Program};
pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::Token;

/// Parse fixture source into a [`Program`].
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source).parse()
}
