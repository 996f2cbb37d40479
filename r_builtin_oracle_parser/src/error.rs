//! Parse error types.

use crate::span::Span;
use thiserror::Error;

/// Parse error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected token
    #[error("unexpected token '{found}' at {span}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Unexpected end of input
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    /// Invalid escape sequence
    #[error("invalid escape sequence '{sequence}' at {span}")]
    InvalidEscape { sequence: String, span: Span },

    /// Unterminated string
    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },

    /// Invalid number literal
    #[error("invalid number literal '{literal}' at {span}")]
    InvalidNumber { literal: String, span: Span },

    /// Assignment target is not a name
    #[error("invalid assignment target at {span}")]
    InvalidAssignTarget { span: Span },

    /// Lexer error
    #[error("unrecognized token at {span}")]
    LexerError { span: Span },
}

impl ParseError {
    /// Get the span of the error, if one is attached.
    pub fn span(&self) -> Option<&Span> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(span),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::InvalidEscape { span, .. } => Some(span),
            ParseError::UnterminatedString { span } => Some(span),
            ParseError::InvalidNumber { span, .. } => Some(span),
            ParseError::InvalidAssignTarget { span } => Some(span),
            ParseError::LexerError { span } => Some(span),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
