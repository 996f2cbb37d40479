//! Lexer for the R fixture sublanguage.
//!
//! Wraps the logos-generated lexer with string-literal scanning: a quote
//! token opens a scan for the matching close quote (honoring backslash
//! escapes), and the whole literal is surfaced as one `StrLit` token.

use logos::Logos;
use memchr::memchr;

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span and source text
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

/// Fixture lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    /// Peeked token (for lookahead)
    peeked: Option<Option<ParseResult<SpannedToken<'a>>>>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer").field("source", &self.source).finish()
    }
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given fixture source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::new(source),
            peeked: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&ParseResult<SpannedToken<'a>>> {
        if self.peeked.is_none() {
            let next = self.next_token_internal();
            self.peeked = Some(next);
        }
        match self.peeked.as_ref() {
            Some(t) => t.as_ref(),
            None => None,
        }
    }

    /// Get the next token
    #[allow(clippy::should_implement_trait)]
    pub fn next_token(&mut self) -> Option<ParseResult<SpannedToken<'a>>> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        self.next_token_internal()
    }

    fn next_token_internal(&mut self) -> Option<ParseResult<SpannedToken<'a>>> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let (start, end) = (span.start, span.end);

        match result {
            Ok(Token::DoubleQuote) => Some(self.scan_string(start, end, b'"')),
            Ok(Token::SingleQuote) => Some(self.scan_string(start, end, b'\'')),
            Ok(token) => Some(Ok(SpannedToken::new(
                token,
                Span::new(start, end),
                &self.source[start..end],
            ))),
            Err(()) => Some(Err(ParseError::LexerError {
                span: Span::new(start, end),
            })),
        }
    }

    /// Scan from just after an opening quote to the matching close quote.
    /// Backslash escapes the following byte; the escape itself is decoded
    /// later by the parser.
    fn scan_string(
        &mut self,
        start: usize,
        mut pos: usize,
        quote: u8,
    ) -> ParseResult<SpannedToken<'a>> {
        let bytes = self.source.as_bytes();
        loop {
            let rest = &bytes[pos..];
            let Some(found) = memchr(quote, rest) else {
                return Err(ParseError::UnterminatedString {
                    span: Span::new(start, self.source.len()),
                });
            };
            let candidate = pos + found;
            // Count the run of backslashes immediately before the quote;
            // an odd run means the quote is escaped.
            let mut run_start = candidate;
            while run_start > start + 1 && bytes[run_start - 1] == b'\\' {
                run_start -= 1;
            }
            if (candidate - run_start) % 2 == 0 {
                let end = candidate + 1;
                self.inner.bump(end - (start + 1));
                return Ok(SpannedToken::new(
                    Token::StrLit,
                    Span::new(start, end),
                    &self.source[start..end],
                ));
            }
            pos = candidate + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<(Token, String)> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            let tok = tok.expect("lex error");
            out.push((tok.token, tok.text.to_string()));
        }
        out
    }

    #[test]
    fn test_double_quoted_string() {
        let toks = tokens(r#"gsub("a", "b", x)"#);
        assert_eq!(toks[0], (Token::Ident, "gsub".to_string()));
        assert_eq!(toks[2], (Token::StrLit, "\"a\"".to_string()));
        assert_eq!(toks[4], (Token::StrLit, "\"b\"".to_string()));
    }

    #[test]
    fn test_single_quoted_string() {
        let toks = tokens("do.call('cbind', argv)");
        assert_eq!(toks[2], (Token::StrLit, "'cbind'".to_string()));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let toks = tokens(r#""a\"b""#);
        assert_eq!(toks[0], (Token::StrLit, r#""a\"b""#.to_string()));
    }

    #[test]
    fn test_escaped_backslash_before_close() {
        let toks = tokens(r#""a\\""#);
        assert_eq!(toks[0], (Token::StrLit, r#""a\\""#.to_string()));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let mut lexer = Lexer::new("\"abc");
        let err = lexer.next_token().unwrap().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { .. }));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("argv");
        assert!(lexer.peek().is_some());
        let tok = lexer.next_token().unwrap().unwrap();
        assert_eq!(tok.token, Token::Ident);
        assert!(lexer.next_token().is_none());
    }
}
