//! Recursive-descent parser for the fixture sublanguage.

use crate::ast::{Arg, Expr, Program};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Fixture parser. Consumes the source once and produces a [`Program`].
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Parse the whole source into an ordered statement list.
    pub fn parse(mut self) -> ParseResult<Program> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators()?;
            if self.peek()?.is_none() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            // A statement ends at a separator or at end of input.
            match self.peek()? {
                None => {}
                Some(tok)
                    if matches!(tok.token, Token::Newline | Token::Semicolon) => {}
                Some(tok) => {
                    return Err(ParseError::UnexpectedToken {
                        found: tok.text.to_string(),
                        expected: "statement separator".to_string(),
                        span: tok.span,
                    });
                }
            }
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_expr()?;
        if self.peek_is(Token::Arrow)? {
            let arrow = self.advance()?.expect("peeked");
            let Expr::Ident(name) = expr else {
                return Err(ParseError::InvalidAssignTarget { span: arrow.span });
            };
            let value = self.parse_expr()?;
            return Ok(Expr::Assign {
                name,
                value: Box::new(value),
            });
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        self.parse_range_tail(lhs)
    }

    /// Apply a `:` range tail, if present, to an already-parsed operand.
    fn parse_range_tail(&mut self, lhs: Expr) -> ParseResult<Expr> {
        if self.peek_is(Token::Colon)? {
            self.advance()?;
            let rhs = self.parse_unary()?;
            return Ok(Expr::Range {
                start: Box::new(lhs),
                end: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.peek_is(Token::Minus)? {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(operand)));
        }
        if self.peek_is(Token::Plus)? {
            self.advance()?;
            return self.parse_unary();
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let primary = self.parse_primary()?;
        self.parse_postfix_from(primary)
    }

    fn parse_postfix_from(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        while self.peek_is(Token::LDoubleBracket)? {
            self.advance()?;
            let index = self.parse_expr()?;
            self.expect(Token::RDoubleBracket, "']]'")?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let tok = self.advance_expecting("an expression")?;
        match tok.token {
            Token::True => Ok(Expr::Logical(Some(true))),
            Token::False => Ok(Expr::Logical(Some(false))),
            Token::Na => Ok(Expr::Logical(None)),
            Token::Null => Ok(Expr::Null),
            Token::NaInteger => Ok(Expr::Int(None)),
            Token::NaReal => Ok(Expr::NaReal),
            Token::NaCharacter => Ok(Expr::NaCharacter),
            Token::NaN => Ok(Expr::Double(f64::NAN)),
            Token::Inf => Ok(Expr::Double(f64::INFINITY)),
            Token::Int => parse_int_literal(tok.text, tok.span),
            Token::Float => parse_double_literal(tok.text, tok.span),
            Token::Imaginary => {
                let digits = &tok.text[..tok.text.len() - 1];
                let im = digits.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    literal: tok.text.to_string(),
                    span: tok.span,
                })?;
                Ok(Expr::Complex { re: 0.0, im })
            }
            Token::StrLit => unescape_string(tok.text, tok.span).map(Expr::Str),
            Token::Ident => {
                let name = tok.text.to_string();
                if self.peek_is(Token::LParen)? {
                    self.advance()?;
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(ParseError::UnexpectedToken {
                found: tok.text.to_string(),
                expected: "an expression".to_string(),
                span: tok.span,
            }),
        }
    }

    /// Parse `(` ... `)` call arguments; the opening paren is already
    /// consumed. Newlines inside the parentheses are insignificant.
    fn parse_call_args(&mut self) -> ParseResult<Vec<Arg>> {
        let mut args = Vec::new();
        self.skip_newlines()?;
        if self.peek_is(Token::RParen)? {
            self.advance()?;
            return Ok(args);
        }
        loop {
            self.skip_newlines()?;
            args.push(self.parse_arg()?);
            self.skip_newlines()?;
            let tok = self.advance_expecting("',' or ')'")?;
            match tok.token {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: tok.text.to_string(),
                        expected: "',' or ')'".to_string(),
                        span: tok.span,
                    });
                }
            }
        }
    }

    /// One call argument. A leading identifier followed by `=` is an
    /// argument name; otherwise the identifier starts an ordinary
    /// expression (bare name, call, or indexed value).
    fn parse_arg(&mut self) -> ParseResult<Arg> {
        if self.peek_is(Token::Ident)? {
            let ident = self.advance()?.expect("peeked");
            let name = ident.text.to_string();
            if self.peek_is(Token::Equals)? {
                self.advance()?;
                self.skip_newlines()?;
                let value = self.parse_expr()?;
                return Ok(Arg::named(name, value));
            }
            // Not named after all: resume expression parsing from the
            // identifier we already consumed.
            let primary = if self.peek_is(Token::LParen)? {
                self.advance()?;
                let args = self.parse_call_args()?;
                Expr::Call { name, args }
            } else {
                Expr::Ident(name)
            };
            let postfixed = self.parse_postfix_from(primary)?;
            let value = self.parse_range_tail(postfixed)?;
            return Ok(Arg::positional(value));
        }
        Ok(Arg::positional(self.parse_expr()?))
    }

    // ==================== token plumbing ====================

    fn peek(&mut self) -> ParseResult<Option<&SpannedToken<'a>>> {
        match self.lexer.peek() {
            None => Ok(None),
            Some(Ok(tok)) => Ok(Some(tok)),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    fn peek_is(&mut self, want: Token) -> ParseResult<bool> {
        Ok(self.peek()?.is_some_and(|tok| tok.token == want))
    }

    fn advance(&mut self) -> ParseResult<Option<SpannedToken<'a>>> {
        match self.lexer.next_token() {
            None => Ok(None),
            Some(res) => res.map(Some),
        }
    }

    fn advance_expecting(&mut self, expected: &str) -> ParseResult<SpannedToken<'a>> {
        self.advance()?.ok_or_else(|| ParseError::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    fn expect(&mut self, want: Token, what: &str) -> ParseResult<SpannedToken<'a>> {
        let tok = self.advance_expecting(what)?;
        if tok.token == want {
            Ok(tok)
        } else {
            Err(ParseError::UnexpectedToken {
                found: tok.text.to_string(),
                expected: what.to_string(),
                span: tok.span,
            })
        }
    }

    fn skip_newlines(&mut self) -> ParseResult<()> {
        while self.peek_is(Token::Newline)? {
            self.advance()?;
        }
        Ok(())
    }

    fn skip_separators(&mut self) -> ParseResult<()> {
        loop {
            let is_sep = self
                .peek()?
                .is_some_and(|tok| matches!(tok.token, Token::Newline | Token::Semicolon));
            if !is_sep {
                return Ok(());
            }
            self.advance()?;
        }
    }
}

fn parse_int_literal(text: &str, span: Span) -> ParseResult<Expr> {
    let digits = text.strip_suffix('L').unwrap_or(text);
    match digits.parse::<i32>() {
        Ok(v) => Ok(Expr::Int(Some(v))),
        Err(_) => Err(ParseError::InvalidNumber {
            literal: text.to_string(),
            span,
        }),
    }
}

fn parse_double_literal(text: &str, span: Span) -> ParseResult<Expr> {
    match text.parse::<f64>() {
        Ok(v) => Ok(Expr::Double(v)),
        Err(_) => Err(ParseError::InvalidNumber {
            literal: text.to_string(),
            span,
        }),
    }
}

/// Decode a quoted string literal (quotes included) into its value.
fn unescape_string(text: &str, span: Span) -> ParseResult<String> {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            other => {
                let mut sequence = String::from('\\');
                if let Some(c) = other {
                    sequence.push(c);
                }
                return Err(ParseError::InvalidEscape { sequence, span });
            }
        }
    }
    Ok(out)
}
