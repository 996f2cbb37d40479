//! Token definitions for the R fixture sublanguage.
//!
//! The grammar covers exactly what the conformance fixtures use: literal
//! values (including the per-type NA sentinels), `argv <- list(...)`
//! preludes, calls with positional and named arguments, `[[` indexing,
//! `:` ranges, and statement separators.

use logos::Logos;

/// R fixture tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // ==================== Literal keywords ====================
    #[token("TRUE")]
    True,
    #[token("FALSE")]
    False,
    #[token("NULL")]
    Null,
    #[token("NA")]
    Na,
    #[token("NA_integer_")]
    NaInteger,
    #[token("NA_real_")]
    NaReal,
    #[token("NA_character_")]
    NaCharacter,
    #[token("NaN")]
    NaN,
    #[token("Inf")]
    Inf,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[[")]
    LDoubleBracket,
    #[token("]]")]
    RDoubleBracket,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // ==================== Punctuation ====================
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("<-")]
    Arrow,
    #[token("=")]
    Equals,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("\n")]
    Newline,

    // ==================== String delimiters ====================
    // String content is scanned by the lexer wrapper, not by logos,
    // so escaped quotes inside the literal are handled in one place.
    #[token("\"")]
    DoubleQuote,
    #[token("'")]
    SingleQuote,

    // ==================== Numbers ====================
    /// Double literal: has a decimal point or an exponent.
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")]
    Float,
    /// Imaginary literal: `2i`, `1.5i`.
    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)i")]
    Imaginary,
    /// Integer literal, optionally with R's explicit `L` suffix.
    /// In this sublanguage an unsuffixed whole number is also integer.
    #[regex(r"[0-9]+L?")]
    Int,

    // ==================== Identifiers ====================
    /// R identifiers, including dotted names (`as.character`, `.Internal`).
    // Lower priority so a dot-leading number like `.5` lexes as Float.
    #[regex(r"[a-zA-Z.][a-zA-Z0-9._]*", priority = 1)]
    Ident,

    // ==================== Synthesized by the lexer wrapper ====================
    /// A complete string literal including its quotes.
    StrLit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_na_sentinels_not_idents() {
        assert_eq!(
            lex("NA NA_integer_ NA_real_ NA_character_ NaN Inf"),
            vec![
                Token::Na,
                Token::NaInteger,
                Token::NaReal,
                Token::NaCharacter,
                Token::NaN,
                Token::Inf
            ]
        );
    }

    #[test]
    fn test_dotted_identifier() {
        assert_eq!(lex("as.character"), vec![Token::Ident]);
        assert_eq!(lex(".Internal"), vec![Token::Ident]);
        assert_eq!(lex("do.call"), vec![Token::Ident]);
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(lex("7L"), vec![Token::Int]);
        assert_eq!(lex("7"), vec![Token::Int]);
        assert_eq!(lex("2.5"), vec![Token::Float]);
        assert_eq!(lex("1e-3"), vec![Token::Float]);
        assert_eq!(lex(".5"), vec![Token::Float]);
        assert_eq!(lex("2i"), vec![Token::Imaginary]);
    }

    #[test]
    fn test_double_bracket_beats_single() {
        assert_eq!(
            lex("argv[[1]]"),
            vec![
                Token::Ident,
                Token::LDoubleBracket,
                Token::Int,
                Token::RDoubleBracket
            ]
        );
    }

    #[test]
    fn test_comment_skipped_to_newline() {
        assert_eq!(lex("1 # trailing\n2"), vec![
            Token::Int,
            Token::Newline,
            Token::Int
        ]);
    }
}
