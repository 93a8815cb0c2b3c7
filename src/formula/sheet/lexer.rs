//! Lexer for spreadsheet-style expressions.
//!
//! Converts source text into `(Token, SimpleSpan)` pairs. Identifiers may
//! contain dots so that qualified field references (`orders.amount`) lex as
//! a single token, matching the formula compiler's field tokenization.

use chumsky::prelude::*;

/// A token in a spreadsheet expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// Numeric literal text (parsed later).
    Number(&'src str),
    /// String literal contents, without the quotes.
    StringLit(&'src str),
    /// Identifier, function name, or qualified reference.
    Ident(&'src str),
    /// `TRUE` literal.
    True,
    /// `FALSE` literal.
    False,

    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Amp,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(s) => write!(f, "{}", s),
            Token::StringLit(s) => write!(f, "\"{}\"", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Percent => write!(f, "%"),
            Token::Amp => write!(f, "&"),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
        }
    }
}

/// Map a bare word to a literal keyword or an identifier.
fn keyword_or_ident(word: &str) -> Token<'_> {
    if word.eq_ignore_ascii_case("true") {
        Token::True
    } else if word.eq_ignore_ascii_case("false") {
        Token::False
    } else {
        Token::Ident(word)
    }
}

/// Build the lexer.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    // Identifiers: letters/underscore start, then alphanumerics,
    // underscores, and dots for table.field qualification.
    let ident = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
                .repeated(),
        )
        .to_slice()
        .map(keyword_or_ident);

    // String literals: "..." (no escape handling; spreadsheet formulas
    // double the quote instead, which lexes as two adjacent literals).
    let string_lit = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit);

    // Numbers: digits with an optional fraction.
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::Number);

    // Symbols (multi-char first, then single-char).
    let symbol = choice((
        just("<>").to(Token::Neq),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('^').to(Token::Caret),
        just('%').to(Token::Percent),
        just('&').to(Token::Amp),
        just('=').to(Token::Eq),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
    ));

    let token = choice((number, ident, string_lit, symbol)).map_with(|tok, e| (tok, e.span()));

    token
        .padded()
        .repeated()
        .collect()
        .padded()
        .then_ignore(end())
}

/// Lex a source string into tokens.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
