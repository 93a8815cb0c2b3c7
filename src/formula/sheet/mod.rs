//! Embedded spreadsheet-formula grammar.
//!
//! The formula compiler accepts lightweight SQL-style metric formulas
//! through cheap heuristics; anything that falls through is handed to this
//! stricter Excel-style expression parser. The module follows the usual
//! lexer → token stream → AST pipeline and reports failures as rendered
//! diagnostics rather than panics.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, SheetExpr, UnaryOp};

/// Result of parsing a spreadsheet expression.
#[derive(Debug)]
pub struct SheetParseResult {
    /// The parsed expression, if parsing succeeded.
    pub expr: Option<SheetExpr>,
    /// Rendered error messages with source offsets.
    pub diagnostics: Vec<Diagnostic>,
}

impl SheetParseResult {
    /// First diagnostic message, rendered for display.
    pub fn first_error(&self) -> Option<String> {
        self.diagnostics.first().map(|d| d.to_string())
    }
}

/// A parse error with its source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Byte range in the source.
    pub span: std::ops::Range<usize>,
    /// The error message.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {}..{})", self.message, self.span.start, self.span.end)
    }
}

/// Parse a spreadsheet expression.
///
/// Lexes the source, then parses the token stream. Lexer and parser errors
/// are both collected into `diagnostics`; `expr` is present only when the
/// whole input parsed as a single expression.
pub fn parse(source: &str) -> SheetParseResult {
    use chumsky::error::Rich;
    use chumsky::input::Input;
    use chumsky::span::SimpleSpan;
    use chumsky::span::Span as _;
    use chumsky::Parser as _;

    let (tokens, lex_errs) = lexer::lexer().parse(source).into_output_errors();

    let mut diagnostics: Vec<Diagnostic> = lex_errs
        .into_iter()
        .map(|e: Rich<'_, char>| {
            let span = e.span();
            Diagnostic {
                span: span.start()..span.end(),
                message: e.to_string(),
            }
        })
        .collect();

    let tokens: Vec<(lexer::Token<'_>, SimpleSpan)> = match tokens {
        Some(t) => t,
        None => {
            return SheetParseResult {
                expr: None,
                diagnostics,
            };
        }
    };

    let len = source.len();
    let eoi: SimpleSpan = (len..len).into();
    let token_stream = tokens
        .as_slice()
        .map(eoi, |(tok, span): &(lexer::Token<'_>, SimpleSpan)| (tok, span));

    let (expr, parse_errs) = parser::parser().parse(token_stream).into_output_errors();

    diagnostics.extend(parse_errs.into_iter().map(
        |e: Rich<'_, lexer::Token<'_>, SimpleSpan>| {
            let span = e.span();
            Diagnostic {
                span: span.start()..span.end(),
                message: e.to_string(),
            }
        },
    ));

    let expr = if diagnostics.is_empty() { expr } else { None };

    SheetParseResult { expr, diagnostics }
}
