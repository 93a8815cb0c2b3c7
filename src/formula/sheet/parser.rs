//! Parser for spreadsheet-style expressions using chumsky.
//!
//! Transforms a token stream from the lexer into a [`SheetExpr`] tree.
//! Precedence, loosest first: comparison, `&` concatenation, `+`/`-`,
//! `*`/`/`, `^`, prefix sign, postfix `%`.

use chumsky::input::ValueInput;
use chumsky::prelude::*;

use super::ast::{BinaryOp, SheetExpr, UnaryOp};
use super::lexer::Token;

/// Create the expression parser.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, SheetExpr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    let expr = recursive(|expr| {
        let number = select! {
            Token::Number(s) => s,
        }
        .labelled("number")
        .map(|s: &str| SheetExpr::Number(s.parse().unwrap_or(f64::NAN)));

        let string_lit = select! {
            Token::StringLit(s) => SheetExpr::Text(s.to_string()),
        }
        .labelled("string literal");

        let boolean = select! {
            Token::True => SheetExpr::Bool(true),
            Token::False => SheetExpr::Bool(false),
        }
        .labelled("boolean");

        let ident = select! {
            Token::Ident(s) => s.to_string(),
        }
        .labelled("identifier");

        // Function call: NAME(arg, arg, ...). A bare identifier is a
        // field/cell reference.
        let call_or_reference = ident
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen))
                    .or_not(),
            )
            .map(|(name, args)| match args {
                Some(args) => SheetExpr::Call { name, args },
                None => SheetExpr::Reference(name),
            });

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((number, string_lit, boolean, call_or_reference, parenthesized))
            .labelled("expression");

        // Postfix percent binds tightest.
        let percent = atom.foldl(just(Token::Percent).repeated(), |operand, _| {
            SheetExpr::Percent(Box::new(operand))
        });

        // Prefix sign.
        let sign = choice((
            just(Token::Minus).to(UnaryOp::Minus),
            just(Token::Plus).to(UnaryOp::Plus),
        ));
        let unary = sign.repeated().foldr(percent, |op, operand| SheetExpr::Unary {
            op,
            operand: Box::new(operand),
        });

        let power = binary_chain(unary, just(Token::Caret).to(BinaryOp::Pow));

        let product = binary_chain(
            power,
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
            )),
        );

        let sum = binary_chain(
            product,
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            )),
        );

        let concat = binary_chain(sum, just(Token::Amp).to(BinaryOp::Concat));

        binary_chain(
            concat,
            choice((
                just(Token::Eq).to(BinaryOp::Eq),
                just(Token::Neq).to(BinaryOp::Neq),
                just(Token::Le).to(BinaryOp::Le),
                just(Token::Ge).to(BinaryOp::Ge),
                just(Token::Lt).to(BinaryOp::Lt),
                just(Token::Gt).to(BinaryOp::Gt),
            )),
        )
    });

    expr.then_ignore(end())
}

/// Left-associative chain of one precedence level.
fn binary_chain<'tokens, 'src: 'tokens, I, P, O>(
    operand: P,
    op: O,
) -> impl Parser<'tokens, I, SheetExpr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
    P: Parser<'tokens, I, SheetExpr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>> + Clone,
    O: Parser<'tokens, I, BinaryOp, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>> + Clone,
{
    operand
        .clone()
        .foldl(op.then(operand).repeated(), |lhs, (op, rhs)| {
            SheetExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }
        })
}
