//! Lexical productions shared by the statement and expression grammar.
//!
//! The grammar is scannerless: these small winnow parsers recognise names,
//! literals, operators and line structure directly on the located source
//! slice, and the statement grammar in [`parser`](crate::parser) composes
//! them.

use winnow::{
    Parser as _,
    ascii::{digit1, space0},
    combinator::{alt, cut_err, eof, not, opt, peek, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location},
    token::{literal, one_of, take_till, take_while},
};

use crate::{
    ast::{BinaryOperator, NumberLiteral, StringLiteral},
    error::ErrorCode,
    span::{Span, Spanned},
};

/// Context attached to winnow errors.
///
/// Pushed innermost first, so the first [`Context::Code`] found names the
/// most specific failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected
    Label(&'static str),
    /// Error code of the failed construct
    Code(ErrorCode),
    /// Suggested fix shown with the diagnostic
    Help(&'static str),
    /// Byte offset where the failed construct starts
    StartOffset(usize),
}

pub(crate) type Input<'a> = LocatingSlice<&'a str>;
pub(crate) type IResult<O> = ModalResult<O, ContextError<Context>>;

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Match `kw` only when it is not followed by another name character.
pub(crate) fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<Span> {
    move |input: &mut Input<'a>| {
        terminated(literal(kw), peek(not(one_of(is_name_char))))
            .span()
            .map(Span::from)
            .parse_next(input)
    }
}

/// `!` immediately followed by `kw`, after optional leading blanks.
///
/// Returns the offset of the `!`.
pub(crate) fn directive<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<usize> {
    move |input: &mut Input<'a>| {
        space0.parse_next(input)?;
        let start = input.current_token_start();
        ('!', keyword(kw)).parse_next(input)?;
        Ok(start)
    }
}

/// A bare word such as a macro name or a keyword: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn bare_name<'a>(input: &mut Input<'a>) -> IResult<Spanned<String>> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_name_char),
    )
        .take()
        .with_span()
        .map(|(name, span): (&str, _)| Spanned::new(name.to_string(), Span::from(span)))
        .parse_next(input)
}

/// A `$`-prefixed variable name. The sigil is part of the returned name.
pub(crate) fn variable_name<'a>(input: &mut Input<'a>) -> IResult<Spanned<String>> {
    ('$', take_while(1.., is_name_char))
        .take()
        .with_span()
        .map(|(name, span): (&str, _)| Spanned::new(name.to_string(), Span::from(span)))
        .parse_next(input)
}

/// Either a variable name or a bare name.
pub(crate) fn any_name<'a>(input: &mut Input<'a>) -> IResult<Spanned<String>> {
    alt((variable_name, bare_name)).parse_next(input)
}

/// A single- or double-quoted string without escapes.
///
/// A string left open at the end of the line is a hard error.
pub(crate) fn string_literal<'a>(input: &mut Input<'a>) -> IResult<StringLiteral> {
    let start = input.current_token_start();
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let value = take_till(0.., [quote, '\n', '\r']).parse_next(input)?;
    cut_err(quote)
        .context(Context::Label("closing quote"))
        .context(Context::Code(ErrorCode::E001))
        .context(Context::Help("close the string on the same line"))
        .context(Context::StartOffset(start))
        .parse_next(input)?;
    Ok(StringLiteral {
        value: value.to_string(),
        span: Span::new(start..input.current_token_start()),
    })
}

/// An optionally negative decimal number, e.g. `42`, `-3`, `2.5`.
pub(crate) fn number_literal<'a>(input: &mut Input<'a>) -> IResult<NumberLiteral> {
    let (text, span) = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .with_span()
        .parse_next(input)?;
    let value = text
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::<Context>::new()))?;
    Ok(NumberLiteral {
        value,
        span: Span::from(span),
    })
}

/// A binary operator, longest spelling first.
pub(crate) fn binary_operator<'a>(input: &mut Input<'a>) -> IResult<Spanned<BinaryOperator>> {
    alt((
        "==".value(BinaryOperator::Equal),
        "!=".value(BinaryOperator::NotEqual),
        ">=".value(BinaryOperator::GreaterEqual),
        "<=".value(BinaryOperator::LessEqual),
        "&&".value(BinaryOperator::And),
        "||".value(BinaryOperator::Or),
        ">".value(BinaryOperator::Greater),
        "<".value(BinaryOperator::Less),
        "+".value(BinaryOperator::Add),
        "-".value(BinaryOperator::Subtract),
        "*".value(BinaryOperator::Multiply),
        "/".value(BinaryOperator::Divide),
    ))
    .with_span()
    .map(|(op, span)| Spanned::new(op, Span::from(span)))
    .parse_next(input)
}

/// The rest of the current line, without its line terminator.
pub(crate) fn rest_of_line<'a>(input: &mut Input<'a>) -> IResult<Spanned<&'a str>> {
    let start = input.current_token_start();
    let raw: &str = take_till(0.., '\n').parse_next(input)?;
    let text = raw.strip_suffix('\r').unwrap_or(raw);
    Ok(Spanned::new(text, Span::new(start..start + text.len())))
}

/// A line terminator, or the end of input.
pub(crate) fn line_end<'a>(input: &mut Input<'a>) -> IResult<()> {
    alt(("\r\n".void(), "\n".void(), eof.void())).parse_next(input)
}

/// Trailing blanks followed by a line terminator.
///
/// Returns the offset where the line's content ends.
pub(crate) fn end_of_statement<'a>(input: &mut Input<'a>) -> IResult<usize> {
    space0.parse_next(input)?;
    let end = input.current_token_start();
    line_end.parse_next(input)?;
    Ok(end)
}
