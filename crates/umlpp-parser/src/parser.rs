//! Statement and expression grammar.
//!
//! Source is processed line by line. Each line is offered to the statement
//! productions in a fixed priority order; the first one that matches wins.
//! Once a known directive keyword has matched, the rest of the directive is
//! committed with [`cut_err`], so a malformed directive fails the whole parse
//! instead of falling through to a pass-through line. Unrecognised `!` lines
//! become [`UnknownStatement`]s and anything else becomes [`DiagramText`].
//! The public entry point is [`build_root`].

use winnow::{
    Parser as _,
    ascii::{space0, space1},
    combinator::{alt, not, opt, peek, preceded, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{take_till, take_while},
};

use crate::{
    ast::*,
    error::{Diagnostic, ErrorCode},
    lexer::{
        Context, IResult, Input, any_name, binary_operator, directive, end_of_statement,
        is_name_char, keyword, line_end, number_literal, rest_of_line, string_literal,
        variable_name,
    },
    span::{Span, Spanned},
};

const IF_TERMINATORS: &[&str] = &["elseif", "else", "endif"];

/// Commit to the directive starting at `start`.
///
/// Any failure inside `f` becomes a cut error tagged with `code`.
fn cut_err<'a, O, F>(input: &mut Input<'a>, start: usize, code: ErrorCode, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'a>) -> IResult<O>,
{
    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::Code(code));
            e.push(Context::StartOffset(start));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Cut error for a block that reached the end of input.
fn unterminated_block(expected: &'static str, start: usize) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(expected));
    e.push(Context::Code(ErrorCode::E102));
    e.push(Context::StartOffset(start));
    ErrMode::Cut(e)
}

fn backtrack() -> ErrMode<ContextError<Context>> {
    ErrMode::Backtrack(ContextError::new())
}

/// The `!` directive start after leading blanks, without consuming anything
/// else.
fn directive_start<'a>(input: &mut Input<'a>) -> IResult<usize> {
    space0.parse_next(input)?;
    let start = input.current_token_start();
    '!'.parse_next(input)?;
    Ok(start)
}

/// Consume whatever follows a closing keyword up to the end of its line.
fn closing_line<'a>(input: &mut Input<'a>) -> IResult<()> {
    rest_of_line(input)?;
    line_end(input)
}

/// Match a block terminator such as `!endif` at the start of a line.
fn terminator<'a>(
    input: &mut Input<'a>,
    terminators: &[&'static str],
) -> IResult<Spanned<&'static str>> {
    let start = directive_start(input)?;
    let word: &str = take_while(1.., is_name_char).parse_next(input)?;
    terminators
        .iter()
        .find(|candidate| **candidate == word)
        .map(|found| Spanned::new(*found, Span::new(start..input.current_token_start())))
        .ok_or_else(backtrack)
}

/// Parse statements until one of `terminators` closes the block.
///
/// Returns the body and the terminator that ended it. Nested blocks consume
/// their own terminators, so only terminators at this nesting level are
/// seen here.
fn block<'a>(
    input: &mut Input<'a>,
    terminators: &[&'static str],
    expected: &'static str,
    start: usize,
) -> IResult<(Vec<Statement>, Spanned<&'static str>)> {
    let mut body = Vec::new();
    loop {
        if input.is_empty() {
            return Err(unterminated_block(expected, start));
        }

        let checkpoint = input.checkpoint();
        match terminator(input, terminators) {
            Ok(found) => return Ok((body, found)),
            Err(ErrMode::Backtrack(_)) => input.reset(&checkpoint),
            Err(e) => return Err(e),
        }

        body.push(statement(input)?);
    }
}

/// Parse a parenthesized expression
fn parenthesized<'a>(input: &mut Input<'a>) -> IResult<Expression> {
    let start = input.current_token_start();
    '('.parse_next(input)?;
    space0.parse_next(input)?;
    let inner = expression(input)?;
    space0.parse_next(input)?;
    ')'.context(Context::Label("`)`")).parse_next(input)?;
    Ok(Expression::Parenthesized(ParenthesizedExpression {
        expression: Box::new(inner),
        span: Span::new(start..input.current_token_start()),
    }))
}

/// Parse a positional (`value`) or named (`$name = value`) call argument
fn argument<'a>(input: &mut Input<'a>) -> IResult<Argument> {
    let start = input.current_token_start();
    let name = opt(terminated(any_name, (space0, '=', not('='), space0))).parse_next(input)?;
    let value = expression(input)?;
    Ok(Argument {
        name,
        span: Span::new(start..value.span().end()),
        value,
    })
}

/// Parse `name(args)` or the built-in form `%name(args)`
fn call_expression<'a>(input: &mut Input<'a>) -> IResult<CallExpression> {
    let start = input.current_token_start();
    let builtin = opt('%').parse_next(input)?.is_some();
    let callee = any_name(input)?;
    '('.parse_next(input)?;
    space0.parse_next(input)?;
    let arguments: Vec<Argument> =
        separated(0.., argument, (space0, ',', space0)).parse_next(input)?;
    space0.parse_next(input)?;
    ')'.context(Context::Label("`)`")).parse_next(input)?;
    Ok(CallExpression {
        builtin,
        callee,
        arguments,
        span: Span::new(start..input.current_token_start()),
    })
}

fn primary<'a>(input: &mut Input<'a>) -> IResult<Expression> {
    alt((
        parenthesized,
        string_literal.map(Expression::String),
        number_literal.map(Expression::Number),
        call_expression.map(Expression::Call),
        any_name.map(|name| {
            Expression::Identifier(Identifier {
                span: name.span(),
                name: name.into_inner(),
            })
        }),
    ))
    .context(Context::Label("expression"))
    .parse_next(input)
}

/// Parse an expression.
///
/// Binary operators have no precedence: `a + b * c` folds to
/// `(a + b) * c`.
pub(crate) fn expression<'a>(input: &mut Input<'a>) -> IResult<Expression> {
    let mut left = primary(input)?;
    loop {
        let checkpoint = input.checkpoint();
        space0.parse_next(input)?;
        let Ok(operator) = binary_operator(input) else {
            input.reset(&checkpoint);
            break;
        };
        space0.parse_next(input)?;
        let right = primary.context(Context::Label("operand")).parse_next(input)?;
        let span = left.span().cover(right.span());
        left = Expression::Binary(BinaryExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parameter<'a>(input: &mut Input<'a>) -> IResult<Parameter> {
    let name = any_name
        .context(Context::Label("parameter name"))
        .parse_next(input)?;
    let default = opt(preceded((space0, '=', space0), expression)).parse_next(input)?;
    let end = default
        .as_ref()
        .map_or(name.span().end(), |value| value.span().end());
    Ok(Parameter {
        span: Span::new(name.span().start()..end),
        name,
        default,
    })
}

/// Parse `(param, param = default, ...)`
fn parameter_list<'a>(input: &mut Input<'a>) -> IResult<Vec<Parameter>> {
    '('.context(Context::Label("`(`")).parse_next(input)?;
    space0.parse_next(input)?;
    let parameters: Vec<Parameter> =
        separated(0.., parameter, (space0, ',', space0)).parse_next(input)?;
    space0.parse_next(input)?;
    ')'.context(Context::Label("`)`")).parse_next(input)?;
    Ok(parameters)
}

/// A parameter list directly after a macro name, if one is present.
fn optional_parameter_list<'a>(input: &mut Input<'a>) -> IResult<Option<Vec<Parameter>>> {
    if opt(peek('(')).parse_next(input)?.is_some() {
        parameter_list(input).map(Some)
    } else {
        Ok(None)
    }
}

/// `![global|local] $name (=|?=) expr`
fn variable_declaration<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive_start(input)?;
    let scope = opt(terminated(
        alt((
            keyword("global").value(VariableScope::Global),
            keyword("local").value(VariableScope::Local),
        )),
        space1,
    ))
    .parse_next(input)?
    .unwrap_or_default();
    let name = variable_name(input)?;
    space0.parse_next(input)?;
    let conditional = alt(("?=".value(true), "=".value(false))).parse_next(input)?;

    cut_err(input, start, ErrorCode::E100, |input| {
        space0.parse_next(input)?;
        let initializer = expression
            .context(Context::Label("variable value"))
            .parse_next(input)?;
        let end = end_of_statement(input)?;
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            name: Identifier {
                span: name.span(),
                name: name.into_inner(),
            },
            initializer,
            scope,
            conditional,
            span: Span::new(start..end),
        }))
    })
}

/// `!definelong NAME[(params)]` followed by raw lines up to `!enddefinelong`
fn define_long_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive("definelong").parse_next(input)?;
    let name = cut_err(input, start, ErrorCode::E103, |input| {
        preceded(space1, any_name)
            .context(Context::Label("macro name"))
            .parse_next(input)
    })?;
    let parameters = cut_err(input, start, ErrorCode::E100, |input| {
        let parameters = optional_parameter_list(input)?;
        end_of_statement(input)?;
        Ok(parameters)
    })?;

    let body_start = input.current_token_start();
    let remaining: &'a str = **input;
    let mut body_end = body_start;
    loop {
        if input.is_empty() {
            return Err(unterminated_block("`!enddefinelong`", start));
        }
        let line = rest_of_line(input)?;
        let is_terminator = line
            .trim_start()
            .strip_prefix("!enddefinelong")
            .is_some_and(|rest| !rest.starts_with(is_name_char));
        if is_terminator {
            let end = line.span().end();
            line_end(input)?;
            let body = &remaining[..body_end - body_start];
            return Ok(Statement::DefineLong(DefineLongStatement {
                name,
                parameters,
                body: Spanned::new(body.to_string(), Span::new(body_start..body_end)),
                span: Span::new(start..end),
            }));
        }
        body_end = line.span().end();
        line_end(input)?;
    }
}

/// `!define NAME[(params)] [value]`
fn define_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive("define").parse_next(input)?;
    let name = cut_err(input, start, ErrorCode::E103, |input| {
        preceded(space1, any_name)
            .context(Context::Label("macro name"))
            .parse_next(input)
    })?;
    let parameters = cut_err(input, start, ErrorCode::E100, optional_parameter_list)?;
    let header_end = input.current_token_start();

    space0.parse_next(input)?;
    let rest = rest_of_line(input)?;
    line_end(input)?;

    let text = rest.trim_end();
    let value_start = rest.span().start();
    let value = (!text.is_empty())
        .then(|| Spanned::new(text.to_string(), Span::new(value_start..value_start + text.len())));
    let end = value
        .as_ref()
        .map_or(header_end, |value| value.span().end());
    Ok(Statement::Define(DefineStatement {
        name,
        parameters,
        value,
        span: Span::new(start..end),
    }))
}

/// Split a trailing `!PART` tag off an include target.
fn split_part(text: &str, offset: usize) -> (Spanned<String>, Option<Spanned<String>>) {
    match text.rfind('!') {
        Some(index) if index > 0 && index + 1 < text.len() && !text[index + 1..].contains('/') => {
            let target = Spanned::new(
                text[..index].to_string(),
                Span::new(offset..offset + index),
            );
            let part = Spanned::new(
                text[index + 1..].to_string(),
                Span::new(offset + index + 1..offset + text.len()),
            );
            (target, Some(part))
        }
        _ => (
            Spanned::new(text.to_string(), Span::new(offset..offset + text.len())),
            None,
        ),
    }
}

type IncludeTarget = (Spanned<String>, IncludeKind, Option<Spanned<String>>);

/// `<module/path>` standard library target
fn standard_target<'a>(input: &mut Input<'a>) -> IResult<IncludeTarget> {
    '<'.parse_next(input)?;
    let offset = input.current_token_start();
    let text: &str = take_till(1.., ['>', '\n', '\r']).parse_next(input)?;
    // An opened `<` never falls back to a path target.
    winnow::combinator::cut_err('>')
        .context(Context::Label("`>`"))
        .parse_next(input)?;
    let (target, part) = split_part(text.trim_end(), offset);
    Ok((target, IncludeKind::Standard, part))
}

/// A relative path or an absolute URL
fn location_target<'a>(
    input: &mut Input<'a>,
    directive: IncludeDirective,
) -> IResult<IncludeTarget> {
    let offset = input.current_token_start();
    let text: &str = take_till(1.., [' ', '\t', '\n', '\r']).parse_next(input)?;
    let kind = if directive == IncludeDirective::IncludeUrl || text.contains("://") {
        IncludeKind::Url
    } else {
        IncludeKind::Path
    };
    let (target, part) = split_part(text, offset);
    Ok((target, kind, part))
}

/// `!include`, `!include_many`, `!include_once`, `!includeurl`, `!includesub`
fn include_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive_start(input)?;
    let directive = alt((
        keyword("include_many").value(IncludeDirective::IncludeMany),
        keyword("include_once").value(IncludeDirective::IncludeOnce),
        keyword("includeurl").value(IncludeDirective::IncludeUrl),
        keyword("includesub").value(IncludeDirective::IncludeSub),
        keyword("include").value(IncludeDirective::Include),
    ))
    .parse_next(input)?;

    cut_err(input, start, ErrorCode::E104, |input| {
        space1
            .context(Context::Label("include target"))
            .parse_next(input)?;
        let (target, kind, part) = alt((standard_target, |input: &mut Input<'a>| {
            location_target(input, directive)
        }))
        .context(Context::Label("include target"))
        .parse_next(input)?;
        let end = end_of_statement(input)?;
        Ok(Statement::Include(IncludeStatement {
            directive,
            target,
            kind,
            part,
            span: Span::new(start..end),
        }))
    })
}

/// `!return expr` after a callable header on the same line
fn inline_return<'a>(input: &mut Input<'a>) -> IResult<Expression> {
    (space0, '!', keyword("return"), space1).parse_next(input)?;
    expression(input)
}

/// `![unquoted ]function` or `![unquoted ]procedure`, block or inline form
fn callable_declaration<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive_start(input)?;
    let unquoted = opt(terminated(keyword("unquoted"), space1))
        .parse_next(input)?
        .is_some();
    let is_function = alt((
        keyword("function").value(true),
        keyword("procedure").value(false),
    ))
    .parse_next(input)?;

    let label = if is_function {
        "function name"
    } else {
        "procedure name"
    };
    let name = cut_err(input, start, ErrorCode::E103, |input| {
        preceded(space1, any_name)
            .context(Context::Label(label))
            .parse_next(input)
    })?;

    let (parameters, inline, header_end) = cut_err(input, start, ErrorCode::E100, |input| {
        let parameters = parameter_list(input)?;
        let inline = if is_function {
            opt(inline_return).parse_next(input)?
        } else {
            None
        };
        let end = end_of_statement(input)?;
        Ok((parameters, inline, end))
    })?;

    if let Some(value) = inline {
        return Ok(Statement::InlineFunctionDeclaration(InlineFunctionDeclaration {
            name,
            parameters,
            value,
            unquoted,
            span: Span::new(start..header_end),
        }));
    }

    let (closer, expected) = if is_function {
        ("endfunction", "`!endfunction`")
    } else {
        ("endprocedure", "`!endprocedure`")
    };
    let (body, end) = block(input, &[closer], expected, start)?;
    closing_line(input)?;
    let span = Span::new(start..end.span().end());

    Ok(if is_function {
        Statement::FunctionDeclaration(FunctionDeclaration {
            name,
            parameters,
            body,
            unquoted,
            span,
        })
    } else {
        Statement::ProcedureDeclaration(ProcedureDeclaration {
            name,
            parameters,
            body,
            unquoted,
            span,
        })
    })
}

/// A directive line holding only a condition: `expr` for `!if`, a bare
/// name for `!ifdef` and `!ifndef`.
fn condition_line<'a>(input: &mut Input<'a>, kind: ConditionKind) -> IResult<Expression> {
    space1.context(Context::Label("condition")).parse_next(input)?;
    let condition = match kind {
        ConditionKind::If => expression
            .context(Context::Label("condition"))
            .parse_next(input)?,
        ConditionKind::IfDef | ConditionKind::IfNotDef => {
            let name = any_name
                .context(Context::Label("macro name"))
                .parse_next(input)?;
            Expression::Identifier(Identifier {
                span: name.span(),
                name: name.into_inner(),
            })
        }
    };
    end_of_statement(input)?;
    Ok(condition)
}

/// `!if` / `!ifdef` / `!ifndef` ... [`!elseif` ...]* [`!else` ...] `!endif`
fn if_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive_start(input)?;
    let kind = alt((
        keyword("ifdef").value(ConditionKind::IfDef),
        keyword("ifndef").value(ConditionKind::IfNotDef),
        keyword("if").value(ConditionKind::If),
    ))
    .parse_next(input)?;

    let condition = cut_err(input, start, ErrorCode::E100, |input| {
        condition_line(input, kind)
    })?;
    let (consequent, mut found) = block(input, IF_TERMINATORS, "`!endif`", start)?;

    let mut else_ifs = Vec::new();
    let mut alternate = None;
    loop {
        match *found.inner() {
            "elseif" => {
                let clause_start = found.span().start();
                let condition = cut_err(input, clause_start, ErrorCode::E100, |input| {
                    condition_line(input, ConditionKind::If)
                })?;
                let (body, next) = block(input, IF_TERMINATORS, "`!endif`", start)?;
                else_ifs.push(ElseIfClause {
                    condition,
                    body,
                    span: Span::new(clause_start..next.span().start()),
                });
                found = next;
            }
            "else" => {
                closing_line(input)?;
                let (body, next) = block(input, &["endif"], "`!endif`", start)?;
                alternate = Some(body);
                found = next;
            }
            _ => break,
        }
    }
    closing_line(input)?;

    Ok(Statement::If(IfStatement {
        kind,
        condition,
        consequent,
        else_ifs,
        alternate,
        span: Span::new(start..found.span().end()),
    }))
}

/// `!while expr` ... `!endwhile`
fn while_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive("while").parse_next(input)?;
    let condition = cut_err(input, start, ErrorCode::E100, |input| {
        condition_line(input, ConditionKind::If)
    })?;
    let (body, end) = block(input, &["endwhile"], "`!endwhile`", start)?;
    closing_line(input)?;
    Ok(Statement::While(WhileStatement {
        condition,
        body,
        span: Span::new(start..end.span().end()),
    }))
}

/// `!return expr`
fn return_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive("return").parse_next(input)?;
    cut_err(input, start, ErrorCode::E100, |input| {
        space1.parse_next(input)?;
        let value = expression
            .context(Context::Label("return value"))
            .parse_next(input)?;
        let end = end_of_statement(input)?;
        Ok(Statement::Return(ReturnStatement {
            value,
            span: Span::new(start..end),
        }))
    })
}

fn call_line<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    space0.parse_next(input)?;
    let expression = call_expression
        .verify(|call: &CallExpression| call.builtin || call.callee.starts_with('$'))
        .parse_next(input)?;
    let end = end_of_statement(input)?;
    Ok(Statement::Expression(ExpressionStatement {
        span: Span::new(expression.span.start()..end),
        expression: Expression::Call(expression),
    }))
}

/// A line holding a single `$`- or `%`-call.
///
/// Never commits: a line that does not parse as a call is diagram text.
fn expression_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    call_line(input).map_err(|e| match e {
        ErrMode::Cut(e) => ErrMode::Backtrack(e),
        e => e,
    })
}

/// Any other `!` line, kept verbatim
fn unknown_statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let start = directive_start(input)?;
    let line: &'a str = **input;
    let name_start = input.current_token_start();
    let name: &str = take_while(0.., |c: char| is_name_char(c) || c == '$').parse_next(input)?;
    let rest = rest_of_line(input)?;
    line_end(input)?;

    let end = rest.span().end();
    // `line` starts right after the `!`
    let text = format!("!{}", &line[..end - name_start]);
    Ok(Statement::Unknown(UnknownStatement {
        directive: Spanned::new(
            name.to_string(),
            Span::new(name_start..name_start + name.len()),
        ),
        text,
        span: Span::new(start..end),
    }))
}

/// A pass-through line, including its leading whitespace
fn diagram_text<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    let line = rest_of_line(input)?;
    line_end(input)?;
    Ok(Statement::DiagramText(DiagramText {
        text: (*line.inner()).to_string(),
        span: line.span(),
    }))
}

/// Parse one statement, trying productions in priority order
fn statement<'a>(input: &mut Input<'a>) -> IResult<Statement> {
    alt((
        variable_declaration,
        define_long_statement,
        define_statement,
        include_statement,
        callable_declaration,
        if_statement,
        while_statement,
        return_statement,
        expression_statement,
        unknown_statement,
        diagram_text,
    ))
    .parse_next(input)
}

fn statements<'a>(input: &mut Input<'a>) -> IResult<Vec<Statement>> {
    let mut statements = Vec::new();
    while !input.is_empty() {
        statements.push(statement(input)?);
    }
    Ok(statements)
}

fn default_help(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::E001 => "close the string with a matching quote on the same line",
        ErrorCode::E100 => "check the directive syntax",
        ErrorCode::E101 => "the document ended in the middle of a directive",
        ErrorCode::E102 => "add the closing directive for this block",
        ErrorCode::E103 => "give the declaration a name, e.g. `!function $name()`",
        ErrorCode::E104 => "use `<module/path>`, a relative path or a URL",
    }
}

/// Utility function to convert winnow errors to our custom error format
///
/// The primary label points at the character where parsing stopped; the
/// secondary label covers the construct that was being parsed.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    source: &str,
    error_pos: usize,
) -> Diagnostic {
    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => {
            // Input is always complete, kept for exhaustiveness.
            return Diagnostic::error("incomplete input")
                .with_code(ErrorCode::E101)
                .with_label(Span::new(error_pos..error_pos), "incomplete")
                .with_help(default_help(ErrorCode::E101));
        }
    };

    let at_end = error_pos >= source.len();
    let code = context
        .context()
        .find_map(|ctx| match ctx {
            Context::Code(code) => Some(*code),
            _ => None,
        })
        .unwrap_or(ErrorCode::E100);
    // Running out of input is reported as incomplete rather than unexpected.
    let code = match code {
        ErrorCode::E100 if at_end => ErrorCode::E101,
        code => code,
    };
    let start = context.context().find_map(|ctx| match ctx {
        Context::StartOffset(offset) => Some(*offset),
        _ => None,
    });
    let help = context
        .context()
        .find_map(|ctx| match ctx {
            Context::Help(help) => Some(*help),
            _ => None,
        })
        .unwrap_or_else(|| default_help(code));
    let expected: Vec<String> = context
        .context()
        .filter_map(|ctx| match ctx {
            Context::Label(label) => Some(format!("expected {label}")),
            _ => None,
        })
        .collect();

    let message = if expected.is_empty() {
        code.description().to_string()
    } else {
        format!("{}: {}", code.description(), expected.join(" → "))
    };

    let width = source
        .get(error_pos..)
        .and_then(|rest| rest.chars().next())
        .filter(|c| *c != '\n' && *c != '\r')
        .map_or(0, char::len_utf8);

    let mut diagnostic = Diagnostic::error(message)
        .with_code(code)
        .with_label(Span::new(error_pos..error_pos + width), code.description());
    if let Some(start) = start.filter(|start| *start < error_pos) {
        diagnostic =
            diagnostic.with_secondary_label(Span::new(start..error_pos), "while parsing this");
    }
    diagnostic.with_help(help)
}

/// Build the syntax tree of a whole document.
pub fn build_root(source: &str) -> Result<Root, Diagnostic> {
    let mut input = LocatingSlice::new(source);

    match statements(&mut input) {
        Ok(statements) => Ok(Root {
            statements,
            span: Span::new(0..source.len()),
        }),
        Err(e) => {
            let error_pos = input.current_token_start();
            Err(convert_error(e, source, error_pos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expression(source: &str) -> Expression {
        let mut input = LocatingSlice::new(source);
        expression(&mut input).expect("expression should parse")
    }

    #[test]
    fn test_expression_folds_left_to_right() {
        let expr = parse_expression("$a + $b * 2");
        let Expression::Binary(outer) = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(*outer.operator.inner(), BinaryOperator::Multiply);
        let Expression::Binary(inner) = *outer.left else {
            panic!("expected nested binary expression on the left");
        };
        assert_eq!(*inner.operator.inner(), BinaryOperator::Add);
        assert_eq!(outer.span, Span::new(0..11));
    }

    #[test]
    fn test_expression_stops_before_trailing_blanks() {
        let mut input = LocatingSlice::new("$a  \n");
        let expr = expression(&mut input).unwrap();
        assert_eq!(expr.span(), Span::new(0..2));
        assert_eq!(input.current_token_start(), 2);
    }

    #[test]
    fn test_call_with_named_and_positional_arguments() {
        let Expression::Call(call) = parse_expression("$box(\"a\", $size = 3)") else {
            panic!("expected call");
        };
        assert!(!call.builtin);
        assert_eq!(call.callee.inner(), "$box");
        assert_eq!(call.arguments.len(), 2);
        assert!(call.arguments[0].name.is_none());
        assert_eq!(
            call.arguments[1].name.as_ref().map(|n| n.inner().as_str()),
            Some("$size")
        );
    }

    #[test]
    fn test_named_argument_does_not_swallow_comparison() {
        let Expression::Call(call) = parse_expression("%not($a == 1)") else {
            panic!("expected call");
        };
        assert!(call.builtin);
        assert_eq!(call.callee.inner(), "not");
        assert!(call.arguments[0].name.is_none());
        assert_eq!(call.arguments[0].value.kind(), NodeKind::BinaryExpression);
    }

    #[test]
    fn test_parenthesized_expression() {
        let expr = parse_expression("($a + 1) * 2");
        let Expression::Binary(outer) = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(outer.left.kind(), NodeKind::ParenthesizedExpression);
    }

    #[test]
    fn test_split_part() {
        let (target, part) = split_part("lib/common.puml!BOX", 10);
        assert_eq!(target.inner(), "lib/common.puml");
        assert_eq!(target.span(), Span::new(10..25));
        let part = part.unwrap();
        assert_eq!(part.inner(), "BOX");
        assert_eq!(part.span(), Span::new(26..29));

        let (target, part) = split_part("https://host/a!b/c.puml", 0);
        assert_eq!(target.inner(), "https://host/a!b/c.puml");
        assert!(part.is_none());
    }

    #[test]
    fn test_cut_error_records_code_and_start() {
        let err = build_root("!function").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E103));
        let primary = err.primary_label().unwrap();
        assert_eq!(primary.span(), Span::new(9..9));
    }
}
