//! # umlpp parser
//!
//! Parser for the `!`-directive preprocessor language embedded in PlantUML
//! style diagram sources. It turns a document into a typed syntax tree
//! ([`Root`]) in which every node carries its source [`Span`].
//!
//! Directives (`!$var = ...`, `!function`, `!include`, `!if`, ...) become
//! typed statements. Unrecognised `!` lines are kept as
//! [`UnknownStatement`]s and all other lines pass through as
//! [`DiagramText`], so only a malformed *known* directive makes a document
//! fail to parse.
//!
//! ## Usage
//!
//! ```
//! # use umlpp_parser::{parse, ParseError, Statement};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "\
//! !$color = \"blue\"
//! !function $double($x) !return $x + $x
//! Alice -> Bob : hello
//! ";
//!
//!     let root = parse(source)?;
//!     assert_eq!(root.statements().len(), 3);
//!     assert!(matches!(root.statements()[2], Statement::DiagramText(_)));
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
mod lexer;
mod line_index;
mod parser;
mod span;

pub use ast::{
    Argument, BinaryExpression, BinaryOperator, CallExpression, ConditionKind, DefineLongStatement,
    DefineStatement, DiagramText, ElseIfClause, Expression, ExpressionStatement,
    FunctionDeclaration, Identifier, IfStatement, IncludeDirective, IncludeKind, IncludeStatement,
    InlineFunctionDeclaration, NodeKind, NumberLiteral, Parameter, ParenthesizedExpression,
    ProcedureDeclaration, ReturnStatement, Root, Statement, StringLiteral, UnknownStatement,
    VariableDeclaration, VariableScope, WhileStatement, visit::Visitor,
};
pub use error::{Diagnostic, ErrorCode, ParseError};
pub use line_index::{LineIndex, Position};
pub use span::{Span, Spanned};

use log::{debug, trace};

/// Parse a document into its syntax tree.
///
/// There are no partial results: either the whole document parses, or a
/// [`ParseError`] describes where it stopped.
///
/// # Errors
///
/// Returns a [`ParseError`] when a known directive is malformed, a string
/// literal is left open, or a block reaches the end of input without its
/// closing directive.
pub fn parse(source: &str) -> Result<Root, ParseError> {
    debug!(bytes = source.len(); "Parsing document");

    let root = parser::build_root(source)?;

    debug!(statements = root.statements.len(); "Document parsed");
    trace!(root:? = root; "Syntax tree");
    Ok(root)
}
