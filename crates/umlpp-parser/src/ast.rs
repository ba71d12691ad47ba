//! Syntax tree produced by the parser.
//!
//! The tree is a closed set of statement and expression shapes. Every node
//! carries a [`Span`] and reports a [`NodeKind`] discriminant, so consumers
//! can match exhaustively or dispatch on the kind name.

pub mod visit;

use std::fmt;

use crate::span::{Span, Spanned};

/// Discriminant naming every node shape of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    VariableDeclaration,
    FunctionDeclaration,
    ProcedureDeclaration,
    InlineFunctionDeclaration,
    DefineStatement,
    DefineLongStatement,
    IncludeStatement,
    IfStatement,
    WhileStatement,
    ReturnStatement,
    ExpressionStatement,
    UnknownStatement,
    DiagramText,
    BinaryExpression,
    ParenthesizedExpression,
    CallExpression,
    StringLiteral,
    NumberLiteral,
    Identifier,
}

impl NodeKind {
    /// Returns the node kind name (e.g., "VariableDeclaration").
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::ProcedureDeclaration => "ProcedureDeclaration",
            NodeKind::InlineFunctionDeclaration => "InlineFunctionDeclaration",
            NodeKind::DefineStatement => "DefineStatement",
            NodeKind::DefineLongStatement => "DefineLongStatement",
            NodeKind::IncludeStatement => "IncludeStatement",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::WhileStatement => "WhileStatement",
            NodeKind::ReturnStatement => "ReturnStatement",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::UnknownStatement => "UnknownStatement",
            NodeKind::DiagramText => "DiagramText",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::ParenthesizedExpression => "ParenthesizedExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::NumberLiteral => "NumberLiteral",
            NodeKind::Identifier => "Identifier",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The root of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Root {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Root
    }
}

/// A single line-level statement, or a block statement spanning several
/// lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(FunctionDeclaration),
    ProcedureDeclaration(ProcedureDeclaration),
    InlineFunctionDeclaration(InlineFunctionDeclaration),
    Define(DefineStatement),
    DefineLong(DefineLongStatement),
    Include(IncludeStatement),
    If(IfStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
    Unknown(UnknownStatement),
    DiagramText(DiagramText),
}

impl Statement {
    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::VariableDeclaration(_) => NodeKind::VariableDeclaration,
            Statement::FunctionDeclaration(_) => NodeKind::FunctionDeclaration,
            Statement::ProcedureDeclaration(_) => NodeKind::ProcedureDeclaration,
            Statement::InlineFunctionDeclaration(_) => NodeKind::InlineFunctionDeclaration,
            Statement::Define(_) => NodeKind::DefineStatement,
            Statement::DefineLong(_) => NodeKind::DefineLongStatement,
            Statement::Include(_) => NodeKind::IncludeStatement,
            Statement::If(_) => NodeKind::IfStatement,
            Statement::While(_) => NodeKind::WhileStatement,
            Statement::Return(_) => NodeKind::ReturnStatement,
            Statement::Expression(_) => NodeKind::ExpressionStatement,
            Statement::Unknown(_) => NodeKind::UnknownStatement,
            Statement::DiagramText(_) => NodeKind::DiagramText,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(node) => node.span,
            Statement::FunctionDeclaration(node) => node.span,
            Statement::ProcedureDeclaration(node) => node.span,
            Statement::InlineFunctionDeclaration(node) => node.span,
            Statement::Define(node) => node.span,
            Statement::DefineLong(node) => node.span,
            Statement::Include(node) => node.span,
            Statement::If(node) => node.span,
            Statement::While(node) => node.span,
            Statement::Return(node) => node.span,
            Statement::Expression(node) => node.span,
            Statement::Unknown(node) => node.span,
            Statement::DiagramText(node) => node.span,
        }
    }
}

/// Visibility modifier of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableScope {
    Local,
    Global,
    #[default]
    Unspecified,
}

/// `!$name = value`, `!global $name = value`, `!local $name ?= value`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: Identifier,
    pub initializer: Expression,
    pub scope: VariableScope,
    /// `?=` assigns only when the variable is not yet defined.
    pub conditional: bool,
    pub span: Span,
}

/// A formal parameter with an optional default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Spanned<String>,
    pub default: Option<Expression>,
    pub span: Span,
}

/// `!function $name(params)` ... `!endfunction`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Spanned<String>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub unquoted: bool,
    pub span: Span,
}

/// `!procedure $name(params)` ... `!endprocedure`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDeclaration {
    pub name: Spanned<String>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub unquoted: bool,
    pub span: Span,
}

/// `!function $name(params) !return value` on a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFunctionDeclaration {
    pub name: Spanned<String>,
    pub parameters: Vec<Parameter>,
    pub value: Expression,
    pub unquoted: bool,
    pub span: Span,
}

/// `!define NAME value` or `!define NAME(params) value`.
///
/// `parameters` is `Some` whenever a parenthesized list is present, even if
/// it is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineStatement {
    pub name: Spanned<String>,
    pub parameters: Option<Vec<Parameter>>,
    pub value: Option<Spanned<String>>,
    pub span: Span,
}

/// `!definelong NAME(params)` followed by raw lines up to `!enddefinelong`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineLongStatement {
    pub name: Spanned<String>,
    pub parameters: Option<Vec<Parameter>>,
    pub body: Spanned<String>,
    pub span: Span,
}

/// The directive spelling used by an include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeDirective {
    Include,
    IncludeMany,
    IncludeOnce,
    IncludeUrl,
    IncludeSub,
}

impl IncludeDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeDirective::Include => "include",
            IncludeDirective::IncludeMany => "include_many",
            IncludeDirective::IncludeOnce => "include_once",
            IncludeDirective::IncludeUrl => "includeurl",
            IncludeDirective::IncludeSub => "includesub",
        }
    }
}

/// How an include target is spelled, which decides how it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `<module/path>`, looked up in the standard library index.
    Standard,
    /// A path relative to the including document.
    Path,
    /// An absolute URL.
    Url,
}

/// `!include <std/module>`, `!include path/file.puml!PART`, `!includeurl https://...`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeStatement {
    pub directive: IncludeDirective,
    /// The target without angle brackets and without the part tag.
    pub target: Spanned<String>,
    pub kind: IncludeKind,
    /// The `!PART` sub-part tag, without the `!`.
    pub part: Option<Spanned<String>>,
    pub span: Span,
}

/// Which directive opened an if statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// `!if expr`
    If,
    /// `!ifdef NAME`
    IfDef,
    /// `!ifndef NAME`
    IfNotDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfClause {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// `!if` / `!ifdef` / `!ifndef` with optional `!elseif` and `!else` branches.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub kind: ConditionKind,
    pub condition: Expression,
    pub consequent: Vec<Statement>,
    pub else_ifs: Vec<ElseIfClause>,
    pub alternate: Option<Vec<Statement>>,
    pub span: Span,
}

/// `!while expr` ... `!endwhile`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// `!return expr`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Expression,
    pub span: Span,
}

/// A line holding a single call, e.g. `$component("api")`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

/// A `!`-line that matches no known directive. Kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownStatement {
    /// The word following `!`, possibly empty.
    pub directive: Spanned<String>,
    pub text: String,
    pub span: Span,
}

/// A pass-through line of diagram source. `span` covers exactly `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramText {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryExpression),
    Parenthesized(ParenthesizedExpression),
    Call(CallExpression),
    String(StringLiteral),
    Number(NumberLiteral),
    Identifier(Identifier),
}

impl Expression {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Binary(_) => NodeKind::BinaryExpression,
            Expression::Parenthesized(_) => NodeKind::ParenthesizedExpression,
            Expression::Call(_) => NodeKind::CallExpression,
            Expression::String(_) => NodeKind::StringLiteral,
            Expression::Number(_) => NodeKind::NumberLiteral,
            Expression::Identifier(_) => NodeKind::Identifier,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Binary(node) => node.span,
            Expression::Parenthesized(node) => node.span,
            Expression::Call(node) => node.span,
            Expression::String(node) => node.span,
            Expression::Number(node) => node.span,
            Expression::Identifier(node) => node.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    And,
    Or,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Less => "<",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `left op right`. Chains fold left to right without precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: Spanned<BinaryOperator>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub span: Span,
}

/// A call argument, positional (`1`) or named (`$a=1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Spanned<String>>,
    pub value: Expression,
    pub span: Span,
}

/// `$name(args)` or the built-in form `%name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// `true` for `%`-prefixed built-in calls.
    pub builtin: bool,
    /// The callee name as written, without the `%` sigil.
    pub callee: Spanned<String>,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub span: Span,
}

/// A variable (`$name`) or bare macro/built-in name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    /// Returns `true` when the name carries the `$` variable sigil.
    pub fn is_variable(&self) -> bool {
        self.name.starts_with('$')
    }
}
