//! Symbol extraction.
//!
//! A single pre-order walk of a [`Root`] collects what a document offers to
//! completion: its declarations, its callables, every identifier it
//! references and every include it names.

use std::fmt::Write as _;

use serde::Serialize;

use umlpp_parser::{
    Expression, Identifier, IncludeStatement, Parameter, Root, Span, Spanned, Statement,
    VariableScope, Visitor,
};

/// Which construct declared a [`Callable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallableKind {
    Function,
    Procedure,
    InlineFunction,
    Define,
    DefineLong,
}

impl CallableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Procedure => "procedure",
            CallableKind::InlineFunction => "inline_function",
            CallableKind::Define => "define",
            CallableKind::DefineLong => "define_long",
        }
    }
}

/// What a callable expands to.
#[derive(Debug, Clone, PartialEq)]
pub enum CallableBody {
    /// Block body of a function or procedure
    Statements(Vec<Statement>),
    /// Single `!return` expression of an inline function
    Expression(Expression),
    /// Raw replacement text of a define
    Text(Option<String>),
}

/// Anything invocable with arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    pub kind: CallableKind,
    pub name: Spanned<String>,
    pub parameters: Vec<Parameter>,
    pub body: CallableBody,
    pub span: Span,
}

impl Callable {
    pub fn name(&self) -> &str {
        self.name.inner()
    }

    /// Defines substitute text and do not take named arguments.
    pub fn is_define(&self) -> bool {
        matches!(self.kind, CallableKind::Define | CallableKind::DefineLong)
    }

    /// The callable's name followed by its parameter list, e.g.
    /// `$label($text, $prefix = "> ")`.
    pub fn signature(&self) -> String {
        let mut signature = format!("{}(", self.name());
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                signature.push_str(", ");
            }
            signature.push_str(parameter.name.inner());
            if let Some(default) = &parameter.default {
                let _ = write!(signature, " = {}", render_expression(default));
            }
        }
        signature.push(')');
        signature
    }
}

/// How a [`Declaration`] came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Variable(VariableScope),
    /// A define without a parameter list
    Define,
}

/// A variable or a zero-argument define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub span: Span,
}

impl Declaration {
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DeclarationKind::Variable(_))
    }

    pub fn is_global(&self) -> bool {
        matches!(self.kind, DeclarationKind::Variable(VariableScope::Global))
    }
}

/// The symbols of one document, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    declarations: Vec<Declaration>,
    callables: Vec<Callable>,
    identifiers: Vec<Identifier>,
    includes: Vec<IncludeStatement>,
}

impl SymbolTable {
    /// Walk `root` once and collect its symbols.
    pub fn extract(root: &Root) -> Self {
        let mut table = SymbolTable::default();
        table.walk_root(root);
        table
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn includes(&self) -> &[IncludeStatement] {
        &self.includes
    }

    /// The first local callable named exactly `name`.
    pub fn callable(&self, name: &str) -> Option<&Callable> {
        self.callables.iter().find(|callable| callable.name() == name)
    }

    fn push_define(
        &mut self,
        kind: CallableKind,
        name: &Spanned<String>,
        parameters: Option<&Vec<Parameter>>,
        text: Option<String>,
        span: Span,
    ) {
        match parameters {
            Some(parameters) => self.callables.push(Callable {
                kind,
                name: name.clone(),
                parameters: parameters.clone(),
                body: CallableBody::Text(text),
                span,
            }),
            None => self.declarations.push(Declaration {
                name: name.inner().clone(),
                kind: DeclarationKind::Define,
                span,
            }),
        }
    }
}

impl Visitor for SymbolTable {
    fn visit_statement(&mut self, statement: &Statement) -> bool {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                self.declarations.push(Declaration {
                    name: declaration.name.name.clone(),
                    kind: DeclarationKind::Variable(declaration.scope),
                    span: declaration.span,
                });
            }
            Statement::FunctionDeclaration(function) => self.callables.push(Callable {
                kind: CallableKind::Function,
                name: function.name.clone(),
                parameters: function.parameters.clone(),
                body: CallableBody::Statements(function.body.clone()),
                span: function.span,
            }),
            Statement::ProcedureDeclaration(procedure) => self.callables.push(Callable {
                kind: CallableKind::Procedure,
                name: procedure.name.clone(),
                parameters: procedure.parameters.clone(),
                body: CallableBody::Statements(procedure.body.clone()),
                span: procedure.span,
            }),
            Statement::InlineFunctionDeclaration(function) => self.callables.push(Callable {
                kind: CallableKind::InlineFunction,
                name: function.name.clone(),
                parameters: function.parameters.clone(),
                body: CallableBody::Expression(function.value.clone()),
                span: function.span,
            }),
            Statement::Define(define) => self.push_define(
                CallableKind::Define,
                &define.name,
                define.parameters.as_ref(),
                define.value.as_ref().map(|value| value.inner().clone()),
                define.span,
            ),
            Statement::DefineLong(define) => self.push_define(
                CallableKind::DefineLong,
                &define.name,
                define.parameters.as_ref(),
                Some(define.body.inner().clone()),
                define.span,
            ),
            Statement::Include(include) => self.includes.push(include.clone()),
            _ => {}
        }
        true
    }

    fn visit_expression(&mut self, expression: &Expression) -> bool {
        if let Expression::Identifier(identifier) = expression {
            self.identifiers.push(identifier.clone());
        }
        true
    }
}

/// A callable together with the key of the document that declares it.
///
/// `origin` is `None` for a callable declared in an unsaved buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableMatch {
    pub callable: Callable,
    pub origin: Option<String>,
}

impl CallableMatch {
    pub fn info(&self) -> CallableInfo {
        CallableInfo {
            kind: self.callable.kind,
            name: self.callable.name().to_string(),
            signature: self.callable.signature(),
            parameters: self
                .callable
                .parameters
                .iter()
                .map(|parameter| ParameterInfo {
                    name: parameter.name.inner().clone(),
                    default: parameter.default.as_ref().map(render_expression),
                })
                .collect(),
            origin: self.origin.clone(),
        }
    }
}

/// Serializable summary of a [`CallableMatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallableInfo {
    pub kind: CallableKind,
    pub name: String,
    pub signature: String,
    pub parameters: Vec<ParameterInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Render an expression back to preprocessor syntax.
pub fn render_expression(expression: &Expression) -> String {
    let mut out = String::new();
    write_expression(&mut out, expression);
    out
}

fn write_expression(out: &mut String, expression: &Expression) {
    match expression {
        Expression::Binary(binary) => {
            write_expression(out, &binary.left);
            let _ = write!(out, " {} ", binary.operator.inner());
            write_expression(out, &binary.right);
        }
        Expression::Parenthesized(inner) => {
            out.push('(');
            write_expression(out, &inner.expression);
            out.push(')');
        }
        Expression::Call(call) => {
            if call.builtin {
                out.push('%');
            }
            out.push_str(call.callee.inner());
            out.push('(');
            for (index, argument) in call.arguments.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                if let Some(name) = &argument.name {
                    let _ = write!(out, "{}=", name.inner());
                }
                write_expression(out, &argument.value);
            }
            out.push(')');
        }
        Expression::String(literal) => {
            let quote = if literal.value.contains('"') { '\'' } else { '"' };
            out.push(quote);
            out.push_str(&literal.value);
            out.push(quote);
        }
        Expression::Number(number) => {
            let _ = write!(out, "{}", number.value);
        }
        Expression::Identifier(identifier) => out.push_str(&identifier.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> SymbolTable {
        SymbolTable::extract(&umlpp_parser::parse(source).unwrap())
    }

    #[test]
    fn test_collects_declarations_and_identifiers() {
        let table = extract("!$a = 10\n!$b = $a + 5\nAlice -> Bob : $b\n");

        let names: Vec<&str> = table
            .declarations()
            .iter()
            .map(|declaration| declaration.name.as_str())
            .collect();
        assert_eq!(names, vec!["$a", "$b"]);
        assert_eq!(table.identifiers().len(), 1);
        assert_eq!(table.identifiers()[0].name, "$a");
    }

    #[test]
    fn test_defines_split_by_parameter_list() {
        let table = extract("!define PLAIN 1\n!define EMPTY() x\n!define PAIR(a, b) a-b\n");

        assert_eq!(table.declarations().len(), 1);
        assert_eq!(table.declarations()[0].kind, DeclarationKind::Define);

        let callables: Vec<(&str, usize)> = table
            .callables()
            .iter()
            .map(|callable| (callable.name(), callable.parameters.len()))
            .collect();
        assert_eq!(callables, vec![("EMPTY", 0), ("PAIR", 2)]);
        assert!(table.callables().iter().all(Callable::is_define));
    }

    #[test]
    fn test_collects_nested_declarations_and_includes() {
        let table = extract(
            "!include <std/lib>\n\
             !function $f($x, $y = 2)\n\
             !local $tmp = $x * $y\n\
             !return $tmp\n\
             !endfunction\n\
             !procedure $p()\n\
             !endprocedure\n",
        );

        assert_eq!(table.includes().len(), 1);
        assert_eq!(table.callables().len(), 2);
        assert_eq!(table.declarations()[0].name, "$tmp");
        assert!(!table.declarations()[0].is_global());

        let function = table.callable("$f").unwrap();
        assert_eq!(function.kind, CallableKind::Function);
        assert_eq!(function.signature(), "$f($x, $y = 2)");
        assert!(table.callable("$missing").is_none());
    }

    #[test]
    fn test_inline_function_signature_and_info() {
        let table = extract("!function $wrap($s, $open = \"[\") !return $open + $s\n");
        let callable = table.callable("$wrap").unwrap().clone();
        assert!(matches!(callable.body, CallableBody::Expression(_)));

        let info = CallableMatch {
            callable,
            origin: Some("file:///lib.puml".into()),
        }
        .info();
        assert_eq!(info.kind, CallableKind::InlineFunction);
        assert_eq!(info.signature, "$wrap($s, $open = \"[\")");
        assert_eq!(info.parameters[1].default.as_deref(), Some("\"[\""));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "inline_function");
        assert!(json["parameters"][0].get("default").is_none());
    }

    #[test]
    fn test_global_declaration() {
        let table = extract("!global $g = 1\n!$u = 2\n");
        let globals: Vec<bool> = table.declarations().iter().map(Declaration::is_global).collect();
        assert_eq!(globals, vec![true, false]);
    }
}
