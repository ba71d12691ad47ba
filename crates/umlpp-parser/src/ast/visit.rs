//! Pre-order traversal of the syntax tree.
//!
//! Implement [`Visitor`] and override only the hooks you need. Every hook is
//! called before the node's children; return `false` to skip them.
//!
//! ```
//! use umlpp_parser::{Expression, Statement, Visitor, parse};
//!
//! #[derive(Default)]
//! struct CallCounter(usize);
//!
//! impl Visitor for CallCounter {
//!     fn visit_expression(&mut self, expression: &Expression) -> bool {
//!         if matches!(expression, Expression::Call(_)) {
//!             self.0 += 1;
//!         }
//!         true
//!     }
//! }
//!
//! let root = parse("$a($b(1))\n").unwrap();
//! let mut counter = CallCounter::default();
//! counter.walk_root(&root);
//! assert_eq!(counter.0, 2);
//! ```

use super::*;

pub trait Visitor {
    /// Visit a statement before its children.
    fn visit_statement(&mut self, _statement: &Statement) -> bool {
        true
    }

    /// Visit a parameter before its default value.
    fn visit_parameter(&mut self, _parameter: &Parameter) -> bool {
        true
    }

    /// Visit an expression before its children.
    fn visit_expression(&mut self, _expression: &Expression) -> bool {
        true
    }

    fn walk_root(&mut self, root: &Root) {
        self.walk_statements(&root.statements);
    }

    fn walk_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.walk_statement(statement);
        }
    }

    /// Walk a statement and its children in source order.
    fn walk_statement(&mut self, statement: &Statement) {
        if !self.visit_statement(statement) {
            return;
        }

        match statement {
            Statement::VariableDeclaration(decl) => self.walk_expression(&decl.initializer),
            Statement::FunctionDeclaration(decl) => {
                self.walk_parameters(&decl.parameters);
                self.walk_statements(&decl.body);
            }
            Statement::ProcedureDeclaration(decl) => {
                self.walk_parameters(&decl.parameters);
                self.walk_statements(&decl.body);
            }
            Statement::InlineFunctionDeclaration(decl) => {
                self.walk_parameters(&decl.parameters);
                self.walk_expression(&decl.value);
            }
            Statement::Define(define) => {
                if let Some(parameters) = &define.parameters {
                    self.walk_parameters(parameters);
                }
            }
            Statement::DefineLong(define) => {
                if let Some(parameters) = &define.parameters {
                    self.walk_parameters(parameters);
                }
            }
            Statement::If(stmt) => {
                self.walk_expression(&stmt.condition);
                self.walk_statements(&stmt.consequent);
                for clause in &stmt.else_ifs {
                    self.walk_expression(&clause.condition);
                    self.walk_statements(&clause.body);
                }
                if let Some(alternate) = &stmt.alternate {
                    self.walk_statements(alternate);
                }
            }
            Statement::While(stmt) => {
                self.walk_expression(&stmt.condition);
                self.walk_statements(&stmt.body);
            }
            Statement::Return(stmt) => self.walk_expression(&stmt.value),
            Statement::Expression(stmt) => self.walk_expression(&stmt.expression),
            Statement::Include(_) | Statement::Unknown(_) | Statement::DiagramText(_) => {}
        }
    }

    fn walk_parameters(&mut self, parameters: &[Parameter]) {
        for parameter in parameters {
            if !self.visit_parameter(parameter) {
                continue;
            }
            if let Some(default) = &parameter.default {
                self.walk_expression(default);
            }
        }
    }

    /// Walk an expression and its children in source order.
    fn walk_expression(&mut self, expression: &Expression) {
        if !self.visit_expression(expression) {
            return;
        }

        match expression {
            Expression::Binary(binary) => {
                self.walk_expression(&binary.left);
                self.walk_expression(&binary.right);
            }
            Expression::Parenthesized(inner) => self.walk_expression(&inner.expression),
            Expression::Call(call) => {
                for argument in &call.arguments {
                    self.walk_expression(&argument.value);
                }
            }
            Expression::String(_) | Expression::Number(_) | Expression::Identifier(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[derive(Default)]
    struct KindRecorder(Vec<NodeKind>);

    impl Visitor for KindRecorder {
        fn visit_statement(&mut self, statement: &Statement) -> bool {
            self.0.push(statement.kind());
            true
        }

        fn visit_expression(&mut self, expression: &Expression) -> bool {
            self.0.push(expression.kind());
            true
        }
    }

    #[test]
    fn test_walk_is_pre_order() {
        let root = parse("!if $a\n!$b = 1 + $c\n!endif\n").unwrap();
        let mut recorder = KindRecorder::default();
        recorder.walk_root(&root);
        assert_eq!(
            recorder.0,
            vec![
                NodeKind::IfStatement,
                NodeKind::Identifier,
                NodeKind::VariableDeclaration,
                NodeKind::BinaryExpression,
                NodeKind::NumberLiteral,
                NodeKind::Identifier,
            ]
        );
    }

    struct SkipFunctions(usize);

    impl Visitor for SkipFunctions {
        fn visit_statement(&mut self, statement: &Statement) -> bool {
            self.0 += 1;
            !matches!(statement, Statement::FunctionDeclaration(_))
        }
    }

    #[test]
    fn test_returning_false_skips_children() {
        let root = parse("!function $f()\n!return 1\n!endfunction\ntext\n").unwrap();
        let mut visitor = SkipFunctions(0);
        visitor.walk_root(&root);
        assert_eq!(visitor.0, 2);
    }
}
