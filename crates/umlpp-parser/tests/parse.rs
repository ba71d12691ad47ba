use umlpp_parser::{
    ErrorCode, Expression, IncludeKind, LineIndex, NodeKind, Position, Statement, Visitor, parse,
};

const DOCUMENT: &str = r#"@startuml
!include <C4/C4_Container>
!include ../shared/styles.puml

!global $theme = "dark"
!$count ?= 0

!function $label($text, $prefix = "> ")
  !$out = $prefix + $text
  !return $out
!endfunction

!procedure $service($name)
  rectangle $name
!endprocedure

!ifdef DEBUG
  !$count = $count + 1
!endif

$service("api")
Alice -> Bob : $label("hello")
@enduml
"#;

#[derive(Default)]
struct Census {
    statements: Vec<NodeKind>,
    identifiers: Vec<String>,
}

impl Visitor for Census {
    fn visit_statement(&mut self, statement: &Statement) -> bool {
        self.statements.push(statement.kind());
        true
    }

    fn visit_expression(&mut self, expression: &Expression) -> bool {
        if let Expression::Identifier(identifier) = expression {
            self.identifiers.push(identifier.name.clone());
        }
        true
    }
}

#[test]
fn parses_a_realistic_document() {
    let root = parse(DOCUMENT).expect("document should parse");

    let kinds: Vec<NodeKind> = root.statements().iter().map(Statement::kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::DiagramText,
            NodeKind::IncludeStatement,
            NodeKind::IncludeStatement,
            NodeKind::DiagramText,
            NodeKind::VariableDeclaration,
            NodeKind::VariableDeclaration,
            NodeKind::DiagramText,
            NodeKind::FunctionDeclaration,
            NodeKind::DiagramText,
            NodeKind::ProcedureDeclaration,
            NodeKind::DiagramText,
            NodeKind::IfStatement,
            NodeKind::DiagramText,
            NodeKind::ExpressionStatement,
            NodeKind::DiagramText,
            NodeKind::DiagramText,
        ]
    );

    let Statement::Include(relative) = &root.statements()[2] else {
        panic!("expected include");
    };
    assert_eq!(relative.kind, IncludeKind::Path);
    assert_eq!(relative.target.inner(), "../shared/styles.puml");
}

#[test]
fn visitor_sees_nested_identifiers() {
    let root = parse(DOCUMENT).unwrap();
    let mut census = Census::default();
    census.walk_root(&root);

    assert!(census.statements.contains(&NodeKind::ReturnStatement));
    assert_eq!(
        census.identifiers,
        vec!["$prefix", "$text", "$out", "DEBUG", "$count"]
    );
}

#[test]
fn spans_map_to_editor_positions() {
    let root = parse(DOCUMENT).unwrap();
    let index = LineIndex::new(DOCUMENT);

    let Statement::VariableDeclaration(theme) = &root.statements()[4] else {
        panic!("expected declaration");
    };
    let (start, end) = index.span_positions(theme.name.span);
    assert_eq!(start, Position::new(4, 8));
    assert_eq!(end, Position::new(4, 14));
    assert_eq!(index.offset(start), Some(theme.name.span.start()));
}

#[test]
fn reports_error_position_and_code() {
    let source = "!$a = 1\n!function\n";
    let err = parse(source).unwrap_err();

    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E103));
    assert_eq!(err.position(), 17);
    assert!(diagnostic.help().is_some());
    assert!(err.to_string().contains("E103"));
}
