use std::{fs, path::Path, sync::Arc};

use serde_json::Value;
use tempfile::{TempDir, tempdir};
use url::Url;

use umlpp::{CompletionEngine, EngineConfig, UmlppError};
use umlpp_cli::{Args, Command, Cursor, LocalSource, execute, run, serve};

const MAIN: &str = "\
@startuml
!include shared/lib.puml
!include <std/colors>
!$title = \"Overview\"
$box(\"api\")
Alice -> Bob : $ti
@enduml
";

const LIB: &str = "\
!global $accent = \"#ff0000\"
!$private = 1
!procedure $box($name, $color = $accent)
  rectangle $name $color
!endprocedure
";

const COLORS: &str = "\
!global $std_red = \"red\"
!function $shade($c) !return $c
";

/// A project directory with an include tree, a stdlib listing and a config
/// file pointing at it.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp directory");
        let root = dir.path();
        fs::create_dir_all(root.join("shared")).unwrap();
        fs::create_dir_all(root.join("std")).unwrap();
        fs::write(root.join("main.puml"), MAIN).unwrap();
        fs::write(root.join("shared/lib.puml"), LIB).unwrap();
        fs::write(root.join("std/colors.puml"), COLORS).unwrap();
        fs::write(root.join("broken.puml"), "!function\n").unwrap();

        let colors_url = Url::from_file_path(root.join("std/colors.puml").canonicalize().unwrap())
            .unwrap()
            .to_string();
        let index = serde_json::json!([{"path": "std/colors.puml", "url": colors_url}]);
        fs::write(root.join("index.json"), index.to_string()).unwrap();
        fs::write(
            root.join("config.toml"),
            format!(
                "[fetch]\ntimeout_ms = 5000\n\n[stdlib]\nindex = {:?}\n",
                root.join("index.json").to_string_lossy()
            ),
        )
        .unwrap();

        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }

    fn engine(&self) -> CompletionEngine {
        let source = LocalSource::new(Some(self.path("index.json")));
        CompletionEngine::new(Arc::new(source), EngineConfig::default())
    }

    fn args(&self, command: Command) -> Args {
        Args {
            config: Some(self.path("config.toml")),
            log_level: "off".to_string(),
            command,
        }
    }
}

async fn query(engine: &CompletionEngine, command: Command) -> Value {
    let mut out = Vec::new();
    execute(engine, &command, &mut out)
        .await
        .expect("command should succeed");
    serde_json::from_slice(&out).expect("output should be JSON")
}

fn texts(items: &Value) -> Vec<&str> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["insertText"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn e2e_suggestions_follow_includes() {
    let project = Project::new();
    let engine = project.engine();

    let all = query(
        &engine,
        Command::Suggest {
            file: project.path("main.puml"),
            cursor: Cursor::default(),
            prefix: None,
        },
    )
    .await;
    assert_eq!(
        texts(&all),
        vec!["$title", "$accent", "$box", "$std_red", "$shade"]
    );

    let typed = query(
        &engine,
        Command::Suggest {
            file: project.path("main.puml"),
            cursor: Cursor {
                line: 5,
                character: 18,
            },
            prefix: None,
        },
    )
    .await;
    assert_eq!(texts(&typed), vec!["$title", "$accent", "$box", "$std_red", "$shade"]);
    assert_eq!(typed[0]["range"]["start"]["character"], 15);
    assert_eq!(typed[0]["range"]["end"]["character"], 18);
}

#[tokio::test]
async fn e2e_arguments_and_callable() {
    let project = Project::new();
    let engine = project.engine();

    let arguments = query(
        &engine,
        Command::Arguments {
            file: project.path("main.puml"),
            name: "$box".into(),
            cursor: Cursor::default(),
        },
    )
    .await;
    assert_eq!(texts(&arguments), vec!["$name=", "$color="]);

    let callable = query(
        &engine,
        Command::Callable {
            file: project.path("main.puml"),
            name: "$box".into(),
        },
    )
    .await;
    assert_eq!(callable["kind"], "procedure");
    assert_eq!(callable["signature"], "$box($name, $color = $accent)");
    assert!(callable["origin"].as_str().unwrap().ends_with("shared/lib.puml"));

    let missing = query(
        &engine,
        Command::Callable {
            file: project.path("main.puml"),
            name: "$nope".into(),
        },
    )
    .await;
    assert!(missing.is_null());
}

#[tokio::test]
async fn e2e_stdlib_listing() {
    let project = Project::new();
    let listing = query(&project.engine(), Command::Stdlib { prefix: "std/".into() }).await;
    assert_eq!(listing[0]["path"], "std/colors.puml");
}

#[tokio::test]
async fn e2e_run_with_config_file() {
    let project = Project::new();

    let ok = run(&project.args(Command::Stdlib {
        prefix: String::new(),
    }))
    .await;
    assert!(ok.is_ok(), "run failed: {ok:?}");

    let err = run(&project.args(Command::Callable {
        file: project.path("broken.puml"),
        name: "$p".into(),
    }))
    .await
    .unwrap_err();
    assert!(matches!(err, UmlppError::Parse { .. }));

    let err = run(&project.args(Command::Suggest {
        file: project.path("absent.puml"),
        cursor: Cursor::default(),
        prefix: None,
    }))
    .await
    .unwrap_err();
    assert!(matches!(err, UmlppError::Io(_)));
}

#[tokio::test]
async fn e2e_serve_answers_every_line() {
    let project = Project::new();
    let engine = Arc::new(project.engine());
    let main = fs::read_to_string(Path::new(&project.path("main.puml"))).unwrap();

    let requests = [
        serde_json::json!({
            "id": 1,
            "operation": "suggestions",
            "params": {"content": "!$x = 1\n"}
        }),
        serde_json::json!({"id": 2, "operation": "stdlibCompletions", "params": {"prefix": "std"}}),
        serde_json::json!({
            "id": 3,
            "operation": "arguments",
            "params": {"content": main, "name": "$shade"}
        }),
        serde_json::json!({"id": 4, "operation": "explode"}),
    ];
    let mut input = String::new();
    for request in &requests {
        input.push_str(&request.to_string());
        input.push('\n');
    }
    input.push_str("not json\n");

    let mut output = Vec::new();
    serve(engine, input.as_bytes(), &mut output).await.unwrap();

    let mut responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    responses.sort_by_key(|response| response["id"].as_u64());
    assert_eq!(responses.len(), 5);

    assert_eq!(responses[0]["id"], 0);
    assert_eq!(responses[0]["error"]["code"], "invalid_params");
    assert_eq!(responses[1]["result"][0]["insertText"], "$x");
    assert_eq!(responses[2]["result"][0]["insertText"], "std/colors");
    assert_eq!(responses[3]["result"][0]["insertText"], "$c=");
    assert_eq!(responses[4]["error"]["code"], "unknown_operation");
}
