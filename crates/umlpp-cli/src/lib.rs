//! CLI logic for the umlpp completion tool.
//!
//! One-shot commands read a diagram file, run a single engine query and
//! print the result as pretty JSON. `serve` runs the completion service over
//! a line-delimited JSON stream.

pub mod error_adapter;

mod args;
mod config;
mod source;

pub use args::{Args, Command, Cursor};
pub use source::LocalSource;

use std::{
    io::{self, Write},
    path::Path,
    sync::Arc,
};

use log::{info, warn};
use serde::Serialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use url::Url;

use umlpp::{
    CompletionEngine, DocumentRef, Position, Range, SuggestionFilter, UmlppError,
    error::ServiceError,
    protocol::{Request, Response},
    service::CompletionService,
};
use umlpp_parser::{LineIndex, Position as SourcePosition};

/// Run the umlpp CLI application, printing results to stdout.
///
/// # Errors
///
/// Returns `UmlppError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parse errors in the queried file
/// - An unreachable standard library index
pub async fn run(args: &Args) -> Result<(), UmlppError> {
    let config = config::load_config(args.config.as_ref())?;
    let source = LocalSource::new(config.stdlib_index().map(str::to_string));
    let engine = Arc::new(CompletionEngine::new(Arc::new(source), config.engine()));

    match &args.command {
        Command::Serve => {
            info!("Serving completion requests on stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve(engine, stdin, tokio::io::stdout()).await
        }
        command => {
            let mut buffer = Vec::new();
            execute(&engine, command, &mut buffer).await?;
            io::stdout().write_all(&buffer)?;
            Ok(())
        }
    }
}

/// Run a one-shot `command` and write its JSON result to `out`.
///
/// # Errors
///
/// See [`run`]. `serve` is rejected here; use [`serve`].
pub async fn execute(
    engine: &CompletionEngine,
    command: &Command,
    out: &mut impl Write,
) -> Result<(), UmlppError> {
    match command {
        Command::Suggest {
            file,
            cursor,
            prefix,
        } => {
            let document = OpenFile::read(file)?;
            let (range, word) = document.word_range(*cursor);
            let prefix = prefix.clone().or_else(|| (!word.is_empty()).then_some(word));
            let filter = SuggestionFilter {
                prefix,
                ..SuggestionFilter::default()
            };
            let items = engine
                .suggestions_at(document.document(), range, Some(&filter))
                .await?;
            print_json(out, &items)
        }
        Command::Arguments { file, name, cursor } => {
            let document = OpenFile::read(file)?;
            let (range, _) = document.word_range(*cursor);
            let items = engine.arguments_for(document.document(), name, range).await?;
            print_json(out, &items)
        }
        Command::Callable { file, name } => {
            let document = OpenFile::read(file)?;
            let found = engine.callable_named(document.document(), name).await?;
            print_json(out, &found.map(|found| found.info()))
        }
        Command::Stdlib { prefix } => {
            let entries = engine.stdlib_paths_matching(prefix).await?;
            print_json(out, &entries)
        }
        Command::Serve => Err(UmlppError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "serve is not a one-shot command",
        ))),
    }
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), UmlppError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// A diagram file read from disk, keyed by its `file://` URL.
struct OpenFile {
    key: String,
    text: String,
}

impl OpenFile {
    fn read(path: &str) -> Result<Self, UmlppError> {
        let text = std::fs::read_to_string(path)?;
        let absolute = Path::new(path).canonicalize()?;
        let key = Url::from_file_path(&absolute)
            .map_err(|()| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot build a file URL for {}", absolute.display()),
                )
            })?
            .to_string();
        Ok(Self { key, text })
    }

    fn document(&self) -> DocumentRef<'_> {
        DocumentRef::updated(&self.key, &self.text)
    }

    /// The range of the partial word ending at `cursor`, and that word.
    fn word_range(&self, cursor: args::Cursor) -> (Range, String) {
        let index = LineIndex::new(&self.text);
        let position = SourcePosition::new(cursor.line, cursor.character);
        let Some(end) = index.offset(position) else {
            let position = Position::new(cursor.line, cursor.character);
            return (Range::point(position), String::new());
        };

        let before = &self.text[..end];
        let start = before
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphanumeric() || matches!(c, '_' | '$' | '%'))
            .last()
            .map_or(end, |(offset, _)| offset);

        let range = Range::new(index.position(start).into(), index.position(end).into());
        (range, before[start..].to_string())
    }
}

/// Run the completion service over a line-delimited JSON stream.
///
/// Each input line is a request; each response is written as one line, in
/// completion order. Lines that are not valid requests are answered with an
/// `invalid_params` error carrying id `0`. Returns when `input` ends and all
/// answers are written.
///
/// # Errors
///
/// Returns an I/O error when reading or writing the stream fails.
pub async fn serve<R, W>(
    engine: Arc<CompletionEngine>,
    input: R,
    mut output: W,
) -> Result<(), UmlppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let service = CompletionService::new(engine);
    let (responses, mut answers) = mpsc::channel::<Response>(64);

    let read = async move {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Request>(&line) {
                Ok(request) => {
                    let service = service.clone();
                    let responses = responses.clone();
                    tokio::spawn(async move {
                        let response = service.handle(request).await;
                        let _ = responses.send(response).await;
                    });
                }
                Err(err) => {
                    warn!(err:% = err; "Malformed request");
                    let _ = responses
                        .send(Response::failure(0, ServiceError::invalid_params(err)))
                        .await;
                }
            }
        }
        Ok::<_, io::Error>(())
    };

    let write = async {
        while let Some(response) = answers.recv().await {
            let mut line = serde_json::to_vec(&response).map_err(io::Error::from)?;
            line.push(b'\n');
            output.write_all(&line).await?;
            output.flush().await?;
        }
        Ok::<_, io::Error>(())
    };

    let (read, write) = tokio::join!(read, write);
    read?;
    write?;
    Ok(())
}
