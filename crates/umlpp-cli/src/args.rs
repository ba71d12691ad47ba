//! Command-line argument definitions for the umlpp CLI.
//!
//! [`Args`] carries the global options (configuration file, log level) and
//! the [`Command`] to run. Positions are 0-based, as editors send them.

use clap::{Parser, Subcommand};

/// Command-line arguments for the umlpp completion tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// A cursor position inside the queried file.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct Cursor {
    /// 0-based line of the cursor
    #[arg(long, default_value_t = 0)]
    pub line: u32,

    /// 0-based UTF-16 column of the cursor
    #[arg(long, default_value_t = 0)]
    pub character: u32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List completion suggestions at a position
    Suggest {
        /// Diagram source file
        file: String,

        #[command(flatten)]
        cursor: Cursor,

        /// Only suggest names starting with this prefix (defaults to the
        /// word before the cursor)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// List named-argument completions for a call
    Arguments {
        /// Diagram source file
        file: String,

        /// Name of the called function or procedure
        name: String,

        #[command(flatten)]
        cursor: Cursor,
    },

    /// Show where a callable is declared and its signature
    Callable {
        /// Diagram source file
        file: String,

        /// Name of the callable
        name: String,
    },

    /// List standard library modules whose path starts with a prefix
    Stdlib {
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Run the completion service on stdin/stdout, one JSON message per line
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suggest() {
        let args = Args::parse_from([
            "umlpp",
            "--log-level",
            "debug",
            "suggest",
            "diagram.puml",
            "--line",
            "3",
            "--character",
            "7",
        ]);
        assert_eq!(args.log_level, "debug");
        match args.command {
            Command::Suggest {
                file,
                cursor,
                prefix,
            } => {
                assert_eq!(file, "diagram.puml");
                assert_eq!((cursor.line, cursor.character), (3, 7));
                assert!(prefix.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::parse_from(["umlpp", "stdlib", "C4/", "--config", "umlpp.toml"]);
        assert_eq!(args.config.as_deref(), Some("umlpp.toml"));
        assert!(matches!(args.command, Command::Stdlib { ref prefix } if prefix == "C4/"));
    }

    #[test]
    fn test_arguments_defaults_cursor() {
        let args = Args::parse_from(["umlpp", "arguments", "a.puml", "$f"]);
        match args.command {
            Command::Arguments { name, cursor, .. } => {
                assert_eq!(name, "$f");
                assert_eq!(cursor.line, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
