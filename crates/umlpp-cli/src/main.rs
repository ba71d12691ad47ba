//! umlpp CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use umlpp_cli::{Args, error_adapter::reports};

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    // Logs go to stderr so stdout stays machine readable.
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .target(env_logger::Target::Stderr)
        .init();

    info!(log_level:?; "Starting umlpp");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = umlpp_cli::run(&args).await {
        let reporter = miette::GraphicalReportHandler::new();

        for report in reports(&err) {
            let mut writer = String::new();
            if reporter.render_report(&mut writer, &report).is_err() {
                writer = report.to_string();
            }
            error!("{writer}");
        }

        process::exit(1);
    }

    debug!("Completed successfully");
}
