//! Export runner
//!
//! Thin wrapper around `plexport-core`: environment-variable
//! configuration, run-lock bracketing, termination-signal handling and
//! exit-code mapping. Invocation takes at most one positional argument,
//! a library name; with none, every library is exported.
//!
//! Environment:
//! - `PLEX_URL` - server base URL (default `http://localhost:32400`)
//! - `PLEX_TOKEN` - authentication token (required)
//! - `PLEXPORT_OUTPUT_DIR` - output directory (default `exports`)
//! - `PLEXPORT_FORCE` - set to `1`/`true` to overwrite existing files

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use plexport_core::{
    output_file_name, ClientConfig, ExportOptions, Exporter, PlexClient, RunLock,
};

const DEFAULT_PLEX_URL: &str = "http://localhost:32400";
const DEFAULT_OUTPUT_DIR: &str = "exports";

// Exit codes, stable for cron-style wrappers
const EXIT_EXPORT_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_MISSING_TOKEN: u8 = 3;
const EXIT_LOCK_CONTENTION: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() > 1 {
        error!("usage: plexport [LIBRARY_NAME]");
        return ExitCode::from(EXIT_USAGE);
    }
    let library_name = args.into_iter().next();

    let token = match std::env::var("PLEX_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => {
            error!("PLEX_TOKEN is required");
            return ExitCode::from(EXIT_MISSING_TOKEN);
        }
    };
    let base_url =
        std::env::var("PLEX_URL").unwrap_or_else(|_| DEFAULT_PLEX_URL.to_string());
    let output_dir = PathBuf::from(
        std::env::var("PLEXPORT_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
    );
    let force = std::env::var("PLEXPORT_FORCE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // The lock brackets all network and file activity; the guard releases
    // on every exit path out of this function.
    let lock = RunLock::standard();
    let _guard = match lock.acquire() {
        Ok(guard) => guard,
        Err(err) if err.is_lock_contention() => {
            error!("{}", err);
            return ExitCode::from(EXIT_LOCK_CONTENTION);
        }
        Err(err) => {
            error!("failed to acquire run lock: {}", err);
            return ExitCode::from(EXIT_EXPORT_FAILED);
        }
    };

    let client = match PlexClient::new(ClientConfig::new(base_url, token)) {
        Ok(client) => client,
        Err(err) => {
            error!("failed to create client: {}", err);
            return ExitCode::from(EXIT_EXPORT_FAILED);
        }
    };
    let exporter = Exporter::new(client);

    tokio::select! {
        code = run(&exporter, library_name, output_dir, force) => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, releasing lock");
            ExitCode::from(EXIT_EXPORT_FAILED)
        }
    }
}

async fn run(
    exporter: &Exporter,
    library_name: Option<String>,
    output_dir: PathBuf,
    force: bool,
) -> ExitCode {
    match library_name {
        Some(name) => export_one(exporter, &name, output_dir, force).await,
        None => export_all(exporter, output_dir, force).await,
    }
}

async fn export_one(
    exporter: &Exporter,
    name: &str,
    output_dir: PathBuf,
    force: bool,
) -> ExitCode {
    let libraries = match exporter.libraries().await {
        Ok(libraries) => libraries,
        Err(err) => {
            error!("failed to list libraries: {}", err);
            return ExitCode::from(EXIT_EXPORT_FAILED);
        }
    };

    let Some(library) = libraries.iter().find(|lib| lib.title == name) else {
        error!("library '{}' not found", name);
        return ExitCode::from(EXIT_EXPORT_FAILED);
    };

    let options = ExportOptions {
        output: output_dir.join(output_file_name(&library.title)),
        force,
    };
    match exporter.export_library(library, &options).await {
        Ok(outcome) => {
            info!(rows = outcome.rows_written, "export finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("export failed: {}", err);
            ExitCode::from(EXIT_EXPORT_FAILED)
        }
    }
}

async fn export_all(exporter: &Exporter, output_dir: PathBuf, force: bool) -> ExitCode {
    match exporter.export_all(&output_dir, force).await {
        Ok(summary) if summary.any_succeeded() => {
            info!(
                succeeded = summary.succeeded,
                rows = summary.rows_written,
                "run finished"
            );
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            error!(
                failed = summary.failed,
                skipped = summary.skipped,
                "no libraries were successfully exported"
            );
            ExitCode::from(EXIT_EXPORT_FAILED)
        }
        Err(err) => {
            error!("run failed: {}", err);
            ExitCode::from(EXIT_EXPORT_FAILED)
        }
    }
}
