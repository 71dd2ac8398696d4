//! Schedule upload tool.
//!
//! Decodes a roster spreadsheet and replaces every month it covers in the
//! store. Run with `--dry-run` to preview counts without writing.
//!
//! Usage: `import_schedule <roster.xlsx> [--dry-run] [--db <path>]`

use std::path::PathBuf;
use std::process::ExitCode;

use oncall_roster::db::RosterDb;
use oncall_roster::error::ApiError;
use oncall_roster::service::{import_schedule, Actor, ROLE_ADMIN};

struct Args {
    file: PathBuf,
    dry_run: bool,
    db_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut file = None;
    let mut dry_run = false;
    let mut db_path = None;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--db" => {
                let path = argv.next().ok_or("--db requires a path")?;
                db_path = Some(PathBuf::from(path));
            }
            other if !other.starts_with('-') => file = Some(PathBuf::from(other)),
            other => return Err(format!("unknown flag: {}", other)),
        }
    }

    Ok(Args {
        file: file.ok_or("usage: import_schedule <roster.xlsx> [--dry-run] [--db <path>]")?,
        dry_run,
        db_path,
    })
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(msg) => {
            log::error!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let payload = match std::fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("failed to read {}: {}", args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let db = match args.db_path {
        Some(path) => RosterDb::open_at(path),
        None => RosterDb::open(),
    };
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            log::error!("failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // CLI runs carry the operator's admin identity
    let actor = Actor {
        id: "cli".to_string(),
        role: ROLE_ADMIN.to_string(),
    };

    match import_schedule(&db, &actor, &payload, args.dry_run) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("failed to render report: {}", e),
            }
            if !report.row_errors.is_empty() {
                log::warn!("{} row errors — see report", report.row_errors.len());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("import failed: {}", err);
            let api = ApiError::from(&err);
            if let Ok(json) = serde_json::to_string_pretty(&api) {
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}
