//! Post-import repair tool.
//!
//! Default mode resolves raw occupant names in persisted schedule days to
//! directory user ids. `--mode dateShift` instead shifts a month's days by
//! a fixed offset. Dry-run unless `--live` is given — a crashed live
//! date-shift can leave a day present under both keys and needs manual
//! inspection, so previewing first is the expected workflow.
//!
//! Usage: `reconcile_roster [--mode resolveNames|dateShift]
//!                          [--month YYYY-MM] [--delta N]
//!                          [--live] [--db <path>]`

use std::path::PathBuf;
use std::process::ExitCode;

use oncall_roster::db::RosterDb;
use oncall_roster::error::ApiError;
use oncall_roster::service::{run_backfill, Actor, BackfillRequest, ROLE_ADMIN};

struct Args {
    mode: Option<String>,
    month: Option<String>,
    delta: Option<String>,
    live: bool,
    db_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        mode: None,
        month: None,
        delta: None,
        live: false,
        db_path: None,
    };

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--mode" => args.mode = Some(argv.next().ok_or("--mode requires a value")?),
            "--month" => args.month = Some(argv.next().ok_or("--month requires YYYY-MM")?),
            "--delta" => args.delta = Some(argv.next().ok_or("--delta requires an integer")?),
            "--live" => args.live = true,
            "--db" => args.db_path = Some(PathBuf::from(
                argv.next().ok_or("--db requires a path")?,
            )),
            other => return Err(format!("unknown flag: {}", other)),
        }
    }
    Ok(args)
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

    let actor = Actor {
        id: "cli".to_string(),
        role: ROLE_ADMIN.to_string(),
    };

    let request = match BackfillRequest::from_query(
        args.mode.as_deref(),
        args.month.as_deref(),
        args.delta.as_deref(),
        !args.live,
    ) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if request.dry_run {
        log::info!("dry-run (pass --live to apply)");
    }

    match run_backfill(&db, &actor, &request) {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("failed to render report: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("backfill failed: {}", err);
            let api = ApiError::from(&err);
            if let Ok(json) = serde_json::to_string_pretty(&api) {
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}
