mod backup;
mod config;
mod error;
mod export;
mod ipc;
mod marks;
mod model;
mod overview;
mod roster;
mod store;

use clap::Parser;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = config::Cli::parse();

    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = config::Config::from_cli(&cli)?;
    info!(
        workspace = %config.workspace.display(),
        data_dir = %config.data_dir.display(),
        roster = %config.roster_path.display(),
        "mentormarksd starting"
    );
    let mut state = ipc::AppState::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let _ = writeln!(
                    stdout,
                    "{}",
                    json!({ "ok": false, "error": { "code": "bad_json", "message": e.to_string() } })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let id = req.id.clone();
        let method = req.method.clone();
        let resp = match catch_unwind(AssertUnwindSafe(|| ipc::handle_request(&mut state, req))) {
            Ok(v) => v,
            Err(_) => {
                error!(%id, %method, "request handler panicked");
                ipc::err(&id, "internal", "internal error", None)
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
