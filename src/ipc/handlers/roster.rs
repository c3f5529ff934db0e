use crate::error::{AppError, AppResult};
use crate::ipc::error::{app_err, ok};
use crate::ipc::helpers::get_opt_str;
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

/// Re-imports the roster and overwrites the groups document. Marks are kept.
fn roster_import(state: &AppState, req: &Request) -> AppResult<Value> {
    let path = get_opt_str(&req.params, &["rosterPath"])
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.roster_path.clone());

    let groups = roster::load_groups_from_roster(&path);
    if groups.is_empty() {
        return Err(AppError::not_found("No groups found in roster spreadsheet"));
    }
    state.store.save_groups(&groups)?;
    info!(path = %path.display(), groups = groups.len(), "groups document replaced");

    Ok(json!({
        "success": true,
        "message": format!("Loaded {} groups from roster spreadsheet", groups.len()),
        "groups": groups,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "roster.import" => roster_import(state, req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => app_err(&req.id, &req.method, e),
    })
}
