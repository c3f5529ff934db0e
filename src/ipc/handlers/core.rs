use crate::error::AppError;
use crate::ipc::error::{app_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.config.workspace.to_string_lossy(),
            "dataDir": state.config.data_dir.to_string_lossy(),
            "rosterPath": state.config.roster_path.to_string_lossy(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let roster = req
        .params
        .get("rosterPath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);

    if let Err(e) = state.select_workspace(&path, roster.as_deref()) {
        return app_err(&req.id, &req.method, AppError::Internal(e));
    }
    info!(workspace = %path.display(), "workspace selected");
    ok(
        &req.id,
        json!({
            "workspacePath": state.config.workspace.to_string_lossy(),
            "dataDir": state.config.data_dir.to_string_lossy(),
            "rosterPath": state.config.roster_path.to_string_lossy(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
