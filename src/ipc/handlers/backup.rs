use crate::backup;
use crate::error::AppResult;
use crate::ipc::error::{app_err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

fn export_bundle(state: &AppState, req: &Request) -> AppResult<Value> {
    let out_path = PathBuf::from(get_required_str(&req.params, "outPath")?);
    let summary = backup::export_bundle(&state.store, &out_path)?;
    info!(path = %out_path.display(), "backup bundle written");
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "path": out_path.to_string_lossy(),
    }))
}

fn import_bundle(state: &AppState, req: &Request) -> AppResult<Value> {
    let in_path = PathBuf::from(get_required_str(&req.params, "inPath")?);
    let summary = backup::import_bundle(&state.store, &in_path)?;
    info!(path = %in_path.display(), groups = summary.groups, marks = summary.marks, "backup bundle restored");
    Ok(json!({
        "bundleFormatDetected": summary.bundle_format_detected,
        "groups": summary.groups,
        "marks": summary.marks,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "backup.exportBundle" => export_bundle(state, req),
        "backup.importBundle" => import_bundle(state, req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => app_err(&req.id, &req.method, e),
    })
}
