use crate::error::{AppError, AppResult};
use crate::export::{self, ExportFormat, Selector};
use crate::ipc::error::{app_err, ok};
use crate::ipc::helpers::{get_opt_str, load_groups};
use crate::ipc::types::{AppState, Request};
use crate::marks;
use serde_json::{json, Value};
use std::path::PathBuf;

fn export_run(state: &AppState, req: &Request) -> AppResult<Value> {
    let format_raw = get_opt_str(&req.params, &["format"]).unwrap_or_else(|| "json".into());
    let format = ExportFormat::parse(&format_raw)
        .ok_or_else(|| AppError::validation(format!("unknown export format: {format_raw}")))?;
    let selector_raw =
        get_opt_str(&req.params, &["type", "selector"]).unwrap_or_else(|| "all".into());
    let selector = Selector::parse(&selector_raw)
        .ok_or_else(|| AppError::validation(format!("unknown export type: {selector_raw}")))?;

    let groups = load_groups(state)?;
    let all_marks = marks::load_all(&state.store)?;

    let filename = export::export_filename(selector, format, chrono::Utc::now().date_naive());
    let out_path = get_opt_str(&req.params, &["outPath"])
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.exports_dir().join(&filename));

    let outcome = export::write_export(selector, format, &groups, &all_marks, &out_path)?;
    let mut result = json!({
        "path": outcome.path.to_string_lossy(),
        "filename": filename,
        "format": format.as_str(),
        "selector": selector.as_str(),
        "groupRows": outcome.group_rows,
        "markRows": outcome.mark_rows,
    });
    if let Some(doc) = outcome.document {
        result["document"] = json!(doc);
    }
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "export.run" => export_run(state, req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => app_err(&req.id, &req.method, e),
    })
}
