use crate::error::{AppError, AppResult};
use crate::ipc::error::{app_err, ok};
use crate::ipc::helpers::{get_opt_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::marks::{self, MarkEntry, MarkInput};
use serde_json::{json, Value};

const MISSING_FIELDS: &str = "Missing required fields";

/// Integer mark from the first present key. Non-integral numbers are rejected
/// rather than rounded.
fn mark_param(params: &Value, keys: &[&str]) -> AppResult<Option<i64>> {
    let Some(v) = keys.iter().find_map(|k| params.get(*k).filter(|v| !v.is_null())) else {
        return Ok(None);
    };
    if let Some(i) = v.as_i64() {
        return Ok(Some(i));
    }
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(Some(f as i64)),
        _ => Err(AppError::validation("Marks must be an integer")),
    }
}

fn marks_list(state: &AppState, req: &Request) -> AppResult<Value> {
    match get_opt_str(&req.params, &["teacherName"]) {
        Some(teacher) => {
            let mine = marks::for_teacher(&state.store, &teacher)?;
            let mut narrowed = serde_json::Map::new();
            narrowed.insert(teacher, json!(mine));
            Ok(json!({ "marks": narrowed }))
        }
        None => Ok(json!({ "marks": marks::load_all(&state.store)? })),
    }
}

fn marks_record(state: &AppState, req: &Request) -> AppResult<Value> {
    let p = &req.params;
    let teacher = get_opt_str(p, &["teacherName"]);
    let gid = get_opt_str(p, &["gid"]);
    let student = get_opt_str(p, &["enrollmentNumber", "studentIdentifier"]);
    let mark = mark_param(p, &["marks", "mark"])?;
    let (Some(teacher), Some(gid), Some(student), Some(mark)) = (teacher, gid, student, mark) else {
        return Err(AppError::validation(MISSING_FIELDS));
    };

    marks::update(&state.store, &teacher, &gid, &student, mark)?;
    Ok(json!({ "success": true, "message": "Marks saved successfully" }))
}

fn entry_from_value(v: &Value) -> MarkEntry {
    MarkEntry {
        gid: get_opt_str(v, &["gid"]).unwrap_or_default(),
        student_identifier: get_opt_str(v, &["studentIdentifier", "enrollmentNumber"])
            .unwrap_or_default(),
        mark: match mark_param(v, &["mark", "marks"]) {
            Ok(Some(m)) => MarkInput::Value(m),
            Ok(None) => MarkInput::Missing,
            Err(e) => MarkInput::Invalid(e.to_string()),
        },
    }
}

fn marks_record_many(state: &AppState, req: &Request) -> AppResult<Value> {
    let teacher = get_required_str(&req.params, "teacherName")?;
    let entries: Vec<MarkEntry> = req
        .params
        .get("entries")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::validation("missing entries"))?
        .iter()
        .map(entry_from_value)
        .collect();

    let summary = marks::update_many(&state.store, &teacher, &entries)?;
    Ok(json!(summary))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "marks.list" => marks_list(state, req),
        "marks.record" => marks_record(state, req),
        "marks.recordMany" => marks_record_many(state, req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => app_err(&req.id, &req.method, e),
    })
}
