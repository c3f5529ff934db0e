use crate::error::{AppError, AppResult};
use crate::ipc::error::{app_err, ok};
use crate::ipc::helpers::{get_required_str, load_groups};
use crate::ipc::types::{AppState, Request};
use crate::{marks, model, overview};
use serde_json::{json, Value};

fn groups_list(state: &AppState, req: &Request) -> AppResult<Value> {
    let teacher = get_required_str(&req.params, "teacherName")
        .map_err(|_| AppError::validation("Teacher name is required"))?;
    let groups = model::groups_for_teacher(load_groups(state)?, &teacher);
    Ok(json!({ "groups": groups }))
}

fn mentors_list(state: &AppState) -> AppResult<Value> {
    let groups = load_groups(state)?;
    Ok(json!({ "teachers": model::distinct_mentors(&groups) }))
}

fn overview_get(state: &AppState) -> AppResult<Value> {
    let groups = load_groups(state)?;
    let all = marks::load_all(&state.store)?;
    Ok(json!({ "teachers": overview::faculty_overview(&groups, &all) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "groups.list" => groups_list(state, req),
        "mentors.list" => mentors_list(state),
        "overview.get" => overview_get(state),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => app_err(&req.id, &req.method, e),
    })
}
