use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::model::Group;
use crate::roster;

use super::types::AppState;

/// Blank values count as missing, but a present value is returned exactly as
/// sent since it may be a key into the stored documents.
pub fn get_required_str(params: &Value, key: &str) -> AppResult<String> {
    get_opt_str(params, &[key]).ok_or_else(|| AppError::validation(format!("missing {}", key)))
}

/// First non-blank string among `keys`, untrimmed.
pub fn get_opt_str(params: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| params.get(*k).and_then(|v| v.as_str()))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Current groups; the first read in a fresh data directory imports them from
/// the configured roster.
pub fn load_groups(state: &AppState) -> AppResult<Vec<Group>> {
    let roster_path = state.config.roster_path.clone();
    Ok(state
        .store
        .load_groups_or_else(|| roster::load_groups_from_roster(&roster_path))?)
}
