use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::model::{mark_in_range, GroupMarks, MarksTable, MARK_MAX, MARK_MIN};
use crate::store::Store;

/// Mark as it arrived in a batch row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MarkInput {
    #[default]
    Missing,
    Value(i64),
    /// Present but unusable; carries the reason.
    Invalid(String),
}

/// One row of a batch save.
#[derive(Debug, Clone, Default)]
pub struct MarkEntry {
    pub gid: String,
    pub student_identifier: String,
    pub mark: MarkInput,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectedEntry {
    pub index: usize,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub updated: usize,
    pub rejected: usize,
    pub errors: Vec<RejectedEntry>,
}

/// Blank keys are rejected; anything else is stored exactly as given so it
/// matches the groups document byte for byte.
fn required_key(field: &str, value: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("missing {field}")));
    }
    Ok(value.to_string())
}

fn checked_mark(mark: i64) -> AppResult<i64> {
    if !mark_in_range(mark) {
        return Err(AppError::validation(format!(
            "Marks must be between {MARK_MIN} and {MARK_MAX}"
        )));
    }
    Ok(mark)
}

fn set_leaf(marks: &mut MarksTable, teacher: String, gid: String, student: String, mark: i64) {
    marks
        .entry(teacher)
        .or_default()
        .entry(gid)
        .or_default()
        .insert(student, mark);
}

pub fn load_all(store: &Store) -> AppResult<MarksTable> {
    Ok(store.load_marks()?)
}

/// Marks recorded by one teacher, or an empty map.
pub fn for_teacher(store: &Store, teacher_name: &str) -> AppResult<GroupMarks> {
    let mut all = store.load_marks()?;
    Ok(all.shift_remove(teacher_name).unwrap_or_default())
}

/// Records one mark. Validation happens before the document is touched, so a
/// rejected update leaves stored state as it was.
pub fn update(
    store: &Store,
    teacher_name: &str,
    gid: &str,
    student_identifier: &str,
    mark: i64,
) -> AppResult<()> {
    let teacher = required_key("teacherName", teacher_name)?;
    let gid = required_key("gid", gid)?;
    let student = required_key("enrollmentNumber", student_identifier)?;
    let mark = checked_mark(mark)?;

    debug!(%teacher, %gid, %student, mark, "recording mark");
    store.update_marks(|marks| {
        set_leaf(marks, teacher, gid, student, mark);
        Ok::<_, AppError>(())
    })
}

/// Validates each entry on its own and applies the valid ones in a single
/// write. Invalid entries are reported by index.
pub fn update_many(
    store: &Store,
    teacher_name: &str,
    entries: &[MarkEntry],
) -> AppResult<BatchSummary> {
    let teacher = required_key("teacherName", teacher_name)?;

    let mut summary = BatchSummary::default();
    let mut accepted: Vec<(String, String, i64)> = Vec::new();
    for (index, e) in entries.iter().enumerate() {
        let checked = required_key("gid", &e.gid).and_then(|gid| {
            let student = required_key("studentIdentifier", &e.student_identifier)?;
            let mark = match &e.mark {
                MarkInput::Value(m) => checked_mark(*m)?,
                MarkInput::Missing => return Err(AppError::validation("missing mark")),
                MarkInput::Invalid(reason) => return Err(AppError::validation(reason.clone())),
            };
            Ok((gid, student, mark))
        });
        match checked {
            Ok(v) => accepted.push(v),
            Err(err) => summary.errors.push(RejectedEntry {
                index,
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
    summary.rejected = summary.errors.len();

    if accepted.is_empty() {
        return Ok(summary);
    }
    summary.updated = accepted.len();
    debug!(%teacher, updated = summary.updated, rejected = summary.rejected, "recording marks batch");
    store.update_marks(|marks| {
        for (gid, student, mark) in accepted {
            set_leaf(marks, teacher.clone(), gid, student, mark);
        }
        Ok::<_, AppError>(())
    })?;
    Ok(summary)
}
