use anyhow::{anyhow, Context};
use calamine::{open_workbook_auto, Data, Reader};
use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::model::{Group, Student};

pub const STUDENT_SLOTS: usize = 3;

const GID_PATTERNS: &[&str] = &["GID", "gid", "Gid", "G I D"];
const MENTOR_PATTERNS: &[&str] = &[
    "Faculty mentor choice 1",
    "faculty mentor choice 1",
    "Faculty Mentor Choice 1",
];

/// First sheet of a roster workbook: raw header text plus one map per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterSheet {
    pub headers: Vec<String>,
    pub rows: Vec<IndexMap<String, String>>,
}

impl RosterSheet {
    /// Builds a sheet from header text and positional cells. Extra cells beyond
    /// the header row are dropped; a repeated header keeps its first column.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|cells| {
                let mut row = IndexMap::new();
                for (h, v) in headers.iter().zip(cells) {
                    row.entry(h.clone()).or_insert(v);
                }
                row
            })
            .collect();
        RosterSheet { headers, rows }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SlotColumns {
    enrollment: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    gid: Option<String>,
    mentor: Option<String>,
    slots: Vec<SlotColumns>,
}

fn enrollment_patterns(slot: usize) -> Vec<String> {
    vec![
        format!("Student {slot} Enrollment Number"),
        format!("Student {slot} Enrollment Number "),
        format!("Student {slot} enrollment number"),
        format!("Student{slot} Enrollment Number"),
    ]
}

fn name_patterns(slot: usize) -> Vec<String> {
    vec![
        format!("Student {slot} Name"),
        format!("Student {slot} Name "),
        format!("Student {slot} name"),
        format!("Student{slot} Name"),
    ]
}

/// Resolves a logical field to a real header. Each pattern is tried in rank
/// order as an exact match, then case-insensitively, then as a case-insensitive
/// substring in either direction. Blank headers never match.
pub fn find_column<'a, P: AsRef<str>>(patterns: &[P], headers: &'a [String]) -> Option<&'a str> {
    let candidates: Vec<&String> = headers.iter().filter(|h| !h.trim().is_empty()).collect();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if let Some(h) = candidates.iter().find(|h| h.as_str() == pattern) {
            return Some(h.as_str());
        }
        let lower = pattern.to_lowercase();
        if let Some(h) = candidates.iter().find(|h| h.to_lowercase() == lower) {
            return Some(h.as_str());
        }
        if let Some(h) = candidates.iter().find(|h| {
            let col = h.to_lowercase();
            col.contains(&lower) || lower.contains(&col)
        }) {
            return Some(h.as_str());
        }
    }
    None
}

fn resolve_columns(headers: &[String]) -> ColumnMap {
    let owned = |c: Option<&str>| c.map(str::to_string);
    let map = ColumnMap {
        gid: owned(find_column(GID_PATTERNS, headers)),
        mentor: owned(find_column(MENTOR_PATTERNS, headers)),
        slots: (1..=STUDENT_SLOTS)
            .map(|slot| SlotColumns {
                enrollment: owned(find_column(&enrollment_patterns(slot), headers)),
                name: owned(find_column(&name_patterns(slot), headers)),
            })
            .collect(),
    };
    debug!(gid = ?map.gid, mentor = ?map.mentor, slots = ?map.slots, "resolved roster columns");
    map
}

fn cell<'r>(row: &'r IndexMap<String, String>, column: Option<&str>) -> &'r str {
    column
        .and_then(|c| row.get(c))
        .map(|v| v.trim())
        .unwrap_or("")
}

/// Turns roster rows into groups, preserving row order. Rows without a gid or
/// mentor are skipped, as are rows where no student slot has a value.
pub fn groups_from_sheet(sheet: &RosterSheet) -> Vec<Group> {
    debug!(headers = ?sheet.headers, "roster headers");
    let columns = resolve_columns(&sheet.headers);

    let mut groups = Vec::new();
    for row in &sheet.rows {
        let gid = cell(row, columns.gid.as_deref());
        let mentor = cell(row, columns.mentor.as_deref());
        if gid.is_empty() || mentor.is_empty() {
            continue;
        }

        let students: Vec<Student> = columns
            .slots
            .iter()
            .filter_map(|slot| {
                let enrollment = cell(row, slot.enrollment.as_deref());
                let name = cell(row, slot.name.as_deref());
                if enrollment.is_empty() && name.is_empty() {
                    return None;
                }
                Some(Student {
                    enrollment_number: enrollment.to_string(),
                    name: name.to_string(),
                })
            })
            .collect();

        if students.is_empty() {
            continue;
        }
        groups.push(Group {
            gid: gid.to_string(),
            students,
            faculty_mentor: mentor.to_string(),
        });
    }
    groups
}

fn header_text(c: &Data) -> String {
    match c {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        other => cell_text(other),
    }
}

/// Cell value as trimmed text. Whole floats drop their fractional part so a
/// numeric enrollment number reads the same as it was typed.
pub fn cell_text(c: &Data) -> String {
    match c {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Reads the first sheet of a workbook. The first row is the header row.
pub fn read_roster_sheet(path: &Path) -> anyhow::Result<RosterSheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.to_string_lossy()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no sheets"))?
        .context("failed to read first sheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RosterSheet::default());
    };
    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    let data: Vec<Vec<String>> = rows
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect();
    Ok(RosterSheet::from_rows(headers, data))
}

/// Non-fatal import: a missing or unreadable roster yields no groups and is
/// logged rather than returned.
pub fn load_groups_from_roster(path: &Path) -> Vec<Group> {
    if !path.is_file() {
        warn!(path = %path.display(), "roster spreadsheet not found");
        return Vec::new();
    }
    match read_roster_sheet(path) {
        Ok(sheet) => {
            let groups = groups_from_sheet(&sheet);
            info!(
                path = %path.display(),
                rows = sheet.rows.len(),
                groups = groups.len(),
                "roster imported"
            );
            groups
        }
        Err(e) => {
            error!(path = %path.display(), "failed to load roster: {e:#}");
            Vec::new()
        }
    }
}
