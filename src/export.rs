use anyhow::Context;
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::{Group, MarksTable};

pub const GROUPS_SHEET: &str = "Groups";
pub const MARKS_SHEET: &str = "Marks";
pub const GROUP_HEADERS: [&str; 5] = [
    "GID",
    "Faculty Mentor",
    "Student Number",
    "Enrollment Number",
    "Student Name",
];
pub const MARK_HEADERS: [&str; 5] = [
    "Teacher Name",
    "GID",
    "Enrollment Number",
    "Student Name",
    "Marks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Groups,
    Marks,
    All,
}

impl Selector {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groups" => Some(Selector::Groups),
            "marks" => Some(Selector::Marks),
            "all" => Some(Selector::All),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Selector::Groups => "groups",
            Selector::Marks => "marks",
            Selector::All => "all",
        }
    }

    pub fn includes_groups(self) -> bool {
        matches!(self, Selector::Groups | Selector::All)
    }

    pub fn includes_marks(self) -> bool {
        matches!(self, Selector::Marks | Selector::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Excel,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "structured" => Some(ExportFormat::Json),
            "excel" | "spreadsheet" | "xlsx" => Some(ExportFormat::Excel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// Structured export. Absent fields are omitted, not null.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<MarksTable>,
}

pub fn build_document(selector: Selector, groups: &[Group], marks: &MarksTable) -> ExportDocument {
    ExportDocument {
        groups: selector.includes_groups().then(|| groups.to_vec()),
        marks: selector.includes_marks().then(|| marks.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub gid: String,
    pub faculty_mentor: String,
    pub student_number: usize,
    pub enrollment_number: String,
    pub student_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRow {
    pub teacher_name: String,
    pub gid: String,
    pub enrollment_number: String,
    pub student_name: String,
    pub marks: i64,
}

pub fn group_rows(groups: &[Group]) -> Vec<GroupRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.students.iter().enumerate().map(move |(idx, s)| GroupRow {
                gid: g.gid.clone(),
                faculty_mentor: g.faculty_mentor.clone(),
                student_number: idx + 1,
                enrollment_number: s.enrollment_number.clone(),
                student_name: s.name.clone(),
            })
        })
        .collect()
}

/// One row per recorded mark, in the table's insertion order. The identifier
/// is matched against the first group with that gid; a field that cannot be
/// resolved shows the raw identifier.
pub fn mark_rows(groups: &[Group], marks: &MarksTable) -> Vec<MarkRow> {
    let mut rows = Vec::new();
    for (teacher, by_gid) in marks {
        for (gid, by_student) in by_gid {
            let group = groups.iter().find(|g| &g.gid == gid);
            for (identifier, mark) in by_student {
                let student = group.and_then(|g| g.find_student(identifier));
                let or_raw = |v: Option<&String>| match v {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => identifier.clone(),
                };
                rows.push(MarkRow {
                    teacher_name: teacher.clone(),
                    gid: gid.clone(),
                    enrollment_number: or_raw(student.map(|s| &s.enrollment_number)),
                    student_name: or_raw(student.map(|s| &s.name)),
                    marks: *mark,
                });
            }
        }
    }
    rows
}

pub fn export_filename(selector: Selector, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "export_{}_{}.{}",
        selector.as_str(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub group_rows: usize,
    pub mark_rows: usize,
    pub document: Option<ExportDocument>,
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> anyhow::Result<()> {
    for (col, h) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *h)?;
    }
    Ok(())
}

fn write_groups_sheet(workbook: &mut Workbook, rows: &[GroupRow]) -> anyhow::Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(GROUPS_SHEET)?;
    write_headers(sheet, &GROUP_HEADERS)?;
    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &r.gid)?;
        sheet.write_string(row, 1, &r.faculty_mentor)?;
        sheet.write_number(row, 2, r.student_number as f64)?;
        sheet.write_string(row, 3, &r.enrollment_number)?;
        sheet.write_string(row, 4, &r.student_name)?;
    }
    Ok(())
}

fn write_marks_sheet(workbook: &mut Workbook, rows: &[MarkRow]) -> anyhow::Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(MARKS_SHEET)?;
    write_headers(sheet, &MARK_HEADERS)?;
    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &r.teacher_name)?;
        sheet.write_string(row, 1, &r.gid)?;
        sheet.write_string(row, 2, &r.enrollment_number)?;
        sheet.write_string(row, 3, &r.student_name)?;
        sheet.write_number(row, 4, r.marks as f64)?;
    }
    Ok(())
}

/// Builds the xlsx export in memory.
pub fn workbook_bytes(
    selector: Selector,
    groups: &[Group],
    marks: &MarksTable,
) -> anyhow::Result<(Vec<u8>, usize, usize)> {
    let mut workbook = Workbook::new();
    let mut group_count = 0;
    let mut mark_count = 0;
    if selector.includes_groups() {
        let rows = group_rows(groups);
        group_count = rows.len();
        write_groups_sheet(&mut workbook, &rows).context("failed to write Groups sheet")?;
    }
    if selector.includes_marks() {
        let rows = mark_rows(groups, marks);
        mark_count = rows.len();
        write_marks_sheet(&mut workbook, &rows).context("failed to write Marks sheet")?;
    }
    let bytes = workbook
        .save_to_buffer()
        .context("failed to encode workbook")?;
    Ok((bytes, group_count, mark_count))
}

/// Writes the export to `out_path` and reports what went into it.
pub fn write_export(
    selector: Selector,
    format: ExportFormat,
    groups: &[Group],
    marks: &MarksTable,
    out_path: &Path,
) -> anyhow::Result<ExportOutcome> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let outcome = match format {
        ExportFormat::Json => {
            let doc = build_document(selector, groups, marks);
            let text =
                serde_json::to_string_pretty(&doc).context("failed to serialize export")?;
            std::fs::write(out_path, text)
                .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
            ExportOutcome {
                path: out_path.to_path_buf(),
                group_rows: doc.groups.as_ref().map(|g| group_rows(g).len()).unwrap_or(0),
                mark_rows: doc
                    .marks
                    .as_ref()
                    .map(crate::model::leaf_count)
                    .unwrap_or(0),
                document: Some(doc),
            }
        }
        ExportFormat::Excel => {
            let (bytes, group_rows, mark_rows) = workbook_bytes(selector, groups, marks)?;
            std::fs::write(out_path, bytes)
                .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
            ExportOutcome {
                path: out_path.to_path_buf(),
                group_rows,
                mark_rows,
                document: None,
            }
        }
    };
    info!(
        path = %outcome.path.display(),
        format = format.as_str(),
        selector = selector.as_str(),
        "export written"
    );
    Ok(outcome)
}
