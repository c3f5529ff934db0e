use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MARK_MIN: i64 = 0;
pub const MARK_MAX: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default, deserialize_with = "text_or_number")]
    pub enrollment_number: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: String,
}

impl Student {
    /// Key used for this student in the marks table: enrollment number when
    /// present, otherwise the name.
    pub fn identifier(&self) -> &str {
        if self.enrollment_number.is_empty() {
            &self.name
        } else {
            &self.enrollment_number
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(deserialize_with = "text_or_number")]
    pub gid: String,
    pub students: Vec<Student>,
    #[serde(deserialize_with = "text_or_number")]
    pub faculty_mentor: String,
}

impl Group {
    /// Enrollment number first, then name.
    pub fn find_student(&self, identifier: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.enrollment_number == identifier)
            .or_else(|| self.students.iter().find(|s| s.name == identifier))
    }
}

/// Older groups documents keep raw spreadsheet values, so numeric cells show
/// up as JSON numbers. Strings pass through untouched.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected text or number, found {other}"
        ))),
    }
}

/// student identifier -> mark
pub type StudentMarks = IndexMap<String, i64>;
/// gid -> student marks
pub type GroupMarks = IndexMap<String, StudentMarks>;
/// teacher name -> gid -> student identifier -> mark
pub type MarksTable = IndexMap<String, GroupMarks>;

pub fn mark_in_range(mark: i64) -> bool {
    (MARK_MIN..=MARK_MAX).contains(&mark)
}

pub fn leaf_count(marks: &MarksTable) -> usize {
    marks
        .values()
        .flat_map(|by_gid| by_gid.values())
        .map(|by_student| by_student.len())
        .sum()
}

/// Distinct non-empty mentors in order of first occurrence.
pub fn distinct_mentors(groups: &[Group]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for g in groups {
        if g.faculty_mentor.is_empty() || out.iter().any(|m| m == &g.faculty_mentor) {
            continue;
        }
        out.push(g.faculty_mentor.clone());
    }
    out
}

pub fn groups_for_teacher(groups: Vec<Group>, teacher_name: &str) -> Vec<Group> {
    if teacher_name == "all" {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.faculty_mentor == teacher_name)
        .collect()
}
