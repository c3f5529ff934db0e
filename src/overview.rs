use serde::Serialize;

use crate::model::{distinct_mentors, Group, MarksTable};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentMark {
    pub enrollment_number: String,
    pub name: String,
    /// `None` until the mentor records a mark.
    pub mark: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub gid: String,
    pub students: Vec<StudentMark>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherOverview {
    pub teacher_name: String,
    pub groups: Vec<GroupOverview>,
}

/// Faculty head roster: every mentor with their groups and the mark they gave
/// each student.
pub fn faculty_overview(groups: &[Group], marks: &MarksTable) -> Vec<TeacherOverview> {
    distinct_mentors(groups)
        .into_iter()
        .map(|teacher| {
            let given = marks.get(&teacher);
            let groups = groups
                .iter()
                .filter(|g| g.faculty_mentor == teacher)
                .map(|g| {
                    let by_student = given.and_then(|m| m.get(&g.gid));
                    GroupOverview {
                        gid: g.gid.clone(),
                        students: g
                            .students
                            .iter()
                            .map(|s| StudentMark {
                                enrollment_number: s.enrollment_number.clone(),
                                name: s.name.clone(),
                                mark: by_student.and_then(|m| m.get(s.identifier())).copied(),
                            })
                            .collect(),
                    }
                })
                .collect();
            TeacherOverview {
                teacher_name: teacher,
                groups,
            }
        })
        .collect()
}
