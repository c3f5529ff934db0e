mod test_support;

use calamine::{open_workbook_auto, Reader};
use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir, write_sample_roster};

fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(stdin, reader, "seed-1", "roster.import", json!({}));
    let _ = request_ok(
        stdin,
        reader,
        "seed-2",
        "marks.recordMany",
        json!({
            "teacherName": "Dr. X",
            "entries": [
                { "gid": "G1", "studentIdentifier": "E1", "mark": 85 },
                { "gid": "G1", "studentIdentifier": "E2", "mark": 64 },
                { "gid": "G3", "studentIdentifier": "Eve", "mark": 77 },
                { "gid": "G9", "studentIdentifier": "E99", "mark": 12 }
            ]
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "seed-3",
        "marks.record",
        json!({ "teacherName": "Dr. Y", "gid": "G2", "enrollmentNumber": "E3", "marks": 91 }),
    );
}

#[test]
fn structured_export_respects_selector() {
    let workspace = temp_dir("mentormarks-export-json");
    write_sample_roster(&workspace.path().join("roster.xlsx"));
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());
    seed(&mut stdin, &mut reader);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "export.run",
        json!({ "format": "json", "type": "groups" }),
    );
    let doc = &res["document"];
    assert!(doc.get("groups").is_some());
    assert!(doc.get("marks").is_none());
    let filename = res["filename"].as_str().expect("filename");
    assert!(filename.starts_with("export_groups_") && filename.ends_with(".json"), "{filename}");

    let path = res["path"].as_str().expect("path");
    assert!(path.ends_with(filename));
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).expect("read export")).expect("json");
    assert_eq!(&on_disk, doc);

    let marks_only = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "export.run",
        json!({ "format": "structured", "selector": "marks" }),
    );
    assert!(marks_only["document"].get("groups").is_none());
    assert_eq!(marks_only["document"]["marks"]["Dr. Y"]["G2"]["E3"], 91);
    assert_eq!(marks_only["markRows"], 5);
}

#[test]
fn spreadsheet_export_has_one_marks_row_per_leaf() {
    let workspace = temp_dir("mentormarks-export-xlsx");
    write_sample_roster(&workspace.path().join("roster.xlsx"));
    let out = workspace.path().join("out/all.xlsx");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());
    seed(&mut stdin, &mut reader);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "export.run",
        json!({ "format": "excel", "type": "all", "outPath": out.to_string_lossy() }),
    );
    assert_eq!(res["markRows"], 5);
    assert_eq!(res["groupRows"], 6);
    assert!(res.get("document").is_none());

    let mut wb = open_workbook_auto(&out).expect("open export");
    assert_eq!(wb.sheet_names(), vec!["Groups".to_string(), "Marks".to_string()]);

    let groups = wb.worksheet_range("Groups").expect("Groups sheet");
    let rows: Vec<Vec<String>> = groups
        .rows()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    assert_eq!(rows.len(), 1 + 6);
    assert_eq!(
        rows[0],
        vec!["GID", "Faculty Mentor", "Student Number", "Enrollment Number", "Student Name"]
    );
    assert_eq!(rows[2], vec!["G1", "Dr. X", "2", "E2", "Bob"]);

    let marks = wb.worksheet_range("Marks").expect("Marks sheet");
    let rows: Vec<Vec<String>> = marks
        .rows()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    assert_eq!(rows.len(), 1 + 5);
    assert_eq!(rows[1], vec!["Dr. X", "G1", "E1", "Alice", "85"]);
    // matched by name; blank enrollment falls back to the identifier
    assert_eq!(rows[3], vec!["Dr. X", "G3", "Eve", "Eve", "77"]);
    // no such group: raw identifier in both columns
    assert_eq!(rows[4], vec!["Dr. X", "G9", "E99", "E99", "12"]);
    assert_eq!(rows[5][0], "Dr. Y");
}

#[test]
fn default_export_lands_in_data_exports() {
    let workspace = temp_dir("mentormarks-export-default");
    write_sample_roster(&workspace.path().join("roster.xlsx"));
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());
    seed(&mut stdin, &mut reader);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "export.run",
        json!({ "format": "spreadsheet", "type": "marks" }),
    );
    let filename = res["filename"].as_str().expect("filename");
    assert!(filename.starts_with("export_marks_") && filename.ends_with(".xlsx"));
    let expected = workspace.path().join("data/exports").join(filename);
    assert!(expected.is_file(), "missing {}", expected.display());

    let wb = open_workbook_auto(&expected).expect("open export");
    assert_eq!(wb.sheet_names(), vec!["Marks".to_string()]);
}

#[test]
fn unknown_format_or_selector_is_rejected() {
    let workspace = temp_dir("mentormarks-export-bad");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());

    let code = request_err(&mut stdin, &mut reader, "1", "export.run", json!({ "format": "pdf" }));
    assert_eq!(code, "bad_params");
    let code = request_err(&mut stdin, &mut reader, "2", "export.run", json!({ "type": "students" }));
    assert_eq!(code, "bad_params");
}
