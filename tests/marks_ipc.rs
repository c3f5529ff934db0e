mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir, write_sample_roster};

#[test]
fn record_then_list_keeps_last_value() {
    let workspace = temp_dir("mentormarks-marks-record");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());

    let empty = request_ok(&mut stdin, &mut reader, "1", "marks.list", json!({}));
    assert_eq!(empty["marks"], json!({}));
    assert!(workspace.path().join("data/marks.json").is_file());

    for (id, m) in [("2", 85), ("3", 90)] {
        let saved = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "marks.record",
            json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1", "marks": m }),
        );
        assert_eq!(saved["success"], true);
    }
    let listed = request_ok(&mut stdin, &mut reader, "4", "marks.list", json!({}));
    assert_eq!(listed["marks"], json!({ "Dr. X": { "G1": { "E1": 90 } } }));
}

#[test]
fn invalid_marks_are_rejected_without_changing_state() {
    let workspace = temp_dir("mentormarks-marks-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.record",
        json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1", "marks": 0 }),
    );
    let before = std::fs::read(workspace.path().join("data/marks.json")).expect("marks.json");

    let cases = [
        json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1", "marks": 150 }),
        json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1", "marks": -1 }),
        json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1", "marks": 7.5 }),
        json!({ "teacherName": "Dr. X", "gid": "G1", "enrollmentNumber": "E1" }),
        json!({ "gid": "G1", "enrollmentNumber": "E1", "marks": 5 }),
        json!({ "teacherName": "Dr. X", "gid": "", "enrollmentNumber": "E1", "marks": 5 }),
    ];
    for (i, params) in cases.into_iter().enumerate() {
        let code = request_err(&mut stdin, &mut reader, &format!("bad-{i}"), "marks.record", params);
        assert_eq!(code, "bad_params");
    }

    let after = std::fs::read(workspace.path().join("data/marks.json")).expect("marks.json");
    assert_eq!(before, after);
}

#[test]
fn record_many_reports_rejections_and_narrowed_list() {
    let workspace = temp_dir("mentormarks-marks-many");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.recordMany",
        json!({
            "teacherName": "Dr. X",
            "entries": [
                { "gid": "G1", "studentIdentifier": "E1", "mark": 70 },
                { "gid": "G1", "enrollmentNumber": "E2", "marks": 101 },
                { "gid": "G3", "studentIdentifier": "Eve", "mark": 55 },
                { "gid": "G3", "mark": 10 },
                { "gid": "G1", "studentIdentifier": "E2", "mark": 85.5 }
            ]
        }),
    );
    assert_eq!(res["updated"], 2);
    assert_eq!(res["rejected"], 3);
    assert_eq!(res["errors"][0]["index"], 1);
    assert_eq!(res["errors"][1]["index"], 3);
    assert_eq!(res["errors"][2]["index"], 4);
    assert_eq!(res["errors"][2]["message"], "Marks must be an integer");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.record",
        json!({ "teacherName": "Dr. Y", "gid": "G2", "studentIdentifier": "E3", "mark": 40 }),
    );
    let narrowed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.list",
        json!({ "teacherName": "Dr. X" }),
    );
    assert_eq!(
        narrowed["marks"],
        json!({ "Dr. X": { "G1": { "E1": 70 }, "G3": { "Eve": 55 } } })
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "marks.recordMany",
        json!({ "teacherName": "Dr. X" }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn overview_shows_marks_per_mentor() {
    let workspace = temp_dir("mentormarks-overview");
    write_sample_roster(&workspace.path().join("roster.xlsx"));
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());
    let _ = request_ok(&mut stdin, &mut reader, "1", "roster.import", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.recordMany",
        json!({
            "teacherName": "Dr. X",
            "entries": [
                { "gid": "G1", "studentIdentifier": "E1", "mark": 0 },
                { "gid": "G3", "studentIdentifier": "Eve", "mark": 88 }
            ]
        }),
    );

    let ov = request_ok(&mut stdin, &mut reader, "3", "overview.get", json!({}));
    let teachers = ov["teachers"].as_array().cloned().unwrap_or_default();
    assert_eq!(teachers.len(), 2);
    assert_eq!(teachers[0]["teacherName"], "Dr. X");

    let g1 = &teachers[0]["groups"][0];
    assert_eq!(g1["gid"], "G1");
    assert_eq!(g1["students"][0]["mark"], 0);
    assert!(g1["students"][1]["mark"].is_null());

    let g3 = &teachers[0]["groups"][1];
    assert_eq!(g3["students"][1]["name"], "Eve");
    assert_eq!(g3["students"][1]["mark"], 88);
    assert!(teachers[1]["groups"][0]["students"][0]["mark"].is_null());
}

#[test]
fn record_keeps_keys_with_surrounding_spaces() {
    let workspace = temp_dir("mentormarks-marks-spaced");
    let (_child, mut stdin, mut reader) = spawn_sidecar(workspace.path());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.record",
        json!({ "teacherName": "Dr. X ", "gid": " G1", "studentIdentifier": "E1", "mark": 50 }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.list",
        json!({ "teacherName": "Dr. X " }),
    );
    assert_eq!(listed["marks"], json!({ "Dr. X ": { " G1": { "E1": 50 } } }));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "marks.record",
        json!({ "teacherName": "  ", "gid": "G1", "studentIdentifier": "E1", "mark": 50 }),
    );
    assert_eq!(code, "bad_params");
}
