#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub const ROSTER_HEADERS: [&str; 8] = [
    "Timestamp",
    "GID",
    "Faculty mentor choice 1",
    "Student 1 Name",
    "Student 1 Enrollment Number",
    "Student 2 Name",
    "Student 2 Enrollment Number ",
    "Student 3 name",
];

pub fn temp_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create temp dir")
}

/// Writes a one-sheet xlsx roster: header row then string cells.
pub fn write_roster(path: &Path, headers: &[&str], rows: &[&[&str]]) {
    let mut wb = rust_xlsxwriter::Workbook::new();
    let ws = wb.add_worksheet();
    for (col, h) in headers.iter().enumerate() {
        ws.write_string(0, col as u16, *h).expect("write header");
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, v) in row.iter().enumerate() {
            if v.is_empty() {
                continue;
            }
            ws.write_string((r + 1) as u32, col as u16, *v)
                .expect("write cell");
        }
    }
    wb.save(path).expect("save roster");
}

/// Roster with three groups over two mentors; G3 has a student without an
/// enrollment number, and one row has no GID.
pub fn write_sample_roster(path: &Path) {
    write_roster(
        path,
        &ROSTER_HEADERS,
        &[
            &["t1", "G1", "Dr. X", "Alice", "E1", "Bob", "E2", ""],
            &["t2", "G2", "Dr. Y", "Cara", "E3", "", "", ""],
            &["t3", "", "Dr. Y", "Ghost", "E0", "", "", ""],
            &["t4", "G3", "Dr. X", "Dan", "E4", "Eve", "", "Finn"],
        ],
    );
}

pub fn spawn_sidecar(workspace: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_mentormarksd");
    let mut child = Command::new(exe)
        .arg("--workspace")
        .arg(workspace)
        .env_remove("MENTORMARKS_DATA_DIR")
        .env_remove("MENTORMARKS_ROSTER")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn mentormarksd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Asserts failure and returns the error code.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value["error"]["code"].as_str().unwrap_or_default().to_string()
}
