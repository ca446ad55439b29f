use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn expect_ok(resp: &serde_json::Value, method: &str) -> serde_json::Value {
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        resp
    );
    resp.get("result").cloned().unwrap_or(json!({}))
}

#[test]
fn full_session_flow_over_stdio() {
    let workspace = temp_dir("gradebookd-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(&mut stdin, &mut reader, "1", "health", json!({}));
    expect_ok(&resp, "health");

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    expect_ok(&resp, "workspace.select");

    // Guarded methods refuse to run without an open class.
    let resp = request(&mut stdin, &mut reader, "3", "document.get", json!({}));
    assert_eq!(
        resp.pointer("/error/code").and_then(|v| v.as_str()),
        Some("no_class_selected")
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "classes.create",
        json!({ "name": "4PK26a" }),
    );
    let class_id = expect_ok(&resp, "classes.create")
        .get("classId")
        .and_then(|v| v.as_str())
        .expect("classId")
        .to_string();

    let resp = request(
        &mut stdin,
        &mut reader,
        "5",
        "classes.open",
        json!({ "classId": class_id }),
    );
    expect_ok(&resp, "classes.open");

    // Load the roster and one graded assignment into the working copy.
    let resp = request(
        &mut stdin,
        &mut reader,
        "6",
        "document.update",
        json!({
            "students": [
                { "id": "student_mia.keller", "Anmeldename": "mia.keller", "Vorname": "Mia", "Nachname": "Keller" }
            ],
            "assignments": [
                {
                    "id": "assign_1", "name": "Test 1", "subject": "SPRACHE", "type": "Test",
                    "weight": 2.0, "maxPoints": 100.0, "scaleType": "60% Scale",
                    "date": "2025-04-01T08:00:00",
                    "grades": { "student_mia.keller": 5.0 }
                },
                {
                    "id": "assign_2", "name": "Essay", "subject": "SPRACHE", "type": "Custom Assignment",
                    "weight": 1.0, "maxPoints": 20.0, "scaleType": "60% Scale",
                    "date": "2025-05-01T08:00:00",
                    "grades": { "student_mia.keller": 4.0 }
                }
            ]
        }),
    );
    let result = expect_ok(&resp, "document.update");
    assert_eq!(result.get("dirty").and_then(|v| v.as_bool()), Some(true));

    let resp = request(
        &mut stdin,
        &mut reader,
        "7",
        "calc.gradeForPoints",
        json!({ "points": 60, "maxPoints": 100, "scaleType": "60% Scale" }),
    );
    let result = expect_ok(&resp, "calc.gradeForPoints");
    assert_eq!(result.pointer("/result/note").and_then(|v| v.as_f64()), Some(4.0));
    assert_eq!(
        result.pointer("/result/percentage").and_then(|v| v.as_f64()),
        Some(60.0)
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "8",
        "calc.weightedAverage",
        json!({ "studentId": "student_mia.keller", "subject": "SPRACHE" }),
    );
    let result = expect_ok(&resp, "calc.weightedAverage");
    assert_eq!(result.get("average").and_then(|v| v.as_f64()), Some(4.67));
    assert_eq!(result.get("reportCard").and_then(|v| v.as_f64()), Some(4.5));

    let resp = request(
        &mut stdin,
        &mut reader,
        "9",
        "calc.studentTrend",
        json!({ "studentId": "student_mia.keller", "subject": "SPRACHE" }),
    );
    let result = expect_ok(&resp, "calc.studentTrend");
    assert_eq!(
        result.pointer("/trend/direction").and_then(|v| v.as_str()),
        Some("down")
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "10",
        "audit.append",
        json!({ "action": "Noten erfasst", "details": "Test 1 und Essay" }),
    );
    expect_ok(&resp, "audit.append");

    let resp = request(
        &mut stdin,
        &mut reader,
        "11",
        "emailLog.append",
        json!({
            "studentId": "student_mia.keller",
            "studentName": "Mia Keller",
            "subject": "SPRACHE",
            "status": "sent"
        }),
    );
    expect_ok(&resp, "emailLog.append");

    let resp = request(
        &mut stdin,
        &mut reader,
        "12",
        "emailLog.lastStatus",
        json!({ "studentId": "student_mia.keller", "subject": "SPRACHE" }),
    );
    let result = expect_ok(&resp, "emailLog.lastStatus");
    assert_eq!(
        result.pointer("/entry/status").and_then(|v| v.as_str()),
        Some("sent")
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "13",
        "document.save",
        json!({ "autoBackup": true }),
    );
    let result = expect_ok(&resp, "document.save");
    assert_eq!(result.get("saved").and_then(|v| v.as_bool()), Some(true));

    let resp = request(
        &mut stdin,
        &mut reader,
        "14",
        "backup.create",
        json!({ "note": "smoke" }),
    );
    expect_ok(&resp, "backup.create");

    let resp = request(&mut stdin, &mut reader, "15", "backup.list", json!({}));
    let result = expect_ok(&resp, "backup.list");
    let backups = result.get("backups").and_then(|v| v.as_array()).expect("backups");
    assert!(!backups.is_empty());

    let resp = request(&mut stdin, &mut reader, "16", "backup.exportZip", json!({}));
    let result = expect_ok(&resp, "backup.exportZip");
    let export_path = result.get("path").and_then(|v| v.as_str()).expect("path");
    assert!(PathBuf::from(export_path).is_file());

    let resp = request(&mut stdin, &mut reader, "17", "templates.list", json!({}));
    let result = expect_ok(&resp, "templates.list");
    assert_eq!(
        result.get("templates").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(2)
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "18",
        "classes.delete",
        json!({ "classId": class_id }),
    );
    expect_ok(&resp, "classes.delete");

    // Opening the deleted id yields an empty document, not an error.
    let resp = request(
        &mut stdin,
        &mut reader,
        "19",
        "classes.open",
        json!({ "classId": class_id }),
    );
    let result = expect_ok(&resp, "classes.open");
    assert_eq!(result.get("studentCount").and_then(|v| v.as_u64()), Some(0));

    let resp = request(&mut stdin, &mut reader, "20", "nosuch.method", json!({}));
    assert_eq!(
        resp.pointer("/error/code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
