use crate::backup::{self, SnapshotKind};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::models::{Assignment, Config, EmailLogEntry, Student};
use crate::store;
use serde_json::json;
use tracing::warn;

fn document_json(state: &AppState) -> Option<serde_json::Value> {
    let session = state.session.as_ref()?;
    let doc = &session.document;
    Some(json!({
        "classId": session.class_id,
        "dirty": session.dirty,
        "students": doc.students,
        "assignments": doc.assignments,
        "config": doc.config,
        "emailLog": doc.email_log,
        "auditLog": doc.audit_log,
        "warnings": session.warnings
    }))
}

fn handle_document_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match document_json(state) {
        Some(doc) => ok(&req.id, doc),
        None => err(&req.id, "no_class_selected", "open a class first", None),
    }
}

/// Replace whole sections of the in-memory working copy. Never touches disk:
/// the session is only marked dirty until an explicit `document.save`.
fn handle_document_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };

    let mut updated: Vec<&str> = Vec::new();

    if let Some(v) = req.params.get("students") {
        match serde_json::from_value::<Vec<Student>>(v.clone()) {
            Ok(students) => {
                session.document.students = students;
                updated.push("students");
            }
            Err(e) => return err(&req.id, "bad_params", format!("students: {}", e), None),
        }
    }
    if let Some(v) = req.params.get("assignments") {
        match serde_json::from_value::<Vec<Assignment>>(v.clone()) {
            Ok(assignments) => {
                session.document.assignments = assignments;
                updated.push("assignments");
            }
            Err(e) => return err(&req.id, "bad_params", format!("assignments: {}", e), None),
        }
    }
    if let Some(v) = req.params.get("config") {
        match serde_json::from_value::<Config>(v.clone()) {
            Ok(config) => {
                session.document.config = config;
                updated.push("config");
            }
            Err(e) => return err(&req.id, "bad_params", format!("config: {}", e), None),
        }
    }
    if let Some(v) = req.params.get("emailLog") {
        match serde_json::from_value::<Vec<EmailLogEntry>>(v.clone()) {
            Ok(email_log) => {
                session.document.email_log = email_log;
                updated.push("emailLog");
            }
            Err(e) => return err(&req.id, "bad_params", format!("emailLog: {}", e), None),
        }
    }

    if updated.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "nothing to update: pass students, assignments, config or emailLog",
            None,
        );
    }

    session.dirty = true;
    ok(&req.id, json!({ "updated": updated, "dirty": true }))
}

/// Persist the working copy: optional auto snapshot first, then a full
/// rewrite of every bundle file.
fn handle_document_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };

    let auto_backup = req
        .params
        .get("autoBackup")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    let mut backup_name: Option<String> = None;
    if auto_backup {
        // A failed snapshot must not block the save itself.
        match backup::create_snapshot(paths, SnapshotKind::Auto, None) {
            Ok(info) => backup_name = Some(info.name),
            Err(e) => warn!(error = %e, "auto snapshot before save failed"),
        }
    }

    match store::save(paths, &session.class_id, &session.document) {
        Ok(()) => {
            session.dirty = false;
            ok(
                &req.id,
                json!({ "saved": true, "autoBackup": backup_name }),
            )
        }
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "document.get" => Some(handle_document_get(state, req)),
        "document.update" => Some(handle_document_update(state, req)),
        "document.save" => Some(handle_document_save(state, req)),
        _ => None,
    }
}
