use crate::audit;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::models::EmailLogEntry;
use serde_json::json;

/// Audit appends are write-through: the event hits disk in the same
/// operation as the mutation it records, even while the document itself has
/// unsaved edits.
fn handle_audit_append(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = match req
        .params
        .get("classId")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .or_else(|| state.session.as_ref().map(|s| s.class_id.clone()))
    {
        Some(v) => v,
        None => return err(&req.id, "no_class_selected", "open a class first", None),
    };

    let action = match req.params.get("action").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing action", None),
    };
    let details = req
        .params
        .get("details")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let user = req.params.get("user").and_then(|v| v.as_str());

    match audit::append(paths, &class_id, action, details, user, state.corrupt_policy) {
        Ok(log) => {
            let count = log.len();
            if let Some(session) = state.session.as_mut() {
                if session.class_id == class_id {
                    session.document.audit_log = log;
                }
            }
            ok(&req.id, json!({ "classId": class_id, "count": count }))
        }
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_audit_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };
    ok(
        &req.id,
        json!({
            "classId": session.class_id,
            "events": session.document.audit_log
        }),
    )
}

fn handle_email_log_append(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = state.session.as_ref().map(|s| s.class_id.clone()) else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };

    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let student_name = req
        .params
        .get("studentName")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing subject", None),
    };
    let status = match req.params.get("status").and_then(|v| v.as_str()) {
        Some(s @ ("sent" | "failed")) => s.to_string(),
        Some(_) => {
            return err(
                &req.id,
                "bad_params",
                "status must be 'sent' or 'failed'",
                None,
            )
        }
        None => return err(&req.id, "bad_params", "missing status", None),
    };
    let error_msg = req
        .params
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let entry = EmailLogEntry {
        timestamp: String::new(),
        student_id,
        student_name,
        subject,
        status,
        error: error_msg,
    };

    match audit::append_email(paths, &class_id, entry, state.corrupt_policy) {
        Ok(log) => {
            let count = log.len();
            if let Some(session) = state.session.as_mut() {
                session.document.email_log = log;
            }
            ok(&req.id, json!({ "classId": class_id, "count": count }))
        }
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_email_log_last_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };
    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing subject", None),
    };

    let entry = audit::last_email_status(&session.document.email_log, student_id, subject);
    ok(&req.id, json!({ "entry": entry }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "audit.append" => Some(handle_audit_append(state, req)),
        "audit.list" => Some(handle_audit_list(state, req)),
        "emailLog.append" => Some(handle_email_log_append(state, req)),
        "emailLog.lastStatus" => Some(handle_email_log_last_status(state, req)),
        _ => None,
    }
}
