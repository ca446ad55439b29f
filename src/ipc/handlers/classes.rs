use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};
use crate::registry;
use crate::store;
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    let records = match registry::list(paths, state.corrupt_policy) {
        Ok(r) => r,
        Err(e) => return err(&req.id, "corrupt_data", e.to_string(), None),
    };

    // Include a roster count so the dashboard can render cards without
    // opening every class.
    let classes: Vec<serde_json::Value> = records
        .iter()
        .map(|c| {
            let student_count = std::fs::read_to_string(paths.students_file(&c.id))
                .ok()
                .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
                .and_then(|v| v.as_array().map(|a| a.len()));
            json!({
                "id": c.id,
                "name": c.name,
                "createdAt": c.created_at,
                "archived": c.archived,
                "studentCount": student_count
            })
        })
        .collect();

    ok(&req.id, json!({ "classes": classes }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    match registry::create(paths, &name, state.corrupt_policy) {
        Ok(record) => ok(
            &req.id,
            json!({ "classId": record.id, "name": record.name, "createdAt": record.created_at }),
        ),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_classes_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let archived = req
        .params
        .get("archived")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match registry::rename(paths, &class_id, &name, archived, state.corrupt_policy) {
        Ok(Some(record)) => ok(
            &req.id,
            json!({ "classId": record.id, "name": record.name, "archived": record.archived }),
        ),
        Ok(None) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    match registry::delete(paths, &class_id, state.corrupt_policy) {
        Ok(true) => {
            // Unsaved edits of the deleted class die with its session.
            if state
                .session
                .as_ref()
                .map(|s| s.class_id == class_id)
                .unwrap_or(false)
            {
                state.session = None;
            }
            ok(&req.id, json!({ "deleted": true }))
        }
        Ok(false) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_classes_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    // A missing directory (including a just-deleted class) opens as an
    // empty document rather than failing.
    let (document, report) = match store::load(paths, &class_id, state.corrupt_policy) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "corrupt_data", e.to_string(), None),
    };

    let student_count = document.students.len();
    let assignment_count = document.assignments.len();
    let warnings = report.corrupt.clone();

    state.session = Some(Session {
        class_id: class_id.clone(),
        document,
        dirty: false,
        warnings: report.corrupt,
    });

    ok(
        &req.id,
        json!({
            "classId": class_id,
            "studentCount": student_count,
            "assignmentCount": assignment_count,
            "warnings": warnings
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.rename" => Some(handle_classes_rename(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        "classes.open" => Some(handle_classes_open(state, req)),
        _ => None,
    }
}
