use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::models::Template;
use crate::templates;
use serde_json::json;

fn handle_templates_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match templates::list(paths, state.corrupt_policy) {
        Ok(list) => ok(&req.id, json!({ "templates": list })),
        Err(e) => err(&req.id, "corrupt_data", e.to_string(), None),
    }
}

fn handle_templates_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let template = match serde_json::from_value::<Template>(req.params.clone()) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if template.name.trim().is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    match templates::upsert(paths, template, state.corrupt_policy) {
        Ok(list) => ok(&req.id, json!({ "count": list.len() })),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_templates_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing name", None),
    };

    match templates::delete(paths, name, state.corrupt_policy) {
        Ok(list) => ok(&req.id, json!({ "count": list.len() })),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "templates.list" => Some(handle_templates_list(state, req)),
        "templates.save" => Some(handle_templates_save(state, req)),
        "templates.delete" => Some(handle_templates_delete(state, req)),
        _ => None,
    }
}
