use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::paths::DataPaths;
use crate::registry;
use crate::store::CorruptPolicy;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.paths.as_ref().map(|p| p.root().to_string_lossy().to_string()),
            "activeClassId": state.session.as_ref().map(|s| s.class_id.clone()),
            "dirty": state.session.as_ref().map(|s| s.dirty).unwrap_or(false)
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let policy = match req.params.get("onCorrupt").and_then(|v| v.as_str()) {
        None => CorruptPolicy::UseDefault,
        Some(s) => match CorruptPolicy::parse(s) {
            Some(p) => p,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "onCorrupt must be 'default' or 'error'",
                    None,
                )
            }
        },
    };

    let paths = DataPaths::new(path);
    if let Err(e) = paths.init() {
        return err(&req.id, "io_failed", e.to_string(), None);
    }

    // Flat single-class roots from early installations are migrated once.
    let migrated = match registry::migrate_legacy_layout(&paths) {
        Ok(m) => m,
        Err(e) => return err(&req.id, "io_failed", e.to_string(), None),
    };

    state.paths = Some(paths);
    state.corrupt_policy = policy;
    state.session = None;

    ok(
        &req.id,
        json!({ "workspacePath": path, "migratedLegacy": migrated }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
