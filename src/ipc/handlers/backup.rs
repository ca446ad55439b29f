use crate::backup::{self, SnapshotKind};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn info_json(info: &backup::BackupInfo) -> serde_json::Value {
    json!({
        "name": info.name,
        "kind": info.kind,
        "date": info.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "path": info.path.to_string_lossy(),
        "sizeMb": info.size_mb
    })
}

fn handle_backup_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let kind = match req.params.get("kind").and_then(|v| v.as_str()) {
        None => SnapshotKind::Manual,
        Some(s) => match SnapshotKind::parse(s) {
            Some(k) => k,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "kind must be 'auto' or 'manual'",
                    None,
                )
            }
        },
    };
    let note = req.params.get("note").and_then(|v| v.as_str());

    match backup::create_snapshot(paths, kind, note) {
        Ok(info) => ok(&req.id, json!({ "backup": info_json(&info) })),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_backup_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match backup::list_snapshots(paths) {
        Ok(snapshots) => {
            let rows: Vec<serde_json::Value> = snapshots.iter().map(info_json).collect();
            ok(&req.id, json!({ "backups": rows }))
        }
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_backup_restore(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing name", None),
    };

    match backup::restore_snapshot(paths, name) {
        Ok(()) => {
            // The on-disk world changed under the session; force a reload.
            state.session = None;
            ok(&req.id, json!({ "restored": true, "sessionCleared": true }))
        }
        Err(e) => {
            let msg = format!("{:#}", e);
            if msg.contains("no longer exists") {
                err(&req.id, "not_found", msg, None)
            } else {
                err(&req.id, "io_failed", msg, None)
            }
        }
    }
}

fn handle_backup_export_zip(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match backup::export_zip(paths) {
        Ok(path) => ok(&req.id, json!({ "path": path.to_string_lossy() })),
        Err(e) => err(&req.id, "io_failed", e.to_string(), None),
    }
}

fn handle_backup_import_zip(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(paths) = state.paths.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let in_path = match req.params.get("path").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => return err(&req.id, "bad_params", "missing path", None),
    };
    if !in_path.is_file() {
        return err(
            &req.id,
            "not_found",
            "archive file not found",
            Some(json!({ "path": in_path.to_string_lossy() })),
        );
    }

    match backup::import_zip(paths, &in_path) {
        Ok(()) => {
            state.session = None;
            ok(&req.id, json!({ "imported": true, "sessionCleared": true }))
        }
        Err(e) => {
            let msg = format!("{:#}", e);
            if msg.contains("invalid backup format") || msg.contains("invalid zip archive") {
                err(&req.id, "bad_archive", msg, None)
            } else {
                err(&req.id, "io_failed", msg, None)
            }
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.create" => Some(handle_backup_create(state, req)),
        "backup.list" => Some(handle_backup_list(state, req)),
        "backup.restore" => Some(handle_backup_restore(state, req)),
        "backup.exportZip" => Some(handle_backup_export_zip(state, req)),
        "backup.importZip" => Some(handle_backup_import_zip(state, req)),
        _ => None,
    }
}
