use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use crate::models::{now_iso, ClassRecord};
use crate::paths::DataPaths;
use crate::store::{self, CorruptPolicy, LoadReport};

/// When set, `list` is restricted to the class with this id (demonstration
/// installations expose a single prepared class).
pub const DEMO_CLASS_ENV: &str = "GRADEBOOKD_DEMO_CLASS";

pub fn read_registry(paths: &DataPaths, policy: CorruptPolicy) -> anyhow::Result<Vec<ClassRecord>> {
    let mut report = LoadReport::default();
    store::load_or_default(&paths.registry_file(), policy, &mut report)
}

fn write_registry(paths: &DataPaths, registry: &[ClassRecord]) -> anyhow::Result<()> {
    store::write_json_pretty(&paths.registry_file(), &registry)
}

/// Classes in creation order, optionally narrowed by the demo toggle.
pub fn list(paths: &DataPaths, policy: CorruptPolicy) -> anyhow::Result<Vec<ClassRecord>> {
    let registry = read_registry(paths, policy)?;
    if let Ok(demo_id) = std::env::var(DEMO_CLASS_ENV) {
        return Ok(registry.into_iter().filter(|c| c.id == demo_id).collect());
    }
    Ok(registry)
}

pub fn create(paths: &DataPaths, name: &str, policy: CorruptPolicy) -> anyhow::Result<ClassRecord> {
    let record = ClassRecord {
        id: format!("class_{}", Uuid::new_v4()),
        name: name.to_string(),
        created_at: now_iso(),
        archived: false,
    };

    let mut registry = read_registry(paths, policy)?;
    registry.push(record.clone());
    write_registry(paths, &registry)?;

    let dir = paths.class_dir(&record.id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create class directory {}", dir.display()))?;

    Ok(record)
}

/// Rename and/or archive. Returns the updated record, `None` for an unknown
/// id.
pub fn rename(
    paths: &DataPaths,
    class_id: &str,
    new_name: &str,
    archived: bool,
    policy: CorruptPolicy,
) -> anyhow::Result<Option<ClassRecord>> {
    let mut registry = read_registry(paths, policy)?;
    let Some(record) = registry.iter_mut().find(|c| c.id == class_id) else {
        return Ok(None);
    };
    record.name = new_name.to_string();
    record.archived = archived;
    let updated = record.clone();
    write_registry(paths, &registry)?;
    Ok(Some(updated))
}

/// Remove the registry entry and the class directory. Returns `false` for an
/// unknown id. Irreversible except via backup restore.
pub fn delete(paths: &DataPaths, class_id: &str, policy: CorruptPolicy) -> anyhow::Result<bool> {
    let mut registry = read_registry(paths, policy)?;
    let before = registry.len();
    registry.retain(|c| c.id != class_id);
    if registry.len() == before {
        return Ok(false);
    }
    write_registry(paths, &registry)?;

    let dir = paths.class_dir(class_id);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("failed to remove class directory {}", dir.display()))?;
    }
    info!(class_id, "class deleted");
    Ok(true)
}

/// Early installations kept a single class flat at the data root. Move those
/// files into a `class_default` directory and seed the registry. Runs when a
/// workspace is selected; a no-op on migrated roots.
pub fn migrate_legacy_layout(paths: &DataPaths) -> anyhow::Result<bool> {
    let flat_students = paths.data_dir().join("students.json");
    if !flat_students.is_file() {
        return Ok(false);
    }

    let class_id = "class_default";
    let class_dir = paths.class_dir(class_id);
    std::fs::create_dir_all(&class_dir)
        .with_context(|| format!("failed to create {}", class_dir.display()))?;

    for file in [
        "students.json",
        "assignments.json",
        "email_log.json",
        "config.json",
    ] {
        let src = paths.data_dir().join(file);
        if src.is_file() {
            let dst = class_dir.join(file);
            std::fs::rename(&src, &dst)
                .with_context(|| format!("failed to move {} into {}", file, class_dir.display()))?;
        }
    }

    write_registry(
        paths,
        &[ClassRecord {
            id: class_id.to_string(),
            name: "Standardklasse".to_string(),
            created_at: now_iso(),
            archived: false,
        }],
    )?;
    info!("migrated flat legacy layout into {}", class_id);
    Ok(true)
}
