use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::models::{Assignment, AuditEvent, ClassDocument, Config, EmailLogEntry, Student};
use crate::paths::DataPaths;

/// What to do when a bundle file exists but does not parse. Missing files are
/// silent defaults either way; only malformed content is policy-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptPolicy {
    UseDefault,
    Error,
}

impl CorruptPolicy {
    pub fn parse(s: &str) -> Option<CorruptPolicy> {
        match s {
            "default" => Some(CorruptPolicy::UseDefault),
            "error" => Some(CorruptPolicy::Error),
            _ => None,
        }
    }
}

/// Files that were malformed and replaced by defaults during a load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub corrupt: Vec<String>,
}

enum FileState<T> {
    Loaded(T),
    Missing,
    Corrupt(String),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> FileState<T> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return FileState::Missing,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable file, treating as missing");
            return FileState::Missing;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => FileState::Loaded(v),
        Err(e) => FileState::Corrupt(e.to_string()),
    }
}

/// Read one bundle file. Missing -> default; malformed -> per policy.
pub fn load_or_default<T>(
    path: &Path,
    policy: CorruptPolicy,
    report: &mut LoadReport,
) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    match read_json(path) {
        FileState::Loaded(v) => Ok(v),
        FileState::Missing => Ok(T::default()),
        FileState::Corrupt(e) => match policy {
            CorruptPolicy::UseDefault => {
                warn!(path = %path.display(), error = %e, "malformed file, using default");
                report.corrupt.push(path.display().to_string());
                Ok(T::default())
            }
            CorruptPolicy::Error => bail!("corrupt file {}: {}", path.display(), e),
        },
    }
}

/// UTF-8, two-space indentation, non-ASCII stored literally.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Load the full document bundle for one class. A registry entry without a
/// directory yields an empty document, not an error.
pub fn load(
    paths: &DataPaths,
    class_id: &str,
    policy: CorruptPolicy,
) -> anyhow::Result<(ClassDocument, LoadReport)> {
    let mut report = LoadReport::default();
    let students: Vec<Student> =
        load_or_default(&paths.students_file(class_id), policy, &mut report)?;
    let assignments: Vec<Assignment> =
        load_or_default(&paths.assignments_file(class_id), policy, &mut report)?;
    let email_log: Vec<EmailLogEntry> =
        load_or_default(&paths.email_log_file(class_id), policy, &mut report)?;
    let audit_log: Vec<AuditEvent> =
        load_or_default(&paths.audit_log_file(class_id), policy, &mut report)?;
    let config = load_config(paths, class_id, policy, &mut report)?;

    Ok((
        ClassDocument {
            students,
            assignments,
            config,
            email_log,
            audit_log,
        },
        report,
    ))
}

/// Per-class override, then the global fallback, then the built-in default.
fn load_config(
    paths: &DataPaths,
    class_id: &str,
    policy: CorruptPolicy,
    report: &mut LoadReport,
) -> anyhow::Result<Config> {
    let class_path = paths.class_config_file(class_id);
    match read_json::<Config>(&class_path) {
        FileState::Loaded(c) => return Ok(c),
        FileState::Missing => {}
        FileState::Corrupt(e) => match policy {
            CorruptPolicy::UseDefault => {
                warn!(path = %class_path.display(), error = %e, "malformed class config, falling back");
                report.corrupt.push(class_path.display().to_string());
            }
            CorruptPolicy::Error => bail!("corrupt file {}: {}", class_path.display(), e),
        },
    }

    let global_path = paths.global_config_file();
    match read_json::<Config>(&global_path) {
        FileState::Loaded(c) => Ok(c),
        FileState::Missing => Ok(Config::default()),
        FileState::Corrupt(e) => match policy {
            CorruptPolicy::UseDefault => {
                warn!(path = %global_path.display(), error = %e, "malformed global config, using default");
                report.corrupt.push(global_path.display().to_string());
                Ok(Config::default())
            }
            CorruptPolicy::Error => bail!("corrupt file {}: {}", global_path.display(), e),
        },
    }
}

/// Persist every bundle file for one class, creating its directory on the
/// first save. All writes are attempted even after a failure; there is no
/// rollback. The document's config is also mirrored to the global fallback.
pub fn save(paths: &DataPaths, class_id: &str, doc: &ClassDocument) -> anyhow::Result<()> {
    let class_dir = paths.class_dir(class_id);
    std::fs::create_dir_all(&class_dir)
        .with_context(|| format!("failed to create class directory {}", class_dir.display()))?;

    let mut failed: Vec<String> = Vec::new();
    let mut attempt = |path: std::path::PathBuf, res: anyhow::Result<()>| {
        if let Err(e) = res {
            warn!(path = %path.display(), error = %e, "bundle write failed");
            failed.push(path.display().to_string());
        }
    };

    let p = paths.students_file(class_id);
    attempt(p.clone(), write_json_pretty(&p, &doc.students));
    let p = paths.assignments_file(class_id);
    attempt(p.clone(), write_json_pretty(&p, &doc.assignments));
    let p = paths.class_config_file(class_id);
    attempt(p.clone(), write_json_pretty(&p, &doc.config));
    let p = paths.email_log_file(class_id);
    attempt(p.clone(), write_json_pretty(&p, &doc.email_log));
    let p = paths.audit_log_file(class_id);
    attempt(p.clone(), write_json_pretty(&p, &doc.audit_log));
    let p = paths.global_config_file();
    attempt(p.clone(), write_json_pretty(&p, &doc.config));

    if !failed.is_empty() {
        bail!("failed to write: {}", failed.join(", "));
    }
    Ok(())
}
