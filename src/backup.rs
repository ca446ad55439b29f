use anyhow::{anyhow, bail, Context};
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::paths::DataPaths;

pub const RETAIN_SNAPSHOTS: usize = 30;
pub const EXPORT_FILE_NAME: &str = "full_export.zip";
const NAME_TS_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const IMPORT_STAGING_DIR: &str = "temp_import";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Auto,
    Manual,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Auto => "auto",
            SnapshotKind::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<SnapshotKind> {
        match s {
            "auto" => Some(SnapshotKind::Auto),
            "manual" => Some(SnapshotKind::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub name: String,
    pub kind: String,
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
    pub size_mb: f64,
}

/// Parse `backup_<kind>_<YYYY-MM-DD>_<HH-MM-SS>`. `None` for anything else;
/// unparseable directories are invisible to listing and retention.
fn parse_backup_name(name: &str) -> Option<(String, NaiveDateTime)> {
    let rest = name.strip_prefix("backup_")?;
    let parts: Vec<&str> = rest.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    let ts = format!("{}_{}", parts[parts.len() - 2], parts[parts.len() - 1]);
    let timestamp = NaiveDateTime::parse_from_str(&ts, NAME_TS_FORMAT).ok()?;
    let kind = parts[..parts.len() - 2].join("_");
    Some((kind, timestamp))
}

/// Copy the entire data root into `backups/backup_<kind>_<timestamp>`.
/// Same-second collisions bump the timestamp forward so names stay unique,
/// parseable, and ordered. Retention runs afterwards.
pub fn create_snapshot(
    paths: &DataPaths,
    kind: SnapshotKind,
    note: Option<&str>,
) -> anyhow::Result<BackupInfo> {
    let data_dir = paths.data_dir();
    if !data_dir.is_dir() {
        bail!("data root not found: {}", data_dir.display());
    }
    let backups_dir = paths.backups_dir();
    std::fs::create_dir_all(&backups_dir)
        .with_context(|| format!("failed to create {}", backups_dir.display()))?;

    let mut timestamp = truncate_to_second(chrono::Local::now().naive_local());
    let (name, backup_path) = loop {
        let name = format!(
            "backup_{}_{}",
            kind.as_str(),
            timestamp.format(NAME_TS_FORMAT)
        );
        let path = backups_dir.join(&name);
        if !path.exists() {
            break (name, path);
        }
        timestamp += chrono::Duration::seconds(1);
    };

    copy_dir_recursive(&data_dir, &backup_path)
        .with_context(|| format!("failed to copy data root into {}", backup_path.display()))?;

    if let Some(note) = note.filter(|n| !n.is_empty()) {
        std::fs::write(backup_path.join("note.txt"), note)
            .with_context(|| format!("failed to write note for {}", name))?;
    }

    let pruned = prune_old(paths)?;
    if pruned > 0 {
        info!(pruned, "retention removed old snapshots");
    }
    info!(name = %name, "snapshot created");

    Ok(BackupInfo {
        kind: kind.as_str().to_string(),
        timestamp,
        size_mb: dir_size_mb(&backup_path),
        path: backup_path,
        name,
    })
}

fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    use chrono::Timelike;
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Delete the oldest parseable snapshots beyond the retention limit.
fn prune_old(paths: &DataPaths) -> anyhow::Result<usize> {
    let mut snapshots = list_snapshots(paths)?;
    if snapshots.len() <= RETAIN_SNAPSHOTS {
        return Ok(0);
    }
    // Newest-first; everything past the limit goes, oldest first.
    let excess: Vec<BackupInfo> = snapshots.split_off(RETAIN_SNAPSHOTS);
    let mut removed = 0;
    for old in excess.iter().rev() {
        match std::fs::remove_dir_all(&old.path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %old.path.display(), error = %e, "failed to prune snapshot"),
        }
    }
    Ok(removed)
}

/// Snapshot metadata, newest first. Directory names that fail to parse are
/// skipped silently.
pub fn list_snapshots(paths: &DataPaths) -> anyhow::Result<Vec<BackupInfo>> {
    let backups_dir = paths.backups_dir();
    let mut snapshots: Vec<BackupInfo> = Vec::new();
    if !backups_dir.is_dir() {
        return Ok(snapshots);
    }

    for entry in std::fs::read_dir(&backups_dir)
        .with_context(|| format!("failed to read {}", backups_dir.display()))?
    {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Some((kind, timestamp)) = parse_backup_name(&name) else {
            continue;
        };
        snapshots.push(BackupInfo {
            size_mb: dir_size_mb(&entry.path()),
            path: entry.path(),
            name,
            kind,
            timestamp,
        });
    }

    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(snapshots)
}

/// Replace the entire data root with a snapshot's contents. A safety
/// snapshot of the current state is taken first, then the snapshot is staged
/// next to the live root and swapped in; a failed swap rolls the old root
/// back automatically. Callers must discard any in-memory session state.
pub fn restore_snapshot(paths: &DataPaths, name: &str) -> anyhow::Result<()> {
    let source = paths.backups_dir().join(name);
    if parse_backup_name(name).is_none() || !source.is_dir() {
        bail!("backup no longer exists: {}", name);
    }

    // Stage first: the safety snapshot below runs retention, which may prune
    // the very snapshot being restored once it is the oldest.
    let staging = stage_incoming(paths, &source)?;

    create_snapshot(paths, SnapshotKind::Auto, Some("Pre-restore safety backup"))
        .context("failed to take pre-restore safety snapshot")?;

    swap_staged(paths, &staging)?;
    info!(name, "snapshot restored");
    Ok(())
}

/// Copy an incoming tree into a staging sibling of the data root.
fn stage_incoming(paths: &DataPaths, incoming: &Path) -> anyhow::Result<PathBuf> {
    let staging = paths.root().join("data.staging");
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("failed to clear {}", staging.display()))?;
    }
    copy_dir_recursive(incoming, &staging)
        .with_context(|| format!("failed to stage {}", incoming.display()))?;
    Ok(staging)
}

/// Swap a fully staged tree into place as `data/`. The live root is moved
/// aside, the staged tree renamed in, and the old root deleted only after
/// the swap succeeds; a failed swap moves the old root back automatically.
fn swap_staged(paths: &DataPaths, staging: &Path) -> anyhow::Result<()> {
    let data_dir = paths.data_dir();
    let retired = paths.root().join("data.old");

    if retired.exists() {
        std::fs::remove_dir_all(&retired)
            .with_context(|| format!("failed to clear {}", retired.display()))?;
    }

    let had_data = data_dir.exists();
    if had_data {
        std::fs::rename(&data_dir, &retired)
            .with_context(|| format!("failed to move {} aside", data_dir.display()))?;
    }

    if let Err(e) = std::fs::rename(staging, &data_dir) {
        if had_data {
            if let Err(rb) = std::fs::rename(&retired, &data_dir) {
                warn!(error = %rb, "rollback of data root failed; recover from the safety snapshot");
            }
        }
        return Err(anyhow!(e))
            .with_context(|| format!("failed to swap staged data into {}", data_dir.display()));
    }

    if had_data {
        if let Err(e) = std::fs::remove_dir_all(&retired) {
            warn!(path = %retired.display(), error = %e, "failed to remove retired data root");
        }
    }
    Ok(())
}

/// Zip the data root for download. The archive's root holds the contents of
/// `data/` directly (`classes.json` top-level). Overwrites a prior export.
pub fn export_zip(paths: &DataPaths) -> anyhow::Result<PathBuf> {
    let data_dir = paths.data_dir();
    if !data_dir.is_dir() {
        bail!("data root not found: {}", data_dir.display());
    }
    let backups_dir = paths.backups_dir();
    std::fs::create_dir_all(&backups_dir)
        .with_context(|| format!("failed to create {}", backups_dir.display()))?;

    let out_path = backups_dir.join(EXPORT_FILE_NAME);
    if out_path.exists() {
        std::fs::remove_file(&out_path)
            .with_context(|| format!("failed to remove prior export {}", out_path.display()))?;
    }

    let out_file = File::create(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(&data_dir).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(&data_dir)
            .context("walked path outside data root")?;
        let entry_name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", entry_name), opts)
                .with_context(|| format!("failed to add directory entry {}", entry_name))?;
        } else {
            zip.start_file(&entry_name, opts)
                .with_context(|| format!("failed to start entry {}", entry_name))?;
            let mut f = File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?;
            std::io::copy(&mut f, &mut zip)
                .with_context(|| format!("failed to write entry {}", entry_name))?;
        }
    }

    zip.finish().context("failed to finalize export archive")?;
    info!(path = %out_path.display(), "data root exported");
    Ok(out_path)
}

/// Restore the system from an exported archive. The archive is extracted
/// into a staging directory and rejected unless the class registry sits at
/// its root; only then is a safety snapshot taken and the root swapped.
pub fn import_zip(paths: &DataPaths, zip_path: &Path) -> anyhow::Result<()> {
    let backups_dir = paths.backups_dir();
    std::fs::create_dir_all(&backups_dir)
        .with_context(|| format!("failed to create {}", backups_dir.display()))?;

    let staging = backups_dir.join(IMPORT_STAGING_DIR);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("failed to clear {}", staging.display()))?;
    }
    std::fs::create_dir_all(&staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;

    let result = extract_and_swap(paths, zip_path, &staging);
    if staging.exists() {
        if let Err(e) = std::fs::remove_dir_all(&staging) {
            warn!(path = %staging.display(), error = %e, "failed to remove import staging");
        }
    }
    result?;
    info!(path = %zip_path.display(), "archive imported");
    Ok(())
}

fn extract_and_swap(paths: &DataPaths, zip_path: &Path, staging: &Path) -> anyhow::Result<()> {
    let in_file = File::open(zip_path)
        .with_context(|| format!("failed to open archive {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read zip entry")?;
        let Some(rel) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            // Entries that would escape the staging root are dropped.
            warn!(entry = %entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let target = staging.join(rel);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let mut out = File::create(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            std::io::copy(&mut entry, &mut out)
                .with_context(|| format!("failed to extract {}", target.display()))?;
        }
    }

    if !staging.join("classes.json").is_file() {
        bail!("invalid backup format (classes.json missing at archive root)");
    }

    let staged = stage_incoming(paths, staging)?;

    create_snapshot(paths, SnapshotKind::Auto, Some("Pre-import safety backup"))
        .context("failed to take pre-import safety snapshot")?;

    swap_staged(paths, &staged)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("walked path outside source root")?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

fn dir_size_mb(path: &Path) -> f64 {
    let mut total: u64 = 0;
    for entry in WalkDir::new(path).into_iter().flatten() {
        if entry.file_type().is_file() {
            if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
    }
    ((total as f64 / 1024.0 / 1024.0) * 100.0).round() / 100.0
}
