//! Write-through event logs. Both logs are newest-first: every append loads
//! the file, prepends, and persists in the same operation as the mutation it
//! records. No batching.

use crate::models::{now_iso, AuditEvent, EmailLogEntry};
use crate::paths::DataPaths;
use crate::store::{self, CorruptPolicy, LoadReport};

/// Record an administrative action for a class and persist immediately.
/// Returns the updated log so a live session can refresh its copy.
pub fn append(
    paths: &DataPaths,
    class_id: &str,
    action: &str,
    details: &str,
    user: Option<&str>,
    policy: CorruptPolicy,
) -> anyhow::Result<Vec<AuditEvent>> {
    let event = AuditEvent {
        timestamp: now_iso(),
        user: user.unwrap_or("Teacher").to_string(),
        action: action.to_string(),
        details: details.to_string(),
    };

    let path = paths.audit_log_file(class_id);
    let mut report = LoadReport::default();
    let mut log: Vec<AuditEvent> = store::load_or_default(&path, policy, &mut report)?;
    log.insert(0, event);
    store::write_json_pretty(&path, &log)?;
    Ok(log)
}

/// Record an outbound-mail attempt (the sender collaborator reports both
/// successes and failures here).
pub fn append_email(
    paths: &DataPaths,
    class_id: &str,
    mut entry: EmailLogEntry,
    policy: CorruptPolicy,
) -> anyhow::Result<Vec<EmailLogEntry>> {
    if entry.timestamp.is_empty() {
        entry.timestamp = now_iso();
    }

    let path = paths.email_log_file(class_id);
    let mut report = LoadReport::default();
    let mut log: Vec<EmailLogEntry> = store::load_or_default(&path, policy, &mut report)?;
    log.insert(0, entry);
    store::write_json_pretty(&path, &log)?;
    Ok(log)
}

/// Most recent email entry for a student/subject pair, if any. The log is
/// newest-first, so the first hit wins.
pub fn last_email_status<'a>(
    log: &'a [EmailLogEntry],
    student_id: &str,
    subject: &str,
) -> Option<&'a EmailLogEntry> {
    log.iter()
        .find(|e| e.student_id == student_id && e.subject == subject)
}
