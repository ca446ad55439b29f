use std::path::{Path, PathBuf};

/// Filesystem layout below a selected workspace root:
///
/// ```text
/// <root>/data/classes.json
/// <root>/data/global_config.json
/// <root>/data/templates.json
/// <root>/data/classes/<classId>/*.json
/// <root>/backups/backup_<kind>_<timestamp>/
/// ```
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataPaths { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.data_dir().join("classes")
    }

    pub fn class_dir(&self, class_id: &str) -> PathBuf {
        self.classes_dir().join(class_id)
    }

    pub fn registry_file(&self) -> PathBuf {
        self.data_dir().join("classes.json")
    }

    pub fn global_config_file(&self) -> PathBuf {
        self.data_dir().join("global_config.json")
    }

    pub fn templates_file(&self) -> PathBuf {
        self.data_dir().join("templates.json")
    }

    pub fn students_file(&self, class_id: &str) -> PathBuf {
        self.class_dir(class_id).join("students.json")
    }

    pub fn assignments_file(&self, class_id: &str) -> PathBuf {
        self.class_dir(class_id).join("assignments.json")
    }

    pub fn class_config_file(&self, class_id: &str) -> PathBuf {
        self.class_dir(class_id).join("config.json")
    }

    pub fn email_log_file(&self, class_id: &str) -> PathBuf {
        self.class_dir(class_id).join("email_log.json")
    }

    pub fn audit_log_file(&self, class_id: &str) -> PathBuf {
        self.class_dir(class_id).join("audit_log.json")
    }

    /// Create the directory skeleton. Safe to call repeatedly.
    pub fn init(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.classes_dir())?;
        std::fs::create_dir_all(self.backups_dir())?;
        Ok(())
    }
}
