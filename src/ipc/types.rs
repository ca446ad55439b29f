use serde::Deserialize;

use crate::models::ClassDocument;
use crate::paths::DataPaths;
use crate::store::CorruptPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The working copy of one class. Collaborators mutate `document` through
/// `document.update` and persist it with an explicit `document.save`; an
/// interruption before the save discards the edits by design.
pub struct Session {
    pub class_id: String,
    pub document: ClassDocument,
    pub dirty: bool,
    /// Bundle files that were malformed and replaced by defaults at load.
    pub warnings: Vec<String>,
}

pub struct AppState {
    pub paths: Option<DataPaths>,
    pub corrupt_policy: CorruptPolicy,
    pub session: Option<Session>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            paths: None,
            corrupt_policy: CorruptPolicy::UseDefault,
            session: None,
        }
    }
}
