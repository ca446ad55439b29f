use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One entry in `data/classes.json`. Ids are `class_<uuid>`; the `archived`
/// flag is set on semester rollover and omitted from disk while false.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub archived: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Roster entry. The German field names are the on-disk contract shared with
/// the editing UI and the spreadsheet importer; collaborators derive `id`
/// from the login name (`student_<anmeldename>`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: String,
    #[serde(rename = "Anmeldename")]
    pub anmeldename: String,
    #[serde(rename = "Vorname")]
    pub vorname: String,
    #[serde(rename = "Nachname")]
    pub nachname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(rename = "maxPoints")]
    pub max_points: f64,
    #[serde(rename = "scaleType", default = "default_scale_type")]
    pub scale_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// student id -> grade in [1.0, 6.0]. Insertion-ordered.
    #[serde(default)]
    pub grades: Map<String, Value>,
    // points and comments were added after grades; deserializing with a
    // default materializes them once so no call site checks key presence.
    #[serde(default)]
    pub points: Map<String, Value>,
    #[serde(default)]
    pub comments: Map<String, Value>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_scale_type() -> String {
    "60% Scale".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        EmailSettings {
            smtp_server: "mail.bbw.ch".to_string(),
            smtp_port: 465,
            sender_email: String::new(),
        }
    }
}

/// Grading configuration. Stored per class in `config.json`, falling back to
/// `data/global_config.json` and finally to these built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
    /// scale name -> { threshold, label }. Insertion-ordered.
    #[serde(default = "default_scales")]
    pub scales: Map<String, Value>,
    /// assignment type -> default weight.
    #[serde(rename = "weightDefaults", default = "default_weight_defaults")]
    pub weight_defaults: Map<String, Value>,
    #[serde(default)]
    pub email: EmailSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            subjects: default_subjects(),
            scales: default_scales(),
            weight_defaults: default_weight_defaults(),
            email: EmailSettings::default(),
        }
    }
}

impl Config {
    pub fn scale_threshold(&self, scale_type: &str) -> Option<f64> {
        self.scales
            .get(scale_type)
            .and_then(|s| s.get("threshold"))
            .and_then(|v| v.as_f64())
    }

    pub fn scale_label(&self, scale_type: &str) -> Option<String> {
        self.scales
            .get(scale_type)
            .and_then(|s| s.get("label"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn default_weight_for(&self, assignment_type: &str) -> Option<f64> {
        self.weight_defaults
            .get(assignment_type)
            .and_then(|v| v.as_f64())
    }
}

fn default_subjects() -> Vec<String> {
    vec!["GESELLSCHAFT".to_string(), "SPRACHE".to_string()]
}

fn default_scales() -> Map<String, Value> {
    let mut scales = Map::new();
    scales.insert(
        "60% Scale".to_string(),
        json!({ "threshold": 0.6, "label": "Note 4 mit 60%" }),
    );
    scales.insert(
        "66% Scale".to_string(),
        json!({ "threshold": 0.66, "label": "Note 4 mit 66%" }),
    );
    scales.insert(
        "50% Scale".to_string(),
        json!({ "threshold": 0.5, "label": "Note 4 mit 50%" }),
    );
    scales
}

fn default_weight_defaults() -> Map<String, Value> {
    let mut weights = Map::new();
    weights.insert("Test".to_string(), json!(2.0));
    weights.insert("Lernpfad".to_string(), json!(1.0));
    weights.insert("Custom Assignment".to_string(), json!(0.5));
    weights
}

/// Audit trail entry. The log is newest-first and append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailLogEntry {
    pub timestamp: String,
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    /// "sent" or "failed".
    pub status: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub name: String,
    pub category: String,
    pub subject_line: String,
    pub body: String,
}

pub fn default_templates() -> Vec<Template> {
    vec![
        Template {
            name: "Standard Notenbericht".to_string(),
            category: "Bericht".to_string(),
            subject_line: "Notenbericht {subject}".to_string(),
            body: "Hallo {firstname},\n\nHier ist Ihre aktuelle Übersicht für {subject}.\n\n{grades_list}\n\nIhr Schnitt: {average}\n\nLieber Gruss\n{sender_name}".to_string(),
        },
        Template {
            name: "Warnung (Ungenügend)".to_string(),
            category: "Intervention".to_string(),
            subject_line: "WICHTIG: Notenstand {subject}".to_string(),
            body: "Hallo {firstname},\n\nLeider ist Ihr aktueller Schnitt in {subject} ungenügend ({average}).\n\nBitte melden Sie sich bei mir für einen Termin.\n\nLieber Gruss\n{sender_name}".to_string(),
        },
    ]
}

/// The full in-memory bundle for one class. Loaded on `classes.open`,
/// mutated wholesale by collaborators, persisted only on an explicit save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDocument {
    pub students: Vec<Student>,
    pub assignments: Vec<Assignment>,
    pub config: Config,
    pub email_log: Vec<EmailLogEntry>,
    pub audit_log: Vec<AuditEvent>,
}

pub fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
