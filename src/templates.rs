//! Message template storage (`data/templates.json`). Rendering and sending
//! live in the email collaborator; the daemon only persists the texts.

use crate::models::{default_templates, Template};
use crate::paths::DataPaths;
use crate::store::{self, CorruptPolicy, LoadReport};

pub fn list(paths: &DataPaths, policy: CorruptPolicy) -> anyhow::Result<Vec<Template>> {
    let path = paths.templates_file();
    if !path.is_file() {
        return Ok(default_templates());
    }
    let mut report = LoadReport::default();
    let templates: Vec<Template> = store::load_or_default(&path, policy, &mut report)?;
    if !report.corrupt.is_empty() {
        return Ok(default_templates());
    }
    Ok(templates)
}

/// Replace any template with the same name, then append.
pub fn upsert(
    paths: &DataPaths,
    template: Template,
    policy: CorruptPolicy,
) -> anyhow::Result<Vec<Template>> {
    let mut templates = list(paths, policy)?;
    templates.retain(|t| t.name != template.name);
    templates.push(template);
    store::write_json_pretty(&paths.templates_file(), &templates)?;
    Ok(templates)
}

pub fn delete(paths: &DataPaths, name: &str, policy: CorruptPolicy) -> anyhow::Result<Vec<Template>> {
    let mut templates = list(paths, policy)?;
    templates.retain(|t| t.name != name);
    store::write_json_pretty(&paths.templates_file(), &templates)?;
    Ok(templates)
}
