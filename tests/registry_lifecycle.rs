#[path = "../src/models.rs"]
mod models;
#[path = "../src/paths.rs"]
mod paths;
#[path = "../src/registry.rs"]
mod registry;
#[path = "../src/store.rs"]
mod store;

use models::Config;
use paths::DataPaths;
use store::CorruptPolicy;
use tempfile::tempdir;

const LENIENT: CorruptPolicy = CorruptPolicy::UseDefault;

#[test]
fn create_list_rename_delete() {
    let root = tempdir().expect("temp root");
    let paths = DataPaths::new(root.path());
    paths.init().expect("init layout");

    let a = registry::create(&paths, "4PK26a", LENIENT).expect("create a");
    let b = registry::create(&paths, "4PK26b", LENIENT).expect("create b");
    let c = registry::create(&paths, "BM1 2025", LENIENT).expect("create c");

    assert_ne!(a.id, b.id);
    assert!(a.id.starts_with("class_"));
    assert!(paths.class_dir(&a.id).is_dir());

    // Creation order is preserved.
    let listed = registry::list(&paths, LENIENT).expect("list");
    assert_eq!(
        listed.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]
    );
    assert!(listed.iter().all(|r| !r.archived));

    // Semester rollover: rename + archive flag.
    let renamed = registry::rename(&paths, &b.id, "4PK26b (Archiv)", true, LENIENT)
        .expect("rename")
        .expect("record");
    assert_eq!(renamed.name, "4PK26b (Archiv)");
    assert!(renamed.archived);

    assert!(registry::rename(&paths, "class_nope", "x", false, LENIENT)
        .expect("rename unknown")
        .is_none());

    // Delete removes the record and the directory.
    assert!(registry::delete(&paths, &a.id, LENIENT).expect("delete"));
    assert!(!paths.class_dir(&a.id).exists());
    let listed = registry::list(&paths, LENIENT).expect("list");
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.id != a.id));

    assert!(!registry::delete(&paths, &a.id, LENIENT).expect("delete again"));
}

#[test]
fn opening_a_deleted_class_yields_an_empty_document() {
    let root = tempdir().expect("temp root");
    let paths = DataPaths::new(root.path());
    paths.init().expect("init layout");

    let record = registry::create(&paths, "Kurzlebig", LENIENT).expect("create");
    let doc = models::ClassDocument {
        students: vec![models::Student {
            id: "student_a.b".to_string(),
            anmeldename: "a.b".to_string(),
            vorname: "A".to_string(),
            nachname: "B".to_string(),
        }],
        ..Default::default()
    };
    store::save(&paths, &record.id, &doc).expect("save");

    registry::delete(&paths, &record.id, LENIENT).expect("delete");

    let (reloaded, _) = store::load(&paths, &record.id, LENIENT).expect("load after delete");
    assert!(reloaded.students.is_empty());
    assert_eq!(reloaded.config, Config::default());
}

#[test]
fn flat_legacy_root_is_migrated_once() {
    let root = tempdir().expect("temp root");
    let paths = DataPaths::new(root.path());
    paths.init().expect("init layout");

    std::fs::write(
        paths.data_dir().join("students.json"),
        r#"[{"id": "student_old.timer", "Anmeldename": "old.timer", "Vorname": "Old", "Nachname": "Timer"}]"#,
    )
    .expect("write flat students");
    std::fs::write(paths.data_dir().join("assignments.json"), "[]").expect("write flat assignments");

    assert!(registry::migrate_legacy_layout(&paths).expect("migrate"));

    // Flat files moved into the default class.
    assert!(!paths.data_dir().join("students.json").exists());
    let (doc, _) = store::load(&paths, "class_default", LENIENT).expect("load migrated");
    assert_eq!(doc.students.len(), 1);
    assert_eq!(doc.students[0].anmeldename, "old.timer");

    let listed = registry::list(&paths, LENIENT).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "class_default");
    assert_eq!(listed[0].name, "Standardklasse");

    // Second run is a no-op.
    assert!(!registry::migrate_legacy_layout(&paths).expect("migrate again"));
}
