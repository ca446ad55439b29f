#[path = "../src/backup.rs"]
mod backup;
#[path = "../src/models.rs"]
mod models;
#[path = "../src/paths.rs"]
mod paths;
#[path = "../src/registry.rs"]
mod registry;
#[path = "../src/store.rs"]
mod store;

use paths::DataPaths;
use std::fs::File;
use store::CorruptPolicy;
use tempfile::tempdir;
use zip::write::FileOptions;
use zip::ZipWriter;

const LENIENT: CorruptPolicy = CorruptPolicy::UseDefault;

fn populated_root() -> (tempfile::TempDir, DataPaths, String) {
    let root = tempdir().expect("temp root");
    let paths = DataPaths::new(root.path());
    paths.init().expect("init layout");

    let record = registry::create(&paths, "Exportklasse", LENIENT).expect("create class");
    let mut doc = models::ClassDocument::default();
    doc.students.push(models::Student {
        id: "student_nils.berg".to_string(),
        anmeldename: "nils.berg".to_string(),
        vorname: "Nils".to_string(),
        nachname: "Berg".to_string(),
    });
    store::save(&paths, &record.id, &doc).expect("save class");
    (root, paths, record.id)
}

#[test]
fn export_places_the_registry_at_the_archive_root() {
    let (_root, paths, class_id) = populated_root();

    let zip_path = backup::export_zip(&paths).expect("export");
    assert_eq!(
        zip_path.file_name().and_then(|n| n.to_str()),
        Some("full_export.zip")
    );

    let mut archive = zip::ZipArchive::new(File::open(&zip_path).expect("open zip"))
        .expect("read zip");
    archive.by_name("classes.json").expect("registry at root");
    archive
        .by_name(&format!("classes/{}/students.json", class_id))
        .expect("class files below classes/");
}

#[test]
fn export_then_import_restores_the_data_root() {
    let (_root, paths, class_id) = populated_root();

    let zip_path = backup::export_zip(&paths).expect("export");
    let (original_doc, _) = store::load(&paths, &class_id, LENIENT).expect("load original");
    let original_registry = registry::list(&paths, LENIENT).expect("list original");

    // Move the export out of backups/ so the swap cannot disturb it, then
    // wreck the live data.
    let moved = paths.root().join("export-under-test.zip");
    std::fs::rename(&zip_path, &moved).expect("move export");
    registry::delete(&paths, &class_id, LENIENT).expect("delete class");

    backup::import_zip(&paths, &moved).expect("import");

    assert_eq!(registry::list(&paths, LENIENT).expect("list"), original_registry);
    let (doc, _) = store::load(&paths, &class_id, LENIENT).expect("load restored");
    assert_eq!(doc, original_doc);

    // Safety snapshot of the pre-import state exists.
    let listed = backup::list_snapshots(&paths).expect("list snapshots");
    let safety = listed.iter().find(|b| b.kind == "auto").expect("safety");
    let note = std::fs::read_to_string(safety.path.join("note.txt")).expect("note");
    assert_eq!(note, "Pre-import safety backup");
}

#[test]
fn import_rejects_archives_without_a_registry() {
    let (_root, paths, class_id) = populated_root();

    let bogus = paths.root().join("bogus.zip");
    let mut zip = ZipWriter::new(File::create(&bogus).expect("create zip"));
    zip.start_file("readme.txt", FileOptions::default())
        .expect("entry");
    use std::io::Write;
    zip.write_all(b"kein backup").expect("write entry");
    zip.finish().expect("finish zip");

    let err = backup::import_zip(&paths, &bogus).unwrap_err();
    assert!(format!("{:#}", err).contains("classes.json"));

    // Rejected before anything destructive: data intact, no safety snapshot.
    let (doc, _) = store::load(&paths, &class_id, LENIENT).expect("load");
    assert_eq!(doc.students.len(), 1);
    assert!(backup::list_snapshots(&paths).expect("list").is_empty());
}

#[test]
fn import_rejects_non_zip_files() {
    let (_root, paths, _class_id) = populated_root();

    let not_zip = paths.root().join("not-a-zip.zip");
    std::fs::write(&not_zip, "plain text").expect("write file");

    let err = backup::import_zip(&paths, &not_zip).unwrap_err();
    assert!(format!("{:#}", err).contains("invalid zip archive"));
}
