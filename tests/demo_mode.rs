#[path = "../src/models.rs"]
mod models;
#[path = "../src/paths.rs"]
mod paths;
#[path = "../src/registry.rs"]
mod registry;
#[path = "../src/store.rs"]
mod store;

use paths::DataPaths;
use store::CorruptPolicy;
use tempfile::tempdir;

// Runs alone in this binary: the toggle is process-wide.
#[test]
fn demo_toggle_restricts_listing_to_one_class() {
    let root = tempdir().expect("temp root");
    let paths = DataPaths::new(root.path());
    paths.init().expect("init layout");

    let lenient = CorruptPolicy::UseDefault;
    let demo = registry::create(&paths, "Demo Class 2025", lenient).expect("create demo");
    registry::create(&paths, "4PK26a", lenient).expect("create other");

    std::env::set_var(registry::DEMO_CLASS_ENV, &demo.id);
    let listed = registry::list(&paths, lenient).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, demo.id);

    std::env::remove_var(registry::DEMO_CLASS_ENV);
    let listed = registry::list(&paths, lenient).expect("list");
    assert_eq!(listed.len(), 2);
}
