// Exporting with an empty directory writes into the working directory.
// Kept in its own test binary since it changes the process cwd.

use std::fs;
use std::path::Path;

use browser_data_export::browsing_data::{BrowsingData, OutputFormat, Registry};
use browser_data_export::item::Item;
use rusqlite::Connection;

#[test]
fn test_export_to_empty_dir_uses_working_directory() {
    let profile = tempfile::tempdir().unwrap();
    let conn = Connection::open(profile.path().join("places.sqlite")).unwrap();
    conn.execute_batch(
        "CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT, title TEXT, visit_count INTEGER, last_visit_date INTEGER);
         INSERT INTO moz_places VALUES (1, 'https://example.com/', 'Example', 1, 0);",
    )
    .unwrap();
    drop(conn);

    let cwd = tempfile::tempdir().unwrap();
    std::env::set_current_dir(cwd.path()).unwrap();

    let mut data = BrowsingData::new(&[Item::FirefoxHistory], &Registry::builtin(profile.path()));
    data.recovery(&[]);
    let report = data.export(Path::new(""), "Firefox", OutputFormat::from_flag("json"));

    assert!(report.is_success(), "{:?}", report);
    let written = fs::read_to_string(cwd.path().join("Firefox_history.json")).unwrap();
    assert!(written.contains("\"URL\": \"https://example.com/\""));
}
