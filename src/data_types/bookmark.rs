//! Bookmarks
//!
//! Chromium keeps a JSON tree in `Bookmarks`; Firefox keeps rows in
//! `places.sqlite`. Both are flattened to one row per URL bookmark with the
//! name of the folder it lives in.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{chromium_time, firefox_time, store_path};
use crate::browsing_data::{RecordSet, Source};
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Folder")]
    pub folder: String,
    #[serde(rename = "DateAdded")]
    pub date_added: Option<DateTime<Utc>>,
}

fn sort_bookmarks(bookmarks: &mut [Bookmark]) {
    bookmarks.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(a.id.cmp(&b.id)));
}

// Helper functions for Chromium JSON parsing
fn parse_chromium_bookmarks(json: &serde_json::Value) -> Vec<Bookmark> {
    let mut bookmarks = Vec::new();

    if let Some(roots) = json.get("roots").and_then(|v| v.as_object()) {
        for root in roots.values() {
            let folder = root.get("name").and_then(|v| v.as_str()).unwrap_or("");
            parse_chromium_node_recursive(root, folder, &mut bookmarks);
        }
    }

    bookmarks
}

fn parse_chromium_node_recursive(node: &serde_json::Value, folder: &str, bookmarks: &mut Vec<Bookmark>) {
    let Some(children) = node.get("children").and_then(|v| v.as_array()) else {
        return;
    };

    for child in children {
        let name = child.get("name").and_then(|v| v.as_str()).unwrap_or("");
        match child.get("type").and_then(|v| v.as_str()) {
            Some("folder") => parse_chromium_node_recursive(child, name, bookmarks),
            Some("url") => {
                let Some(url) = child.get("url").and_then(|v| v.as_str()) else {
                    continue;
                };
                bookmarks.push(Bookmark {
                    id: string_number(child.get("id")),
                    name: name.to_string(),
                    url: url.to_string(),
                    folder: folder.to_string(),
                    date_added: chromium_time(string_number(child.get("date_added"))),
                });
            }
            _ => {}
        }
    }
}

/// Chromium writes ids and timestamps as JSON strings.
fn string_number(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0),
        Some(v) => v.as_i64().unwrap_or(0),
        None => 0,
    }
}

pub struct ChromiumBookmark {
    profile_dir: PathBuf,
    bookmarks: Vec<Bookmark>,
}

impl ChromiumBookmark {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            bookmarks: Vec::new(),
        }
    }
}

impl Source for ChromiumBookmark {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.bookmarks.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumBookmark)?;
        let content = std::fs::read_to_string(&path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;

        let mut bookmarks = parse_chromium_bookmarks(&json);
        sort_bookmarks(&mut bookmarks);
        debug!("Read {} bookmarks from {:?}", bookmarks.len(), path);
        self.bookmarks = bookmarks;
        Ok(())
    }

    fn name(&self) -> &str {
        "bookmarks"
    }

    fn len(&self) -> usize {
        self.bookmarks.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.bookmarks
    }
}

fn read_firefox_bookmarks(db_path: &Path) -> Result<Vec<Bookmark>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(
        "SELECT b.id, COALESCE(b.title, ''), p.url, COALESCE(f.title, ''), COALESCE(b.dateAdded, 0)
         FROM moz_bookmarks b
         JOIN moz_places p ON b.fk = p.id
         LEFT JOIN moz_bookmarks f ON b.parent = f.id
         WHERE b.type = 1",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Bookmark {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            folder: row.get(3)?,
            date_added: firefox_time(row.get(4)?),
        })
    })?;

    let mut bookmarks = rows.collect::<Result<Vec<_>, _>>()?;
    sort_bookmarks(&mut bookmarks);
    debug!("Read {} bookmarks from Firefox database", bookmarks.len());
    Ok(bookmarks)
}

pub struct FirefoxBookmark {
    profile_dir: PathBuf,
    bookmarks: Vec<Bookmark>,
}

impl FirefoxBookmark {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            bookmarks: Vec::new(),
        }
    }
}

impl Source for FirefoxBookmark {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.bookmarks.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxBookmark)?;
        self.bookmarks = read_firefox_bookmarks(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "bookmarks"
    }

    fn len(&self) -> usize {
        self.bookmarks.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.bookmarks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_chromium_tree_is_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let tree = serde_json::json!({
            "roots": {
                "bookmark_bar": {
                    "name": "Bookmarks bar",
                    "type": "folder",
                    "children": [
                        {"id": "5", "name": "Rust", "type": "url", "url": "https://rust-lang.org", "date_added": "13300000000000000"},
                        {"id": "6", "name": "Work", "type": "folder", "children": [
                            {"id": "7", "name": "Docs", "type": "url", "url": "https://docs.rs", "date_added": "13200000000000000"}
                        ]}
                    ]
                },
                "other": {"name": "Other", "type": "folder", "children": []}
            },
            "version": 1
        });
        std::fs::write(dir.path().join("Bookmarks"), tree.to_string()).unwrap();

        let mut source = ChromiumBookmark::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();

        assert_eq!(source.len(), 2);
        assert_eq!(source.bookmarks[0].name, "Rust");
        assert_eq!(source.bookmarks[0].folder, "Bookmarks bar");
        assert_eq!(source.bookmarks[1].url, "https://docs.rs");
        assert_eq!(source.bookmarks[1].folder, "Work");
        assert_eq!(source.bookmarks[1].id, 7);
    }

    #[test]
    fn test_firefox_bookmarks() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("places.sqlite")).unwrap();
        conn.execute_batch(
            "CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT, title TEXT, visit_count INTEGER, last_visit_date INTEGER);
             CREATE TABLE moz_bookmarks (id INTEGER PRIMARY KEY, type INTEGER, fk INTEGER, parent INTEGER, title TEXT, dateAdded INTEGER);
             INSERT INTO moz_places VALUES (1, 'https://mozilla.org', 'Mozilla', 3, 0);
             INSERT INTO moz_bookmarks VALUES (2, 2, NULL, 1, 'toolbar', 0);
             INSERT INTO moz_bookmarks VALUES (10, 1, 1, 2, 'Mozilla', 1700000000000000);",
        )
        .unwrap();
        drop(conn);

        let mut source = FirefoxBookmark::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.bookmarks[0].folder, "toolbar");
        assert_eq!(source.bookmarks[0].url, "https://mozilla.org");
    }
}
