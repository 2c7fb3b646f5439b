//! Download history extraction
//!
//! Supports Chromium and Firefox browsers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chromium_time, firefox_time, store_path, unix_millis};
use crate::browsing_data::{RecordSet, Source};
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

/// Download entry from browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "TargetPath")]
    pub target_path: String,
    #[serde(rename = "TotalBytes")]
    pub total_bytes: i64,
    #[serde(rename = "StartTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "EndTime")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "State")]
    pub state: String,
}

fn chromium_state(state: i32) -> &'static str {
    match state {
        0 => "In Progress",
        1 => "Complete",
        2 => "Cancelled",
        3 => "Interrupted",
        _ => "Unknown",
    }
}

fn firefox_state(state: i64) -> &'static str {
    match state {
        0 => "In Progress",
        1 => "Complete",
        3 => "Failed",
        4 => "Cancelled",
        _ => "Unknown",
    }
}

fn sort_downloads(downloads: &mut [Download]) {
    downloads.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}

/// Extract downloads from Chromium-based browser
fn read_chromium_downloads(db_path: &Path) -> Result<Vec<Download>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(
        "SELECT tab_url, target_path, total_bytes, start_time, COALESCE(end_time, 0), state
         FROM downloads",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Download {
            url: row.get(0)?,
            target_path: row.get(1)?,
            total_bytes: row.get(2)?,
            start_time: chromium_time(row.get(3)?),
            end_time: chromium_time(row.get(4)?),
            state: chromium_state(row.get(5)?).to_string(),
        })
    })?;

    let mut downloads = rows.collect::<Result<Vec<_>, _>>()?;
    sort_downloads(&mut downloads);
    Ok(downloads)
}

/// `downloads/metaData` annotation content.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirefoxDownloadMeta {
    #[serde(default)]
    state: i64,
    #[serde(default)]
    end_time: i64,
    #[serde(default)]
    file_size: i64,
}

/// Extract downloads from Firefox
///
/// Firefox stores downloads in places.sqlite as moz_annos on the source URL.
fn read_firefox_downloads(db_path: &Path) -> Result<Vec<Download>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(
        "SELECT p.url, dest.content, COALESCE(dest.dateAdded, 0), meta.content
         FROM moz_places p
         JOIN moz_annos dest ON dest.place_id = p.id
             AND dest.anno_attribute_id =
                 (SELECT id FROM moz_anno_attributes WHERE name = 'downloads/destinationFileURI')
         LEFT JOIN moz_annos meta ON meta.place_id = p.id
             AND meta.anno_attribute_id =
                 (SELECT id FROM moz_anno_attributes WHERE name = 'downloads/metaData')",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut downloads = Vec::new();
    for row in rows {
        let (url, dest_uri, added, meta) = row?;
        let meta: FirefoxDownloadMeta = meta
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or_default();

        downloads.push(Download {
            url,
            target_path: dest_uri
                .strip_prefix("file://")
                .unwrap_or(&dest_uri)
                .to_string(),
            total_bytes: meta.file_size,
            start_time: firefox_time(added),
            end_time: unix_millis(meta.end_time),
            state: firefox_state(meta.state).to_string(),
        });
    }

    sort_downloads(&mut downloads);
    Ok(downloads)
}

pub struct ChromiumDownload {
    profile_dir: PathBuf,
    downloads: Vec<Download>,
}

impl ChromiumDownload {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            downloads: Vec::new(),
        }
    }
}

impl Source for ChromiumDownload {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.downloads.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumDownload)?;
        self.downloads = read_chromium_downloads(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "downloads"
    }

    fn len(&self) -> usize {
        self.downloads.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.downloads
    }
}

pub struct FirefoxDownload {
    profile_dir: PathBuf,
    downloads: Vec<Download>,
}

impl FirefoxDownload {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            downloads: Vec::new(),
        }
    }
}

impl Source for FirefoxDownload {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.downloads.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxDownload)?;
        self.downloads = read_firefox_downloads(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "downloads"
    }

    fn len(&self) -> usize {
        self.downloads.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.downloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_chromium_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("History")).unwrap();
        conn.execute_batch(
            "CREATE TABLE downloads (id INTEGER PRIMARY KEY, tab_url TEXT, target_path TEXT, total_bytes INTEGER,
                start_time INTEGER, end_time INTEGER, state INTEGER);
             INSERT INTO downloads VALUES (1, 'https://a.example/f.zip', '/tmp/f.zip', 1024, 13300000000000000, 13300000001000000, 1);
             INSERT INTO downloads VALUES (2, 'https://a.example/g.zip', '/tmp/g.zip', 0, 13200000000000000, NULL, 2);",
        )
        .unwrap();
        drop(conn);

        let mut source = ChromiumDownload::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.downloads[0].state, "Complete");
        assert_eq!(source.downloads[0].total_bytes, 1024);
        assert_eq!(source.downloads[1].state, "Cancelled");
        assert_eq!(source.downloads[1].end_time, None);
    }

    #[test]
    fn test_firefox_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("places.sqlite")).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT);
             CREATE TABLE moz_anno_attributes (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE moz_annos (id INTEGER PRIMARY KEY, place_id INTEGER, anno_attribute_id INTEGER, content TEXT, dateAdded INTEGER);
             INSERT INTO moz_places VALUES (1, 'https://dl.example/a.iso');
             INSERT INTO moz_anno_attributes VALUES (1, 'downloads/destinationFileURI');
             INSERT INTO moz_anno_attributes VALUES (2, 'downloads/metaData');
             INSERT INTO moz_annos VALUES (1, 1, 1, 'file:///home/u/a.iso', 1700000000000000);
             INSERT INTO moz_annos VALUES (2, 1, 2, '{"state":1,"endTime":1700000005000,"fileSize":42}', 1700000000000000);"#,
        )
        .unwrap();
        drop(conn);

        let mut source = FirefoxDownload::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();
        assert_eq!(source.len(), 1);
        let dl = &source.downloads[0];
        assert_eq!(dl.target_path, "/home/u/a.iso");
        assert_eq!(dl.total_bytes, 42);
        assert_eq!(dl.state, "Complete");
        assert_eq!(dl.end_time.unwrap().timestamp(), 1_700_000_005);
    }
}
