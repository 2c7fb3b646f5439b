//! Browsing history, most visited first.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chromium_time, firefox_time, store_path};
use crate::browsing_data::{RecordSet, Source};
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "VisitCount")]
    pub visit_count: i64,
    #[serde(rename = "LastVisitTime")]
    pub last_visit_time: Option<DateTime<Utc>>,
}

const CHROMIUM_QUERY: &str =
    "SELECT url, COALESCE(title, ''), visit_count, COALESCE(last_visit_time, 0) FROM urls";
const FIREFOX_QUERY: &str = "SELECT url, COALESCE(title, ''), visit_count, COALESCE(last_visit_date, 0)
     FROM moz_places WHERE visit_count > 0";

fn read_history(
    db_path: &Path,
    query: &str,
    to_time: fn(i64) -> Option<DateTime<Utc>>,
) -> Result<Vec<HistoryEntry>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(query)?;

    let rows = stmt.query_map([], |row| {
        Ok(HistoryEntry {
            url: row.get(0)?,
            title: row.get(1)?,
            visit_count: row.get(2)?,
            last_visit_time: to_time(row.get(3)?),
        })
    })?;

    let mut history = rows.collect::<Result<Vec<_>, _>>()?;
    history.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then_with(|| b.last_visit_time.cmp(&a.last_visit_time))
    });
    Ok(history)
}

pub struct ChromiumHistory {
    profile_dir: PathBuf,
    history: Vec<HistoryEntry>,
}

impl ChromiumHistory {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            history: Vec::new(),
        }
    }
}

impl Source for ChromiumHistory {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.history.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumHistory)?;
        self.history = read_history(&path, CHROMIUM_QUERY, chromium_time)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "history"
    }

    fn len(&self) -> usize {
        self.history.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.history
    }
}

pub struct FirefoxHistory {
    profile_dir: PathBuf,
    history: Vec<HistoryEntry>,
}

impl FirefoxHistory {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            history: Vec::new(),
        }
    }
}

impl Source for FirefoxHistory {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.history.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxHistory)?;
        self.history = read_history(&path, FIREFOX_QUERY, firefox_time)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "history"
    }

    fn len(&self) -> usize {
        self.history.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.history
    }
}
