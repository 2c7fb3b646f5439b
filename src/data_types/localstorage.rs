//! Firefox localStorage from `webappsstore.sqlite`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::store_path;
use crate::browsing_data::{RecordSet, Source};
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Turn an origin key such as `moc.elpmaxe.www.:https:443` back into
/// `https://www.example.com:443`.
pub fn origin_from_key(origin_key: &str) -> String {
    let mut parts = origin_key.splitn(3, ':');
    let reversed_host = parts.next().unwrap_or_default();
    let host: String = reversed_host
        .trim_end_matches('.')
        .chars()
        .rev()
        .collect();

    match (parts.next(), parts.next()) {
        (Some(scheme), Some(port)) if !port.is_empty() => format!("{}://{}:{}", scheme, host, port),
        (Some(scheme), _) if !scheme.is_empty() => format!("{}://{}", scheme, host),
        _ => host,
    }
}

fn read_firefox_storage(db_path: &Path) -> Result<Vec<StorageEntry>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot
        .conn()
        .prepare("SELECT originKey, key, value FROM webappsstore2")?;

    let rows = stmt.query_map([], |row| {
        Ok(StorageEntry {
            url: origin_from_key(&row.get::<_, String>(0)?),
            key: row.get(1)?,
            value: row.get(2)?,
        })
    })?;

    let entries = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub struct FirefoxLocalStorage {
    profile_dir: PathBuf,
    entries: Vec<StorageEntry>,
}

impl FirefoxLocalStorage {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            entries: Vec::new(),
        }
    }
}

impl Source for FirefoxLocalStorage {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.entries.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxLocalStorage)?;
        self.entries = read_firefox_storage(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "localstorage"
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.entries
    }
}
