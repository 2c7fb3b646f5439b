//! Read-only access to browser databases.
//!
//! A running browser keeps its SQLite stores locked, so stores are never
//! opened in place. The database (and its `-wal` / `-journal` companions,
//! when present) is copied into a private temp directory and the copy is
//! opened instead. The copies are removed when the [`Snapshot`] is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::SourceError;

const COMPANION_SUFFIXES: [&str; 2] = ["-wal", "-journal"];

pub struct Snapshot {
    // Declared before `files` so the connection closes before the copies
    // are removed.
    conn: Connection,
    files: TempCopies,
}

impl Snapshot {
    pub fn open(db_path: &Path) -> Result<Self, SourceError> {
        if !db_path.is_file() {
            return Err(SourceError::MissingStore(db_path.to_path_buf()));
        }

        let db_name = db_path
            .file_name()
            .ok_or_else(|| SourceError::MissingStore(db_path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();

        let temp_dir = std::env::temp_dir().join("browser-data-export");
        fs::create_dir_all(&temp_dir)?;
        let temp_db_path = temp_dir.join(format!("{}_{}.tmp", db_name.replace(' ', "_"), uuid::Uuid::new_v4()));

        debug!("Creating temporary copy of {:?} at {:?}", db_path, temp_db_path);
        let mut files = TempCopies(Vec::new());
        fs::copy(db_path, &temp_db_path)?;
        files.0.push(temp_db_path.clone());

        for suffix in COMPANION_SUFFIXES {
            let companion = with_suffix(db_path, suffix);
            if companion.exists() {
                let target = with_suffix(&temp_db_path, suffix);
                if fs::copy(&companion, &target).is_ok() {
                    files.0.push(target);
                }
            }
        }

        let conn = Connection::open(&temp_db_path)?;
        Ok(Self { conn, files })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.files.0[0]
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

struct TempCopies(Vec<PathBuf>);

impl Drop for TempCopies {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = fs::remove_file(path);
        }
        // SQLite may have created these next to the copy.
        if let Some(db) = self.0.first() {
            let _ = fs::remove_file(with_suffix(db, "-shm"));
            let _ = fs::remove_file(with_suffix(db, "-wal"));
        }
    }
}
