//! Cookies
//!
//! Supports Chromium (encrypted values) and Firefox (plaintext) stores.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{chromium_time, decrypted_or_blank, firefox_time, store_path, unix_seconds};
use crate::browsing_data::{RecordSet, Source};
use crate::crypto;
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

/// From this schema version on, Chromium prepends SHA-256(host_key) to the
/// plaintext before encrypting a cookie value.
const HOST_DIGEST_DB_VERSION: i64 = 24;
const HOST_DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "KeyName")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "IsSecure")]
    pub is_secure: bool,
    #[serde(rename = "IsHTTPOnly")]
    pub is_http_only: bool,
    #[serde(rename = "HasExpire")]
    pub has_expire: bool,
    #[serde(rename = "IsPersistent")]
    pub is_persistent: bool,
    #[serde(rename = "CreateDate")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(rename = "ExpireDate")]
    pub expire_date: Option<DateTime<Utc>>,
}

fn sort_cookies(cookies: &mut [Cookie]) {
    cookies.sort_by(|a, b| {
        a.host
            .cmp(&b.host)
            .then_with(|| b.create_date.cmp(&a.create_date))
    });
}

/// `meta.version` of a Chromium cookie store. Stores without a `meta` table
/// predate versioning and count as version 0.
fn schema_version(conn: &Connection) -> Result<i64, SourceError> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
            row.get::<_, Value>(0)
        })
        .optional();

    let version = match value {
        Ok(Some(Value::Integer(v))) => v,
        Ok(Some(Value::Text(v))) => v.trim().parse().unwrap_or_else(|_| {
            debug!("Unparseable cookie schema version {:?}", v);
            0
        }),
        Ok(_) => 0,
        Err(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.starts_with("no such table") => {
            debug!("Cookie store has no meta table: {}", msg);
            0
        }
        Err(e) => return Err(e.into()),
    };
    Ok(version)
}

fn read_chromium_cookies(db_path: &Path, master_key: &[u8]) -> Result<Vec<Cookie>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let conn = snapshot.conn();

    let version = schema_version(conn)?;

    let mut stmt = conn.prepare(
        "SELECT name, value, encrypted_value, host_key, path, creation_utc, expires_utc,
                is_secure, is_httponly, has_expires, is_persistent
         FROM cookies",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Vec<u8>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, bool>(7)?,
            row.get::<_, bool>(8)?,
            row.get::<_, bool>(9)?,
            row.get::<_, bool>(10)?,
        ))
    })?;

    let mut cookies = Vec::new();
    for row in rows {
        let (name, plain_value, encrypted, host, path, created, expires, secure, http_only, has_expire, persistent) = row?;

        let value = if encrypted.is_empty() {
            plain_value
        } else {
            let mut plain = decrypted_or_blank(
                crypto::decrypt_chromium_data(master_key, &encrypted),
                "cookie value",
                &format!("{} {}{}", name, host, path),
            );
            if version >= HOST_DIGEST_DB_VERSION && crypto::is_encrypted(&encrypted) && plain.len() >= HOST_DIGEST_LEN {
                plain.drain(..HOST_DIGEST_LEN);
            }
            String::from_utf8_lossy(&plain).into_owned()
        };

        cookies.push(Cookie {
            host,
            path,
            name,
            value,
            is_secure: secure,
            is_http_only: http_only,
            has_expire,
            is_persistent: persistent,
            create_date: chromium_time(created),
            expire_date: chromium_time(expires),
        });
    }

    sort_cookies(&mut cookies);
    debug!("Read {} cookies from {:?} (schema version {})", cookies.len(), db_path, version);
    Ok(cookies)
}

pub struct ChromiumCookie {
    profile_dir: PathBuf,
    cookies: Vec<Cookie>,
}

impl ChromiumCookie {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            cookies: Vec::new(),
        }
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

impl Source for ChromiumCookie {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.cookies.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumCookie)?;
        self.cookies = read_chromium_cookies(&path, master_key)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "cookies"
    }

    fn len(&self) -> usize {
        self.cookies.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.cookies
    }
}

fn read_firefox_cookies(db_path: &Path) -> Result<Vec<Cookie>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(
        "SELECT name, value, host, path, creationTime, expiry, isSecure, isHttpOnly FROM moz_cookies",
    )?;

    let rows = stmt.query_map([], |row| {
        let expiry: i64 = row.get(5)?;
        Ok(Cookie {
            name: row.get(0)?,
            value: row.get(1)?,
            host: row.get(2)?,
            path: row.get(3)?,
            create_date: firefox_time(row.get(4)?),
            expire_date: unix_seconds(expiry),
            is_secure: row.get(6)?,
            is_http_only: row.get(7)?,
            has_expire: expiry != 0,
            is_persistent: expiry != 0,
        })
    })?;

    let mut cookies = rows.collect::<Result<Vec<_>, _>>()?;
    sort_cookies(&mut cookies);
    Ok(cookies)
}

pub struct FirefoxCookie {
    profile_dir: PathBuf,
    cookies: Vec<Cookie>,
}

impl FirefoxCookie {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            cookies: Vec::new(),
        }
    }
}

impl Source for FirefoxCookie {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.cookies.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxCookie)?;
        self.cookies = read_firefox_cookies(&path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "cookies"
    }

    fn len(&self) -> usize {
        self.cookies.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.cookies
    }
}
