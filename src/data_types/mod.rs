//! Built-in sources, one module per data category
//!
//! Supports: passwords, cookies, bookmarks, history, downloads, credit
//! cards, localStorage, extensions

pub mod bookmark;
pub mod cookie;
pub mod creditcard;
pub mod download;
pub mod extension;
pub mod history;
pub mod localstorage;
pub mod password;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::SourceError;
use crate::item::Item;

/// Microseconds between 1601-01-01 (WebKit epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

/// Chromium timestamps: microseconds since 1601-01-01. Zero means unset.
pub fn chromium_time(micros: i64) -> Option<DateTime<Utc>> {
    if micros == 0 {
        return None;
    }
    micros
        .checked_sub(WEBKIT_EPOCH_OFFSET_MICROS)
        .and_then(DateTime::from_timestamp_micros)
}

/// Firefox PRTime: microseconds since the Unix epoch. Zero means unset.
pub fn firefox_time(micros: i64) -> Option<DateTime<Utc>> {
    if micros == 0 {
        return None;
    }
    DateTime::from_timestamp_micros(micros)
}

pub fn unix_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

pub fn unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

/// First store candidate of `item` that exists under `profile_dir`.
pub fn store_path(profile_dir: &Path, item: Item) -> Result<PathBuf, SourceError> {
    item.store_files()
        .iter()
        .map(|name| profile_dir.join(name))
        .find(|path| path.exists())
        .ok_or_else(|| {
            SourceError::MissingStore(profile_dir.join(item.store_files().first().copied().unwrap_or_default()))
        })
}

/// A field that fails to decrypt is logged and left blank; the rest of the
/// row and the rest of the store are still kept.
pub(crate) fn decrypted_or_blank<T: Default>(decrypted: Result<T, SourceError>, field: &str, row: &str) -> T {
    decrypted.unwrap_or_else(|e| {
        warn!("Failed to decrypt {} of {}: {}", field, row, e);
        T::default()
    })
}
