//! Catalog of extractable data categories.
//!
//! Each [`Item`] names one (browser family, data category) pair. The set is
//! closed; adding a category means adding a variant here and registering a
//! source factory for it in [`crate::browsing_data::Registry`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserFamily {
    Chromium,
    Yandex,
    Firefox,
}

impl BrowserFamily {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserFamily::Chromium => "Chromium",
            BrowserFamily::Yandex => "Yandex",
            BrowserFamily::Firefox => "Firefox",
        }
    }

    pub fn items(&self) -> &'static [Item] {
        match self {
            BrowserFamily::Chromium => Item::chromium_items(),
            BrowserFamily::Yandex => Item::yandex_items(),
            BrowserFamily::Firefox => Item::firefox_items(),
        }
    }
}

impl FromStr for BrowserFamily {
    type Err = ParseItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserFamily::Chromium),
            "yandex" => Ok(BrowserFamily::Yandex),
            "firefox" => Ok(BrowserFamily::Firefox),
            other => Err(ParseItemError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    ChromiumPassword,
    ChromiumCookie,
    ChromiumBookmark,
    ChromiumHistory,
    ChromiumDownload,
    ChromiumCreditCard,
    ChromiumLocalStorage,
    ChromiumSessionStorage,
    ChromiumExtension,

    YandexPassword,
    YandexCreditCard,

    FirefoxPassword,
    FirefoxCookie,
    FirefoxBookmark,
    FirefoxHistory,
    FirefoxDownload,
    FirefoxLocalStorage,
    FirefoxExtension,
}

const CHROMIUM_ITEMS: &[Item] = &[
    Item::ChromiumPassword,
    Item::ChromiumCookie,
    Item::ChromiumBookmark,
    Item::ChromiumHistory,
    Item::ChromiumDownload,
    Item::ChromiumCreditCard,
    Item::ChromiumLocalStorage,
    Item::ChromiumSessionStorage,
    Item::ChromiumExtension,
];

const YANDEX_ITEMS: &[Item] = &[Item::YandexPassword, Item::YandexCreditCard];

const FIREFOX_ITEMS: &[Item] = &[
    Item::FirefoxPassword,
    Item::FirefoxCookie,
    Item::FirefoxBookmark,
    Item::FirefoxHistory,
    Item::FirefoxDownload,
    Item::FirefoxLocalStorage,
    Item::FirefoxExtension,
];

impl Item {
    pub fn chromium_items() -> &'static [Item] {
        CHROMIUM_ITEMS
    }

    pub fn yandex_items() -> &'static [Item] {
        YANDEX_ITEMS
    }

    pub fn firefox_items() -> &'static [Item] {
        FIREFOX_ITEMS
    }

    pub fn all() -> impl Iterator<Item = Item> {
        CHROMIUM_ITEMS
            .iter()
            .chain(YANDEX_ITEMS)
            .chain(FIREFOX_ITEMS)
            .copied()
    }

    pub fn family(&self) -> BrowserFamily {
        match self {
            Item::ChromiumPassword
            | Item::ChromiumCookie
            | Item::ChromiumBookmark
            | Item::ChromiumHistory
            | Item::ChromiumDownload
            | Item::ChromiumCreditCard
            | Item::ChromiumLocalStorage
            | Item::ChromiumSessionStorage
            | Item::ChromiumExtension => BrowserFamily::Chromium,
            Item::YandexPassword | Item::YandexCreditCard => BrowserFamily::Yandex,
            Item::FirefoxPassword
            | Item::FirefoxCookie
            | Item::FirefoxBookmark
            | Item::FirefoxHistory
            | Item::FirefoxDownload
            | Item::FirefoxLocalStorage
            | Item::FirefoxExtension => BrowserFamily::Firefox,
        }
    }

    /// Store file candidates relative to a profile directory, most recent
    /// layout first.
    pub fn store_files(&self) -> &'static [&'static str] {
        match self {
            Item::ChromiumPassword => &["Login Data"],
            Item::ChromiumCookie => &["Network/Cookies", "Cookies"],
            Item::ChromiumBookmark => &["Bookmarks"],
            Item::ChromiumHistory | Item::ChromiumDownload => &["History"],
            Item::ChromiumCreditCard => &["Web Data"],
            Item::ChromiumLocalStorage => &["Local Storage/leveldb"],
            Item::ChromiumSessionStorage => &["Session Storage"],
            Item::ChromiumExtension => &["Secure Preferences", "Preferences"],
            Item::YandexPassword => &["Ya Passman Data"],
            Item::YandexCreditCard => &["Ya Credit Cards"],
            Item::FirefoxPassword => &["logins.json"],
            Item::FirefoxCookie => &["cookies.sqlite"],
            Item::FirefoxBookmark | Item::FirefoxHistory | Item::FirefoxDownload => {
                &["places.sqlite"]
            }
            Item::FirefoxLocalStorage => &["webappsstore.sqlite"],
            Item::FirefoxExtension => &["extensions.json"],
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Item::ChromiumPassword => "chromium-password",
            Item::ChromiumCookie => "chromium-cookie",
            Item::ChromiumBookmark => "chromium-bookmark",
            Item::ChromiumHistory => "chromium-history",
            Item::ChromiumDownload => "chromium-download",
            Item::ChromiumCreditCard => "chromium-creditcard",
            Item::ChromiumLocalStorage => "chromium-localstorage",
            Item::ChromiumSessionStorage => "chromium-sessionstorage",
            Item::ChromiumExtension => "chromium-extension",
            Item::YandexPassword => "yandex-password",
            Item::YandexCreditCard => "yandex-creditcard",
            Item::FirefoxPassword => "firefox-password",
            Item::FirefoxCookie => "firefox-cookie",
            Item::FirefoxBookmark => "firefox-bookmark",
            Item::FirefoxHistory => "firefox-history",
            Item::FirefoxDownload => "firefox-download",
            Item::FirefoxLocalStorage => "firefox-localstorage",
            Item::FirefoxExtension => "firefox-extension",
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item: {0}")]
pub struct ParseItemError(pub String);

impl FromStr for Item {
    type Err = ParseItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Item::all()
            .find(|item| item.id() == wanted)
            .ok_or(ParseItemError(wanted))
    }
}

/// Parse a comma-separated item list, skipping blanks.
pub fn parse_item_list(list: &str) -> Result<Vec<Item>, ParseItemError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Item::from_str)
        .collect()
}
