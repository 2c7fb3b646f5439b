//! Maps catalog items to constructors of empty sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::Source;
use crate::data_types::{
    bookmark, cookie, creditcard, download, extension, history, localstorage, password,
};
use crate::item::Item;

pub type Factory = Box<dyn Fn() -> Box<dyn Source>>;

/// Item → source constructor table. Construction is pure: factories only
/// allocate, they never touch the filesystem.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<Item, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `item`, replacing any earlier one.
    pub fn register<F>(&mut self, item: Item, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Source> + 'static,
    {
        self.factories.insert(item, Box::new(factory));
        self
    }

    pub fn contains(&self, item: Item) -> bool {
        self.factories.contains_key(&item)
    }

    pub fn create(&self, item: Item) -> Option<Box<dyn Source>> {
        self.factories.get(&item).map(|factory| factory())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Every built-in source, each reading its store from `profile_dir` when
    /// parsed.
    ///
    /// Chromium local and session storage are LevelDB stores and have no
    /// built-in source.
    pub fn builtin(profile_dir: impl Into<PathBuf>) -> Self {
        let profile_dir = profile_dir.into();
        let mut registry = Self::new();

        registry.register_store(&profile_dir, Item::ChromiumPassword, password::ChromiumPassword::new);
        registry.register_store(&profile_dir, Item::YandexPassword, password::YandexPassword::new);
        registry.register_store(&profile_dir, Item::FirefoxPassword, password::FirefoxPassword::new);
        registry.register_store(&profile_dir, Item::ChromiumCookie, cookie::ChromiumCookie::new);
        registry.register_store(&profile_dir, Item::FirefoxCookie, cookie::FirefoxCookie::new);
        registry.register_store(&profile_dir, Item::ChromiumBookmark, bookmark::ChromiumBookmark::new);
        registry.register_store(&profile_dir, Item::FirefoxBookmark, bookmark::FirefoxBookmark::new);
        registry.register_store(&profile_dir, Item::ChromiumHistory, history::ChromiumHistory::new);
        registry.register_store(&profile_dir, Item::FirefoxHistory, history::FirefoxHistory::new);
        registry.register_store(&profile_dir, Item::ChromiumDownload, download::ChromiumDownload::new);
        registry.register_store(&profile_dir, Item::FirefoxDownload, download::FirefoxDownload::new);
        registry.register_store(&profile_dir, Item::ChromiumCreditCard, creditcard::ChromiumCreditCard::new);
        registry.register_store(&profile_dir, Item::YandexCreditCard, creditcard::YandexCreditCard::new);
        registry.register_store(&profile_dir, Item::FirefoxLocalStorage, localstorage::FirefoxLocalStorage::new);
        registry.register_store(&profile_dir, Item::ChromiumExtension, extension::ChromiumExtension::new);
        registry.register_store(&profile_dir, Item::FirefoxExtension, extension::FirefoxExtension::new);

        registry
    }

    fn register_store<S, F>(&mut self, profile_dir: &Path, item: Item, build: F)
    where
        S: Source + 'static,
        F: Fn(PathBuf) -> S + 'static,
    {
        let profile_dir = profile_dir.to_path_buf();
        self.register(item, move || Box::new(build(profile_dir.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_skips_leveldb_stores() {
        let registry = Registry::builtin("/nonexistent/profile");
        assert_eq!(registry.len(), 16);
        assert!(registry.contains(Item::FirefoxLocalStorage));
        assert!(!registry.contains(Item::ChromiumLocalStorage));
        assert!(!registry.contains(Item::ChromiumSessionStorage));
    }

    #[test]
    fn test_create_returns_fresh_empty_source() {
        let registry = Registry::builtin("/nonexistent/profile");
        let source = registry.create(Item::ChromiumCookie).unwrap();
        assert_eq!(source.name(), "cookies");
        assert!(source.is_empty());
        assert!(registry.create(Item::ChromiumSessionStorage).is_none());
    }

    #[test]
    fn test_register_replaces_factory() {
        let mut registry = Registry::builtin("/nonexistent/profile");
        registry.register(Item::ChromiumHistory, || {
            Box::new(password::ChromiumPassword::new(PathBuf::new()))
        });
        assert_eq!(registry.len(), 16);
        let source = registry.create(Item::ChromiumHistory).unwrap();
        assert_eq!(source.name(), "passwords");
    }
}
