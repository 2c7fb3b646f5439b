//! Installed extensions
//!
//! Chromium lists them under `extensions.settings` in (Secure) Preferences;
//! Firefox keeps an `addons` array in `extensions.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::store_path;
use crate::browsing_data::{RecordSet, Source};
use crate::error::SourceError;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "HomepageURL")]
    pub homepage_url: String,
    #[serde(rename = "Enabled")]
    pub enabled: bool,
}

/// Chromium `location` values for component and external-component
/// extensions shipped with the browser itself.
const CHROMIUM_BUILTIN_LOCATIONS: [i64; 2] = [5, 10];

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Newer profiles drop `state` and record a list (older: a bitmask) of
/// disable reasons instead.
fn has_disable_reasons(setting: &serde_json::Value) -> bool {
    match setting.get("disable_reasons") {
        Some(serde_json::Value::Array(reasons)) => !reasons.is_empty(),
        Some(v) => v.as_i64().unwrap_or(0) != 0,
        None => false,
    }
}

fn parse_chromium_extensions(prefs: &serde_json::Value) -> Vec<Extension> {
    let Some(settings) = prefs
        .pointer("/extensions/settings")
        .and_then(|v| v.as_object())
    else {
        return Vec::new();
    };

    let mut extensions: Vec<Extension> = settings
        .iter()
        .filter_map(|(id, setting)| {
            let location = setting.get("location").and_then(|v| v.as_i64()).unwrap_or(0);
            if CHROMIUM_BUILTIN_LOCATIONS.contains(&location) {
                return None;
            }
            let manifest = setting.get("manifest")?;
            let enabled = match setting.get("state").and_then(|v| v.as_i64()) {
                Some(state) => state == 1,
                None => !has_disable_reasons(setting),
            };
            Some(Extension {
                id: id.clone(),
                name: str_field(manifest, "name"),
                description: str_field(manifest, "description"),
                version: str_field(manifest, "version"),
                homepage_url: str_field(manifest, "homepage_url"),
                enabled,
            })
        })
        .collect();

    extensions.sort_by(|a, b| a.name.cmp(&b.name));
    extensions
}

pub struct ChromiumExtension {
    profile_dir: PathBuf,
    extensions: Vec<Extension>,
}

impl ChromiumExtension {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            extensions: Vec::new(),
        }
    }
}

impl Source for ChromiumExtension {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.extensions.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumExtension)?;
        let content = std::fs::read_to_string(&path)?;
        let prefs: serde_json::Value = serde_json::from_str(&content)?;
        self.extensions = parse_chromium_extensions(&prefs);
        Ok(())
    }

    fn name(&self) -> &str {
        "extensions"
    }

    fn len(&self) -> usize {
        self.extensions.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.extensions
    }
}

#[derive(Debug, Deserialize)]
struct AddonsFile {
    #[serde(default)]
    addons: Vec<Addon>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Addon {
    id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    location: String,
    #[serde(default)]
    default_locale: AddonLocale,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonLocale {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "homepageURL", default)]
    homepage_url: Option<String>,
}

/// Add-on locations for system add-ons bundled with Firefox.
const FIREFOX_BUILTIN_LOCATIONS: [&str; 2] = ["app-builtin", "app-system-defaults"];

pub struct FirefoxExtension {
    profile_dir: PathBuf,
    extensions: Vec<Extension>,
}

impl FirefoxExtension {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            extensions: Vec::new(),
        }
    }
}

impl Source for FirefoxExtension {
    fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
        self.extensions.clear();
        let path = store_path(&self.profile_dir, Item::FirefoxExtension)?;
        let content = std::fs::read_to_string(&path)?;
        let file: AddonsFile = serde_json::from_str(&content)?;

        let mut extensions: Vec<Extension> = file
            .addons
            .into_iter()
            .filter(|addon| !FIREFOX_BUILTIN_LOCATIONS.contains(&addon.location.as_str()))
            .map(|addon| Extension {
                id: addon.id,
                name: addon.default_locale.name,
                description: addon.default_locale.description.unwrap_or_default(),
                version: addon.version,
                homepage_url: addon.default_locale.homepage_url.unwrap_or_default(),
                enabled: addon.active,
            })
            .collect();
        extensions.sort_by(|a, b| a.name.cmp(&b.name));
        self.extensions = extensions;
        Ok(())
    }

    fn name(&self) -> &str {
        "extensions"
    }

    fn len(&self) -> usize {
        self.extensions.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromium_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = serde_json::json!({
            "extensions": {
                "settings": {
                    "aaa": {"location": 1, "state": 1, "manifest": {"name": "Blocker", "version": "1.2", "description": "Blocks"}},
                    "bbb": {"location": 1, "disable_reasons": [1], "manifest": {"name": "Another", "version": "0.1"}},
                    "ccc": {"location": 5, "manifest": {"name": "Builtin"}},
                    "ddd": {"location": 1}
                }
            }
        });
        std::fs::write(dir.path().join("Secure Preferences"), prefs.to_string()).unwrap();

        let mut source = ChromiumExtension::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.extensions[0].name, "Another");
        assert!(!source.extensions[0].enabled);
        assert_eq!(source.extensions[1].id, "aaa");
        assert!(source.extensions[1].enabled);
    }

    #[test]
    fn test_firefox_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let addons = serde_json::json!({
            "schemaVersion": 36,
            "addons": [
                {"id": "ublock@example", "version": "1.5", "active": true, "location": "app-profile",
                 "defaultLocale": {"name": "uBlock", "description": "Ads", "homepageURL": "https://ublock.example"}},
                {"id": "formautofill@mozilla.org", "version": "1.0", "active": true, "location": "app-builtin",
                 "defaultLocale": {"name": "Form Autofill"}}
            ]
        });
        std::fs::write(dir.path().join("extensions.json"), addons.to_string()).unwrap();

        let mut source = FirefoxExtension::new(dir.path().to_path_buf());
        source.parse(&[]).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.extensions[0].homepage_url, "https://ublock.example");
        assert!(source.extensions[0].enabled);
    }
}
