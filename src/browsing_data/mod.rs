//! Extraction orchestration: owns one source per requested item, decrypts
//! them in one batch and exports whatever they yielded.
//!
//! Every batch is best-effort. A source that fails to parse, serialize or
//! persist is reported and skipped; the remaining sources still run. The
//! [`Report`] returned by each batch lists what happened per source, in item
//! order, so callers can decide whether any failure matters to them.

mod output;
mod registry;
mod reporter;

pub use output::{encode_csv, encode_json, filename, OutputFormat, Outputter, RecordSet};
pub use registry::{Factory, Registry};
pub use reporter::{Reporter, Stage, TracingReporter};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use crate::error::SourceError;
use crate::item::Item;

/// One extractable data category: parses its store, then holds the
/// decrypted records.
pub trait Source {
    /// Populate records using `master_key`. A store with no relevant rows
    /// is not an error; `len()` just stays 0.
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError>;

    /// Stable, filesystem-safe category name.
    fn name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> &dyn RecordSet;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub item: Item,
    pub name: String,
    pub status: Status,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }
}

/// Per-source outcomes of one batch, ordered by item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    /// True when no source failed. Skips do not count as failures.
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(Outcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == Status::Success)
    }

    pub fn status_of(&self, item: Item) -> Option<&Status> {
        self.outcomes
            .iter()
            .find(|o| o.item == item)
            .map(|o| &o.status)
    }

    fn push(&mut self, item: Item, name: &str, status: Status) {
        self.outcomes.push(Outcome {
            item,
            name: name.to_string(),
            status,
        });
    }
}

/// The sources of one run, keyed by item.
pub struct BrowsingData {
    sources: BTreeMap<Item, Box<dyn Source>>,
    unsupported: Vec<Item>,
    reporter: Rc<dyn Reporter>,
}

impl BrowsingData {
    pub fn new(items: &[Item], registry: &Registry) -> Self {
        Self::with_reporter(items, registry, Rc::new(TracingReporter))
    }

    /// Build one fresh source per distinct item. Items the registry has no
    /// factory for are left out without error and listed by
    /// [`BrowsingData::unsupported`].
    pub fn with_reporter(items: &[Item], registry: &Registry, reporter: Rc<dyn Reporter>) -> Self {
        let mut sources = BTreeMap::new();
        let mut unsupported = Vec::new();

        for &item in items {
            match registry.create(item) {
                Some(source) => {
                    sources.insert(item, source);
                }
                None => {
                    if !unsupported.contains(&item) {
                        reporter.skipped(item, item.id(), Stage::Construct, "no source registered");
                        unsupported.push(item);
                    }
                }
            }
        }

        Self {
            sources,
            unsupported,
            reporter,
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, item: Item) -> bool {
        self.sources.contains_key(&item)
    }

    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.sources.keys().copied()
    }

    pub fn source(&self, item: Item) -> Option<&dyn Source> {
        self.sources.get(&item).map(|s| s.as_ref())
    }

    pub fn unsupported(&self) -> &[Item] {
        &self.unsupported
    }

    /// Parse every source with `master_key`. Never stops early.
    pub fn recovery(&mut self, master_key: &[u8]) -> Report {
        let mut report = Report::default();

        for (&item, source) in self.sources.iter_mut() {
            match source.parse(master_key) {
                Ok(()) => {
                    let detail = format!("{} records", source.len());
                    self.reporter
                        .success(item, source.name(), Stage::Recovery, &detail);
                    report.push(item, source.name(), Status::Success);
                }
                Err(e) => {
                    let reason = e.to_string();
                    self.reporter
                        .failure(item, source.name(), Stage::Recovery, &reason);
                    report.push(item, source.name(), Status::Failed(reason));
                }
            }
        }

        report
    }

    /// Write each non-empty source to `dir/{label}_{name}.{ext}`. An empty
    /// `dir` writes into the working directory.
    pub fn export(&self, dir: &Path, browser_label: &str, format: OutputFormat) -> Report {
        let output = Outputter::new(format);
        let mut report = Report::default();

        for (&item, source) in &self.sources {
            let name = source.name();
            if source.is_empty() {
                self.reporter.skipped(item, name, Stage::Export, "no records");
                report.push(item, name, Status::Skipped("no records".to_string()));
                continue;
            }

            let filename = filename(browser_label, name, output.extension());
            match write_file(&output, source.as_ref(), dir, &filename) {
                Ok(()) => {
                    let path = dir.join(&filename);
                    self.reporter.success(
                        item,
                        name,
                        Stage::Export,
                        &format!("output to file {}", path.display()),
                    );
                    report.push(item, name, Status::Success);
                }
                Err(reason) => {
                    self.reporter.failure(item, name, Stage::Export, &reason);
                    report.push(item, name, Status::Failed(reason));
                }
            }
        }

        report
    }

    /// Name → pretty JSON for every non-empty source.
    pub fn to_json_map(&self) -> BTreeMap<String, String> {
        self.render_map(Outputter::new(OutputFormat::Json))
    }

    /// Name → BOM-prefixed CSV for every non-empty source.
    pub fn to_csv_map(&self) -> BTreeMap<String, String> {
        self.render_map(Outputter::new(OutputFormat::Csv))
    }

    fn render_map(&self, output: Outputter) -> BTreeMap<String, String> {
        let mut rendered = BTreeMap::new();

        for (&item, source) in &self.sources {
            if source.is_empty() {
                continue;
            }
            match output.render(source.as_ref()) {
                Ok(text) => {
                    rendered.insert(source.name().to_string(), text);
                }
                Err(e) => {
                    self.reporter
                        .failure(item, source.name(), Stage::Serialize, &e.to_string());
                }
            }
        }

        rendered
    }
}

/// Serializes fully before the target is opened, so a source that fails to
/// serialize leaves any earlier export of it untouched.
fn write_file(output: &Outputter, source: &dyn Source, dir: &Path, filename: &str) -> Result<(), String> {
    let mut buf = Vec::new();
    output
        .write(source, &mut buf)
        .map_err(|e| format!("serialize {} error {}", filename, e))?;

    let mut file = output
        .create_file(dir, filename)
        .map_err(|e| format!("create file {} error {}", filename, e))?;
    file.write_all(&buf)
        .map_err(|e| format!("write to file {} error {}", filename, e))?;
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|e| format!("close file {} error {}", filename, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Fixed {
        name: &'static str,
        rows: Vec<String>,
        fill: Vec<String>,
        fail: bool,
    }

    impl Source for Fixed {
        fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
            if self.fail {
                return Err(SourceError::Decrypt("bad key".to_string()));
            }
            self.rows = self.fill.clone();
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }

        fn len(&self) -> usize {
            self.rows.len()
        }

        fn records(&self) -> &dyn RecordSet {
            &self.rows
        }
    }

    #[derive(Default)]
    struct Recording {
        events: RefCell<Vec<String>>,
    }

    impl Reporter for Recording {
        fn success(&self, _item: Item, name: &str, stage: Stage, _detail: &str) {
            self.events.borrow_mut().push(format!("ok {stage} {name}"));
        }

        fn failure(&self, _item: Item, name: &str, stage: Stage, _reason: &str) {
            self.events.borrow_mut().push(format!("fail {stage} {name}"));
        }

        fn skipped(&self, _item: Item, name: &str, stage: Stage, _reason: &str) {
            self.events.borrow_mut().push(format!("skip {stage} {name}"));
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Item::ChromiumPassword, || {
            Box::new(Fixed {
                name: "passwords",
                fill: vec!["secret".to_string()],
                ..Default::default()
            })
        });
        registry.register(Item::ChromiumCookie, || {
            Box::new(Fixed {
                name: "cookies",
                fail: true,
                ..Default::default()
            })
        });
        registry.register(Item::FirefoxHistory, || {
            Box::new(Fixed {
                name: "history",
                ..Default::default()
            })
        });
        registry
    }

    #[test]
    fn test_duplicates_collapse_and_unknown_items_skip() {
        let data = BrowsingData::new(
            &[
                Item::ChromiumPassword,
                Item::ChromiumPassword,
                Item::YandexPassword,
                Item::YandexPassword,
            ],
            &registry(),
        );
        assert_eq!(data.len(), 1);
        assert!(data.contains(Item::ChromiumPassword));
        assert!(!data.contains(Item::YandexPassword));
        assert_eq!(data.unsupported(), &[Item::YandexPassword]);
    }

    #[test]
    fn test_recovery_continues_past_failures() {
        let reporter = Rc::new(Recording::default());
        let mut data = BrowsingData::with_reporter(
            &[Item::ChromiumCookie, Item::ChromiumPassword],
            &registry(),
            reporter.clone(),
        );

        let report = data.recovery(b"key");

        assert_eq!(data.source(Item::ChromiumPassword).unwrap().len(), 1);
        assert_eq!(data.source(Item::ChromiumCookie).unwrap().len(), 0);
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.status_of(Item::ChromiumPassword), Some(&Status::Success));
        assert_eq!(
            report.status_of(Item::ChromiumCookie),
            Some(&Status::Failed("decryption failed: bad key".to_string()))
        );
        assert_eq!(
            *reporter.events.borrow(),
            vec!["ok parse passwords".to_string(), "fail parse cookies".to_string()]
        );
    }

    #[test]
    fn test_recovery_twice_keeps_state_consistent() {
        let mut data = BrowsingData::new(&[Item::ChromiumPassword], &registry());
        data.recovery(b"key");
        data.recovery(b"key");
        assert_eq!(data.source(Item::ChromiumPassword).unwrap().len(), 1);
    }

    #[test]
    fn test_maps_skip_empty_sources() {
        let mut data = BrowsingData::new(
            &[Item::ChromiumPassword, Item::FirefoxHistory],
            &registry(),
        );
        data.recovery(b"key");

        let json = data.to_json_map();
        assert_eq!(json.keys().collect::<Vec<_>>(), vec!["passwords"]);
        assert_eq!(json["passwords"], "[\n    \"secret\"\n  ]\n");

        let csv = data.to_csv_map();
        assert_eq!(csv.len(), 1);
        assert!(csv["passwords"].starts_with('\u{feff}'));
    }

    #[test]
    fn test_export_skips_empty_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = BrowsingData::new(
            &[Item::ChromiumPassword, Item::FirefoxHistory],
            &registry(),
        );
        data.recovery(b"key");

        let report = data.export(dir.path(), "Chrome", OutputFormat::Json);

        assert!(report.is_success());
        assert_eq!(report.succeeded().count(), 1);
        assert!(matches!(
            report.status_of(Item::FirefoxHistory),
            Some(Status::Skipped(_))
        ));
        assert!(dir.path().join("Chrome_passwords.json").exists());
        assert!(!dir.path().join("Chrome_history.json").exists());
    }

    #[derive(serde::Serialize)]
    struct Tagged {
        n: String,
        extra: BTreeMap<String, String>,
    }

    /// Records CSV cannot represent.
    struct NestedRows {
        rows: Vec<Tagged>,
    }

    impl Source for NestedRows {
        fn parse(&mut self, _master_key: &[u8]) -> Result<(), SourceError> {
            self.rows = vec![Tagged {
                n: "a".to_string(),
                extra: BTreeMap::from([("k".to_string(), "v".to_string())]),
            }];
            Ok(())
        }

        fn name(&self) -> &str {
            "bad"
        }

        fn len(&self) -> usize {
            self.rows.len()
        }

        fn records(&self) -> &dyn RecordSet {
            &self.rows
        }
    }

    #[test]
    fn test_serialize_failure_keeps_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let previous = dir.path().join("Chrome_bad.csv");
        std::fs::write(&previous, b"previous good export").unwrap();

        let mut registry = registry();
        registry.register(Item::ChromiumExtension, || Box::new(NestedRows { rows: Vec::new() }));
        let mut data = BrowsingData::new(&[Item::ChromiumPassword, Item::ChromiumExtension], &registry);
        data.recovery(b"key");

        let report = data.export(dir.path(), "Chrome", OutputFormat::Csv);

        assert_eq!(report.failures().count(), 1);
        assert!(matches!(
            report.status_of(Item::ChromiumExtension),
            Some(Status::Failed(_))
        ));
        assert_eq!(std::fs::read(&previous).unwrap(), b"previous good export");
        assert!(dir.path().join("Chrome_passwords.csv").exists());
    }

    #[test]
    fn test_serialize_failure_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        registry.register(Item::ChromiumExtension, || Box::new(NestedRows { rows: Vec::new() }));
        let mut data = BrowsingData::new(&[Item::ChromiumExtension], &registry);
        data.recovery(b"key");

        let report = data.export(&dir.path().join("out"), "Chrome", OutputFormat::Csv);

        assert!(!report.is_success());
        assert!(!dir.path().join("out").join("Chrome_bad.csv").exists());
    }

    #[test]
    fn test_export_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut data = BrowsingData::new(&[Item::ChromiumPassword], &registry());
        data.recovery(b"key");

        let report = data.export(&blocker.join("sub"), "Chrome", OutputFormat::Csv);
        assert_eq!(report.failures().count(), 1);

        let report = data.export(dir.path(), "Chrome", OutputFormat::Csv);
        assert!(report.is_success());
        assert!(dir.path().join("Chrome_passwords.csv").exists());
    }
}
