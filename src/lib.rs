//! Extract browser data (passwords, cookies, bookmarks, history, downloads,
//! credit cards, storage, extensions), decrypt it with a caller-supplied
//! master key and export it as JSON or CSV.
//!
//! ```no_run
//! use std::path::Path;
//! use browser_data_export::browsing_data::{BrowsingData, OutputFormat, Registry};
//! use browser_data_export::item::Item;
//!
//! let registry = Registry::builtin("/path/to/Chrome/Default");
//! let mut data = BrowsingData::new(Item::chromium_items(), &registry);
//! let master_key = vec![0u8; 16];
//! data.recovery(&master_key);
//! data.export(Path::new("results"), "Chrome", OutputFormat::Csv);
//! ```

pub mod browsing_data;
pub mod crypto;
pub mod data_types;
pub mod db_snapshot;
pub mod error;
pub mod item;

pub use browsing_data::{BrowsingData, OutputFormat, Registry, Report, Source};
pub use error::{OutputError, SourceError};
pub use item::Item;
