//! Where per-source outcomes are announced while a batch runs.

use std::fmt;

use tracing::{debug, error, info};

use crate::item::Item;

/// The batch step an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Construct,
    Recovery,
    Export,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Construct => "construct",
            Stage::Recovery => "parse",
            Stage::Export => "export",
            Stage::Serialize => "serialize",
        })
    }
}

/// Receives outcomes as the collection processes its sources.
pub trait Reporter {
    fn success(&self, item: Item, name: &str, stage: Stage, detail: &str);
    fn failure(&self, item: Item, name: &str, stage: Stage, reason: &str);
    fn skipped(&self, item: Item, name: &str, stage: Stage, reason: &str);
}

/// Forwards outcomes to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn success(&self, item: Item, name: &str, stage: Stage, detail: &str) {
        info!(%item, "{} {} success: {}", stage, name, detail);
    }

    fn failure(&self, item: Item, name: &str, stage: Stage, reason: &str) {
        error!(%item, "{} {} error {}", stage, name, reason);
    }

    fn skipped(&self, item: Item, name: &str, stage: Stage, reason: &str) {
        debug!(%item, "{} {} skipped: {}", stage, name, reason);
    }
}
