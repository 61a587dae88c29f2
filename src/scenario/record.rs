//! Persisted summary of a scenario run.

use serde::Serialize;
use std::path::Path;

use crate::actions::{Action, Receipt, WinnerSummary};
use crate::scenario::runner::{ScenarioError, ScenarioResult};

/// Network, every receipt in call order, and the winner. Written once, never read back.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRecord {
    pub network: String,
    pub receipts: Vec<Receipt>,
    pub winner: WinnerSummary,
}

impl ScenarioRecord {
    /// Number of receipts produced by `action`.
    pub fn count(&self, action: Action) -> usize {
        self.receipts.iter().filter(|r| r.action == action).count()
    }

    pub fn to_json(&self) -> ScenarioResult<String> {
        serde_json::to_string_pretty(self).map_err(ScenarioError::Serialize)
    }

    /// Write the record as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> ScenarioResult<()> {
        std::fs::write(path, self.to_json()?).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), receipts = self.receipts.len(), "Records written");
        Ok(())
    }
}
