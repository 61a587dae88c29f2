//! Scenario subsystem: the scripted end-to-end demonstration and its record.

pub mod record;
pub mod runner;

pub use record::ScenarioRecord;
pub use runner::{split_budget, ScenarioError, ScenarioRunner, GROUP_ID, MINT_VALUE, PROPOSALS};
