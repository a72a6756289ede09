//! Schema-upgrade statement staging.
//!
//! Upgrade statements are registered ahead of time, keyed by database name
//! and target version, and applied by the registry when a connection is
//! opened past the database's stored version. Registration never executes
//! anything.
//!
//! ## Design Philosophy
//!
//! - **Forward-only**: entries must arrive in strictly ascending
//!   `to_version` order per database; regressions and duplicates are
//!   validation errors, never silently corrected
//! - **Staged, not run**: execution happens on the next open that detects a
//!   stored version below the target, in ascending order, none skipped

use crate::error::{CoreError, CoreResult};
use litevault_engine::SeedStatement;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One schema-upgrade step toward a target version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStatement {
    /// The schema version this step upgrades to.
    pub to_version: u32,
    /// Schema statements, run in order.
    pub statements: Vec<String>,
    /// Optional parameterized seed statements, run after `statements`.
    #[serde(default)]
    pub seed_statements: Vec<SeedStatement>,
}

impl UpgradeStatement {
    /// Creates an upgrade step without seed statements.
    pub fn new(to_version: u32, statements: Vec<String>) -> Self {
        Self {
            to_version,
            statements,
            seed_statements: Vec::new(),
        }
    }

    /// Adds seed statements to the step.
    #[must_use]
    pub fn with_seeds(mut self, seeds: Vec<SeedStatement>) -> Self {
        self.seed_statements = seeds;
        self
    }
}

/// Holds staged upgrade statements per database name.
///
/// Entries persist for the lifetime of the process.
#[derive(Debug, Default)]
pub struct UpgradeStore {
    plans: RwLock<HashMap<String, BTreeMap<u32, UpgradeStatement>>>,
}

impl UpgradeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an upgrade step for a database.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is empty, the target version is
    /// zero, the statement list is empty, or the target version does not
    /// strictly exceed every previously staged version for this database.
    pub fn add(&self, name: &str, upgrade: UpgradeStatement) -> CoreResult<()> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database name"));
        }
        if upgrade.to_version == 0 {
            return Err(CoreError::invalid_argument(
                "upgrade target version must be at least 1",
            ));
        }
        if upgrade.statements.is_empty() {
            return Err(CoreError::invalid_argument(
                "must provide at least one upgrade statement",
            ));
        }

        let mut plans = self.plans.write();
        let plan = plans.entry(name.to_string()).or_default();

        if let Some((&highest, _)) = plan.iter().next_back() {
            if upgrade.to_version <= highest {
                return Err(CoreError::invalid_argument(format!(
                    "upgrade target {} for '{name}' must exceed previously staged version {highest}",
                    upgrade.to_version
                )));
            }
        }

        plan.insert(upgrade.to_version, upgrade);
        Ok(())
    }

    /// Returns the staged steps for `name` with
    /// `stored < to_version <= requested`, in ascending order.
    ///
    /// Used by the registry during open; not part of the facade surface.
    #[must_use]
    pub fn staged_between(&self, name: &str, stored: u32, requested: u32) -> Vec<UpgradeStatement> {
        if stored >= requested {
            return Vec::new();
        }
        let plans = self.plans.read();
        let Some(plan) = plans.get(name) else {
            return Vec::new();
        };
        plan.range(stored + 1..=requested)
            .map(|(_, upgrade)| upgrade.clone())
            .collect()
    }

    /// Returns every staged target version for a database, ascending.
    #[must_use]
    pub fn staged_versions(&self, name: &str) -> Vec<u32> {
        let plans = self.plans.read();
        plans
            .get(name)
            .map(|plan| plan.keys().copied().collect())
            .unwrap_or_default()
    }
}
