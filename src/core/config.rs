//! Configuration structures for sword-depositor
//!
//! Deposit points are administered outside the deposit core; the config
//! file is their read-only source here.

use crate::core::error::DepositError;
use crate::core::traits::{DepositFlags, DepositPoint, DepositPointSource};
use async_trait::async_trait;
use serde::Deserialize;

fn default_version() -> String {
    "1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Root configuration object
#[derive(Debug, Clone, Deserialize)]
pub struct DepositConfig {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Publishing context all deposits in this config belong to
    pub context_id: i64,

    /// Configured deposit targets
    #[serde(default)]
    pub deposit_points: Vec<DepositPoint>,

    /// Default inclusion flags, overridable per invocation
    #[serde(default)]
    pub defaults: DepositFlags,

    /// Per-exchange HTTP timeout; a timeout is reported as an ordinary
    /// transport failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DepositConfig {
    /// Build a lookup registry over this config's deposit points.
    ///
    /// Deposit points whose `context_id` was omitted in the file inherit
    /// the config-level context.
    pub fn registry(&self) -> DepositPointRegistry {
        let points = self
            .deposit_points
            .iter()
            .cloned()
            .map(|mut p| {
                if p.context_id == 0 {
                    p.context_id = self.context_id;
                }
                p
            })
            .collect();

        DepositPointRegistry { points }
    }
}

/// Config-backed deposit point lookup
#[derive(Debug, Clone, Default)]
pub struct DepositPointRegistry {
    points: Vec<DepositPoint>,
}

impl DepositPointRegistry {
    pub fn new(points: Vec<DepositPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepositPoint> {
        self.points.iter()
    }
}

#[async_trait]
impl DepositPointSource for DepositPointRegistry {
    /// Lookup by id, scoped to one publishing context. A deposit point
    /// belonging to another context is absent, not an error.
    async fn by_id(
        &self,
        deposit_point_id: i64,
        context_id: i64,
    ) -> Result<Option<DepositPoint>, DepositError> {
        Ok(self
            .points
            .iter()
            .find(|p| p.id == deposit_point_id && p.context_id == context_id)
            .cloned())
    }
}
