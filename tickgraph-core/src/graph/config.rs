//! Graph configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for a [`DependencyGraph`](super::DependencyGraph).
///
/// Every field has a default, so a partial JSON document such as `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Emit a `debug!` progress event every this many tasks during
    /// `calculate`. Zero is treated as one.
    pub progress_interval: usize,
}

impl GraphConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            progress_interval: 1000,
        }
    }
}
